//! Device domain types: faces, face states and LED colours.
//!
//! Faces are numbered `0..NFACES` and carry byte values. Companion apps show
//! faces as 1-8 with 0-100 values; this API uses the device's raw ranges.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Number of faces on a brain block.
pub const NFACES: usize = 8;

/// A face index in `0..NFACES`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Face(u8);

impl Face {
    pub fn new(index: u8) -> Result<Self> {
        if usize::from(index) < NFACES {
            Ok(Self(index))
        } else {
            Err(ClientError::InvalidFace(index))
        }
    }

    pub const fn index(self) -> u8 {
        self.0
    }

    /// Bit for this face in a `setManyFaceValues` mask.
    pub const fn mask(self) -> u8 {
        1 << self.0
    }

    /// Every face, in index order.
    pub fn all() -> impl Iterator<Item = Face> {
        (0..NFACES as u8).map(Face)
    }
}

impl TryFrom<u8> for Face {
    type Error = ClientError;

    fn try_from(index: u8) -> Result<Self> {
        Self::new(index)
    }
}

impl From<Face> for u8 {
    fn from(face: Face) -> u8 {
        face.0
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a face drives its value (output) or reports it (input).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceState {
    #[default]
    Output = 0,
    Input = 1,
}

impl FaceState {
    pub const fn wire(self) -> u8 {
        self as u8
    }

    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            0 => Some(FaceState::Output),
            1 => Some(FaceState::Input),
            _ => None,
        }
    }
}

/// An RGB value for the block LED.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const BLUE: Color = Color::new(0, 0, 255);
    pub const GREEN: Color = Color::new(0, 255, 0);
    pub const CYAN: Color = Color::new(0, 255, 255);
    pub const RED: Color = Color::new(255, 0, 0);
    pub const MAGENTA: Color = Color::new(255, 0, 255);
    pub const YELLOW: Color = Color::new(255, 255, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Arguments for `setLEDState`.
    pub fn args(self) -> [i64; 3] {
        [
            i64::from(self.red),
            i64::from(self.green),
            i64::from(self.blue),
        ]
    }

    /// Build from a `getLEDState` reply.
    pub fn from_values(values: &[u8]) -> Option<Self> {
        match values {
            [red, green, blue] => Some(Self::new(*red, *green, *blue)),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

/// The fixed palette. Index bits read as `RGB`: `COLORS[0b101]` is magenta.
pub const COLORS: [Color; 8] = [
    Color::BLACK,
    Color::BLUE,
    Color::GREEN,
    Color::CYAN,
    Color::RED,
    Color::MAGENTA,
    Color::YELLOW,
    Color::WHITE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_range() {
        assert_eq!(Face::new(7).expect("face 7 is valid").index(), 7);
        assert!(matches!(Face::new(8), Err(ClientError::InvalidFace(8))));
        assert_eq!(Face::all().count(), NFACES);
        assert_eq!(Face::new(0).expect("face 0 is valid").mask(), 0x01);
        assert_eq!(Face::new(7).expect("face 7 is valid").mask(), 0x80);
    }

    #[test]
    fn face_serde_validates() {
        let face: Face = serde_json::from_str("6").expect("face should parse");
        assert_eq!(face.index(), 6);
        assert!(serde_json::from_str::<Face>("9").is_err());
    }

    #[test]
    fn face_state_wire_values() {
        assert_eq!(FaceState::Output.wire(), 0);
        assert_eq!(FaceState::Input.wire(), 1);
        assert_eq!(FaceState::from_wire(1), Some(FaceState::Input));
        assert_eq!(FaceState::from_wire(2), None);
    }

    #[test]
    fn palette_order() {
        assert_eq!(COLORS[0], Color::BLACK);
        assert_eq!(COLORS[2], Color::GREEN);
        assert_eq!(COLORS[4], Color::RED);
        assert_eq!(COLORS[6], Color::YELLOW);
        assert_eq!(COLORS[7], Color::WHITE);
        assert_eq!(COLORS[0b101], Color::MAGENTA);
        assert_eq!(Color::CYAN.args(), [0, 255, 255]);
        assert_eq!(Color::MAGENTA.to_string(), "#ff00ff");
    }

    #[test]
    fn color_from_reply() {
        assert_eq!(Color::from_values(&[255, 255, 0]), Some(Color::YELLOW));
        assert_eq!(Color::from_values(&[1, 2]), None);
    }
}
