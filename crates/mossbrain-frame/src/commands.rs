//! The brain block command table.
//!
//! Names are the camelCase identifiers used by the device firmware and the
//! stdio relay. The table is closed: both name and opcode are unique keys.

use std::fmt;
use std::str::FromStr;

use crate::error::{FrameError, Result};

/// Commands that are written without reading a reply.
pub const NO_RESPONSE: [&str; 2] = ["setManyFaceValues", "setFaceValue"];

/// A device command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Debug,
    GetConfiguration,
    GetMode,
    SetMode,
    GetAllFaceStates,
    SetAllFaceStates,
    SetFaceState,
    GetAllFaceValues,
    GetFaceValue,
    SetManyFaceValues,
    SetFaceValue,
    RegisterFaceValueEvent,
    FaceValueEvent,
    GetLedState,
    SetLedState,
    SetAutoReconnect,
    SetFaceOverride,
    Flash,
    FlashProgressEvent,
    BrickDetection,
}

impl Command {
    /// Every command, in opcode order.
    pub const ALL: [Command; 20] = [
        Command::Debug,
        Command::GetConfiguration,
        Command::GetMode,
        Command::SetMode,
        Command::GetAllFaceStates,
        Command::SetAllFaceStates,
        Command::SetFaceState,
        Command::GetAllFaceValues,
        Command::GetFaceValue,
        Command::SetManyFaceValues,
        Command::SetFaceValue,
        Command::RegisterFaceValueEvent,
        Command::FaceValueEvent,
        Command::GetLedState,
        Command::SetLedState,
        Command::SetAutoReconnect,
        Command::SetFaceOverride,
        Command::Flash,
        Command::FlashProgressEvent,
        Command::BrickDetection,
    ];

    pub const fn opcode(self) -> u8 {
        match self {
            Command::Debug => 0x00,
            Command::GetConfiguration => 0x01,
            Command::GetMode => 0x02,
            Command::SetMode => 0x03,
            Command::GetAllFaceStates => 0x04,
            Command::SetAllFaceStates => 0x05,
            Command::SetFaceState => 0x06,
            Command::GetAllFaceValues => 0x07,
            Command::GetFaceValue => 0x08,
            Command::SetManyFaceValues => 0x09,
            Command::SetFaceValue => 0x0A,
            Command::RegisterFaceValueEvent => 0x0B,
            Command::FaceValueEvent => 0x0C,
            Command::GetLedState => 0x0D,
            Command::SetLedState => 0x0E,
            Command::SetAutoReconnect => 0x11,
            Command::SetFaceOverride => 0x12,
            Command::Flash => 0xF0,
            Command::FlashProgressEvent => 0xF1,
            Command::BrickDetection => 0xF2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Command::Debug => "debug",
            Command::GetConfiguration => "getConfiguration",
            Command::GetMode => "getMode",
            Command::SetMode => "setMode",
            Command::GetAllFaceStates => "getAllFaceStates",
            Command::SetAllFaceStates => "setAllFaceStates",
            Command::SetFaceState => "setFaceState",
            Command::GetAllFaceValues => "getAllFaceValues",
            Command::GetFaceValue => "getFaceValue",
            Command::SetManyFaceValues => "setManyFaceValues",
            Command::SetFaceValue => "setFaceValue",
            Command::RegisterFaceValueEvent => "registerFaceValueEvent",
            Command::FaceValueEvent => "faceValueEvent",
            Command::GetLedState => "getLEDState",
            Command::SetLedState => "setLEDState",
            Command::SetAutoReconnect => "setAutoReconnect",
            Command::SetFaceOverride => "setFaceOverride",
            Command::Flash => "flash",
            Command::FlashProgressEvent => "flashProgressEvent",
            Command::BrickDetection => "brickDetection",
        }
    }

    /// Whether the device answers this command with a frame.
    pub const fn expects_response(self) -> bool {
        !matches!(self, Command::SetManyFaceValues | Command::SetFaceValue)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.name() == name)
    }

    pub fn from_opcode(opcode: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.opcode() == opcode)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Command {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| FrameError::UnknownCommand(s.to_string()))
    }
}

/// Opcode for a command name.
pub fn opcode_of(name: &str) -> Result<u8> {
    name.parse::<Command>().map(Command::opcode)
}

/// Command name for an opcode.
pub fn name_of(opcode: u8) -> Result<&'static str> {
    Command::from_opcode(opcode)
        .map(Command::name)
        .ok_or(FrameError::UnknownOpcode(opcode))
}

/// Whether a command is answered with a frame.
///
/// True for every name outside [`NO_RESPONSE`].
pub fn expects_response(name: &str) -> bool {
    !NO_RESPONSE.contains(&name)
}
