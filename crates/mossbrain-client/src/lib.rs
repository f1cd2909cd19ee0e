//! Session layer for brain blocks.
//!
//! Finds a device, connects, resets it, and turns command names plus integer
//! arguments into request/response round trips. The session resets the
//! device and closes the stream when it goes out of scope.

pub mod client;
pub mod config;
pub mod connection;
pub mod connector;
pub mod error;
pub mod locator;
pub mod types;

#[cfg(test)]
mod mock;

pub use client::{BrainClient, ALL_FACES_MASK, RESET_FACE_VALUE};
pub use config::{ClientConfig, ScanConfig, DEFAULT_NAME_PREFIX};
pub use connection::{Connection, Interrupter};
pub use connector::{connect, connect_with};
pub use error::{ClientError, Result};
pub use locator::DeviceLocator;
pub use types::{Color, Face, FaceState, COLORS, NFACES};
