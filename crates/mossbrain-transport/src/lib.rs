//! Bluetooth transport for brain blocks.
//!
//! Provides the two platform primitives everything else builds on:
//! - device discovery ([`Discover`], implemented by [`HciScanner`])
//! - RFCOMM byte streams ([`Connect`] / [`DuplexStream`], implemented by
//!   [`RfcommConnector`] / [`RfcommStream`])
//!
//! The concrete backend talks to the Linux kernel Bluetooth stack. Other
//! platforms get [`TransportError::Unsupported`].

pub mod addr;
pub mod error;
pub mod hci;
pub mod rfcomm;
pub mod traits;

pub use addr::BdAddr;
pub use error::{Result, TransportError};
pub use hci::HciScanner;
pub use rfcomm::{RfcommConnector, RfcommStream, DEFAULT_CHANNEL};
pub use traits::{Connect, DiscoveredDevice, Discover, DuplexStream};
