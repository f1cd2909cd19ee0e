//! Control Moss brain blocks over Bluetooth.
//!
//! A brain block exposes eight faces (inputs or outputs) and an RGB LED
//! behind a small binary command protocol carried over RFCOMM.
//!
//! # Crate Structure
//!
//! - [`transport`]: device discovery and RFCOMM streams
//! - [`frame`]: command table and frame codec
//! - [`client`]: connection lifecycle and the command client
//!
//! ```no_run
//! use mossbrain::client::{connect, ClientConfig, Color};
//!
//! let mut brain = connect(&ClientConfig::default())?;
//! brain.set_led(Color::GREEN)?;
//! let reply = brain.call("getAllFaceValues", &[])?;
//! println!("{reply:?}");
//! # Ok::<(), mossbrain::client::ClientError>(())
//! ```

/// Re-export transport types.
pub mod transport {
    pub use mossbrain_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use mossbrain_frame::*;
}

/// Re-export client types.
pub mod client {
    pub use mossbrain_client::*;
}

pub use mossbrain_client::{connect, BrainClient, ClientConfig, ClientError};
