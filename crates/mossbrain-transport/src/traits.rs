use std::io::{Read, Write};

use crate::error::Result;

/// A connected, exclusively owned duplex byte stream to a device.
///
/// `read` returning `Ok(0)` means the peer closed the stream.
pub trait DuplexStream: Read + Write + Send + Sized {
    /// Open a second handle onto the same stream (used to split reader/writer).
    fn try_clone(&self) -> Result<Self>;

    /// Shut down both directions of the stream.
    ///
    /// Every handle obtained through [`DuplexStream::try_clone`] observes the
    /// shutdown; dropping the handles afterwards releases the descriptors.
    fn shutdown(&mut self) -> Result<()>;
}

/// Local socket pairs stand in for a device link, for example an emulator
/// bridged onto a Unix socket.
#[cfg(unix)]
impl DuplexStream for std::os::unix::net::UnixStream {
    fn try_clone(&self) -> Result<Self> {
        Ok(std::os::unix::net::UnixStream::try_clone(self)?)
    }

    fn shutdown(&mut self) -> Result<()> {
        match std::os::unix::net::UnixStream::shutdown(self, std::net::Shutdown::Both) {
            Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            other => Ok(other?),
        }
    }
}

/// One `(address, name)` pair reported by device discovery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub address: String,
    pub name: String,
}

impl DiscoveredDevice {
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }
}

/// Scans for nearby devices.
///
/// The order of the returned devices is whatever the platform reports and
/// must not be assumed stable between scans.
pub trait Discover {
    fn discover(&mut self) -> Result<Vec<DiscoveredDevice>>;
}

/// Opens streams to devices by address.
pub trait Connect {
    type Stream: DuplexStream;

    fn connect(&mut self, address: &str, channel: u8) -> Result<Self::Stream>;
}
