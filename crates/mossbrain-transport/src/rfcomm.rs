use std::fs::File;
use std::io::{Read, Write};

use tracing::debug;

use crate::addr::BdAddr;
use crate::error::{Result, TransportError};
use crate::traits::{Connect, DuplexStream};

/// RFCOMM channel the brain block listens on.
pub const DEFAULT_CHANNEL: u8 = 1;

/// A connected RFCOMM socket.
///
/// Reads and writes go straight to the socket descriptor and block until the
/// kernel has data or buffer space. There is no read timeout.
pub struct RfcommStream {
    inner: File,
    address: BdAddr,
    channel: u8,
}

impl Read for RfcommStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for RfcommStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl RfcommStream {
    /// Connect to `address` on the given RFCOMM channel (blocking).
    pub fn connect(address: BdAddr, channel: u8) -> Result<Self> {
        #[cfg(not(target_os = "linux"))]
        {
            let _ = (address, channel);
            Err(TransportError::Unsupported(
                "RFCOMM sockets require the Linux Bluetooth stack",
            ))
        }

        #[cfg(target_os = "linux")]
        {
            let inner = sys::connect(address, channel).map_err(|source| {
                TransportError::Connect {
                    address: address.to_string(),
                    channel,
                    source,
                }
            })?;
            debug!(%address, channel, "connected rfcomm socket");
            Ok(Self {
                inner,
                address,
                channel,
            })
        }
    }

    /// Remote device address.
    pub fn address(&self) -> BdAddr {
        self.address
    }

    /// RFCOMM channel of this stream.
    pub fn channel(&self) -> u8 {
        self.channel
    }
}

impl DuplexStream for RfcommStream {
    fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            inner: self.inner.try_clone()?,
            address: self.address,
            channel: self.channel,
        })
    }

    fn shutdown(&mut self) -> Result<()> {
        debug!(address = %self.address, "shutting down rfcomm socket");
        #[cfg(target_os = "linux")]
        sys::shutdown(&self.inner)?;
        Ok(())
    }
}

impl std::fmt::Debug for RfcommStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RfcommStream")
            .field("address", &self.address)
            .field("channel", &self.channel)
            .finish()
    }
}

/// Check that the kernel can create RFCOMM sockets.
pub fn probe() -> Result<()> {
    #[cfg(not(target_os = "linux"))]
    {
        Err(TransportError::Unsupported(
            "RFCOMM sockets require the Linux Bluetooth stack",
        ))
    }

    #[cfg(target_os = "linux")]
    {
        sys::socket().map(drop).map_err(TransportError::Io)
    }
}

/// Opens [`RfcommStream`]s from textual addresses.
#[derive(Clone, Copy, Debug, Default)]
pub struct RfcommConnector;

impl Connect for RfcommConnector {
    type Stream = RfcommStream;

    fn connect(&mut self, address: &str, channel: u8) -> Result<RfcommStream> {
        let address: BdAddr = address.parse()?;
        RfcommStream::connect(address, channel)
    }
}

#[cfg(target_os = "linux")]
mod sys {
    use std::fs::File;
    use std::io;
    use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

    use crate::addr::BdAddr;

    const BTPROTO_RFCOMM: libc::c_int = 3;

    /// `struct sockaddr_rc` from `<bluetooth/rfcomm.h>`.
    #[repr(C)]
    struct SockaddrRc {
        rc_family: libc::sa_family_t,
        rc_bdaddr: [u8; 6],
        rc_channel: u8,
    }

    pub(super) fn socket() -> io::Result<OwnedFd> {
        // SAFETY: socket(2) takes no pointers; the result is checked before use.
        let raw = unsafe {
            libc::socket(
                libc::AF_BLUETOOTH,
                libc::SOCK_STREAM | libc::SOCK_CLOEXEC,
                BTPROTO_RFCOMM,
            )
        };
        if raw < 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: `raw` is a freshly created descriptor not owned by anything else.
        Ok(unsafe { OwnedFd::from_raw_fd(raw) })
    }

    pub(super) fn connect(address: BdAddr, channel: u8) -> io::Result<File> {
        let fd = socket()?;

        let sockaddr = SockaddrRc {
            rc_family: libc::AF_BLUETOOTH as libc::sa_family_t,
            rc_bdaddr: address.to_wire(),
            rc_channel: channel,
        };

        loop {
            // SAFETY: `sockaddr` lives across the call and the length passed is its exact size.
            let rc = unsafe {
                libc::connect(
                    fd.as_raw_fd(),
                    (&sockaddr as *const SockaddrRc).cast::<libc::sockaddr>(),
                    std::mem::size_of::<SockaddrRc>() as libc::socklen_t,
                )
            };
            if rc == 0 {
                return Ok(File::from(fd));
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    pub(super) fn shutdown(file: &File) -> io::Result<()> {
        // SAFETY: the descriptor is open for as long as `file` is borrowed.
        let rc = unsafe { libc::shutdown(file.as_raw_fd(), libc::SHUT_RDWR) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            // Already disconnected by the peer.
            if err.raw_os_error() == Some(libc::ENOTCONN) {
                return Ok(());
            }
            return Err(err);
        }
        Ok(())
    }
}
