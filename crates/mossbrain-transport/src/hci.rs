//! Classic Bluetooth device discovery through the kernel HCI interface.
//!
//! An inquiry collects nearby device addresses, then a remote name request is
//! issued for each of them. Both operations talk to the local adapter
//! (`hciN`) over raw `BTPROTO_HCI` sockets, so no BlueZ daemon is involved.

use std::time::Duration;

use tracing::debug;

use crate::addr::BdAddr;
use crate::error::{Result, TransportError};
use crate::traits::{DiscoveredDevice, Discover};

/// Device inquiry plus name lookup on one local adapter.
#[derive(Clone, Debug)]
pub struct HciScanner {
    dev_id: u16,
    inquiry_length: u8,
    max_responses: u8,
    flush_cache: bool,
    name_timeout: Duration,
}

impl Default for HciScanner {
    fn default() -> Self {
        Self {
            dev_id: 0,
            inquiry_length: 8,
            max_responses: 255,
            flush_cache: true,
            name_timeout: Duration::from_secs(10),
        }
    }
}

impl HciScanner {
    /// Scanner bound to adapter `hci{dev_id}` with default timings.
    pub fn new(dev_id: u16) -> Self {
        Self {
            dev_id,
            ..Self::default()
        }
    }

    /// Inquiry duration in units of 1.28 seconds.
    pub fn with_inquiry_length(mut self, inquiry_length: u8) -> Self {
        self.inquiry_length = inquiry_length;
        self
    }

    /// Upper bound on inquiry responses (0 lets the kernel pick 255).
    pub fn with_max_responses(mut self, max_responses: u8) -> Self {
        self.max_responses = max_responses;
        self
    }

    /// Discard the kernel inquiry cache before scanning.
    pub fn with_flush_cache(mut self, flush_cache: bool) -> Self {
        self.flush_cache = flush_cache;
        self
    }

    /// Per-device remote name request timeout.
    pub fn with_name_timeout(mut self, name_timeout: Duration) -> Self {
        self.name_timeout = name_timeout;
        self
    }

    pub fn dev_id(&self) -> u16 {
        self.dev_id
    }

    /// Check that the adapter exists and an HCI socket can be bound to it.
    pub fn probe(&self) -> Result<()> {
        #[cfg(not(target_os = "linux"))]
        {
            Err(TransportError::Unsupported(
                "bluetooth adapters require the Linux Bluetooth stack",
            ))
        }

        #[cfg(target_os = "linux")]
        {
            sys::probe(self.dev_id).map_err(TransportError::Discovery)
        }
    }

    /// Run an inquiry and return the responding addresses, first seen first.
    pub fn inquiry(&self) -> Result<Vec<BdAddr>> {
        #[cfg(not(target_os = "linux"))]
        {
            Err(TransportError::Unsupported(
                "bluetooth inquiry requires the Linux Bluetooth stack",
            ))
        }

        #[cfg(target_os = "linux")]
        {
            debug!(
                dev_id = self.dev_id,
                length = self.inquiry_length,
                "starting inquiry"
            );
            let raw = sys::inquiry(
                self.dev_id,
                self.inquiry_length,
                self.max_responses,
                self.flush_cache,
            )
            .map_err(TransportError::Discovery)?;

            let mut addresses: Vec<BdAddr> = Vec::with_capacity(raw.len());
            for wire in raw {
                let address = BdAddr::from_wire(wire);
                if !addresses.contains(&address) {
                    addresses.push(address);
                }
            }
            Ok(addresses)
        }
    }

    /// Ask a device for its user-friendly name.
    ///
    /// `Ok(None)` means the device did not answer the request.
    pub fn lookup_name(&self, address: BdAddr) -> Result<Option<String>> {
        #[cfg(not(target_os = "linux"))]
        {
            let _ = address;
            Err(TransportError::Unsupported(
                "bluetooth name lookup requires the Linux Bluetooth stack",
            ))
        }

        #[cfg(target_os = "linux")]
        {
            sys::remote_name(self.dev_id, address.to_wire(), self.name_timeout)
                .map_err(TransportError::Discovery)
        }
    }
}

impl Discover for HciScanner {
    fn discover(&mut self) -> Result<Vec<DiscoveredDevice>> {
        let addresses = self.inquiry()?;
        let mut devices = Vec::with_capacity(addresses.len());
        for address in addresses {
            debug!(%address, "address");
            let name = match self.lookup_name(address) {
                Ok(Some(name)) => name,
                Ok(None) => String::new(),
                Err(err) => {
                    debug!(%address, error = %err, "name lookup failed");
                    String::new()
                }
            };
            debug!(%address, name = %name, "name");
            devices.push(DiscoveredDevice::new(address.to_string(), name));
        }
        Ok(devices)
    }
}

#[cfg(target_os = "linux")]
mod sys {
    use std::fs::File;
    use std::io::{self, Read, Write};
    use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
    use std::time::{Duration, Instant};

    const BTPROTO_HCI: libc::c_int = 1;
    const HCI_CHANNEL_RAW: u16 = 0;
    const SOL_HCI: libc::c_int = 0;
    const HCI_FILTER: libc::c_int = 2;

    /// `_IOR('H', 240, int)`
    const HCIINQUIRY: libc::c_ulong = 0x8004_48F0;
    const IREQ_CACHE_FLUSH: u16 = 0x0001;
    /// General inquiry access code.
    const GIAC_LAP: [u8; 3] = [0x33, 0x8B, 0x9E];
    /// `sizeof(struct hci_inquiry_req)` including trailing padding.
    const INQUIRY_REQ_SIZE: usize = 10;
    /// `sizeof(inquiry_info)` (packed).
    const INQUIRY_INFO_SIZE: usize = 14;

    const HCI_COMMAND_PKT: u8 = 0x01;
    const HCI_EVENT_PKT: u8 = 0x04;
    const EVT_REMOTE_NAME_REQ_COMPLETE: u8 = 0x07;
    const EVT_CMD_STATUS: u8 = 0x0F;
    /// OGF_LINK_CTL (0x01) << 10 | OCF_REMOTE_NAME_REQ (0x0019)
    const OPCODE_REMOTE_NAME_REQ: u16 = (0x01 << 10) | 0x0019;
    const HCI_MAX_EVENT_SIZE: usize = 260;

    #[repr(C)]
    struct SockaddrHci {
        hci_family: libc::sa_family_t,
        hci_dev: u16,
        hci_channel: u16,
    }

    #[repr(C)]
    struct HciFilter {
        type_mask: u32,
        event_mask: [u32; 2],
        opcode: u16,
    }

    impl HciFilter {
        fn set_event(&mut self, event: u8) {
            self.event_mask[usize::from(event >> 5)] |= 1 << (event & 31);
        }
    }

    fn raw_socket() -> io::Result<OwnedFd> {
        // SAFETY: socket(2) takes no pointers; the result is checked before use.
        let raw = unsafe {
            libc::socket(
                libc::AF_BLUETOOTH,
                libc::SOCK_RAW | libc::SOCK_CLOEXEC,
                BTPROTO_HCI,
            )
        };
        if raw < 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: `raw` is a freshly created descriptor not owned by anything else.
        Ok(unsafe { OwnedFd::from_raw_fd(raw) })
    }

    fn bind_device(fd: &OwnedFd, dev_id: u16) -> io::Result<()> {
        let sockaddr = SockaddrHci {
            hci_family: libc::AF_BLUETOOTH as libc::sa_family_t,
            hci_dev: dev_id,
            hci_channel: HCI_CHANNEL_RAW,
        };
        // SAFETY: `sockaddr` lives across the call and the length passed is its exact size.
        let rc = unsafe {
            libc::bind(
                fd.as_raw_fd(),
                (&sockaddr as *const SockaddrHci).cast::<libc::sockaddr>(),
                std::mem::size_of::<SockaddrHci>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    pub(super) fn probe(dev_id: u16) -> io::Result<()> {
        let fd = raw_socket()?;
        bind_device(&fd, dev_id)
    }

    pub(super) fn inquiry(
        dev_id: u16,
        length: u8,
        max_responses: u8,
        flush_cache: bool,
    ) -> io::Result<Vec<[u8; 6]>> {
        let fd = raw_socket()?;

        let slots = if max_responses == 0 {
            255
        } else {
            usize::from(max_responses)
        };
        let mut buf = vec![0u8; INQUIRY_REQ_SIZE + INQUIRY_INFO_SIZE * slots];
        let flags = if flush_cache { IREQ_CACHE_FLUSH } else { 0 };
        buf[0..2].copy_from_slice(&dev_id.to_ne_bytes());
        buf[2..4].copy_from_slice(&flags.to_ne_bytes());
        buf[4..7].copy_from_slice(&GIAC_LAP);
        buf[7] = length;
        buf[8] = max_responses;

        loop {
            // SAFETY: `buf` holds a request header followed by room for `slots`
            // inquiry_info records, which bounds what the kernel writes back.
            let rc = unsafe { libc::ioctl(fd.as_raw_fd(), HCIINQUIRY as _, buf.as_mut_ptr()) };
            if rc >= 0 {
                break;
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }

        let found = usize::from(buf[8]).min(slots);
        let mut addresses = Vec::with_capacity(found);
        for i in 0..found {
            let offset = INQUIRY_REQ_SIZE + i * INQUIRY_INFO_SIZE;
            let mut wire = [0u8; 6];
            wire.copy_from_slice(&buf[offset..offset + 6]);
            addresses.push(wire);
        }
        Ok(addresses)
    }

    pub(super) fn remote_name(
        dev_id: u16,
        address: [u8; 6],
        timeout: Duration,
    ) -> io::Result<Option<String>> {
        let fd = raw_socket()?;

        bind_device(&fd, dev_id)?;

        let mut filter = HciFilter {
            type_mask: 1 << HCI_EVENT_PKT,
            event_mask: [0; 2],
            opcode: OPCODE_REMOTE_NAME_REQ,
        };
        filter.set_event(EVT_CMD_STATUS);
        filter.set_event(EVT_REMOTE_NAME_REQ_COMPLETE);
        // SAFETY: `filter` lives across the call and the length passed is its exact size.
        let rc = unsafe {
            libc::setsockopt(
                fd.as_raw_fd(),
                SOL_HCI,
                HCI_FILTER,
                (&filter as *const HciFilter).cast::<libc::c_void>(),
                std::mem::size_of::<HciFilter>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }

        let mut socket = File::from(fd);

        // remote_name_req_cp: bdaddr, pscan_rep_mode R2, reserved, clock_offset
        let mut command = Vec::with_capacity(14);
        command.push(HCI_COMMAND_PKT);
        command.extend_from_slice(&OPCODE_REMOTE_NAME_REQ.to_le_bytes());
        command.push(10);
        command.extend_from_slice(&address);
        command.extend_from_slice(&[0x02, 0x00, 0x00, 0x00]);
        socket.write_all(&command)?;

        let deadline = Instant::now() + timeout;
        let mut buf = [0u8; HCI_MAX_EVENT_SIZE];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || !wait_readable(&socket, remaining)? {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "remote name request timed out",
                ));
            }

            let read = match socket.read(&mut buf) {
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            if read < 3 || buf[0] != HCI_EVENT_PKT {
                continue;
            }
            let end = read.min(3 + usize::from(buf[2]));
            let params = &buf[3..end];

            match buf[1] {
                EVT_CMD_STATUS => {
                    if params.len() < 4 {
                        continue;
                    }
                    let opcode = u16::from_le_bytes([params[2], params[3]]);
                    if opcode != OPCODE_REMOTE_NAME_REQ {
                        continue;
                    }
                    if params[0] != 0 {
                        return Err(io::Error::other(format!(
                            "remote name request rejected (status 0x{:02x})",
                            params[0]
                        )));
                    }
                }
                EVT_REMOTE_NAME_REQ_COMPLETE => {
                    if params.len() < 7 || params[1..7] != address {
                        continue;
                    }
                    if params[0] != 0 {
                        return Ok(None);
                    }
                    let name = &params[7..];
                    let len = name.iter().position(|&b| b == 0).unwrap_or(name.len());
                    return Ok(Some(String::from_utf8_lossy(&name[..len]).into_owned()));
                }
                _ => {}
            }
        }
    }

    fn wait_readable(socket: &File, timeout: Duration) -> io::Result<bool> {
        let mut pfd = libc::pollfd {
            fd: socket.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let millis = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);
        loop {
            // SAFETY: `pfd` is a single valid pollfd for the duration of the call.
            let rc = unsafe { libc::poll(&mut pfd, 1, millis.max(1)) };
            if rc >= 0 {
                return Ok(rc > 0);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let scanner = HciScanner::new(1)
            .with_inquiry_length(4)
            .with_max_responses(10)
            .with_flush_cache(false)
            .with_name_timeout(Duration::from_secs(2));
        assert_eq!(scanner.dev_id(), 1);
        assert_eq!(scanner.inquiry_length, 4);
        assert_eq!(scanner.max_responses, 10);
        assert!(!scanner.flush_cache);
        assert_eq!(scanner.name_timeout, Duration::from_secs(2));
    }
}
