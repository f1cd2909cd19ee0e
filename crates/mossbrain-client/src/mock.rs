//! In-memory transport doubles shared by the client tests.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use mossbrain_transport::{
    Connect, DiscoveredDevice, Discover, DuplexStream, Result as TransportResult, TransportError,
};

#[derive(Default)]
pub(crate) struct MockState {
    /// One entry per `write` call.
    pub writes: Vec<Vec<u8>>,
    pub input: VecDeque<u8>,
    pub reads: usize,
    pub closes: usize,
    /// Fail every write once this many have succeeded.
    pub fail_writes_after: Option<usize>,
    /// Fail only the write attempt with this index.
    pub fail_write_at: Option<usize>,
    pub write_attempts: usize,
}

/// A scripted duplex stream. Clones share state, like `try_clone`d sockets.
#[derive(Clone, Default)]
pub(crate) struct MockStream {
    state: Arc<Mutex<MockState>>,
}

impl MockStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state lock should not be poisoned")
    }

    pub fn queue_reply(&self, opcode: u8, values: &[u8]) {
        let mut state = self.state();
        state
            .input
            .extend([b'<', opcode, 0x00, values.len() as u8, b'>']);
        state.input.extend(values.iter().copied());
    }

    /// Replies for the two answered commands of the reset sequence.
    pub fn queue_reset_replies(&self) {
        self.queue_reply(0x0E, &[]);
        self.queue_reply(0x05, &[]);
    }

    pub fn fail_writes_after(&self, n: usize) {
        self.state().fail_writes_after = Some(n);
    }

    pub fn fail_write_at(&self, attempt: usize) {
        self.state().fail_write_at = Some(attempt);
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state().writes.clone()
    }

    pub fn reads(&self) -> usize {
        self.state().reads
    }

    pub fn closes(&self) -> usize {
        self.state().closes
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut state = self.state();
        state.reads += 1;
        let n = buf.len().min(state.input.len());
        for slot in buf.iter_mut().take(n) {
            *slot = state.input.pop_front().unwrap_or_default();
        }
        Ok(n)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut state = self.state();
        let attempt = state.write_attempts;
        state.write_attempts += 1;
        let limit_hit = state
            .fail_writes_after
            .is_some_and(|limit| state.writes.len() >= limit);
        if limit_hit || state.fail_write_at == Some(attempt) || state.closes > 0 {
            return Err(std::io::Error::from(ErrorKind::BrokenPipe));
        }
        state.writes.push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl DuplexStream for MockStream {
    fn try_clone(&self) -> TransportResult<Self> {
        Ok(self.clone())
    }

    fn shutdown(&mut self) -> TransportResult<()> {
        self.state().closes += 1;
        Ok(())
    }
}

pub(crate) struct MockDiscover {
    pub devices: Vec<DiscoveredDevice>,
    pub scans: usize,
}

impl MockDiscover {
    pub fn new(devices: &[(&str, &str)]) -> Self {
        Self {
            devices: devices
                .iter()
                .map(|(address, name)| DiscoveredDevice::new(*address, *name))
                .collect(),
            scans: 0,
        }
    }
}

impl Discover for MockDiscover {
    fn discover(&mut self) -> TransportResult<Vec<DiscoveredDevice>> {
        self.scans += 1;
        Ok(self.devices.clone())
    }
}

pub(crate) struct MockConnector {
    pub stream: MockStream,
    pub refuse: bool,
    pub attempts: Vec<(String, u8)>,
}

impl MockConnector {
    pub fn new(stream: MockStream) -> Self {
        Self {
            stream,
            refuse: false,
            attempts: Vec::new(),
        }
    }

    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::new(MockStream::new())
        }
    }
}

impl Connect for MockConnector {
    type Stream = MockStream;

    fn connect(&mut self, address: &str, channel: u8) -> TransportResult<MockStream> {
        self.attempts.push((address.to_string(), channel));
        if self.refuse {
            return Err(TransportError::Connect {
                address: address.to_string(),
                channel,
                source: std::io::Error::from(ErrorKind::ConnectionRefused),
            });
        }
        Ok(self.stream.clone())
    }
}
