use std::sync::{Mutex, PoisonError};

use bytes::BytesMut;
use mossbrain_frame::{FrameError, FrameHeader, FrameReader, FrameWriter};
use mossbrain_transport::{Connect, DuplexStream};
use tracing::{debug, info, warn};

use crate::error::Result;

/// An open stream to one device.
///
/// The stream is split into a reader and a writer handle. Closing shuts the
/// stream down once; dropping an open connection closes it and logs any
/// failure instead of returning it.
pub struct Connection<S: DuplexStream> {
    reader: FrameReader<S>,
    writer: FrameWriter<S>,
    closed: bool,
}

impl<S: DuplexStream> Connection<S> {
    /// Take ownership of a connected stream.
    pub fn new(stream: S) -> Result<Self> {
        let reader_stream = stream.try_clone()?;
        Ok(Self {
            reader: FrameReader::new(reader_stream),
            writer: FrameWriter::new(stream),
            closed: false,
        })
    }

    /// Connect to `address` on `channel`.
    ///
    /// No cleanup is attempted when the connect itself fails; there is
    /// nothing to reset yet.
    pub fn open<C>(connector: &mut C, address: &str, channel: u8) -> Result<Self>
    where
        C: Connect<Stream = S>,
    {
        debug!(address, channel, "connecting");
        let stream = connector.connect(address, channel)?;
        info!(address, channel, "connected");
        Self::new(stream)
    }

    /// Encode and write one frame.
    pub fn write_frame(&mut self, opcode: u8, args: &[i64]) -> Result<()> {
        self.ensure_open()?;
        self.writer.send(opcode, args)?;
        Ok(())
    }

    /// Read exactly `n` bytes, blocking until they arrive.
    pub fn read_exactly(&mut self, n: usize) -> Result<BytesMut> {
        self.ensure_open()?;
        Ok(self.reader.read_exactly(n)?)
    }

    /// Read and validate a response header.
    pub fn read_header(&mut self) -> Result<FrameHeader> {
        self.ensure_open()?;
        Ok(self.reader.read_header()?)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Shut the stream down. Later calls are no-ops.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        debug!("closing");
        self.writer.get_mut().shutdown()?;
        Ok(())
    }

    /// A handle that can shut this stream down from another thread.
    pub fn interrupter(&self) -> Result<Interrupter<S>> {
        Ok(Interrupter {
            stream: Mutex::new(Some(self.writer.get_ref().try_clone()?)),
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(FrameError::ConnectionClosed.into());
        }
        Ok(())
    }
}

impl<S: DuplexStream> Drop for Connection<S> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(error = %err, "close failed");
        }
    }
}

/// Shuts a connection's stream down from outside the owning thread.
///
/// A read blocked on a silent device then returns with
/// `ConnectionClosed`, so the session unwinds and tears down normally.
/// Only the first [`Interrupter::interrupt`] has any effect.
pub struct Interrupter<S> {
    stream: Mutex<Option<S>>,
}

impl<S: DuplexStream> Interrupter<S> {
    pub fn interrupt(&self) -> Result<()> {
        let stream = self
            .stream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut stream) = stream {
            debug!("interrupting");
            stream.shutdown()?;
        }
        Ok(())
    }
}
