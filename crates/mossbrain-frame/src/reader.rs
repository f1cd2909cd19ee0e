use std::io::{ErrorKind, Read};

use bytes::BytesMut;

use crate::codec::{decode_header, Frame, FrameHeader, HEADER_SIZE};
use crate::error::{FrameError, Result};

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads internally; callers always get whole headers and
/// bodies. Reads block without a timeout.
pub struct FrameReader<T> {
    inner: T,
}

impl<T: Read> FrameReader<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Read exactly `n` bytes (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` if the stream reports EOF
    /// before `n` bytes have arrived.
    pub fn read_exactly(&mut self, n: usize) -> Result<BytesMut> {
        let mut buf = BytesMut::zeroed(n);
        let mut filled = 0usize;
        while filled < n {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(read) => filled += read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(buf)
    }

    /// Read and validate the next frame header.
    pub fn read_header(&mut self) -> Result<FrameHeader> {
        let raw = self.read_exactly(HEADER_SIZE)?;
        let mut header = [0u8; HEADER_SIZE];
        header.copy_from_slice(&raw);
        decode_header(&header)
    }

    /// Read the next complete frame (blocking).
    pub fn read_frame(&mut self) -> Result<Frame> {
        let header = self.read_header()?;
        let payload = self.read_exactly(usize::from(header.body_len))?;
        Ok(Frame {
            opcode: header.opcode,
            payload: payload.freeze(),
        })
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::encode_frame;

    fn wire(opcode: u8, args: &[i64]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_frame(opcode, args, &mut buf).unwrap();
        buf.to_vec()
    }

    #[test]
    fn read_single_frame() {
        let mut reader = FrameReader::new(Cursor::new(wire(0x08, &[6, 42])));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.opcode, 0x08);
        assert_eq!(frame.values(), vec![6, 42]);
    }

    #[test]
    fn read_multiple_frames() {
        let bytes = [
            wire(0x0E, &[0, 0, 0]),
            wire(0x05, &[]),
            wire(0x0D, &[255, 0, 255]),
        ]
        .concat();
        let mut reader = FrameReader::new(Cursor::new(bytes));

        let f1 = reader.read_frame().unwrap();
        let f2 = reader.read_frame().unwrap();
        let f3 = reader.read_frame().unwrap();

        assert_eq!(f1.opcode, 0x0E);
        assert_eq!(f1.values(), vec![0, 0, 0]);
        assert_eq!(f2.opcode, 0x05);
        assert!(f2.payload.is_empty());
        assert_eq!(f3.opcode, 0x0D);
        assert_eq!(f3.values(), vec![255, 0, 255]);
    }

    #[test]
    fn read_full_length_body() {
        let args: Vec<i64> = (0..255).collect();
        let mut reader = FrameReader::new(Cursor::new(wire(0x07, &args)));
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.payload.len(), 255);
        assert_eq!(frame.payload[254], 254);
    }

    #[test]
    fn partial_read_handling() {
        let byte_reader = ByteByByteReader {
            bytes: wire(0x01, &[1, 2, 3, 4]),
            pos: 0,
        };
        let mut reader = FrameReader::new(byte_reader);

        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.opcode, 0x01);
        assert_eq!(frame.values(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn read_exactly_zero_bytes_does_not_read() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        assert!(reader.read_exactly(0).unwrap().is_empty());
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_frame() {
        let mut partial = wire(0x07, &[1, 2, 3, 4, 5, 6, 7, 8]);
        partial.truncate(HEADER_SIZE + 3);

        let mut reader = FrameReader::new(Cursor::new(partial));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn invalid_markers_in_stream() {
        let bytes = vec![b'(', 0x01, 0x00, 0x00, b')'];
        let mut reader = FrameReader::new(Cursor::new(bytes));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::FramingError { .. }));
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            interrupted: false,
            inner: Cursor::new(wire(0x02, &[1])),
        };
        let mut framed = FrameReader::new(reader);
        let frame = framed.read_frame().unwrap();

        assert_eq!(frame.opcode, 0x02);
        assert_eq!(frame.values(), vec![1]);
    }

    #[test]
    fn other_io_errors_propagate() {
        let mut framed = FrameReader::new(FailingReader);
        let err = framed.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::ConnectionReset));
    }

    #[cfg(unix)]
    #[test]
    fn roundtrip_over_socket_pair() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = crate::writer::FrameWriter::new(left);
        let mut reader = FrameReader::new(right);

        writer.send(0x0D, &[]).unwrap();
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.opcode, 0x0D);
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut reader = FrameReader::new(cursor);

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        let _inner = reader.into_inner();
    }

    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::ConnectionReset))
        }
    }
}
