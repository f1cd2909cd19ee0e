use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::error::{FrameError, Result};

/// Frame header: start (1) + opcode (1) + reserved (1) + length (1) + end (1).
pub const HEADER_SIZE: usize = 5;

/// Header start marker `'<'`.
pub const START_MARKER: u8 = b'<';

/// Header end marker `'>'`.
pub const END_MARKER: u8 = b'>';

/// Value written to the reserved header byte.
pub const RESERVED: u8 = 0x00;

/// Maximum number of payload bytes (the length field is one byte).
pub const MAX_ARGS: usize = u8::MAX as usize;

/// A decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub opcode: u8,
    pub body_len: u8,
}

/// A complete frame as read off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub opcode: u8,
    pub payload: Bytes,
}

impl Frame {
    /// The payload as returned values.
    pub fn values(&self) -> Vec<u8> {
        decode_body(self.opcode, &self.payload)
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────┬────────┬──────┬────────┬──────┬───────────────┐
/// │ '<'  │ opcode │ 0x00 │ len N  │ '>'  │ N arg bytes   │
/// │ 0x3C │        │      │        │ 0x3E │               │
/// └──────┴────────┴──────┴────────┴──────┴───────────────┘
/// ```
///
/// Every argument must lie in `0..=255` and there may be at most 255 of them.
/// Nothing is appended to `dst` when validation fails.
pub fn encode_frame(opcode: u8, args: &[i64], dst: &mut BytesMut) -> Result<()> {
    if args.len() > MAX_ARGS {
        return Err(FrameError::ArgumentOutOfRange {
            index: None,
            value: args.len() as i64,
        });
    }
    if let Some((index, &value)) = args
        .iter()
        .enumerate()
        .find(|(_, value)| u8::try_from(**value).is_err())
    {
        return Err(FrameError::ArgumentOutOfRange {
            index: Some(index),
            value,
        });
    }

    dst.reserve(HEADER_SIZE + args.len());
    dst.put_slice(&[START_MARKER, opcode, RESERVED, args.len() as u8, END_MARKER]);
    for &value in args {
        dst.put_u8(value as u8);
    }
    Ok(())
}

/// Decode and validate a frame header.
pub fn decode_header(header: &[u8; HEADER_SIZE]) -> Result<FrameHeader> {
    if header[0] != START_MARKER || header[4] != END_MARKER {
        return Err(FrameError::FramingError {
            start: header[0],
            end: header[4],
        });
    }
    Ok(FrameHeader {
        opcode: header[1],
        body_len: header[3],
    })
}

/// Map payload bytes to returned values, order preserved.
///
/// The meaning of each position is command specific and left to the caller.
pub fn decode_body(opcode: u8, body: &[u8]) -> Vec<u8> {
    trace!(opcode, len = body.len(), "decoding body");
    body.to_vec()
}
