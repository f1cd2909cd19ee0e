//! Command table and frame codec for the brain block protocol.
//!
//! Every request and response is framed the same way:
//! - a 5-byte header `'<' opcode 0x00 len '>'`
//! - `len` payload bytes, one per argument or returned value
//!
//! There are no request ids: one frame goes out, at most one comes back.

pub mod codec;
pub mod commands;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_body, decode_header, encode_frame, Frame, FrameHeader, END_MARKER,
    HEADER_SIZE, MAX_ARGS, START_MARKER,
};
pub use commands::{expects_response, name_of, opcode_of, Command, NO_RESPONSE};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
