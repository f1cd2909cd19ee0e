/// Errors that can occur during command lookup and frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The command name is not in the command table.
    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    /// The opcode is not in the command table.
    #[error("unknown opcode 0x{0:02x}")]
    UnknownOpcode(u8),

    /// The frame header is not delimited by `'<'` and `'>'`.
    #[error("invalid frame markers (got 0x{start:02x}..0x{end:02x}, expected '<'..'>')")]
    FramingError { start: u8, end: u8 },

    /// Argument count or argument value outside `0..=255`.
    ///
    /// `index` is `None` when the argument count itself is out of range.
    #[error("{}", describe_out_of_range(.index, .value))]
    ArgumentOutOfRange { index: Option<usize>, value: i64 },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

fn describe_out_of_range(index: &Option<usize>, value: &i64) -> String {
    match index {
        Some(index) => format!("argument {index} value {value} outside 0..=255"),
        None => format!("argument count {value} outside 0..=255"),
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
