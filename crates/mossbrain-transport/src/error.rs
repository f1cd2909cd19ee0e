/// Errors that can occur in Bluetooth transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open an RFCOMM stream to the specified device.
    #[error("failed to connect to {address} channel {channel}: {source}")]
    Connect {
        address: String,
        channel: u8,
        source: std::io::Error,
    },

    /// Device inquiry or remote name lookup failed.
    #[error("bluetooth discovery failed: {0}")]
    Discovery(std::io::Error),

    /// The string is not a `XX:XX:XX:XX:XX:XX` Bluetooth address.
    #[error("invalid bluetooth address: {0:?}")]
    InvalidAddress(String),

    /// The platform has no native Bluetooth backend.
    #[error("unsupported platform: {0}")]
    Unsupported(&'static str),

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
