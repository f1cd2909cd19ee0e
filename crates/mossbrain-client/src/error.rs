/// Errors that can occur in client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] mossbrain_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] mossbrain_frame::FrameError),

    /// Discovery finished without a device whose name has the prefix.
    #[error("no device found with name prefix {prefix:?}")]
    DeviceNotFound { prefix: String },

    /// Face index outside `0..NFACES`.
    #[error("face {0} out of range (expected 0-7)")]
    InvalidFace(u8),

    /// The device answered with a payload a typed helper cannot interpret.
    #[error("unexpected {command} response: {data:?}")]
    UnexpectedResponse {
        command: &'static str,
        data: Vec<u8>,
    },
}

pub type Result<T> = std::result::Result<T, ClientError>;
