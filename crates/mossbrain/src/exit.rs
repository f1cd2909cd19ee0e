use std::fmt;
use std::io;

use mossbrain_client::ClientError;
use mossbrain_frame::FrameError;
use mossbrain_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const HEALTH_CHECK_FAILED: i32 = 30;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const DEVICE_NOT_FOUND: i32 = 69;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// A bad command line or relay line; the relay keeps going after these.
    pub fn is_usage(&self) -> bool {
        self.code == USAGE
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::InvalidAddress(_) => CliError::new(USAGE, format!("{context}: {err}")),
        TransportError::Connect { ref source, .. }
        | TransportError::Discovery(ref source)
        | TransportError::Io(ref source)
            if source.kind() == io::ErrorKind::PermissionDenied =>
        {
            CliError::new(PERMISSION_DENIED, format!("{context}: {err}"))
        }
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::UnknownCommand(_) | FrameError::ArgumentOutOfRange { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        FrameError::UnknownOpcode(_) | FrameError::FramingError { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::ConnectionClosed => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
    }
}

pub fn client_error(context: &str, err: ClientError) -> CliError {
    match err {
        ClientError::Transport(err) => transport_error(context, err),
        ClientError::Frame(err) => frame_error(context, err),
        ClientError::DeviceNotFound { .. } => {
            CliError::new(DEVICE_NOT_FOUND, format!("{context}: {err}"))
        }
        ClientError::InvalidFace(_) => CliError::new(USAGE, format!("{context}: {err}")),
        ClientError::UnexpectedResponse { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_errors() {
        let err = client_error(
            "call failed",
            FrameError::UnknownCommand("fly".to_string()).into(),
        );
        assert_eq!(err.code, USAGE);
        assert!(err.is_usage());

        let err = frame_error(
            "call failed",
            FrameError::ArgumentOutOfRange {
                index: Some(1),
                value: 256,
            },
        );
        assert!(err.is_usage());
    }

    #[test]
    fn session_errors() {
        let err = frame_error("call failed", FrameError::ConnectionClosed);
        assert_eq!(err.code, TRANSPORT_ERROR);

        let err = frame_error("call failed", FrameError::UnknownOpcode(0x0F));
        assert_eq!(err.code, DATA_INVALID);

        let err = client_error(
            "connect failed",
            ClientError::DeviceNotFound {
                prefix: "Moss".to_string(),
            },
        );
        assert_eq!(err.code, DEVICE_NOT_FOUND);
        assert_eq!(
            err.to_string(),
            "connect failed: no device found with name prefix \"Moss\""
        );
    }

    #[test]
    fn permission_denied_maps_to_50() {
        let err = transport_error(
            "connect failed",
            TransportError::Connect {
                address: "00:11:22:33:44:55".to_string(),
                channel: 1,
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            },
        );
        assert_eq!(err.code, PERMISSION_DENIED);

        let err = transport_error(
            "connect failed",
            TransportError::Connect {
                address: "00:11:22:33:44:55".to_string(),
                channel: 1,
                source: io::Error::from(io::ErrorKind::ConnectionRefused),
            },
        );
        assert_eq!(err.code, TRANSPORT_ERROR);
    }
}
