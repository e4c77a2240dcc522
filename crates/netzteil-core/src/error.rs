//! Common error types for power supply drivers

use thiserror::Error;

/// Result type for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Errors that can occur while talking to a power supply
#[derive(Debug, Error)]
pub enum DeviceError {
    /// No device registered under this id
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Channel outside the range the device reports
    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    /// Argument rejected before reaching the wire
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Capability not implemented by this model
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Device answered with something we could not interpret
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// I/O failure, refused connection or exhausted retries
    #[error("Transport error: {0}")]
    Transport(String),

    /// Timeout waiting for a response
    #[error("Operation timed out")]
    Timeout,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeviceError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            DeviceError::DeviceNotFound(_) => 404,
            DeviceError::ChannelNotFound(_) => 404,
            DeviceError::InvalidArgument(_) => 400,
            DeviceError::NotSupported(_) => 501,
            DeviceError::Protocol(_) => 502,
            DeviceError::Transport(_) => 503,
            DeviceError::Timeout => 504,
            DeviceError::Internal(_) => 500,
        }
    }

    /// Whether the caller addressed something that does not exist or sent bad input
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    pub(crate) fn not_supported(operation: &str) -> Self {
        DeviceError::NotSupported(operation.to_string())
    }
}
