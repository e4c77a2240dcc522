//! Error types for netzteil client operations

use thiserror::Error;

/// Result type alias for netzteil client operations
pub type Result<T> = std::result::Result<T, NetzteilClientError>;

/// Errors that can occur while talking to a netzteil gateway
#[derive(Error, Debug)]
pub enum NetzteilClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Unknown device or channel (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// The device model lacks the capability (501)
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// The gateway gave up waiting for the device (504)
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Any other error response
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// WebSocket failure
    #[error("Stream error: {0}")]
    StreamError(String),
}

impl NetzteilClientError {
    /// Classify an error response by status code
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            404 => Self::NotFound(message),
            501 => Self::NotSupported(message),
            504 => Self::Timeout(message),
            _ => Self::ServerError { status, message },
        }
    }

    /// HTTP status behind this error, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound(_) => Some(404),
            Self::NotSupported(_) => Some(501),
            Self::Timeout(_) => Some(504),
            Self::ServerError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
