//! Driver and startup errors

use netzteil_core::DeviceError;
use thiserror::Error;

use crate::transport::TransportError;

/// Failures while turning configuration into a registry; all of them abort startup
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Unsupported power supply model: {0}")]
    UnknownModel(String),

    #[error("Invalid handle '{handle}': {reason}")]
    InvalidHandle { handle: String, reason: String },

    #[error("Model {model} cannot be reached through '{handle}'")]
    HandleMismatch { model: String, handle: String },

    #[error("Opening {name} failed: {source}")]
    Open {
        name: String,
        #[source]
        source: TransportError,
    },

    #[error("Probe of {name} failed: {source}")]
    Probe {
        name: String,
        #[source]
        source: DeviceError,
    },
}

impl From<TransportError> for DeviceError {
    fn from(err: TransportError) -> Self {
        if err.is_timeout() {
            tracing::debug!(error = %err, "Device did not answer in time");
            return DeviceError::Timeout;
        }
        DeviceError::Transport(err.to_string())
    }
}
