//! Transport layer errors

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Peer closed the stream before a line terminator arrived
    #[error("Connection closed after {received} byte(s) without line terminator")]
    ConnectionClosed { received: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Invalid response encoding: {0}")]
    Encoding(String),

    /// The handle was lost and could not be opened again
    #[error("Reopening {locator} failed: {source}")]
    ReopenFailed {
        locator: String,
        #[source]
        source: io::Error,
    },

    #[error("Giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<TransportError>,
    },
}

impl TransportError {
    /// Whether the underlying handle is gone and must be reopened.
    ///
    /// USB serial adapters report EIO once the instrument behind them has been
    /// power cycled; writes to a vanished node fail with ENXIO or ENODEV.
    pub fn is_handle_lost(&self) -> bool {
        match self {
            TransportError::Io(err) => {
                matches!(
                    err.raw_os_error(),
                    Some(libc::EIO) | Some(libc::ENXIO) | Some(libc::ENODEV)
                ) || matches!(
                    err.kind(),
                    io::ErrorKind::BrokenPipe | io::ErrorKind::NotConnected
                )
            }
            _ => false,
        }
    }

    /// Whether the failure was a missing answer rather than a broken link
    pub fn is_timeout(&self) -> bool {
        match self {
            TransportError::Timeout(_) => true,
            TransportError::Io(err) => err.kind() == io::ErrorKind::TimedOut,
            TransportError::RetriesExhausted { last, .. } => last.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eio_means_handle_lost() {
        let err = TransportError::Io(io::Error::from_raw_os_error(libc::EIO));
        assert!(err.is_handle_lost());

        let err = TransportError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        assert!(err.is_handle_lost());

        let err = TransportError::Io(io::Error::new(io::ErrorKind::InvalidData, "noise"));
        assert!(!err.is_handle_lost());
        assert!(!TransportError::Timeout("no reply".into()).is_handle_lost());
    }

    #[test]
    fn test_timeout_survives_retry_wrapping() {
        let err = TransportError::RetriesExhausted {
            attempts: 3,
            last: Box::new(TransportError::Timeout("*IDN?".into())),
        };
        assert!(err.is_timeout());
        assert!(err.to_string().contains("3 attempts"));
    }
}
