//! TCP handles

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::debug;

use super::{Connector, DynStream};

/// Default time allowed for the TCP handshake
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct TcpConnector {
    target: String,
    connect_timeout: Duration,
    locator: String,
}

impl TcpConnector {
    /// `target` is `host:port`
    pub fn new(target: impl Into<String>) -> Self {
        let target = target.into();
        Self {
            locator: format!("tcp://{}", target),
            target,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self) -> io::Result<DynStream> {
        debug!(target = %self.target, "Connecting");
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.target))
            .await
            .map_err(|_| {
                io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connect to {} timed out", self.target),
                )
            })??;
        stream.set_nodelay(true)?;
        Ok(Box::new(stream))
    }

    fn locator(&self) -> &str {
        &self.locator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::framing;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_line_exchange_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (read, mut write) = socket.into_split();
            let mut lines = BufReader::new(read).lines();
            while let Some(line) = lines.next_line().await.unwrap() {
                if line == "*IDN?" {
                    write.write_all(b"HAMEG,HMC8043,0,1.0\n").await.unwrap();
                }
            }
        });

        let connector = TcpConnector::new(addr.to_string());
        assert_eq!(connector.locator(), format!("tcp://{}", addr));

        let mut stream = connector.connect().await.unwrap();
        let ident = framing::request_line(&mut stream, b"*IDN?").await.unwrap();
        assert_eq!(ident, "HAMEG,HMC8043,0,1.0");
    }

    #[tokio::test]
    async fn test_refused_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let connector = TcpConnector::new(addr.to_string());
        assert!(connector.connect().await.is_err());
    }
}
