//! Connect-per-operation access for instruments that accept a single socket

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use super::framing::{self, LINE_TERMINATOR};
use super::{Connector, DynStream, TransportError};

/// Line framed access where every logical operation gets its own connection.
///
/// The instrument serves one client at a time, so no socket is kept across
/// operations. Commands that depend on each other (select a channel, then
/// read or write it) travel as one batch over one connection, and the device
/// lock keeps a second batch from this process off the wire meanwhile.
pub struct SessionLink {
    connector: Arc<dyn Connector>,
    lock: Mutex<()>,
    reply_timeout: Duration,
}

impl SessionLink {
    pub fn new(connector: Arc<dyn Connector>, reply_timeout: Duration) -> Self {
        Self {
            connector,
            lock: Mutex::new(()),
            reply_timeout,
        }
    }

    pub fn locator(&self) -> &str {
        self.connector.locator()
    }

    /// Send all commands, in order, over one connection
    pub async fn send_batch<C>(&self, commands: &[C]) -> Result<(), TransportError>
    where
        C: AsRef<[u8]> + Sync,
    {
        let _guard = self.lock.lock().await;
        let mut stream = self.connect().await?;

        let result = Self::write_all(&mut stream, commands).await;
        Self::close(stream).await;
        result
    }

    /// Send the setup commands, then a query, and read one line back
    pub async fn query<C>(&self, setup: &[C], query: &[u8]) -> Result<String, TransportError>
    where
        C: AsRef<[u8]> + Sync,
    {
        let _guard = self.lock.lock().await;
        let mut stream = self.connect().await?;

        let result: Result<String, TransportError> = async {
            Self::write_all(&mut stream, setup).await?;
            tokio::time::timeout(self.reply_timeout, framing::request_line(&mut stream, query))
                .await
                .map_err(|_| {
                    TransportError::Timeout(format!(
                        "no reply to {} from {} within {:?}",
                        String::from_utf8_lossy(query),
                        self.locator(),
                        self.reply_timeout
                    ))
                })?
        }
        .await;

        Self::close(stream).await;
        result
    }

    async fn connect(&self) -> Result<DynStream, TransportError> {
        debug!(locator = self.locator(), "Opening session");
        self.connector.connect().await.map_err(|e| {
            TransportError::ConnectionFailed(format!("{}: {}", self.locator(), e))
        })
    }

    async fn write_all<C>(stream: &mut DynStream, commands: &[C]) -> Result<(), TransportError>
    where
        C: AsRef<[u8]> + Sync,
    {
        for cmd in commands {
            framing::send(stream, cmd.as_ref(), Some(LINE_TERMINATOR)).await?;
        }
        Ok(())
    }

    async fn close(mut stream: DynStream) {
        // The instrument frees its only slot when it sees the FIN
        if let Err(e) = stream.shutdown().await {
            debug!(error = %e, "Session shutdown failed");
        }
    }
}
