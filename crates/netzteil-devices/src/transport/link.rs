//! Long lived device handle with bounded retries and transparent reopen

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{framing, Connector, DynStream, TransportError};
use crate::retry::RetryPolicy;

/// One wire exchange, replayable on retry
#[derive(Debug, Clone, Copy)]
enum Exchange<'a> {
    Send(&'a [u8]),
    UntilIdle(&'a [u8], Duration),
}

impl Exchange<'_> {
    fn command(&self) -> &[u8] {
        match self {
            Exchange::Send(cmd) | Exchange::UntilIdle(cmd, _) => cmd,
        }
    }

    async fn perform(&self, stream: &mut DynStream) -> Result<Vec<u8>, TransportError> {
        match *self {
            Exchange::Send(cmd) => framing::send(stream, cmd, None).await.map(|_| Vec::new()),
            Exchange::UntilIdle(cmd, idle) => framing::request_until_idle(stream, cmd, idle).await,
        }
    }
}

/// A handle owned by exactly one device.
///
/// The lock is held for one attempt of one exchange, so concurrent callers
/// queue instead of interleaving on the wire. When an attempt fails because
/// the handle went away, a fresh one is opened from the same connector and put
/// into the slot before the lock is released.
pub struct PersistentLink {
    connector: Arc<dyn Connector>,
    slot: Mutex<Option<DynStream>>,
    retry: RetryPolicy,
}

impl PersistentLink {
    /// Open the handle right away; failure here is a startup error
    pub async fn open(
        connector: Arc<dyn Connector>,
        retry: RetryPolicy,
    ) -> Result<Self, TransportError> {
        let stream = connector.connect().await.map_err(|e| {
            TransportError::ConnectionFailed(format!("{}: {}", connector.locator(), e))
        })?;

        Ok(Self {
            connector,
            slot: Mutex::new(Some(stream)),
            retry,
        })
    }

    pub fn locator(&self) -> &str {
        self.connector.locator()
    }

    /// Fire and forget command without terminator
    pub async fn send(&self, cmd: &[u8]) -> Result<(), TransportError> {
        self.exchange(Exchange::Send(cmd)).await.map(|_| ())
    }

    /// Command followed by a silence framed reply
    pub async fn request(&self, cmd: &[u8], idle: Duration) -> Result<Vec<u8>, TransportError> {
        self.exchange(Exchange::UntilIdle(cmd, idle)).await
    }

    async fn exchange(&self, exchange: Exchange<'_>) -> Result<Vec<u8>, TransportError> {
        let max_attempts = self.retry.max_attempts;
        let mut attempt = 1;

        loop {
            let err = match self.attempt(&exchange).await {
                Ok(reply) => return Ok(reply),
                // The handle is gone for good, retrying cannot help
                Err(err @ TransportError::ReopenFailed { .. }) => return Err(err),
                Err(err) => err,
            };

            if attempt >= max_attempts {
                if max_attempts == 1 {
                    return Err(err);
                }
                return Err(TransportError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            warn!(
                locator = self.locator(),
                command = %String::from_utf8_lossy(exchange.command()),
                attempt,
                max_attempts,
                error = %err,
                "Exchange failed, retrying"
            );
            tokio::time::sleep(self.retry.backoff).await;
            attempt += 1;
        }
    }

    async fn attempt(&self, exchange: &Exchange<'_>) -> Result<Vec<u8>, TransportError> {
        let mut slot = self.slot.lock().await;

        let mut stream = match slot.take() {
            Some(stream) => stream,
            None => self.reopen().await?,
        };

        match exchange.perform(&mut stream).await {
            Ok(reply) => {
                *slot = Some(stream);
                Ok(reply)
            }
            Err(err) if err.is_handle_lost() => {
                drop(stream);
                debug!(locator = self.locator(), error = %err, "Handle lost, reopening");
                *slot = Some(self.reopen().await?);
                Err(err)
            }
            Err(err) => {
                *slot = Some(stream);
                Err(err)
            }
        }
    }

    async fn reopen(&self) -> Result<DynStream, TransportError> {
        self.connector
            .connect()
            .await
            .map_err(|source| TransportError::ReopenFailed {
                locator: self.locator().to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockConnector;

    const IDLE: Duration = Duration::from_millis(100);

    async fn link(mock: &Arc<MockConnector>) -> PersistentLink {
        PersistentLink::open(mock.clone(), RetryPolicy::default())
            .await
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_invisible() {
        let mock = Arc::new(MockConnector::new("mock:rnd"));
        mock.respond("VOUT1?", b"12.34");
        let link = link(&mock).await;

        mock.fail_next_writes(2);
        let started = tokio::time::Instant::now();
        let reply = link.request(b"VOUT1?", IDLE).await.unwrap();

        assert_eq!(reply, b"12.34");
        // two back-offs plus the idle window of the successful attempt
        assert_eq!(started.elapsed(), Duration::from_millis(1100));
        // initial open plus one reopen per failed attempt
        assert_eq!(mock.connects(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_three_attempts() {
        let mock = Arc::new(MockConnector::new("mock:rnd"));
        let link = link(&mock).await;

        mock.fail_next_writes(3);
        let started = tokio::time::Instant::now();
        let err = link.send(b"OUT1").await.unwrap_err();

        assert!(matches!(
            err,
            TransportError::RetriesExhausted { attempts: 3, .. }
        ));
        assert_eq!(started.elapsed(), Duration::from_millis(1000));
        assert!(mock.written().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_reopen_is_fatal() {
        let mock = Arc::new(MockConnector::new("mock:rnd"));
        let link = link(&mock).await;

        mock.fail_next_writes(1);
        mock.fail_next_connects(1);
        let err = link.send(b"OUT0").await.unwrap_err();

        assert!(matches!(err, TransportError::ReopenFailed { .. }));
        assert_eq!(mock.connects(), 1);

        // the next call opens a fresh handle and goes through
        link.send(b"OUT0").await.unwrap();
        assert_eq!(mock.written(), vec!["OUT0"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_requests_do_not_interleave() {
        let mock = Arc::new(MockConnector::new("mock:rnd"));
        mock.respond("VOUT1?", b"05.00");
        mock.respond("IOUT1?", b"0.250");
        let link = Arc::new(link(&mock).await);

        let mut tasks = Vec::new();
        for i in 0..8 {
            let link = link.clone();
            tasks.push(tokio::spawn(async move {
                let cmd: &[u8] = if i % 2 == 0 { b"VOUT1?" } else { b"IOUT1?" };
                link.request(cmd, IDLE).await.unwrap()
            }));
        }
        for (i, task) in tasks.into_iter().enumerate() {
            let reply = task.await.unwrap();
            let expected: &[u8] = if i % 2 == 0 { b"05.00" } else { b"0.250" };
            assert_eq!(reply, expected);
        }

        assert_eq!(mock.written().len(), 8);
        assert_eq!(mock.interleaved(), 0);
        assert_eq!(mock.max_open(), 1);
    }
}
