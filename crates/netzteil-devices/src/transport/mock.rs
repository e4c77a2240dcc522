//! Scripted in-memory transport for testing drivers without hardware

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use super::{Connector, DynStream};

#[derive(Default)]
struct MockState {
    /// Command prefix -> reply bytes
    responses: Vec<(Vec<u8>, Vec<u8>)>,
    /// Commands that reached the "device", terminator stripped
    written: Vec<Vec<u8>>,
    fail_writes: usize,
    fail_connects: usize,
    connects: usize,
    open: usize,
    max_open: usize,
    interleaved: usize,
}

impl MockState {
    fn reply_for(&self, command: &[u8]) -> Option<Vec<u8>> {
        self.responses
            .iter()
            .rev()
            .find(|(prefix, _)| command.starts_with(prefix))
            .map(|(_, reply)| reply.clone())
    }
}

/// Hands out [`MockStream`]s that share one script and one set of counters.
///
/// Replies are only produced for scripted commands; anything else is met
/// with silence, which is what the real hardware does too.
pub struct MockConnector {
    locator: String,
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Reply with `reply` to every command starting with `command`.
    ///
    /// Later registrations win over earlier ones.
    pub fn respond(&self, command: &str, reply: &[u8]) {
        self.state
            .lock()
            .responses
            .push((command.as_bytes().to_vec(), reply.to_vec()));
    }

    /// Fail the next `n` writes with EIO, as a power cycled USB adapter does
    pub fn fail_next_writes(&self, n: usize) {
        self.state.lock().fail_writes = n;
    }

    /// Refuse the next `n` connection attempts
    pub fn fail_next_connects(&self, n: usize) {
        self.state.lock().fail_connects = n;
    }

    /// Commands received so far, in order
    pub fn written(&self) -> Vec<String> {
        self.state
            .lock()
            .written
            .iter()
            .map(|cmd| String::from_utf8_lossy(cmd).into_owned())
            .collect()
    }

    /// Successful connects, including the initial one
    pub fn connects(&self) -> usize {
        self.state.lock().connects
    }

    /// Highest number of simultaneously open streams
    pub fn max_open(&self) -> usize {
        self.state.lock().max_open
    }

    /// Commands written while a previous reply was still unread
    pub fn interleaved(&self) -> usize {
        self.state.lock().interleaved
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self) -> io::Result<DynStream> {
        let mut state = self.state.lock();
        if state.fail_connects > 0 {
            state.fail_connects -= 1;
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "mock connect refused",
            ));
        }

        state.connects += 1;
        state.open += 1;
        state.max_open = state.max_open.max(state.open);

        Ok(Box::new(MockStream {
            state: self.state.clone(),
            inbox: VecDeque::new(),
        }))
    }

    fn locator(&self) -> &str {
        &self.locator
    }
}

/// One open handle to the mock device
pub struct MockStream {
    state: Arc<Mutex<MockState>>,
    inbox: VecDeque<u8>,
}

impl AsyncWrite for MockStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = &mut *self;
        let mut state = this.state.lock();

        if state.fail_writes > 0 {
            state.fail_writes -= 1;
            return Poll::Ready(Err(io::Error::from_raw_os_error(libc::EIO)));
        }

        if !this.inbox.is_empty() {
            state.interleaved += 1;
        }

        let command = buf.strip_suffix(b"\n").unwrap_or(buf);
        if let Some(reply) = state.reply_for(command) {
            this.inbox.extend(reply);
        }
        state.written.push(command.to_vec());

        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = &mut *self;
        if this.inbox.is_empty() {
            // Silence; only a deadline gets the reader out of here
            return Poll::Pending;
        }

        let n = buf.remaining().min(this.inbox.len());
        let chunk: Vec<u8> = this.inbox.drain(..n).collect();
        buf.put_slice(&chunk);
        Poll::Ready(Ok(()))
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.state.lock().open -= 1;
    }
}
