//! Request/response framing over a duplex byte stream
//!
//! Two disciplines exist in the field: replies terminated by a newline, and
//! replies that simply end when the device stops talking. Drivers pick the
//! matching primitive; neither knows anything about locking or retries.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use super::TransportError;

/// Terminator used by line framed (SCPI style) devices
pub const LINE_TERMINATOR: u8 = b'\n';

/// Read buffer size for silence framed replies
const READ_CHUNK: usize = 32 * 1024;

/// Write a command, optionally followed by a terminator.
pub async fn send<S>(stream: &mut S, cmd: &[u8], terminator: Option<u8>) -> Result<(), TransportError>
where
    S: AsyncWrite + Unpin + ?Sized,
{
    let mut frame = Vec::with_capacity(cmd.len() + 1);
    frame.extend_from_slice(cmd);
    if let Some(terminator) = terminator {
        frame.push(terminator);
    }

    stream.write_all(&frame).await?;
    stream.flush().await?;
    Ok(())
}

/// Write a command plus terminator and read exactly one line back.
///
/// The terminator (and a preceding carriage return) is stripped.
pub async fn request_line<S>(stream: &mut S, cmd: &[u8]) -> Result<String, TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin + ?Sized,
{
    send(stream, cmd, Some(LINE_TERMINATOR)).await?;
    read_line(stream).await
}

/// Read one terminator delimited line.
pub async fn read_line<S>(stream: &mut S) -> Result<String, TransportError>
where
    S: AsyncRead + Unpin + ?Sized,
{
    let mut reader = BufReader::new(stream);
    let mut line = Vec::new();
    reader.read_until(LINE_TERMINATOR, &mut line).await?;

    if line.last() != Some(&LINE_TERMINATOR) {
        return Err(TransportError::ConnectionClosed {
            received: line.len(),
        });
    }
    line.pop();
    if line.last() == Some(&b'\r') {
        line.pop();
    }

    String::from_utf8(line).map_err(|e| TransportError::Encoding(e.to_string()))
}

/// Write a command and collect the reply until the device falls silent.
///
/// The idle deadline restarts before every read. Hitting it ends the reply
/// and is not an error; whatever arrived so far (possibly nothing) is returned.
pub async fn request_until_idle<S>(
    stream: &mut S,
    cmd: &[u8],
    idle: Duration,
) -> Result<Vec<u8>, TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin + ?Sized,
{
    send(stream, cmd, None).await?;
    read_until_idle(stream, idle).await
}

/// Accumulate bytes until no data arrives for `idle`.
pub async fn read_until_idle<S>(stream: &mut S, idle: Duration) -> Result<Vec<u8>, TransportError>
where
    S: AsyncRead + Unpin + ?Sized,
{
    let mut reply = Vec::new();
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        match tokio::time::timeout(idle, stream.read(&mut chunk)).await {
            // Silence: the device is done
            Err(_) => break,
            // End of stream also ends the reply
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => reply.extend_from_slice(&chunk[..n]),
            Ok(Err(e)) => return Err(e.into()),
        }
    }

    Ok(reply)
}
