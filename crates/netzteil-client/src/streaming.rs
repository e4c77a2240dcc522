//! WebSocket measurement streams
//!
//! # Example
//!
//! ```no_run
//! use netzteil_client::NetzteilClient;
//! use netzteil_client::Readout;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = NetzteilClient::new("http://localhost:8000")?;
//! let mut stream = client.stream(1, 1, Readout::Both, None).await?;
//!
//! while let Some(frame) = stream.next().await {
//!     println!("{:?}", frame?);
//! }
//! # Ok(())
//! # }
//! ```

use futures::StreamExt;
use netzteil_core::StreamFrame;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;
use url::Url;

use crate::client::ErrorBody;
use crate::error::{NetzteilClientError, Result};

/// An open measurement stream
///
/// Frames arrive until the server closes the socket or the stream is dropped.
pub struct MeasurementStream {
    url: Url,
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl MeasurementStream {
    /// Connect to a stream URL (`ws://` or `wss://`)
    pub async fn connect(url: Url) -> Result<Self> {
        debug!(%url, "Connecting to measurement stream");

        match connect_async(url.as_str()).await {
            Ok((socket, _)) => Ok(Self { url, socket }),
            // The gateway rejects bad addresses before upgrading, with the
            // usual JSON error body
            Err(WsError::Http(response)) => {
                let status = response.status().as_u16();
                let message = response
                    .body()
                    .as_deref()
                    .and_then(|body| serde_json::from_slice::<ErrorBody>(body).ok())
                    .map(|body| body.error)
                    .unwrap_or_else(|| format!("HTTP {}", status));
                Err(NetzteilClientError::from_status(status, message))
            }
            Err(e) => Err(NetzteilClientError::StreamError(e.to_string())),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Next frame, or `None` once the stream has ended
    pub async fn next(&mut self) -> Option<Result<StreamFrame>> {
        loop {
            let message = match self.socket.next().await? {
                Ok(message) => message,
                Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => return None,
                Err(e) => return Some(Err(NetzteilClientError::StreamError(e.to_string()))),
            };

            match message {
                Message::Text(text) => {
                    return Some(
                        serde_json::from_str(&text)
                            .map_err(|e| NetzteilClientError::ParseError(e.to_string())),
                    );
                }
                Message::Close(_) => return None,
                // Pings are answered by tungstenite itself
                _ => continue,
            }
        }
    }

    /// Close the stream politely
    pub async fn close(mut self) -> Result<()> {
        self.socket
            .close(None)
            .await
            .map_err(|e| NetzteilClientError::StreamError(e.to_string()))?;
        // Drain until the server acknowledges
        while let Some(Ok(_)) = self.socket.next().await {}
        Ok(())
    }
}
