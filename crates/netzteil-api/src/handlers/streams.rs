//! WebSocket measurement streams
//!
//! Each stream polls one channel, pushes a JSON frame per sample and sleeps
//! the requested interval. Getter failures become `{"error": ...}` frames and
//! the stream keeps running until the client goes away.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use netzteil_core::{sample, PowerSupply, Readout, StreamFrame};
use serde::Deserialize;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::extract::{ApiPath, ApiQuery};
use crate::state::AppState;

/// Interval used when the client does not ask for one
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// Shorter intervals are raised to this
pub const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// Query parameters for stream endpoints
#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    /// Polling interval in milliseconds
    #[serde(default)]
    pub interval: Option<u64>,
}

impl StreamQuery {
    pub fn interval(&self) -> Duration {
        self.interval
            .map(Duration::from_millis)
            .map_or(DEFAULT_INTERVAL, |interval| interval.max(MIN_INTERVAL))
    }
}

/// GET /api/devices/{id}/channels/{ch}/voltage/ws
pub async fn voltage_stream(
    State(state): State<AppState>,
    ApiPath((id, ch)): ApiPath<(u32, u32)>,
    ApiQuery(query): ApiQuery<StreamQuery>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    open_stream(&state, id, ch, &query, upgrade, Readout::Voltage).await
}

/// GET /api/devices/{id}/channels/{ch}/current/ws
pub async fn current_stream(
    State(state): State<AppState>,
    ApiPath((id, ch)): ApiPath<(u32, u32)>,
    ApiQuery(query): ApiQuery<StreamQuery>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    open_stream(&state, id, ch, &query, upgrade, Readout::Current).await
}

/// GET /api/devices/{id}/channels/{ch}/measurements/ws
pub async fn measurements_stream(
    State(state): State<AppState>,
    ApiPath((id, ch)): ApiPath<(u32, u32)>,
    ApiQuery(query): ApiQuery<StreamQuery>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    open_stream(&state, id, ch, &query, upgrade, Readout::Both).await
}

/// Resolve the address first so a bad device or channel gets a plain JSON
/// error instead of an upgraded connection.
async fn open_stream(
    state: &AppState,
    id: u32,
    ch: u32,
    query: &StreamQuery,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    readout: Readout,
) -> Result<Response, ApiError> {
    let (device, channel) = state.channel(id, ch).await?;
    let device = Arc::clone(device);
    let interval = query.interval();
    let upgrade = upgrade.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    info!(id, channel, ?readout, ?interval, "Measurement stream opened");

    Ok(upgrade.on_upgrade(move |socket| async move {
        run_stream(socket, device, channel, readout, interval).await;
        info!(id, channel, ?readout, "Measurement stream closed");
    }))
}

async fn run_stream(
    socket: WebSocket,
    device: Arc<dyn PowerSupply>,
    channel: u32,
    readout: Readout,
    interval: Duration,
) {
    let (mut sender, mut receiver) = socket.split();

    // The stream is server to client only; the read side exists to notice
    // the client leaving.
    let (closed_tx, mut closed) = oneshot::channel::<()>();
    let reader = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if let Message::Close(_) = message {
                break;
            }
        }
        let _ = closed_tx.send(());
    });

    loop {
        let frame = tokio::select! {
            _ = &mut closed => break,
            result = sample(device.as_ref(), channel, readout) => match result {
                Ok(measurement) => StreamFrame::Measurement(measurement),
                Err(e) => {
                    warn!(channel, error = %e, "Stream sample failed");
                    StreamFrame::Error { error: e.to_string() }
                }
            },
        };

        let text = match serde_json::to_string(&frame) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Failed to encode stream frame");
                break;
            }
        };

        if let Err(e) = sender.send(Message::Text(text.into())).await {
            debug!(error = %e, "Stream send failed, client gone");
            break;
        }

        tokio::select! {
            _ = &mut closed => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    reader.abort();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_defaults_and_floor() {
        assert_eq!(StreamQuery::default().interval(), DEFAULT_INTERVAL);
        assert_eq!(
            StreamQuery { interval: Some(250) }.interval(),
            Duration::from_millis(250)
        );
        assert_eq!(StreamQuery { interval: Some(0) }.interval(), MIN_INTERVAL);
    }
}
