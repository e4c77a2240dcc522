//! Channel level handlers
//!
//! Paths carry a 1-based device id and a 1-based channel. Channel 0 is only
//! meaningful for `out`, where it addresses the master output.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use netzteil_core::ChannelTarget;
use tracing::debug;

use crate::error::ApiError;
use crate::extract::{ApiPath, JsonBody};
use crate::state::AppState;

// =============================================================================
// Voltage / current
// =============================================================================

/// GET /api/devices/{id}/channels/{ch}/voltage
pub async fn get_voltage(
    State(state): State<AppState>,
    ApiPath((id, ch)): ApiPath<(u32, u32)>,
) -> Result<Json<f64>, ApiError> {
    let (device, channel) = state.channel(id, ch).await?;
    Ok(Json(device.get_voltage(channel).await?))
}

/// PUT /api/devices/{id}/channels/{ch}/voltage
pub async fn set_voltage(
    State(state): State<AppState>,
    ApiPath((id, ch)): ApiPath<(u32, u32)>,
    JsonBody(volts): JsonBody<f64>,
) -> Result<StatusCode, ApiError> {
    let (device, channel) = state.channel(id, ch).await?;
    debug!(id, channel, volts, "Set voltage");
    device.set_voltage(channel, volts).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/devices/{id}/channels/{ch}/current
pub async fn get_current(
    State(state): State<AppState>,
    ApiPath((id, ch)): ApiPath<(u32, u32)>,
) -> Result<Json<f64>, ApiError> {
    let (device, channel) = state.channel(id, ch).await?;
    Ok(Json(device.get_current(channel).await?))
}

/// PUT /api/devices/{id}/channels/{ch}/current
pub async fn set_current(
    State(state): State<AppState>,
    ApiPath((id, ch)): ApiPath<(u32, u32)>,
    JsonBody(amps): JsonBody<f64>,
) -> Result<StatusCode, ApiError> {
    let (device, channel) = state.channel(id, ch).await?;
    debug!(id, channel, amps, "Set current");
    device.set_current(channel, amps).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Output
// =============================================================================

/// GET /api/devices/{id}/channels/{ch}/out
pub async fn get_out(
    State(state): State<AppState>,
    ApiPath((id, ch)): ApiPath<(u32, u32)>,
) -> Result<Json<bool>, ApiError> {
    let enabled = match state.output(id, ch).await? {
        (device, ChannelTarget::Master) => device.get_master().await?,
        (device, ChannelTarget::Channel(channel)) => device.get_out(channel).await?,
    };
    Ok(Json(enabled))
}

/// PUT /api/devices/{id}/channels/{ch}/out
pub async fn set_out(
    State(state): State<AppState>,
    ApiPath((id, ch)): ApiPath<(u32, u32)>,
    JsonBody(enabled): JsonBody<bool>,
) -> Result<StatusCode, ApiError> {
    match state.output(id, ch).await? {
        (device, ChannelTarget::Master) => device.set_master(enabled).await?,
        (device, ChannelTarget::Channel(channel)) => device.set_out(channel, enabled).await?,
    }
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Protection
// =============================================================================

/// GET /api/devices/{id}/channels/{ch}/ocp
pub async fn get_ocp(
    State(state): State<AppState>,
    ApiPath((id, ch)): ApiPath<(u32, u32)>,
) -> Result<Json<bool>, ApiError> {
    let (device, channel) = state.channel(id, ch).await?;
    Ok(Json(device.get_ocp(channel).await?))
}

/// PUT /api/devices/{id}/channels/{ch}/ocp
pub async fn set_ocp(
    State(state): State<AppState>,
    ApiPath((id, ch)): ApiPath<(u32, u32)>,
    JsonBody(enabled): JsonBody<bool>,
) -> Result<StatusCode, ApiError> {
    let (device, channel) = state.channel(id, ch).await?;
    device.set_ocp(channel, enabled).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/devices/{id}/channels/{ch}/ovp
pub async fn get_ovp(
    State(state): State<AppState>,
    ApiPath((id, ch)): ApiPath<(u32, u32)>,
) -> Result<Json<bool>, ApiError> {
    let (device, channel) = state.channel(id, ch).await?;
    Ok(Json(device.get_ovp(channel).await?))
}

/// PUT /api/devices/{id}/channels/{ch}/ovp
pub async fn set_ovp(
    State(state): State<AppState>,
    ApiPath((id, ch)): ApiPath<(u32, u32)>,
    JsonBody(enabled): JsonBody<bool>,
) -> Result<StatusCode, ApiError> {
    let (device, channel) = state.channel(id, ch).await?;
    device.set_ovp(channel, enabled).await?;
    Ok(StatusCode::NO_CONTENT)
}
