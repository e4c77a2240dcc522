//! Device level handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use futures::future::join_all;
use tracing::warn;

use crate::error::ApiError;
use crate::extract::{ApiPath, JsonBody};
use crate::state::AppState;

/// GET /api/devices
///
/// Identity strings in registry order. A device that fails to answer is
/// listed with an empty string so positions keep matching device ids.
pub async fn list_devices(State(state): State<AppState>) -> Json<Vec<String>> {
    let queries = state.registry().iter().map(|(id, device)| async move {
        match device.get_ident().await {
            Ok(ident) => ident,
            Err(e) => {
                warn!(id, device = %device.info().name, error = %e, "Ident query failed");
                String::new()
            }
        }
    });

    Json(join_all(queries).await)
}

/// GET /api/devices/{id}/ident
pub async fn get_ident(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<u32>,
) -> Result<Json<String>, ApiError> {
    let device = state.device(id)?;
    Ok(Json(device.get_ident().await?))
}

/// GET /api/devices/{id}/status
pub async fn get_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<u32>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let device = state.device(id)?;
    Ok(Json(device.status().await?))
}

/// GET /api/devices/{id}/channels
pub async fn get_channels(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<u32>,
) -> Result<Json<u32>, ApiError> {
    let device = state.device(id)?;
    Ok(Json(device.get_channels().await?))
}

/// GET /api/devices/{id}/out
pub async fn get_master(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<u32>,
) -> Result<Json<bool>, ApiError> {
    let device = state.device(id)?;
    Ok(Json(device.get_master().await?))
}

/// PUT /api/devices/{id}/out
pub async fn set_master(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<u32>,
    JsonBody(enabled): JsonBody<bool>,
) -> Result<StatusCode, ApiError> {
    let device = state.device(id)?;
    device.set_master(enabled).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/devices/{id}/beep
pub async fn set_beep(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<u32>,
    JsonBody(enabled): JsonBody<bool>,
) -> Result<StatusCode, ApiError> {
    let device = state.device(id)?;
    device.set_beep(enabled).await?;
    Ok(StatusCode::NO_CONTENT)
}
