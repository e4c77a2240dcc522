//! Reduced API shorthands
//!
//! Single-device and single-channel deployments may drop the id segments.
//! Both shorthands answer with a permanent redirect so the method and body
//! survive.

use axum::extract::{RawQuery, State};
use axum::response::Redirect;

use crate::error::ApiError;
use crate::extract::ApiPath;
use crate::state::AppState;

/// ANY /api/device/{*rest} -> /api/devices/1/{rest}
pub async fn single_device(
    State(state): State<AppState>,
    ApiPath(rest): ApiPath<String>,
    RawQuery(query): RawQuery,
) -> Result<Redirect, ApiError> {
    if state.registry().len() != 1 {
        return Err(ApiError::NotFound(format!(
            "/api/device is only available with exactly one device ({} registered)",
            state.registry().len()
        )));
    }

    Ok(Redirect::permanent(&with_query(
        format!("/api/devices/1/{}", rest),
        query,
    )))
}

/// ANY /api/devices/{id}/channel/{*rest} -> /api/devices/{id}/channels/1/{rest}
pub async fn single_channel(
    ApiPath((id, rest)): ApiPath<(u32, String)>,
    RawQuery(query): RawQuery,
) -> Redirect {
    Redirect::permanent(&with_query(
        format!("/api/devices/{}/channels/1/{}", id, rest),
        query,
    ))
}

fn with_query(path: String, query: Option<String>) -> String {
    match query {
        Some(query) if !query.is_empty() => format!("{}?{}", path, query),
        _ => path,
    }
}
