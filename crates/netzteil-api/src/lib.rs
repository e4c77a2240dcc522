//! netzteil-api - REST and WebSocket layer of the power supply gateway
//!
//! Serves the devices of a [`Registry`](netzteil_core::Registry) under `/api`,
//! addressing them by 1-based device id and channel number.
//!
//! # Usage
//!
//! ```ignore
//! use netzteil_api::{create_router, AppState};
//! use netzteil_devices::build_registry;
//!
//! let registry = build_registry(&config.devices)?;
//! let router = create_router(AppState::new(registry));
//! ```

pub mod error;
pub mod extract;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::error_handling::HandleErrorLayer;
use axum::routing::{any, get, put};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the gateway router with the given application state
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let timeout = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(error::handle_middleware_error))
        .timeout(state.request_timeout());

    Router::new()
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Device routes
        .route("/api/devices", get(handlers::devices::list_devices))
        .route("/api/devices/{id}/ident", get(handlers::devices::get_ident))
        .route("/api/devices/{id}/status", get(handlers::devices::get_status))
        .route(
            "/api/devices/{id}/channels",
            get(handlers::devices::get_channels),
        )
        .route(
            "/api/devices/{id}/out",
            get(handlers::devices::get_master).put(handlers::devices::set_master),
        )
        .route(
            "/api/devices/{id}/beep",
            put(handlers::devices::set_beep),
        )
        // Channel routes
        .route(
            "/api/devices/{id}/channels/{ch}/voltage",
            get(handlers::channels::get_voltage).put(handlers::channels::set_voltage),
        )
        .route(
            "/api/devices/{id}/channels/{ch}/current",
            get(handlers::channels::get_current).put(handlers::channels::set_current),
        )
        .route(
            "/api/devices/{id}/channels/{ch}/out",
            get(handlers::channels::get_out).put(handlers::channels::set_out),
        )
        .route(
            "/api/devices/{id}/channels/{ch}/ocp",
            get(handlers::channels::get_ocp).put(handlers::channels::set_ocp),
        )
        .route(
            "/api/devices/{id}/channels/{ch}/ovp",
            get(handlers::channels::get_ovp).put(handlers::channels::set_ovp),
        )
        // Streaming routes (WebSocket)
        .route(
            "/api/devices/{id}/channels/{ch}/voltage/ws",
            get(handlers::streams::voltage_stream),
        )
        .route(
            "/api/devices/{id}/channels/{ch}/current/ws",
            get(handlers::streams::current_stream),
        )
        .route(
            "/api/devices/{id}/channels/{ch}/measurements/ws",
            get(handlers::streams::measurements_stream),
        )
        // Reduced API shorthands
        .route("/api/device/{*rest}", any(handlers::reduced::single_device))
        .route(
            "/api/devices/{id}/channel/{*rest}",
            any(handlers::reduced::single_channel),
        )
        // Middleware
        .layer(timeout)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
