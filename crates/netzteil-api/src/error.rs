//! API error types and conversions

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{BoxError, Json};
use netzteil_core::DeviceError;
use serde::Serialize;

/// API error type that converts to HTTP responses
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request
    BadRequest(String),
    /// 404 Not Found
    NotFound(String),
    /// 501 Not Implemented
    NotImplemented(String),
    /// 502 Bad Gateway (device answered nonsense)
    BadGateway(String),
    /// 503 Service Unavailable (transport failure)
    ServiceUnavailable(String),
    /// 504 Gateway Timeout
    GatewayTimeout(String),
    /// 500 Internal Server Error
    Internal(String),
}

/// Error envelope
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_message(self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::NotImplemented(msg)
            | ApiError::BadGateway(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::GatewayTimeout(msg)
            | ApiError::Internal(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.into_message();

        // Log errors at appropriate levels
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), %message, "API error");
        } else if status.is_client_error() {
            tracing::debug!(status = status.as_u16(), %message, "API client error");
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<DeviceError> for ApiError {
    fn from(err: DeviceError) -> Self {
        let message = err.to_string();
        match err {
            DeviceError::DeviceNotFound(_) | DeviceError::ChannelNotFound(_) => {
                ApiError::NotFound(message)
            }
            DeviceError::InvalidArgument(_) => ApiError::BadRequest(message),
            DeviceError::NotSupported(_) => ApiError::NotImplemented(message),
            DeviceError::Protocol(_) => ApiError::BadGateway(message),
            DeviceError::Transport(_) => ApiError::ServiceUnavailable(message),
            DeviceError::Timeout => ApiError::GatewayTimeout(message),
            DeviceError::Internal(_) => ApiError::Internal(message),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Turns middleware failures (request timeout) into the error envelope
pub async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        ApiError::GatewayTimeout("Request timed out".to_string())
    } else {
        ApiError::Internal(format!("Unhandled middleware error: {}", err))
    }
}
