//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Malformed JSON body")]
    MalformedJson(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request body too large")]
    PayloadTooLarge { limit: usize },

    #[error("Cannot {method} {path}")]
    RouteNotFound { method: String, path: String },

    // Delegated route group has no handlers mounted
    #[error("Capability not implemented: {capability}")]
    CapabilityNotImplemented { capability: String },

    // Server errors (5xx)
    #[error("Route table error: {0}")]
    RouteTable(#[from] crate::routing::RouteTableError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    /// HTTP status and machine-readable code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::MalformedJson(_) => (StatusCode::BAD_REQUEST, "malformed_json"),
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AppError::PayloadTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large")
            }
            AppError::RouteNotFound { .. } => (StatusCode::NOT_FOUND, "route_not_found"),
            AppError::CapabilityNotImplemented { .. } => {
                (StatusCode::NOT_IMPLEMENTED, "capability_not_implemented")
            }
            AppError::RouteTable(_) => (StatusCode::INTERNAL_SERVER_ERROR, "route_table_error"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        let details = match &self {
            AppError::MalformedJson(msg) => Some(msg.clone()),
            AppError::PayloadTooLarge { limit } => Some(format!("limit is {} bytes", limit)),
            AppError::RouteTable(e) => {
                tracing::error!("Route table error: {:?}", e);
                None
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                None
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                None
            }
            _ => None,
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
