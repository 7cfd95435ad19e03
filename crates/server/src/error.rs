//! Error types for the HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use evotune_engine::{EngineError, ServiceError};
use serde::Serialize;
use thiserror::Error;

/// API-level errors surfaced as HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request input
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Durable state could not be written
    #[error("storage error: {0}")]
    Storage(String),

    /// Anything else
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match &e {
            ServiceError::Validation(_) => ApiError::BadRequest(e.to_string()),
            ServiceError::Engine(EngineError::Storage(_)) => ApiError::Storage(e.to_string()),
            ServiceError::Engine(EngineError::Closed) => ApiError::Internal(e.to_string()),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable description of the failure
    pub error: String,
    /// Stable machine-readable code
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;
