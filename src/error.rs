//! Error types for the tier router
//!
//! `RouterError` covers the routing engine itself. Runtime routing scenarios
//! (no rule match, unhealthy models) never produce errors; only configuration
//! defects do. `AppError` is the HTTP boundary error.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Routing engine errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RouterError {
    /// Malformed or incomplete tier/rule configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl RouterError {
    /// Shorthand for building a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        RouterError::Configuration(message.into())
    }
}

/// Result type alias for the routing engine
pub type RouterResult<T> = Result<T, RouterError>;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Router(#[from] RouterError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error details
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Router(RouterError::Configuration(msg)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR",
                msg.clone(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
