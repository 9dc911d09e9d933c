//! # Centralized Error Handling
//!
//! This module defines the application-wide error type [`AppError`] used consistently
//! across all backend modules, and the JSON body every failed request carries.
//!
//! ## Error Categories
//!
//! 1. **Client Errors** (4xx)
//!    - [`Validation`](AppError::Validation) → 422 with per-field details
//!    - [`InvalidInput`](AppError::InvalidInput) / [`InvalidStatus`](AppError::InvalidStatus) → 400
//!    - [`Conflict`](AppError::Conflict) → 400 (duplicate registration)
//!    - [`Unauthorized`](AppError::Unauthorized) → 401
//!    - [`Forbidden`](AppError::Forbidden) → 403
//!    - [`NotFound`](AppError::NotFound) → 404, also used for rows owned by someone else
//!    - [`RateLimited`](AppError::RateLimited) → 429
//!
//! 2. **Server Errors** (5xx), always reported with a generic body
//!    - [`Config`](AppError::Config), [`Storage`](AppError::Storage), [`Internal`](AppError::Internal)
//!
//! ## Response Body
//!
//! ```json
//! {"error": "Wire with ID 7 not found", "status_code": 404,
//!  "timestamp": "2025-01-01T00:00:00Z", "path": "/api/wires/7"}
//! ```
//!
//! `path` is filled in by the response mapping middleware, which can see the
//! request URI. [`IntoResponse`] stores a copy of the body in the response
//! extensions so the middleware can rebuild it.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience type alias for `Result<T, AppError>`.
pub type Result<T> = std::result::Result<T, AppError>;

pub const INTERNAL_ERROR: &str = "Internal server error";
pub const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// One failed field in a validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// JSON body returned for every error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
    pub status_code: u16,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
            details: Vec::new(),
            status_code: status.as_u16(),
            timestamp: lib_utils::format_time(lib_utils::now_utc()),
            path: None,
        }
    }

    /// The body used for any failure whose detail must stay server side.
    pub fn internal() -> Self {
        Self {
            message: Some(INTERNAL_ERROR_MESSAGE.to_string()),
            ..Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Render with the body stashed in the extensions for later remapping.
    pub fn into_response_with(self, status: StatusCode) -> Response {
        let mut res = (status, Json(self.clone())).into_response();
        res.extensions_mut().insert(self);
        res
    }
}

/// Application-wide error type covering all error scenarios.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error during startup or environment loading.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request body, query or path failed validation.
    #[error("Validation error: {0:?}")]
    Validation(Vec<FieldError>),

    /// Invalid user input that is not tied to a single field.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A status string outside pending/processing/completed/failed.
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// Missing or bad credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (inactive account, no credentials sent).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Requested resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint on user input, e.g. an email already registered.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    /// Database or allocation failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal server error (unexpected failures).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError::new(field, message)])
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidInput(_) | AppError::InvalidStatus(_) | AppError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Config(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Build the client-facing body. Server errors never leak their detail.
    pub fn to_error_response(&self) -> ErrorResponse {
        let status = self.status_code();
        match self {
            AppError::Validation(details) => ErrorResponse {
                details: details.clone(),
                ..ErrorResponse::new(status, "Validation error")
            },
            AppError::InvalidInput(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => ErrorResponse::new(status, msg.clone()),
            AppError::InvalidStatus(value) => {
                ErrorResponse::new(status, format!("Invalid status: {value}"))
            }
            AppError::RateLimited => ErrorResponse::new(status, "Rate limit exceeded"),
            AppError::Config(_) | AppError::Storage(_) | AppError::Internal(_) => {
                ErrorResponse::internal()
            }
        }
    }
}

/// Implement Axum's `IntoResponse` for automatic error handling.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match status {
            StatusCode::INTERNAL_SERVER_ERROR => tracing::error!("Server error: {}", self),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                tracing::warn!("Client error: {}", self)
            }
            _ => tracing::debug!("Client error: {}", self),
        }

        let mut res = self.to_error_response().into_response_with(status);
        if status == StatusCode::UNAUTHORIZED {
            res.headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        res
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Convert `sqlx::Error` to `AppError`.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Database record not found".to_string()),
            sqlx::Error::Database(db_err) => {
                AppError::Storage(format!("Database error: {}", db_err.message()))
            }
            _ => AppError::Storage(format!("Database error: {}", err)),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Storage(format!("Migration error: {}", err))
    }
}

/// Convert `serde_json::Error` to `AppError`.
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", err))
    }
}
