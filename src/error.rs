//! Service error types with HTTP status code mapping.
//!
//! [`AuditError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid request: application_name exceeds 126 characters"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`AuditError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category | HTTP Status                         |
/// |-----------|----------|-------------------------------------|
/// | 1000–1999 | Client   | 422 Unprocessable Entity            |
/// | 3000–3999 | Server   | 500 Internal / 503 Unavailable      |
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// Malformed client input. Never retried internally.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Simulated or transient storage fault. Callers are expected to retry.
    #[error("transient failure: {0}")]
    TransientFailure(String),

    /// The connection pool cannot be constructed or used.
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// A statement failed inside an otherwise healthy connection.
    #[error("database error: {0}")]
    Database(String),

    /// Configuration could not be read or is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuditError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::Internal(_) => 3000,
            Self::TransientFailure(_) => 3001,
            Self::ResourceUnavailable(_) => 3002,
            Self::Database(_) => 3003,
            Self::Config(_) => 3004,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ResourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::TransientFailure(_)
            | Self::Database(_)
            | Self::Config(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AuditError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => Self::ResourceUnavailable(err.to_string()),
            other => Self::Database(other.to_string()),
        }
    }
}

impl From<figment::Error> for AuditError {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl IntoResponse for AuditError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
