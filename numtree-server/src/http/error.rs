//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes.
//! Every body has an `error` message; validation failures also list the
//! offending fields under `errors`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use numtree_core::CoreError;
use serde_json::json;

use crate::auth::PasswordError;
use crate::db::repos::DbError;
use crate::models::ValidationError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Request was well-formed but refused (400)
    BadRequest { message: String },

    /// No valid session (401)
    Unauthorized,

    /// Login failed (401)
    InvalidCredentials,

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Database error (500, logged)
    Database(DbError),

    /// Internal error (500, logged)
    Internal { message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Validation(e) => json!({
                "error": "Validation failed",
                "errors": [{
                    "field": e.field(),
                    "message": e.to_string()
                }]
            }),
            Self::BadRequest { message } => json!({ "error": message }),
            Self::Unauthorized => json!({ "error": "Unauthorized" }),
            Self::InvalidCredentials => json!({ "error": "Invalid credentials" }),
            Self::NotFound { resource, id } => {
                tracing::debug!(resource, id = %id, "not found");
                json!({ "error": format!("{} not found", resource) })
            }
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                json!({ "error": "Internal server error" })
            }
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                json!({ "error": "Internal server error" })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::DivisionByZero
            | CoreError::NonFiniteResult { .. }
            | CoreError::UnknownOperation { .. } => Self::BadRequest {
                message: e.to_string(),
            },
            other => Self::Internal {
                message: other.to_string(),
            },
        }
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::Conflict { resource, .. } => Self::BadRequest {
                message: format!("{} already exists", resource),
            },
            DbError::Rejected(core) => core.into(),
            _ => Self::Database(e),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(e: PasswordError) -> Self {
        Self::Internal {
            message: e.to_string(),
        }
    }
}
