//! Error types for stats-admin HTTP handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::forms::FieldErrors;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// No authenticated user (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Conflict (409) - duplicate key or record still referenced
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Form validation failed (422)
    #[error("Validation failed")]
    Validation(FieldErrors),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// stats-common error
    #[error("Common error: {0}")]
    Common(stats_common::Error),
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<stats_common::Error> for ApiError {
    fn from(err: stats_common::Error) -> Self {
        use stats_common::Error as E;

        match err {
            E::Database(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                ApiError::Conflict("A record with this key already exists".to_string())
            }
            E::Database(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                ApiError::Conflict("The record is referenced by other records".to_string())
            }
            E::Database(sqlx::Error::RowNotFound) => ApiError::NotFound("Record not found".to_string()),
            E::NotFound(msg) => ApiError::NotFound(msg),
            E::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => ApiError::Common(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            ApiError::Validation(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                "One or more fields are invalid".to_string(),
            ),
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
            ApiError::Common(err) => {
                error!("Unhandled error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR", err.to_string())
            }
        };

        let body = match self {
            ApiError::Validation(fields) => json!({
                "error": {
                    "code": error_code,
                    "message": message,
                    "fields": fields,
                }
            }),
            _ => json!({
                "error": {
                    "code": error_code,
                    "message": message,
                }
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
