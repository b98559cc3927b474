//! # API Error Types
//!
//! The last hop of the error chain: `ValidationError`/`CoreError` (caja-core)
//! and `DbError` (caja-db) land here and are mapped onto an HTTP status and
//! the failure envelope.
//!
//! ## Status mapping
//! - 400 validation failures
//! - 401 missing/invalid token, bad credentials
//! - 403 valid token, insufficient role
//! - 404 explicit not-found (including a close on a non-open session)
//! - 409 business conflicts (duplicate open session, insufficient safe
//!   balance, interior ledger delete, subcategory mismatch)
//! - 500 store or internal failures; the detail is logged, never leaked

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use caja_core::{CoreError, ValidationError};
use caja_db::DbError;

/// API request errors.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AuthFailed(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("internal error")]
    Internal(String),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(v) => ApiError::Validation(v),
            CoreError::SessionNotOpen(_) => ApiError::NotFound(err.to_string()),
            CoreError::SessionAlreadyOpen { .. }
            | CoreError::InsufficientSafeBalance { .. }
            | CoreError::MovementNotDeletable { .. }
            | CoreError::SubcategoryMismatch { .. } => ApiError::Conflict(err.to_string()),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                ApiError::Conflict(err.to_string())
            }
            DbError::Domain(core) => core.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(v) => (StatusCode::BAD_REQUEST, v.to_string()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::AuthFailed(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::Internal(detail) => {
                error!(detail, "internal error while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({ "ok": false, "message": message }));
        (status, body).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
