//! Uniform response envelope.
//!
//! Every endpoint answers `{ "ok": true, "message": ..., "data": ... }` on
//! success and `{ "ok": false, "message": ... }` on failure, so the retail
//! frontend never branches on shape. "Valid query, nothing there" is a 200
//! with `data: null`, not an error.

use axum::Json;
use serde::Serialize;

/// The success envelope. Failures are produced by `ApiError`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub ok: bool,
    pub message: String,
    pub data: Option<T>,
}

/// Success with a payload.
pub fn ok<T: Serialize>(message: impl Into<String>, data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        ok: true,
        message: message.into(),
        data: Some(data),
    })
}

/// Success with `data: null` (deletes, empty lookups).
pub fn ok_empty(message: impl Into<String>) -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse {
        ok: true,
        message: message.into(),
        data: None,
    })
}

/// Success carrying an explicit `Option` payload: `None` serializes as
/// `data: null`.
pub fn ok_maybe<T: Serialize>(
    message: impl Into<String>,
    data: Option<T>,
) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        ok: true,
        message: message.into(),
        data,
    })
}
