//! Login endpoint.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use caja_core::Operator;

use crate::auth::verify_password;
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::response::{ok, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub operator: Operator,
}

/// `POST /auth/login`
///
/// Unknown email and wrong password produce the same message so the
/// endpoint does not confirm which emails exist.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    let record = state
        .db
        .operators()
        .find_by_email(body.email.trim())
        .await?;

    let record = match record {
        Some(r) if verify_password(&body.password, &r.password_hash) => r,
        _ => {
            return Err(ApiError::AuthFailed(
                "credenciales inválidas".to_string(),
            ))
        }
    };

    let operator = record.into_operator();
    let token = state.jwt.generate_token(&operator)?;

    info!(operator_id = operator.id, "operator logged in");

    Ok(ok("sesión iniciada", LoginResponse { token, operator }))
}
