//! Operator administration (`/operadores`).

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use caja_core::validation::validate_description;
use caja_core::{Operator, OperatorRole, ValidationError};

use crate::auth::{hash_password, AuthOperator};
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::response::{ok, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateOperatorRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: OperatorRole,
}

const MIN_PASSWORD_LEN: usize = 8;

/// `POST /operadores`: admin-only account creation. A duplicate email is a
/// conflict (the store enforces uniqueness).
pub async fn create(
    State(state): State<AppState>,
    operator: AuthOperator,
    ApiJson(body): ApiJson<CreateOperatorRequest>,
) -> ApiResult<Json<ApiResponse<Operator>>> {
    operator.require_admin()?;

    validate_description("name", &body.name)?;
    let email = body.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "expected an email address".to_string(),
        }
        .into());
    }
    if body.password.len() < MIN_PASSWORD_LEN {
        return Err(ValidationError::InvalidFormat {
            field: "password".to_string(),
            reason: format!("expected at least {MIN_PASSWORD_LEN} characters"),
        }
        .into());
    }

    let hash = hash_password(&body.password)?;
    let created = state
        .db
        .operators()
        .create(body.name.trim(), email, &hash, body.role)
        .await?;

    Ok(ok("operador creado", created))
}
