//! Safe-ledger endpoints (`/caja-fuerte`).

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use caja_core::validation::{
    validate_date_range, validate_description, validate_positive_amount,
};
use caja_core::{Money, MovementKind, SafeMovement};
use caja_db::repository::NewMovement;
use caja_db::{DateRange, MovementFilter};

use crate::auth::AuthOperator;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery};
use crate::response::{ok, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterMovementRequest {
    pub kind: MovementKind,
    pub amount_cents: i64,
    pub description: String,
    pub session_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MovementQuery {
    pub kind: Option<MovementKind>,
    pub operator_id: Option<i64>,
    pub session_id: Option<i64>,
    pub fecha_inicio: Option<String>,
    pub fecha_fin: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub fecha_inicio: Option<String>,
    pub fecha_fin: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance_cents: i64,
}

/// `GET /caja-fuerte/saldo`
pub async fn balance(
    State(state): State<AppState>,
    _operator: AuthOperator,
) -> ApiResult<Json<ApiResponse<BalanceResponse>>> {
    let balance = state.db.safe().current_balance().await?;
    Ok(ok(
        "saldo de la caja fuerte",
        BalanceResponse {
            balance_cents: balance.cents(),
        },
    ))
}

/// `POST /caja-fuerte/movimientos`
///
/// Registrations are serialized behind the process-wide ledger lock so two
/// concurrent movements cannot chain off the same prior balance.
pub async fn register(
    State(state): State<AppState>,
    operator: AuthOperator,
    ApiJson(body): ApiJson<RegisterMovementRequest>,
) -> ApiResult<Json<ApiResponse<SafeMovement>>> {
    let amount = Money::from_cents(body.amount_cents);
    validate_positive_amount("amount_cents", amount)?;
    validate_description("description", &body.description)?;

    let _guard = state.ledger_lock.lock().await;

    let movement = state
        .db
        .safe()
        .register(NewMovement {
            kind: body.kind,
            amount,
            description: body.description.trim().to_string(),
            operator_id: operator.id,
            session_id: body.session_id,
        })
        .await?;

    Ok(ok("movimiento registrado", movement))
}

/// `GET /caja-fuerte/movimientos/{id}`
pub async fn get(
    State(state): State<AppState>,
    _operator: AuthOperator,
    Path(id): Path<i64>,
) -> ApiResult<Json<ApiResponse<SafeMovement>>> {
    let movement = state
        .db
        .safe()
        .get_by_id(id)
        .await?
        .filter(|m| m.is_active)
        .ok_or_else(|| caja_db::DbError::not_found("safe movement", id))?;

    Ok(ok("movimiento encontrado", movement))
}

/// `GET /caja-fuerte/movimientos`: filtered listing, newest first.
pub async fn list(
    State(state): State<AppState>,
    _operator: AuthOperator,
    ApiQuery(query): ApiQuery<MovementQuery>,
) -> ApiResult<Json<ApiResponse<Vec<SafeMovement>>>> {
    validate_date_range(query.fecha_inicio.as_deref(), query.fecha_fin.as_deref())?;

    let filter = MovementFilter {
        kind: query.kind,
        operator_id: query.operator_id,
        session_id: query.session_id,
        recorded: DateRange::new(query.fecha_inicio, query.fecha_fin),
    };

    let movements = state.db.safe().list(&filter).await?;
    Ok(ok("movimientos de la caja fuerte", movements))
}

/// `DELETE /caja-fuerte/movimientos/{id}`: admin-only undo of the latest
/// movement. Interior movements are refused; the chain is not editable.
pub async fn delete(
    State(state): State<AppState>,
    operator: AuthOperator,
    Path(id): Path<i64>,
) -> ApiResult<Json<ApiResponse<SafeMovement>>> {
    operator.require_admin()?;

    let _guard = state.ledger_lock.lock().await;
    let movement = state.db.safe().soft_delete(id).await?;

    Ok(ok("movimiento anulado", movement))
}

/// `GET /caja-fuerte/historial?fecha_inicio&fecha_fin`: chronological
/// balance evolution.
pub async fn history(
    State(state): State<AppState>,
    _operator: AuthOperator,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> ApiResult<Json<ApiResponse<Vec<SafeMovement>>>> {
    validate_date_range(query.fecha_inicio.as_deref(), query.fecha_fin.as_deref())?;

    let range = DateRange::new(query.fecha_inicio, query.fecha_fin);
    let movements = state.db.safe().history(&range).await?;

    Ok(ok("historial de la caja fuerte", movements))
}
