//! Sale endpoints (`/ventas`).

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use caja_core::validation::{
    validate_date_range, validate_description, validate_notes, validate_positive_amount,
};
use caja_core::{Money, PaymentMethod, Sale, SaleChannel};
use caja_db::repository::NewSale;
use caja_db::{DateRange, SaleFilter};

use crate::auth::AuthOperator;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery};
use crate::response::{ok, ok_empty, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    pub description: String,
    pub channel: SaleChannel,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub session_id: Option<i64>,
    pub exit_reference: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSaleRequest {
    pub description: Option<String>,
    pub channel: Option<SaleChannel>,
    pub amount_cents: Option<i64>,
    pub method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaleQuery {
    pub session_id: Option<i64>,
    pub method: Option<PaymentMethod>,
    pub channel: Option<SaleChannel>,
    pub fecha_inicio: Option<String>,
    pub fecha_fin: Option<String>,
}

/// `POST /ventas`
///
/// When no session id is given, the sale is linked to the operator's open
/// session if one exists; otherwise it stays unlinked and never enters a
/// reconciliation.
pub async fn create(
    State(state): State<AppState>,
    operator: AuthOperator,
    ApiJson(body): ApiJson<CreateSaleRequest>,
) -> ApiResult<Json<ApiResponse<Sale>>> {
    let amount = Money::from_cents(body.amount_cents);
    validate_positive_amount("amount_cents", amount)?;
    validate_description("description", &body.description)?;
    validate_notes("notes", body.notes.as_deref())?;

    let session_id = match body.session_id {
        Some(id) => Some(id),
        None => state
            .db
            .sessions()
            .find_open(operator.id)
            .await?
            .map(|s| s.id),
    };

    let sale = state
        .db
        .sales()
        .create(NewSale {
            description: body.description.trim().to_string(),
            channel: body.channel,
            amount,
            method: body.method,
            operator_id: operator.id,
            session_id,
            exit_reference: body.exit_reference,
            notes: body.notes,
        })
        .await?;

    Ok(ok("venta registrada", sale))
}

/// `GET /ventas/{id}`
pub async fn get(
    State(state): State<AppState>,
    _operator: AuthOperator,
    Path(id): Path<i64>,
) -> ApiResult<Json<ApiResponse<Sale>>> {
    let sale = state
        .db
        .sales()
        .get_by_id(id)
        .await?
        .filter(|s| s.is_active)
        .ok_or_else(|| caja_db::DbError::not_found("sale", id))?;

    Ok(ok("venta encontrada", sale))
}

/// `GET /ventas`: filtered listing.
pub async fn list(
    State(state): State<AppState>,
    _operator: AuthOperator,
    ApiQuery(query): ApiQuery<SaleQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Sale>>>> {
    validate_date_range(query.fecha_inicio.as_deref(), query.fecha_fin.as_deref())?;

    let filter = SaleFilter {
        session_id: query.session_id,
        method: query.method,
        channel: query.channel,
        recorded: DateRange::new(query.fecha_inicio, query.fecha_fin),
    };

    let sales = state.db.sales().list(&filter).await?;
    Ok(ok("ventas", sales))
}

/// `PUT /ventas/{id}`
pub async fn update(
    State(state): State<AppState>,
    _operator: AuthOperator,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<UpdateSaleRequest>,
) -> ApiResult<Json<ApiResponse<Sale>>> {
    let amount = body.amount_cents.map(Money::from_cents);
    if let Some(amount) = amount {
        validate_positive_amount("amount_cents", amount)?;
    }
    if let Some(ref description) = body.description {
        validate_description("description", description)?;
    }
    validate_notes("notes", body.notes.as_deref())?;

    let sale = state
        .db
        .sales()
        .update(
            id,
            body.description,
            body.channel,
            amount,
            body.method,
            body.notes,
        )
        .await?;

    Ok(ok("venta actualizada", sale))
}

/// `DELETE /ventas/{id}`: admin-only soft delete.
pub async fn delete(
    State(state): State<AppState>,
    operator: AuthOperator,
    Path(id): Path<i64>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    operator.require_admin()?;
    state.db.sales().soft_delete(id).await?;
    Ok(ok_empty("venta eliminada"))
}
