//! Expense endpoints (`/gastos`) and the category reference lists.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use caja_core::validation::{
    validate_date_range, validate_description, validate_positive_amount,
};
use caja_core::{Expense, ExpenseCategory, ExpenseSubcategory, Money, PaymentMethod};
use caja_db::repository::NewExpense;
use caja_db::{DateRange, ExpenseFilter};

use crate::auth::AuthOperator;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery};
use crate::response::{ok, ok_empty, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub description: String,
    pub category_id: i64,
    pub subcategory_id: Option<i64>,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub session_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateExpenseRequest {
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
    pub amount_cents: Option<i64>,
    pub method: Option<PaymentMethod>,
}

#[derive(Debug, Deserialize)]
pub struct ExpenseQuery {
    pub session_id: Option<i64>,
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
    pub method: Option<PaymentMethod>,
    pub fecha_inicio: Option<String>,
    pub fecha_fin: Option<String>,
}

/// `POST /gastos`
///
/// Like sales, an expense with no explicit session id is linked to the
/// operator's open session when one exists.
pub async fn create(
    State(state): State<AppState>,
    operator: AuthOperator,
    ApiJson(body): ApiJson<CreateExpenseRequest>,
) -> ApiResult<Json<ApiResponse<Expense>>> {
    let amount = Money::from_cents(body.amount_cents);
    validate_positive_amount("amount_cents", amount)?;
    validate_description("description", &body.description)?;

    let session_id = match body.session_id {
        Some(id) => Some(id),
        None => state
            .db
            .sessions()
            .find_open(operator.id)
            .await?
            .map(|s| s.id),
    };

    let expense = state
        .db
        .expenses()
        .create(NewExpense {
            description: body.description.trim().to_string(),
            category_id: body.category_id,
            subcategory_id: body.subcategory_id,
            amount,
            method: body.method,
            operator_id: operator.id,
            session_id,
        })
        .await?;

    Ok(ok("gasto registrado", expense))
}

/// `GET /gastos/{id}`
pub async fn get(
    State(state): State<AppState>,
    _operator: AuthOperator,
    Path(id): Path<i64>,
) -> ApiResult<Json<ApiResponse<Expense>>> {
    let expense = state
        .db
        .expenses()
        .get_by_id(id)
        .await?
        .filter(|e| e.is_active)
        .ok_or_else(|| caja_db::DbError::not_found("expense", id))?;

    Ok(ok("gasto encontrado", expense))
}

/// `GET /gastos`: filtered listing.
pub async fn list(
    State(state): State<AppState>,
    _operator: AuthOperator,
    ApiQuery(query): ApiQuery<ExpenseQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Expense>>>> {
    validate_date_range(query.fecha_inicio.as_deref(), query.fecha_fin.as_deref())?;

    let filter = ExpenseFilter {
        session_id: query.session_id,
        category_id: query.category_id,
        subcategory_id: query.subcategory_id,
        method: query.method,
        recorded: DateRange::new(query.fecha_inicio, query.fecha_fin),
    };

    let expenses = state.db.expenses().list(&filter).await?;
    Ok(ok("gastos", expenses))
}

/// `PUT /gastos/{id}`
pub async fn update(
    State(state): State<AppState>,
    _operator: AuthOperator,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<UpdateExpenseRequest>,
) -> ApiResult<Json<ApiResponse<Expense>>> {
    let amount = body.amount_cents.map(Money::from_cents);
    if let Some(amount) = amount {
        validate_positive_amount("amount_cents", amount)?;
    }
    if let Some(ref description) = body.description {
        validate_description("description", description)?;
    }

    let expense = state
        .db
        .expenses()
        .update(
            id,
            body.description,
            body.category_id,
            body.subcategory_id,
            amount,
            body.method,
        )
        .await?;

    Ok(ok("gasto actualizado", expense))
}

/// `DELETE /gastos/{id}`: admin-only soft delete.
pub async fn delete(
    State(state): State<AppState>,
    operator: AuthOperator,
    Path(id): Path<i64>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    operator.require_admin()?;
    state.db.expenses().soft_delete(id).await?;
    Ok(ok_empty("gasto eliminado"))
}

/// `GET /gastos/categorias`
pub async fn categories(
    State(state): State<AppState>,
    _operator: AuthOperator,
) -> ApiResult<Json<ApiResponse<Vec<ExpenseCategory>>>> {
    let categories = state.db.expenses().categories().await?;
    Ok(ok("categorías de gasto", categories))
}

/// `GET /gastos/categorias/{id}/subcategorias`
pub async fn subcategories(
    State(state): State<AppState>,
    _operator: AuthOperator,
    Path(category_id): Path<i64>,
) -> ApiResult<Json<ApiResponse<Vec<ExpenseSubcategory>>>> {
    let subcategories = state.db.expenses().subcategories(category_id).await?;
    Ok(ok("subcategorías", subcategories))
}
