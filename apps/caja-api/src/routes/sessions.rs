//! Cash-session endpoints (`/cajas`).

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use caja_core::reconcile::{ClosingFigures, SessionTotals};
use caja_core::validation::{validate_date_range, validate_non_negative_amount, validate_notes};
use caja_core::{CashSession, Money, SessionStatus, Shift};
use caja_db::{DateRange, SessionFilter};

use crate::auth::AuthOperator;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery};
use crate::response::{ok, ok_maybe, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OpenSessionRequest {
    pub shift: Shift,
    pub opening_float_cents: i64,
    pub opening_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CloseSessionRequest {
    pub closing_float_cents: i64,
    pub closing_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSessionRequest {
    pub shift: Option<Shift>,
    pub opening_notes: Option<String>,
    pub closing_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub operator_id: Option<i64>,
    pub status: Option<SessionStatus>,
    pub shift: Option<Shift>,
    pub fecha_inicio: Option<String>,
    pub fecha_fin: Option<String>,
}

/// Closed session plus its reconciliation figures.
#[derive(Debug, Serialize)]
pub struct CloseSessionResponse {
    pub caja: CashSession,
    pub cuadre: ClosingFigures,
}

/// `POST /cajas`: opens a session for the authenticated operator.
pub async fn open(
    State(state): State<AppState>,
    operator: AuthOperator,
    ApiJson(body): ApiJson<OpenSessionRequest>,
) -> ApiResult<Json<ApiResponse<CashSession>>> {
    let opening_float = Money::from_cents(body.opening_float_cents);
    validate_non_negative_amount("opening_float_cents", opening_float)?;
    validate_notes("opening_notes", body.opening_notes.as_deref())?;

    let session = state
        .db
        .sessions()
        .open(operator.id, body.shift, opening_float, body.opening_notes)
        .await?;

    Ok(ok("caja abierta", session))
}

/// `POST /cajas/{id}/cerrar`: closes and reconciles a session.
pub async fn close(
    State(state): State<AppState>,
    _operator: AuthOperator,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<CloseSessionRequest>,
) -> ApiResult<Json<ApiResponse<CloseSessionResponse>>> {
    let closing_float = Money::from_cents(body.closing_float_cents);
    validate_non_negative_amount("closing_float_cents", closing_float)?;
    validate_notes("closing_notes", body.closing_notes.as_deref())?;

    let (caja, cuadre) = state
        .db
        .sessions()
        .close(id, closing_float, body.closing_notes)
        .await?;

    let message = if cuadre.exact_reconciliation {
        "caja cerrada: cuadre exacto"
    } else {
        "caja cerrada con diferencia"
    };

    Ok(ok(message, CloseSessionResponse { caja, cuadre }))
}

/// `GET /cajas/{id}`
pub async fn get(
    State(state): State<AppState>,
    _operator: AuthOperator,
    Path(id): Path<i64>,
) -> ApiResult<Json<ApiResponse<CashSession>>> {
    let session = state
        .db
        .sessions()
        .get_by_id(id)
        .await?
        .ok_or_else(|| caja_db::DbError::not_found("cash session", id))?;

    Ok(ok("caja encontrada", session))
}

/// `GET /cajas/{id}/totales`: live reconciliation preview.
pub async fn totals(
    State(state): State<AppState>,
    _operator: AuthOperator,
    Path(id): Path<i64>,
) -> ApiResult<Json<ApiResponse<SessionTotals>>> {
    let totals = state.db.sessions().totals(id).await?;
    Ok(ok("totales de la caja", totals))
}

/// `GET /cajas/usuario/{operator_id}/abierta`
///
/// No open session is a valid answer: 200 with `data: null`.
pub async fn find_open(
    State(state): State<AppState>,
    _operator: AuthOperator,
    Path(operator_id): Path<i64>,
) -> ApiResult<Json<ApiResponse<CashSession>>> {
    let session = state.db.sessions().find_open(operator_id).await?;

    let message = if session.is_some() {
        "caja abierta encontrada"
    } else {
        "el operador no tiene caja abierta"
    };

    Ok(ok_maybe(message, session))
}

/// `GET /cajas`: filtered listing.
pub async fn list(
    State(state): State<AppState>,
    _operator: AuthOperator,
    ApiQuery(query): ApiQuery<SessionQuery>,
) -> ApiResult<Json<ApiResponse<Vec<CashSession>>>> {
    validate_date_range(query.fecha_inicio.as_deref(), query.fecha_fin.as_deref())?;

    let filter = SessionFilter {
        operator_id: query.operator_id,
        status: query.status,
        shift: query.shift,
        opened: DateRange::new(query.fecha_inicio, query.fecha_fin),
    };

    let sessions = state.db.sessions().list(&filter).await?;
    Ok(ok("cajas", sessions))
}

/// `PUT /cajas/{id}`: admin-only edit of shift label and notes. The
/// reconciliation fields have no update path.
pub async fn update_notes(
    State(state): State<AppState>,
    operator: AuthOperator,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<UpdateSessionRequest>,
) -> ApiResult<Json<ApiResponse<CashSession>>> {
    operator.require_admin()?;

    validate_notes("opening_notes", body.opening_notes.as_deref())?;
    validate_notes("closing_notes", body.closing_notes.as_deref())?;

    let session = state
        .db
        .sessions()
        .update_notes(id, body.shift, body.opening_notes, body.closing_notes)
        .await?;

    Ok(ok("caja actualizada", session))
}
