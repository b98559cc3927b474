//! Reporting endpoints (`/reportes`). Read-only rollups computed on demand.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use caja_core::reconcile::complete_method_summary;
use caja_core::validation::validate_date_range;
use caja_core::{CategorySummary, DailyReportRow, MethodSummary, MonthlyReportRow, ValidationError};
use caja_db::DateRange;

use crate::auth::AuthOperator;
use crate::error::ApiResult;
use crate::extract::ApiQuery;
use crate::response::{ok, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub fecha_inicio: Option<String>,
    pub fecha_fin: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MonthlyQuery {
    pub anio: i32,
    pub mes: Option<u32>,
}

impl RangeQuery {
    fn into_range(self) -> Result<DateRange, ValidationError> {
        validate_date_range(self.fecha_inicio.as_deref(), self.fecha_fin.as_deref())?;
        Ok(DateRange::new(self.fecha_inicio, self.fecha_fin))
    }
}

/// `GET /reportes/diario?fecha_inicio&fecha_fin`
pub async fn daily(
    State(state): State<AppState>,
    _operator: AuthOperator,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> ApiResult<Json<ApiResponse<Vec<DailyReportRow>>>> {
    let range = query.into_range()?;
    let rows = state.db.reports().daily(&range).await?;
    Ok(ok("reporte diario", rows))
}

/// `GET /reportes/mensual?anio&mes`
pub async fn monthly(
    State(state): State<AppState>,
    _operator: AuthOperator,
    ApiQuery(query): ApiQuery<MonthlyQuery>,
) -> ApiResult<Json<ApiResponse<Vec<MonthlyReportRow>>>> {
    if !(1..=12).contains(&query.mes.unwrap_or(1)) {
        return Err(ValidationError::InvalidFormat {
            field: "mes".to_string(),
            reason: "expected 1-12".to_string(),
        }
        .into());
    }

    let rows = state.db.reports().monthly(query.anio, query.mes).await?;
    Ok(ok("reporte mensual", rows))
}

/// `GET /reportes/ventas-por-metodo?fecha_inicio&fecha_fin`
///
/// The payment-method domain is closed: the response always enumerates all
/// six methods, zero-filled where the period saw no activity.
pub async fn sales_by_method(
    State(state): State<AppState>,
    _operator: AuthOperator,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> ApiResult<Json<ApiResponse<Vec<MethodSummary>>>> {
    let range = query.into_range()?;
    let rows = state.db.reports().sales_by_method(&range).await?;
    Ok(ok("ventas por método de pago", complete_method_summary(rows)))
}

/// `GET /reportes/gastos-por-categoria?fecha_inicio&fecha_fin`
pub async fn expenses_by_category(
    State(state): State<AppState>,
    _operator: AuthOperator,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> ApiResult<Json<ApiResponse<Vec<CategorySummary>>>> {
    let range = query.into_range()?;
    let rows = state.db.reports().expenses_by_category(&range).await?;
    Ok(ok("gastos por categoría", rows))
}
