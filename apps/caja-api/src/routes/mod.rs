//! Route handlers and router assembly.

pub mod auth;
pub mod expenses;
pub mod operators;
pub mod reports;
pub mod safe;
pub mod sales;
pub mod sessions;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, ApiResult};
use crate::response::{ok, ApiResponse};
use crate::state::AppState;

/// Builds the full application router. Exposed so integration tests can
/// drive the service without binding a socket.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(auth::login))
        .route("/operadores", post(operators::create))
        // Cash sessions ("cajas")
        .route("/cajas", get(sessions::list).post(sessions::open))
        .route(
            "/cajas/:id",
            get(sessions::get).put(sessions::update_notes),
        )
        .route("/cajas/:id/cerrar", post(sessions::close))
        .route("/cajas/:id/totales", get(sessions::totals))
        .route(
            "/cajas/usuario/:operator_id/abierta",
            get(sessions::find_open),
        )
        // Sales ("ventas")
        .route("/ventas", get(sales::list).post(sales::create))
        .route(
            "/ventas/:id",
            get(sales::get).put(sales::update).delete(sales::delete),
        )
        // Expenses ("gastos")
        .route("/gastos", get(expenses::list).post(expenses::create))
        .route("/gastos/categorias", get(expenses::categories))
        .route(
            "/gastos/categorias/:id/subcategorias",
            get(expenses::subcategories),
        )
        .route(
            "/gastos/:id",
            get(expenses::get)
                .put(expenses::update)
                .delete(expenses::delete),
        )
        // Safe ledger ("caja fuerte")
        .route("/caja-fuerte/saldo", get(safe::balance))
        .route(
            "/caja-fuerte/movimientos",
            get(safe::list).post(safe::register),
        )
        .route(
            "/caja-fuerte/movimientos/:id",
            get(safe::get).delete(safe::delete),
        )
        .route("/caja-fuerte/historial", get(safe::history))
        // Reports
        .route("/reportes/diario", get(reports::daily))
        .route("/reportes/mensual", get(reports::monthly))
        .route("/reportes/ventas-por-metodo", get(reports::sales_by_method))
        .route(
            "/reportes/gastos-por-categoria",
            get(reports::expenses_by_category),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness + store reachability.
async fn health(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    if state.db.health_check().await {
        Ok(ok(
            "servicio disponible",
            serde_json::json!({ "database": "ok" }),
        ))
    } else {
        Err(ApiError::Internal("database unreachable".to_string()))
    }
}
