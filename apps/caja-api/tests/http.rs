//! End-to-end tests driving the axum router in memory, with the envelope
//! and status codes asserted the way the frontend depends on them.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use caja_api::auth::{hash_password, JwtManager};
use caja_api::routes::build_router;
use caja_api::state::AppState;
use caja_core::OperatorRole;
use caja_db::{Database, DbConfig};

struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    async fn new() -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let jwt = JwtManager::new("test-secret".to_string(), 3600);
        let state = AppState::new(db, jwt);
        let router = build_router(state.clone());
        TestApp { router, state }
    }

    async fn seed_operator(&self, email: &str, password: &str, role: OperatorRole) -> i64 {
        let hash = hash_password(password).unwrap();
        let operator = self
            .state
            .db
            .operators()
            .create("Prueba", email, &hash, role)
            .await
            .unwrap();
        operator.id
    }

    /// Logs in through the real endpoint and returns the bearer token.
    async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .request(
                "POST",
                "/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = TestApp::new().await;
    app.seed_operator("op@example.com", "secreta", OperatorRole::Operator)
        .await;

    let (status, body) = app
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "op@example.com", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["ok"], json!(false));

    // Unknown email yields the same message as a wrong password.
    let (status2, body2) = app
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "nadie@example.com", "password": "wrong" })),
        )
        .await;
    assert_eq!(status2, StatusCode::UNAUTHORIZED);
    assert_eq!(body2["message"], body["message"]);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = TestApp::new().await;

    let (status, body) = app.request("GET", "/cajas", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["ok"], json!(false));

    let (status, _) = app
        .request("GET", "/caja-fuerte/saldo", Some("not.a.token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.request("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
}

// =============================================================================
// Session lifecycle over HTTP
// =============================================================================

#[tokio::test]
async fn session_open_close_flow() {
    let app = TestApp::new().await;
    app.seed_operator("op@example.com", "secreta", OperatorRole::Operator)
        .await;
    let token = app.login("op@example.com", "secreta").await;

    // Open with a 100000-cent float.
    let (status, body) = app
        .request(
            "POST",
            "/cajas",
            Some(&token),
            Some(json!({ "shift": "mañana", "opening_float_cents": 100_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("abierta"));
    let session_id = body["data"]["id"].as_i64().unwrap();

    // A second open conflicts.
    let (status, body) = app
        .request(
            "POST",
            "/cajas",
            Some(&token),
            Some(json!({ "shift": "tarde", "opening_float_cents": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["ok"], json!(false));

    // Register a sale and an expense against the open session.
    let (status, _) = app
        .request(
            "POST",
            "/ventas",
            Some(&token),
            Some(json!({
                "description": "FV-001",
                "channel": "ALMACEN",
                "amount_cents": 50_000,
                "method": "EFECTIVO"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request(
            "POST",
            "/gastos",
            Some(&token),
            Some(json!({
                "description": "Flete",
                "category_id": 2,
                "amount_cents": 20_000,
                "method": "EFECTIVO"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Live totals see both.
    let (status, body) = app
        .request(
            "GET",
            &format!("/cajas/{session_id}/totales"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["net_expected_cents"], json!(130_000));

    // Close counting exactly the expected cash.
    let (status, body) = app
        .request(
            "POST",
            &format!("/cajas/{session_id}/cerrar"),
            Some(&token),
            Some(json!({ "closing_float_cents": 130_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cuadre"]["variance_cents"], json!(0));
    assert_eq!(body["data"]["cuadre"]["exact_reconciliation"], json!(true));
    assert_eq!(body["data"]["caja"]["status"], json!("cerrada"));

    // A second close is a 404.
    let (status, _) = app
        .request(
            "POST",
            &format!("/cajas/{session_id}/cerrar"),
            Some(&token),
            Some(json!({ "closing_float_cents": 130_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn find_open_returns_null_data_when_none() {
    let app = TestApp::new().await;
    let op = app
        .seed_operator("op@example.com", "secreta", OperatorRole::Operator)
        .await;
    let token = app.login("op@example.com", "secreta").await;

    let (status, body) = app
        .request(
            "GET",
            &format!("/cajas/usuario/{op}/abierta"),
            Some(&token),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn negative_opening_float_is_a_400() {
    let app = TestApp::new().await;
    app.seed_operator("op@example.com", "secreta", OperatorRole::Operator)
        .await;
    let token = app.login("op@example.com", "secreta").await;

    let (status, body) = app
        .request(
            "POST",
            "/cajas",
            Some(&token),
            Some(json!({ "shift": "mañana", "opening_float_cents": -1 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], json!(false));
}

#[tokio::test]
async fn session_note_edit_requires_admin() {
    let app = TestApp::new().await;
    app.seed_operator("op@example.com", "secreta", OperatorRole::Operator)
        .await;
    app.seed_operator("admin@example.com", "secreta", OperatorRole::Admin)
        .await;
    let op_token = app.login("op@example.com", "secreta").await;
    let admin_token = app.login("admin@example.com", "secreta").await;

    let (_, body) = app
        .request(
            "POST",
            "/cajas",
            Some(&op_token),
            Some(json!({ "shift": "mañana", "opening_float_cents": 0 })),
        )
        .await;
    let session_id = body["data"]["id"].as_i64().unwrap();

    let edit = json!({ "opening_notes": "revisada" });

    let (status, _) = app
        .request(
            "PUT",
            &format!("/cajas/{session_id}"),
            Some(&op_token),
            Some(edit.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request(
            "PUT",
            &format!("/cajas/{session_id}"),
            Some(&admin_token),
            Some(edit),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["opening_notes"], json!("revisada"));
}

// =============================================================================
// Sales
// =============================================================================

#[tokio::test]
async fn sale_delete_is_admin_only_and_soft() {
    let app = TestApp::new().await;
    app.seed_operator("op@example.com", "secreta", OperatorRole::Operator)
        .await;
    app.seed_operator("admin@example.com", "secreta", OperatorRole::Admin)
        .await;
    let op_token = app.login("op@example.com", "secreta").await;
    let admin_token = app.login("admin@example.com", "secreta").await;

    let (_, body) = app
        .request(
            "POST",
            "/ventas",
            Some(&op_token),
            Some(json!({
                "description": "FV-002",
                "channel": "REDES",
                "amount_cents": 8_000,
                "method": "NEQUI"
            })),
        )
        .await;
    let sale_id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = app
        .request("DELETE", &format!("/ventas/{sale_id}"), Some(&op_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            "DELETE",
            &format!("/ventas/{sale_id}"),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Gone from reads.
    let (status, _) = app
        .request("GET", &format!("/ventas/{sale_id}"), Some(&op_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn zero_amount_sale_is_rejected() {
    let app = TestApp::new().await;
    app.seed_operator("op@example.com", "secreta", OperatorRole::Operator)
        .await;
    let token = app.login("op@example.com", "secreta").await;

    let (status, _) = app
        .request(
            "POST",
            "/ventas",
            Some(&token),
            Some(json!({
                "description": "FV-003",
                "channel": "ALMACEN",
                "amount_cents": 0,
                "method": "EFECTIVO"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Safe ledger
// =============================================================================

#[tokio::test]
async fn safe_ledger_flow() {
    let app = TestApp::new().await;
    app.seed_operator("admin@example.com", "secreta", OperatorRole::Admin)
        .await;
    let token = app.login("admin@example.com", "secreta").await;

    // Empty ledger: balance 0.
    let (status, body) = app
        .request("GET", "/caja-fuerte/saldo", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["balance_cents"], json!(0));

    // Deposit, then an overdrawing withdrawal.
    let (status, body) = app
        .request(
            "POST",
            "/caja-fuerte/movimientos",
            Some(&token),
            Some(json!({
                "kind": "DEPOSITO",
                "amount_cents": 200_000,
                "description": "Consignación"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let deposit_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["balance_after_cents"], json!(200_000));

    let (status, _) = app
        .request(
            "POST",
            "/caja-fuerte/movimientos",
            Some(&token),
            Some(json!({
                "kind": "RETIRO",
                "amount_cents": 200_001,
                "description": "Retiro imposible"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Withdraw part, leaving a two-row chain.
    let (status, body) = app
        .request(
            "POST",
            "/caja-fuerte/movimientos",
            Some(&token),
            Some(json!({
                "kind": "RETIRO",
                "amount_cents": 50_000,
                "description": "Base de caja"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let withdrawal_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["balance_after_cents"], json!(150_000));

    // Interior delete refused, tip delete restores the balance.
    let (status, _) = app
        .request(
            "DELETE",
            &format!("/caja-fuerte/movimientos/{deposit_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .request(
            "DELETE",
            &format!("/caja-fuerte/movimientos/{withdrawal_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .request("GET", "/caja-fuerte/saldo", Some(&token), None)
        .await;
    assert_eq!(body["data"]["balance_cents"], json!(200_000));
}

// =============================================================================
// Reports
// =============================================================================

#[tokio::test]
async fn method_report_enumerates_all_six_methods() {
    let app = TestApp::new().await;
    app.seed_operator("op@example.com", "secreta", OperatorRole::Operator)
        .await;
    let token = app.login("op@example.com", "secreta").await;

    for (amount, method) in [(10_000, "EFECTIVO"), (5_000, "TARJETA")] {
        let (status, _) = app
            .request(
                "POST",
                "/ventas",
                Some(&token),
                Some(json!({
                    "description": format!("FV-{amount}"),
                    "channel": "ALMACEN",
                    "amount_cents": amount,
                    "method": method
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = app
        .request("GET", "/reportes/ventas-por-metodo", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0]["method"], json!("EFECTIVO"));
    assert_eq!(rows[0]["total_cents"], json!(10_000));
    assert_eq!(rows[1]["method"], json!("TARJETA"));
    assert_eq!(rows[1]["total_cents"], json!(5_000));
    // The other four methods are present, zero-filled.
    assert!(rows[2..]
        .iter()
        .all(|r| r["total_cents"] == json!(0) && r["count"] == json!(0)));
}

#[tokio::test]
async fn inverted_date_range_is_rejected() {
    let app = TestApp::new().await;
    app.seed_operator("op@example.com", "secreta", OperatorRole::Operator)
        .await;
    let token = app.login("op@example.com", "secreta").await;

    let (status, _) = app
        .request(
            "GET",
            "/reportes/diario?fecha_inicio=2026-02-01&fecha_fin=2026-01-01",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Extractor failures stay inside the envelope
// =============================================================================

#[tokio::test]
async fn malformed_payloads_answer_with_the_envelope() {
    let app = TestApp::new().await;
    app.seed_operator("op@example.com", "secreta", OperatorRole::Operator)
        .await;
    let token = app.login("op@example.com", "secreta").await;

    // Unknown payment method: deserialization fails inside the extractor.
    let (status, body) = app
        .request(
            "POST",
            "/ventas",
            Some(&token),
            Some(json!({
                "description": "FV-004",
                "channel": "ALMACEN",
                "amount_cents": 1_000,
                "method": "BITCOIN"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], json!(false));
    assert!(body["message"].is_string());

    // Body that is not JSON at all.
    let request = Request::builder()
        .method("POST")
        .uri("/cajas")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("not json"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["ok"], json!(false));

    // Missing required query parameter.
    let (status, body) = app
        .request("GET", "/reportes/mensual", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], json!(false));
}

// =============================================================================
// Operator administration
// =============================================================================

#[tokio::test]
async fn operator_creation_is_admin_only() {
    let app = TestApp::new().await;
    app.seed_operator("op@example.com", "secreta1", OperatorRole::Operator)
        .await;
    app.seed_operator("admin@example.com", "secreta1", OperatorRole::Admin)
        .await;
    let op_token = app.login("op@example.com", "secreta1").await;
    let admin_token = app.login("admin@example.com", "secreta1").await;

    let new_operator = json!({
        "name": "Nueva",
        "email": "nueva@example.com",
        "password": "contraseña",
        "role": "operator"
    });

    let (status, _) = app
        .request("POST", "/operadores", Some(&op_token), Some(new_operator.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request(
            "POST",
            "/operadores",
            Some(&admin_token),
            Some(new_operator.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], json!("nueva@example.com"));
    // The credential never leaves the data layer.
    assert!(body["data"].get("password_hash").is_none());

    // The new account works end to end.
    let token = app.login("nueva@example.com", "contraseña").await;
    assert!(!token.is_empty());

    // Duplicate email is a conflict.
    let (status, _) = app
        .request("POST", "/operadores", Some(&admin_token), Some(new_operator))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn operator_creation_rejects_short_passwords() {
    let app = TestApp::new().await;
    app.seed_operator("admin@example.com", "secreta1", OperatorRole::Admin)
        .await;
    let token = app.login("admin@example.com", "secreta1").await;

    let (status, body) = app
        .request(
            "POST",
            "/operadores",
            Some(&token),
            Some(json!({
                "name": "Corta",
                "email": "corta@example.com",
                "password": "corta",
                "role": "operator"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], json!(false));
}
