//! # caja-api: REST API for the Caja Backend
//!
//! axum HTTP server over the caja-db repositories.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      caja-api server                        │
//! │                                                             │
//! │  frontend ──► axum router ──► handlers ──► repositories     │
//! │                   │               │            │            │
//! │                   │           validation    SQLite          │
//! │                   ▼           (caja-core)                   │
//! │             trace layer                                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The library exposes [`routes::build_router`] and [`state::AppState`] so
//! integration tests can drive the full service in memory.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod response;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::build_router;
pub use state::AppState;
