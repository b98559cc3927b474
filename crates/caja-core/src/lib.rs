//! # caja-core: Pure Business Logic for the Caja Backend
//!
//! The heart of the system: the cash-register reconciliation algorithm, the
//! safe-ledger balance rules, and the domain types they operate on, all as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! HTTP client ──► apps/caja-api (axum handlers)
//!                      │
//!                      ▼
//!              ★ caja-core (THIS CRATE) ★
//!              money · types · reconcile · validation
//!              NO I/O · NO DATABASE · PURE FUNCTIONS
//!                      │
//!                      ▼
//!                 crates/caja-db (sqlx/SQLite repositories)
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (CashSession, Sale, Expense, SafeMovement, ...)
//! - [`money`] - Money type with integer-cents arithmetic (no floating point)
//! - [`reconcile`] - Session close math and ledger balance derivation
//! - [`validation`] - Field-level business rule validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure functions**: same input, same output
//! 2. **Integer money**: every monetary value is cents (i64); summing sales
//!    and expenses must never drift the way floating point does
//! 3. **Explicit errors**: typed enums, never strings or panics

pub mod error;
pub mod money;
pub mod reconcile;
pub mod types;
pub mod validation;

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use reconcile::{ClosingFigures, SessionTotals};
pub use types::*;

/// Maximum length accepted for sale/expense/movement descriptions.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Maximum length accepted for session opening/closing notes.
pub const MAX_NOTES_LEN: usize = 1000;
