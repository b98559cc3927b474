//! # Domain Types
//!
//! Core domain types for the Caja backend.
//!
//! ## Entities
//!
//! - [`CashSession`] - one operator shift at the register ("caja")
//! - [`Sale`] / [`Expense`] - cash movements attributable to a session
//! - [`SafeMovement`] - one row of the append-only safe ledger ("caja fuerte")
//! - [`ExpenseCategory`] / [`ExpenseSubcategory`] - reference lists
//! - [`Operator`] - an authenticated register operator
//!
//! ## Wire values
//! Enum spellings on the wire and in the database keep the values the retail
//! frontend already speaks (`mañana`/`tarde`, `EFECTIVO`, `DEPOSITO`, ...);
//! Rust-side names are English. Every monetary field is integer cents with a
//! `_cents` suffix; accessor methods return [`Money`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Enums
// =============================================================================

/// Shift label of a cash session. The store runs two fixed shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum Shift {
    #[serde(rename = "mañana")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "mañana"))]
    Morning,
    #[serde(rename = "tarde")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "tarde"))]
    Afternoon,
}

/// Lifecycle state of a cash session.
///
/// The only transition is `Open -> Closed`, performed exclusively by the
/// close operation. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum SessionStatus {
    #[serde(rename = "abierta")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "abierta"))]
    Open,
    #[serde(rename = "cerrada")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cerrada"))]
    Closed,
}

/// Payment methods accepted at the register.
///
/// This domain is closed: reporting enumerates all six methods even when a
/// method saw no activity in the period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum PaymentMethod {
    #[serde(rename = "EFECTIVO")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "EFECTIVO"))]
    Cash,
    #[serde(rename = "TARJETA")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "TARJETA"))]
    Card,
    #[serde(rename = "BANCOLOMBIA")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "BANCOLOMBIA"))]
    Bancolombia,
    #[serde(rename = "NEQUI")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "NEQUI"))]
    Nequi,
    #[serde(rename = "DAVIPLATA")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "DAVIPLATA"))]
    Daviplata,
    #[serde(rename = "A LA MANO")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "A LA MANO"))]
    ALaMano,
}

impl PaymentMethod {
    /// Every accepted method, in reporting order.
    pub const ALL: [PaymentMethod; 6] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Bancolombia,
        PaymentMethod::Nequi,
        PaymentMethod::Daviplata,
        PaymentMethod::ALaMano,
    ];
}

/// Sales channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum SaleChannel {
    /// Sold through social media / online.
    #[serde(rename = "REDES")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "REDES"))]
    Online,
    /// Sold over the counter.
    #[serde(rename = "ALMACEN")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "ALMACEN"))]
    InStore,
}

/// Direction of a safe-ledger movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum MovementKind {
    #[serde(rename = "DEPOSITO")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "DEPOSITO"))]
    Deposit,
    #[serde(rename = "RETIRO")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "RETIRO"))]
    Withdrawal,
}

impl MovementKind {
    /// Applies a movement of `amount` to `balance`.
    ///
    /// This is the ledger invariant in executable form:
    /// `balance_after = balance_before + amount` for deposits,
    /// `balance_before - amount` for withdrawals.
    #[inline]
    pub fn apply(&self, balance: Money, amount: Money) -> Money {
        match self {
            MovementKind::Deposit => balance.saturating_add(amount),
            MovementKind::Withdrawal => balance - amount,
        }
    }
}

/// Role of an authenticated operator. Derived from the verified token,
/// never from request payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
pub enum OperatorRole {
    Admin,
    Operator,
}

// =============================================================================
// Cash Session
// =============================================================================

/// A cash-register session ("caja").
///
/// Invariants:
/// - at most one session with status `Open` per operator at any time
/// - `closed_at`, `closing_float_cents` and `variance_cents` are all null
///   iff the status is `Open`
/// - never hard-deleted; `is_active` is the soft-delete flag
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CashSession {
    pub id: i64,
    pub operator_id: i64,
    pub shift: Shift,
    pub status: SessionStatus,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Cash float counted into the drawer at opening.
    pub opening_float_cents: i64,
    /// Cash counted at closing; null while open.
    pub closing_float_cents: Option<i64>,
    /// Sum of active sales linked to the session, persisted at close.
    pub sales_total_cents: i64,
    /// Sum of active expenses linked to the session, persisted at close.
    pub expenses_total_cents: i64,
    /// `closing_float - (opening_float + sales - expenses)`; null while open.
    pub variance_cents: Option<i64>,
    pub opening_notes: Option<String>,
    pub closing_notes: Option<String>,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl CashSession {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }

    #[inline]
    pub fn opening_float(&self) -> Money {
        Money::from_cents(self.opening_float_cents)
    }

    #[inline]
    pub fn variance(&self) -> Option<Money> {
        self.variance_cents.map(Money::from_cents)
    }

    /// True when the session closed with no difference between counted and
    /// expected cash.
    #[inline]
    pub fn exact_reconciliation(&self) -> bool {
        self.variance_cents == Some(0)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A registered sale. May be recorded with no open session, in which case
/// `session_id` is null and the sale never enters any reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: i64,
    /// Invoice number or free-text description.
    pub description: String,
    pub channel: SaleChannel,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub recorded_at: DateTime<Utc>,
    pub operator_id: i64,
    pub session_id: Option<i64>,
    /// Id of the originating inventory-exit record, when the sale was
    /// produced by an exit of stock. Opaque to this service.
    pub exit_reference: Option<i64>,
    pub notes: Option<String>,
    pub is_active: bool,
}

impl Sale {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Expense
// =============================================================================

/// A registered expense. References exactly one category and at most one
/// subcategory; the subcategory must belong to the category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Expense {
    pub id: i64,
    pub description: String,
    pub category_id: i64,
    pub subcategory_id: Option<i64>,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub recorded_at: DateTime<Utc>,
    pub operator_id: i64,
    pub session_id: Option<i64>,
    pub is_active: bool,
}

impl Expense {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Safe Ledger
// =============================================================================

/// One row of the cash-safe ledger ("caja fuerte").
///
/// The ledger is append-only: `balance_before_cents` of a new movement
/// equals `balance_after_cents` of the most recent prior active movement,
/// and the current balance is the `balance_after_cents` of the latest
/// active movement (zero when the ledger is empty). Rows are created only
/// through the registration operation so the chain stays consistent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SafeMovement {
    pub id: i64,
    pub kind: MovementKind,
    pub amount_cents: i64,
    pub description: String,
    pub operator_id: i64,
    pub session_id: Option<i64>,
    pub balance_before_cents: i64,
    pub balance_after_cents: i64,
    pub recorded_at: DateTime<Utc>,
    pub is_active: bool,
}

impl SafeMovement {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    #[inline]
    pub fn balance_after(&self) -> Money {
        Money::from_cents(self.balance_after_cents)
    }
}

// =============================================================================
// Expense Categories
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ExpenseCategory {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ExpenseSubcategory {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
}

// =============================================================================
// Operator
// =============================================================================

/// Public profile of a register operator. The password hash never leaves
/// the data layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Operator {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: OperatorRole,
    pub is_active: bool,
}

// =============================================================================
// Report Rows
// =============================================================================

/// Grouped sales for one payment method over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MethodSummary {
    pub method: PaymentMethod,
    pub total_cents: i64,
    pub count: i64,
}

/// Grouped expenses for one category over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CategorySummary {
    pub category: String,
    pub total_cents: i64,
    pub count: i64,
}

/// One day of the sales-vs-expenses rollup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DailyReportRow {
    /// `YYYY-MM-DD`
    pub day: String,
    pub sales_cents: i64,
    pub expenses_cents: i64,
    pub difference_cents: i64,
}

/// One month of the sales-vs-expenses rollup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MonthlyReportRow {
    /// `YYYY-MM`
    pub month: String,
    pub sales_cents: i64,
    pub expenses_cents: i64,
    pub difference_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
