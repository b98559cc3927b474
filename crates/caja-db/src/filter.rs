//! # Query Filters
//!
//! Explicit, enumerated filter structs, one per list query. The system
//! this replaces built WHERE clauses from free-form request objects; here
//! every filterable field is a typed `Option`, so a query can only be
//! narrowed along the axes its repository actually supports.
//!
//! Dates are `YYYY-MM-DD` strings (validated at the API boundary) and are
//! compared against `date(recorded_at)` / `date(opened_at)`, so both ends
//! of a range are inclusive whole days.

use caja_core::{MovementKind, PaymentMethod, SaleChannel, SessionStatus, Shift};

/// Inclusive calendar-day range. Either end may be open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl DateRange {
    pub fn new(from: Option<String>, to: Option<String>) -> Self {
        DateRange { from, to }
    }
}

/// Filter for cash-session listings.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub operator_id: Option<i64>,
    pub status: Option<SessionStatus>,
    pub shift: Option<Shift>,
    /// Applied to the opening timestamp.
    pub opened: DateRange,
}

/// Filter for sale listings.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub session_id: Option<i64>,
    pub method: Option<PaymentMethod>,
    pub channel: Option<SaleChannel>,
    pub recorded: DateRange,
}

/// Filter for expense listings.
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub session_id: Option<i64>,
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
    pub method: Option<PaymentMethod>,
    pub recorded: DateRange,
}

/// Filter for safe-movement listings.
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub kind: Option<MovementKind>,
    pub operator_id: Option<i64>,
    pub session_id: Option<i64>,
    pub recorded: DateRange,
}
