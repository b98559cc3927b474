//! # Reconciliation Engine
//!
//! The cash math of the system: what the drawer *should* hold, how far the
//! counted cash is from that, and how the safe-ledger balance chains from
//! movement to movement.
//!
//! Everything here is a pure function over [`Money`]. The data layer feeds
//! in summed cents; no query, clock or locking concern leaks into this
//! module, which is what makes the close algorithm auditable.
//!
//! ## The close algorithm
//! ```text
//! expected = opening_float + sales_total - expenses_total
//! variance = closing_float - expected
//! exact    = variance == 0
//! ```
//! A positive variance means the drawer holds more than expected (overage),
//! a negative one that it is short.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{MethodSummary, PaymentMethod};

// =============================================================================
// Session Totals
// =============================================================================

/// Live totals for an open session, also the first half of the close
/// computation. Usable before close as a preview and by the close operation
/// itself, so both paths agree by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTotals {
    pub sales_total_cents: i64,
    pub expenses_total_cents: i64,
    /// `opening_float + sales_total - expenses_total`
    pub net_expected_cents: i64,
}

impl SessionTotals {
    /// Computes the totals preview from the opening float and the summed
    /// active sales/expenses linked to the session.
    pub fn compute(opening_float: Money, sales_total: Money, expenses_total: Money) -> Self {
        let net_expected = opening_float + sales_total - expenses_total;
        SessionTotals {
            sales_total_cents: sales_total.cents(),
            expenses_total_cents: expenses_total.cents(),
            net_expected_cents: net_expected.cents(),
        }
    }

    #[inline]
    pub fn net_expected(&self) -> Money {
        Money::from_cents(self.net_expected_cents)
    }
}

// =============================================================================
// Closing Figures
// =============================================================================

/// The full result of reconciling a session at close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingFigures {
    pub sales_total_cents: i64,
    pub expenses_total_cents: i64,
    pub expected_cents: i64,
    pub variance_cents: i64,
    /// True when counted cash matches expected cash exactly.
    pub exact_reconciliation: bool,
}

/// Reconciles a closing count against the session's activity.
///
/// This is the single canonical close computation; the data layer persists
/// its outputs verbatim inside the closing transaction.
pub fn close_figures(
    opening_float: Money,
    sales_total: Money,
    expenses_total: Money,
    closing_float: Money,
) -> ClosingFigures {
    let totals = SessionTotals::compute(opening_float, sales_total, expenses_total);
    let variance = closing_float - totals.net_expected();

    ClosingFigures {
        sales_total_cents: totals.sales_total_cents,
        expenses_total_cents: totals.expenses_total_cents,
        expected_cents: totals.net_expected_cents,
        variance_cents: variance.cents(),
        exact_reconciliation: variance.is_zero(),
    }
}

// =============================================================================
// Payment-Method Summary Completion
// =============================================================================

/// Zero-fills a grouped payment-method summary so the closed method domain
/// is fully enumerated, in [`PaymentMethod::ALL`] order.
///
/// The store only returns methods with activity; callers should not have to
/// know which methods exist to render a complete report.
pub fn complete_method_summary(rows: Vec<MethodSummary>) -> Vec<MethodSummary> {
    PaymentMethod::ALL
        .iter()
        .map(|&method| {
            rows.iter()
                .find(|r| r.method == method)
                .cloned()
                .unwrap_or(MethodSummary {
                    method,
                    total_cents: 0,
                    count: 0,
                })
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
