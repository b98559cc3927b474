//! # Error Types
//!
//! Domain-specific error types for caja-core.
//!
//! ## Error Flow
//! ```text
//! ValidationError ──► CoreError ──► DbError (caja-db) ──► ApiError (caja-api)
//! ```
//!
//! Each layer adds its own context; the API layer maps the final error onto
//! the uniform response envelope. Errors are enum variants, never strings.

use thiserror::Error;

use crate::types::MovementKind;

// =============================================================================
// Core Error
// =============================================================================

/// Business-rule violations and domain logic failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The operator already has an open session; a second one may not be
    /// opened until the first is closed.
    #[error("operator {operator_id} already has an open cash session (id {session_id})")]
    SessionAlreadyOpen { operator_id: i64, session_id: i64 },

    /// No session with this id is currently open. Raised both for unknown
    /// ids and for sessions that were already closed, which makes a second
    /// close of the same session fail deliberately.
    #[error("no open cash session with id {0}")]
    SessionNotOpen(i64),

    /// A withdrawal may not exceed what the safe currently holds.
    #[error("withdrawal of {requested_cents} cents exceeds safe balance of {balance_cents} cents")]
    InsufficientSafeBalance {
        balance_cents: i64,
        requested_cents: i64,
    },

    /// Only the latest active movement may be soft-deleted; removing an
    /// interior movement would invalidate every later balance pair.
    #[error("movement {id} ({kind:?}) is not the latest ledger entry and cannot be deleted")]
    MovementNotDeletable { id: i64, kind: MovementKind },

    /// The referenced subcategory does not belong to the referenced category.
    #[error("subcategory {subcategory_id} does not belong to category {category_id}")]
    SubcategoryMismatch {
        subcategory_id: i64,
        category_id: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation failures, raised before any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Monetary amounts must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Monetary amounts must not be negative (zero allowed).
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (unparseable date, malformed enum value, ...).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// The start of a date range lies after its end.
    #[error("date range is inverted: {from} is after {to}")]
    InvertedRange { from: String, to: String },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
