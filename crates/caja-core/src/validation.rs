//! # Validation Module
//!
//! Field-level validation run by the API handlers before any repository
//! call. The database enforces its own constraints (NOT NULL, CHECK,
//! unique indexes); this layer exists to reject bad input with a precise,
//! human-readable message instead of a constraint failure.

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_DESCRIPTION_LEN, MAX_NOTES_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a monetary amount that must be strictly positive
/// (sale values, expense values, safe movements).
pub fn validate_positive_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a monetary amount that may be zero but not negative
/// (opening and closing floats).
pub fn validate_non_negative_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a required description field.
pub fn validate_description(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_DESCRIPTION_LEN,
        });
    }

    Ok(())
}

/// Validates optional free-text notes.
pub fn validate_notes(field: &str, value: Option<&str>) -> ValidationResult<()> {
    if let Some(notes) = value {
        if notes.len() > MAX_NOTES_LEN {
            return Err(ValidationError::TooLong {
                field: field.to_string(),
                max: MAX_NOTES_LEN,
            });
        }
    }
    Ok(())
}

/// Validates a `YYYY-MM-DD` date parameter as used by the range filters.
pub fn validate_date(field: &str, value: &str) -> ValidationResult<()> {
    if chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected YYYY-MM-DD".to_string(),
        });
    }
    Ok(())
}

/// Validates that a date range is not inverted. Open-ended ranges are fine.
pub fn validate_date_range(from: Option<&str>, to: Option<&str>) -> ValidationResult<()> {
    if let Some(from) = from {
        validate_date("fecha_inicio", from)?;
    }
    if let Some(to) = to {
        validate_date("fecha_fin", to)?;
    }
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(ValidationError::InvertedRange {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
