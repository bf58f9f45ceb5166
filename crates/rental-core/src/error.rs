//! # Error Types
//!
//! Domain-specific error types for rental-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  rental-core errors (this file)                                        │
//! │  ├── CoreError        - NotFound + wrapped validation failures          │
//! │  └── ValidationError  - Business rule violations (always recoverable)   │
//! │                                                                         │
//! │  rental-db errors (separate crate)                                     │
//! │  ├── DbError          - Store failures (propagated, never retried)      │
//! │  └── ServiceError     - What callers see: Validation | NotFound | Store │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → caller             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Carry structure, not prose: a conflict names product, day, available
//!    and requested so the caller can adjust and retry
//! 3. Overbooking reports every conflict at once, never just the first

use chrono::NaiveDate;
use thiserror::Error;

use crate::availability::{Conflict, StockShortage};
use crate::types::RentalStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced entity (product, rental, customer, payment) does not exist.
    ///
    /// Not retryable without different input.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Business rule violations.
///
/// Every variant is recoverable: the caller may retry with adjusted items,
/// dates or quantities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Value has the wrong shape.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A textual value does not name a known variant.
    #[error("unknown {field}: {value}")]
    UnknownValue { field: String, value: String },

    /// `end` is not strictly after `start`.
    #[error("end date {end} must be after start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// The rental contains RENTAL-kind items but no complete date range.
    #[error("start and end dates are required for rental items")]
    MissingDates,

    /// Requested quantities exceed availability on one or more days.
    ///
    /// ## User Workflow
    /// ```text
    /// Request 50 chairs for Jan 10-12
    ///      │
    ///      ▼
    /// Scan every day × every item
    ///      │
    ///      ▼
    /// Unavailable { conflicts: [
    ///     (chair, Jan 10, available 40, requested 50),
    ///     (chair, Jan 11, available 40, requested 50),
    /// ] }
    ///      │
    ///      ▼
    /// UI lowers the quantity to 40 once and retries
    /// ```
    #[error("insufficient availability: {}", describe_conflicts(.conflicts))]
    Unavailable { conflicts: Vec<Conflict> },

    /// Completing the order would sell more than the remaining sale stock.
    #[error("insufficient sale stock: {}", describe_shortages(.shortages))]
    InsufficientSaleStock { shortages: Vec<StockShortage> },

    /// Lowering stock would leave already committed quantities uncovered.
    ///
    /// `committed` is the peak reserved quantity for RENTAL products (with
    /// the short `days`) or the quantity held by open rentals for SALE ones.
    #[error("stock of {product_id} cannot drop to {total_qty}: {committed} already committed")]
    StockBelowCommitted {
        product_id: String,
        total_qty: i64,
        committed: i64,
        days: Vec<NaiveDate>,
    },

    /// The lifecycle does not allow moving between these states.
    #[error("cannot move rental from {from} to {to}")]
    InvalidTransition { from: RentalStatus, to: RentalStatus },

    /// Items and dates can only be replaced before completion or cancellation.
    #[error("rental is {status} and can no longer be edited")]
    NotEditable { status: RentalStatus },
}

impl ValidationError {
    /// Returns the full conflict list for availability failures.
    pub fn conflicts(&self) -> Option<&[Conflict]> {
        match self {
            ValidationError::Unavailable { conflicts } => Some(conflicts),
            _ => None,
        }
    }
}

fn describe_conflicts(conflicts: &[Conflict]) -> String {
    conflicts
        .iter()
        .map(|c| {
            format!(
                "{} on {}: available {}, requested {}",
                c.product_id, c.day, c.available, c.requested
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe_shortages(shortages: &[StockShortage]) -> String {
    shortages
        .iter()
        .map(|s| {
            format!(
                "{}: available {}, requested {}",
                s.product_id, s.available, s.requested
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_unavailable_message_lists_every_conflict() {
        let err = ValidationError::Unavailable {
            conflicts: vec![
                Conflict {
                    product_id: "chair".to_string(),
                    day: day(10),
                    available: 40,
                    requested: 50,
                },
                Conflict {
                    product_id: "chair".to_string(),
                    day: day(11),
                    available: 40,
                    requested: 50,
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "insufficient availability: chair on 2024-01-10: available 40, requested 50; \
             chair on 2024-01-11: available 40, requested 50"
        );
        assert_eq!(err.conflicts().map(<[Conflict]>::len), Some(2));
    }

    #[test]
    fn test_transition_message() {
        let err = ValidationError::InvalidTransition {
            from: RentalStatus::Canceled,
            to: RentalStatus::Confirmed,
        };
        assert_eq!(err.to_string(), "cannot move rental from canceled to confirmed");
        assert!(err.conflicts().is_none());
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MissingDates;
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }

    #[test]
    fn test_not_found_message() {
        let err = CoreError::not_found("Rental", "abc");
        assert_eq!(err.to_string(), "Rental not found: abc");
    }
}
