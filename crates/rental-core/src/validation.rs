//! # Validation Module
//!
//! Input validation for rentals, items, products and payments.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (UI, script, API)                                     │
//! │  └── Deserialization into typed inputs (RentalDraft, PaymentInput)     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE: shape rules                                     │
//! │  ├── qty > 0, prices >= 0, amounts > 0                                 │
//! │  └── dates: both or neither, end > start, required for rental items    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Services: stock rules (availability, sale stock)             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database (SQLite) CHECK / FOREIGN KEY constraints            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rental_core::validation::{validate_payment_amount, validate_quantity};
//!
//! validate_quantity(60).unwrap();
//! assert!(validate_payment_amount(0).is_err());
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::period::DateRange;
use crate::money::Money;
use crate::types::{ItemRequest, RentalDraft};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn validate_name(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Example
/// ```rust
/// use rental_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Folding chair").is_ok());
/// assert!(validate_product_name("   ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_name("name", name, 200)
}

pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    validate_name("customer name", name, 200)
}

/// Validates an optional free-text field (address, note, method).
pub fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(text) if text.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity. Must be positive.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a physical stock count. Zero is allowed.
pub fn validate_stock_qty(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "total_qty".to_string(),
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed (free items).
///
/// ## Example
/// ```rust
/// use rental_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(350).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "unit price".to_string(),
        });
    }

    Ok(())
}

/// Validates a payment amount in cents. Must be > 0.
pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Rental Validators
// =============================================================================

fn amount_overflow(field: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
}

/// Validates the item list of a rental.
///
/// ## Rules
/// - At least one item
/// - Every line has a product, a positive quantity and a non-negative price
/// - Line totals and their sum fit in an `i64` of cents
pub fn validate_items(items: &[ItemRequest]) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    let mut total = Money::zero();
    for item in items {
        if item.product_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "product_id".to_string(),
            });
        }
        validate_quantity(item.qty)?;
        validate_price_cents(item.unit_price_cents)?;

        let line_total = item
            .checked_line_total()
            .ok_or_else(|| amount_overflow("line total"))?;
        total = total
            .checked_add(line_total)
            .ok_or_else(|| amount_overflow("total"))?;
    }

    Ok(())
}

/// Validates the booking dates of a rental.
///
/// ## Rules
/// ```text
/// start  end    rental items?   result
/// ─────  ─────  ─────────────   ──────────────────────
///  -      -     no              Ok(None)
///  -      -     yes             MissingDates
///  x      -     any             MissingDates
///  x      y     any             Ok(Some([x, y))) if y > x
/// ```
pub fn validate_rental_dates(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    has_rental_items: bool,
) -> ValidationResult<Option<DateRange>> {
    let range = DateRange::from_optional(start, end)?;

    match range {
        None if has_rental_items => Err(ValidationError::MissingDates),
        _ => Ok(range),
    }
}

/// Shape checks on a whole draft that do not need the catalogue.
pub fn validate_draft(draft: &RentalDraft) -> ValidationResult<()> {
    validate_uuid(&draft.customer_id)?;
    validate_items(&draft.items)?;
    validate_optional_text("address", draft.address.as_deref(), 500)?;
    validate_optional_text("contact_phone", draft.contact_phone.as_deref(), 50)?;

    if let Some(total) = draft.total_override {
        if total.is_negative() {
            return Err(ValidationError::MustNotBeNegative {
                field: "total".to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use rental_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
