//! # Domain Types
//!
//! The entity model of the rental engine. Pure data plus the invariants each
//! record carries; behaviour lives in [`crate::availability`],
//! [`crate::lifecycle`] and [`crate::payment`].
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Rental      │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄┐ │  id (UUID)      │◄──│  rental_id (FK) │       │
//! │  │  name (unique)  │ │ │  status         │   │  amount_cents   │       │
//! │  │  kind           │ │ │  start..end     │   └─────────────────┘       │
//! │  │  total_qty      │ │ │  total / paid   │                             │
//! │  └─────────────────┘ │ └────────┬────────┘                             │
//! │                      │          │ owns 1:N (cascade)                    │
//! │                      │ ┌────────▼────────┐                             │
//! │                      └─│   RentalItem    │  product referenced by id   │
//! │                        │  qty, unit/line │  only (no back-pointer)     │
//! │                        └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! - `id`: UUID v4 - immutable, used for relations and lock ordering
//! - Business ID: product `name` - human-readable, unique, potentially mutable

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::period::DateRange;

// =============================================================================
// Product Kind
// =============================================================================

/// How a product consumes stock.
///
/// ```text
/// RENTAL   date-ranged reservation, returned after the booking
/// SALE     permanent decrement of total_qty at completion
/// SERVICE  unconstrained, never blocks or consumes
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Rental,
    Sale,
    Service,
}

impl ProductKind {
    /// Returns true if the product has a physical stock to check.
    pub fn is_stock_tracked(&self) -> bool {
        !matches!(self, ProductKind::Service)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::Rental => "rental",
            ProductKind::Sale => "sale",
            ProductKind::Service => "service",
        }
    }
}

impl Default for ProductKind {
    fn default() -> Self {
        ProductKind::Rental
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rental" => Ok(ProductKind::Rental),
            "sale" => Ok(ProductKind::Sale),
            "service" => Ok(ProductKind::Service),
            other => Err(ValidationError::UnknownValue {
                field: "kind".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalogue product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, unique across the catalogue.
    pub name: String,

    pub category: Option<String>,

    pub kind: ProductKind,

    /// Physical stock. Ignored for SERVICE products.
    pub total_qty: i64,

    /// Default price per unit, in cents.
    pub unit_price_cents: i64,

    /// Whether the product is listed (soft delete).
    pub active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the default unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub kind: ProductKind,
    pub total_qty: i64,
    #[serde(default)]
    pub unit_price_cents: i64,
}

/// Replacement values for an existing product. The kind is fixed at
/// creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub total_qty: i64,
    #[serde(default)]
    pub unit_price_cents: i64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

// =============================================================================
// Customer
// =============================================================================

/// A customer a rental is booked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

// =============================================================================
// Rental Status
// =============================================================================

/// Lifecycle state of a rental. Transition rules live in [`crate::lifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RentalStatus {
    /// Tentative; does not block other rentals.
    Draft,
    /// Committed; blocks stock for its date range.
    Confirmed,
    /// Terminal; blocks nothing.
    Canceled,
    /// Terminal; still counted as blocking for its range.
    Completed,
}

impl Default for RentalStatus {
    fn default() -> Self {
        RentalStatus::Draft
    }
}

impl RentalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RentalStatus::Draft => "draft",
            RentalStatus::Confirmed => "confirmed",
            RentalStatus::Canceled => "canceled",
            RentalStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Derived from `(paid_value, total_value)`; never set by a caller.
/// See [`crate::payment::PaymentSummary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Unpaid
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Rental
// =============================================================================

/// A booking for one customer.
///
/// `start_date`/`end_date` form the half-open range `[start, end)`. They are
/// both present whenever the rental holds at least one RENTAL-kind item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Rental {
    pub id: String,
    pub customer_id: String,
    #[ts(as = "String")]
    pub event_date: NaiveDate,
    #[ts(as = "Option<String>")]
    pub start_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub end_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub contact_phone: Option<String>,
    pub delivery_required: bool,
    pub status: RentalStatus,
    pub total_cents: i64,
    /// Always `Σ payments.amount_cents` for this rental.
    pub paid_cents: i64,
    pub payment_status: PaymentStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Rental {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn paid(&self) -> Money {
        Money::from_cents(self.paid_cents)
    }

    /// Remaining amount to collect (negative when overpaid).
    #[inline]
    pub fn balance_due(&self) -> Money {
        self.total().saturating_sub(self.paid())
    }

    /// Returns the booking range, if the rental has one.
    pub fn date_range(&self) -> Result<Option<DateRange>, ValidationError> {
        DateRange::from_optional(self.start_date, self.end_date)
    }
}

// =============================================================================
// Rental Item
// =============================================================================

/// A persisted line of a rental.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RentalItem {
    pub id: String,
    pub rental_id: String,
    pub product_id: String,
    pub qty: i64,
    pub unit_price_cents: i64,
    /// `qty × unit_price_cents`.
    pub line_total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl RentalItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }

    /// The candidate-item view of this line.
    pub fn to_request(&self) -> ItemRequest {
        ItemRequest {
            product_id: self.product_id.clone(),
            qty: self.qty,
            unit_price_cents: self.unit_price_cents,
        }
    }
}

/// A candidate line submitted by a caller.
///
/// The product kind is never inferred from the payload; it is looked up by
/// [`crate::classify`] in a separate step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemRequest {
    pub product_id: String,
    pub qty: i64,
    #[serde(default)]
    pub unit_price_cents: i64,
}

impl ItemRequest {
    pub fn new(product_id: impl Into<String>, qty: i64, unit_price: Money) -> Self {
        ItemRequest {
            product_id: product_id.into(),
            qty,
            unit_price_cents: unit_price.cents(),
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// `qty × unit_price`, saturating. Validated requests never saturate.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().saturating_mul(self.qty)
    }

    #[inline]
    pub fn checked_line_total(&self) -> Option<Money> {
        self.unit_price().checked_mul(self.qty)
    }
}

/// Everything a caller provides to create or update a rental.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RentalDraft {
    pub customer_id: String,
    #[ts(as = "String")]
    pub event_date: NaiveDate,
    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub delivery_required: bool,
    pub items: Vec<ItemRequest>,
    /// Replaces the computed Σ line totals when set.
    #[serde(default)]
    pub total_override: Option<Money>,
}

impl RentalDraft {
    /// Σ line totals, or the override when one was given.
    pub fn total_value(&self) -> Money {
        self.total_override.unwrap_or_else(|| {
            self.items
                .iter()
                .fold(Money::zero(), |total, item| total.saturating_add(item.line_total()))
        })
    }
}

/// Filters for listing rentals. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RentalFilter {
    pub status: Option<RentalStatus>,
    pub payment_status: Option<PaymentStatus>,
    /// Inclusive lower bound on `event_date`.
    pub event_from: Option<NaiveDate>,
    /// Inclusive upper bound on `event_date`.
    pub event_to: Option<NaiveDate>,
}

// =============================================================================
// Payment
// =============================================================================

/// A payment towards a rental. A rental may be paid in several parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub rental_id: String,
    /// Always > 0.
    pub amount_cents: i64,
    pub method: Option<String>,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<NaiveDate>,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Payment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// Input for recording or editing a payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInput {
    pub amount: Money,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub paid_at: Option<NaiveDate>,
    #[serde(default)]
    pub note: Option<String>,
}

impl PaymentInput {
    pub fn new(amount: Money) -> Self {
        PaymentInput {
            amount,
            method: None,
            paid_at: None,
            note: None,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_defaults() {
        assert_eq!(RentalStatus::default(), RentalStatus::Draft);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Unpaid);
        assert_eq!(ProductKind::default(), ProductKind::Rental);
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("SALE".parse::<ProductKind>().unwrap(), ProductKind::Sale);
        assert_eq!(" service ".parse::<ProductKind>().unwrap(), ProductKind::Service);
        assert!("furniture".parse::<ProductKind>().is_err());
    }

    #[test]
    fn test_enums_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&RentalStatus::Confirmed).unwrap(), "\"confirmed\"");
        assert_eq!(serde_json::to_string(&PaymentStatus::Partial).unwrap(), "\"partial\"");
        assert_eq!(serde_json::to_string(&ProductKind::Sale).unwrap(), "\"sale\"");
    }

    #[test]
    fn test_draft_total_uses_line_totals_unless_overridden() {
        let mut draft = RentalDraft {
            customer_id: "c".to_string(),
            event_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            start_date: None,
            end_date: None,
            address: None,
            contact_phone: None,
            delivery_required: false,
            items: vec![
                ItemRequest::new("chair", 60, Money::from_cents(350)),
                ItemRequest::new("table", 6, Money::from_cents(2000)),
            ],
            total_override: None,
        };
        assert_eq!(draft.total_value(), Money::from_cents(21000 + 12000));

        draft.total_override = Some(Money::from_cents(30000));
        assert_eq!(draft.total_value(), Money::from_cents(30000));
    }
}
