//! # Availability Arithmetic
//!
//! Decides whether requested quantities fit into physical stock on every day
//! of a booking. The storage layer loads the data; this module only counts.
//!
//! ## Day-by-Day Scan
//! ```text
//!   chair, total_qty = 100
//!
//!   day        10   11   12   13
//!   R1 [10,12) 60   60
//!   R3 [11,14)      30   30   30
//!   ─────────────────────────────
//!   reserved   60   90   30   30
//!   available  40   10   70   70
//!
//!   request 50 chairs for [10,14) → conflicts on day 10 AND day 11
//! ```
//!
//! Overlapping bookings can cover different sub-ranges with different
//! quantities, so a single range sum over- or under-counts. The scan is
//! O(days × items); bookings are short, so this stays cheap.
//!
//! ## Blocking Statuses
//! Only CONFIRMED and COMPLETED rentals reserve stock. Drafts compete freely
//! until one of them confirms; canceled rentals hold nothing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::period::DateRange;
use crate::types::ItemRequest;

// =============================================================================
// Reports
// =============================================================================

/// One product that is short on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Conflict {
    pub product_id: String,
    #[ts(as = "String")]
    pub day: NaiveDate,
    /// What was still free on that day (floored at zero).
    pub available: i64,
    pub requested: i64,
}

/// One SALE product whose remaining stock cannot cover the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockShortage {
    pub product_id: String,
    pub available: i64,
    pub requested: i64,
}

// =============================================================================
// Reservation Ledger
// =============================================================================

/// A blocking reservation of one product over one date range.
///
/// Usually a single rental item joined with its rental's dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationSpan {
    pub product_id: String,
    pub start: NaiveDate,
    /// Exclusive.
    pub end: NaiveDate,
    pub qty: i64,
}

impl ReservationSpan {
    #[inline]
    fn covers(&self, day: NaiveDate) -> bool {
        self.start <= day && day < self.end
    }

    #[inline]
    fn overlaps(&self, range: DateRange) -> bool {
        self.start < range.end() && range.start() < self.end
    }
}

/// In-memory view of the blocking reservations relevant to one validation.
///
/// Loaded with a single query covering every product and the whole range,
/// then queried per day without further round trips.
#[derive(Debug, Clone, Default)]
pub struct ReservationLedger {
    by_product: BTreeMap<String, Vec<ReservationSpan>>,
}

impl ReservationLedger {
    pub fn from_spans(spans: impl IntoIterator<Item = ReservationSpan>) -> Self {
        let mut by_product: BTreeMap<String, Vec<ReservationSpan>> = BTreeMap::new();
        for span in spans {
            by_product
                .entry(span.product_id.clone())
                .or_default()
                .push(span);
        }
        ReservationLedger { by_product }
    }

    /// Quantity of `product_id` held on `day`.
    pub fn reserved_on_day(&self, product_id: &str, day: NaiveDate) -> i64 {
        self.spans(product_id)
            .filter(|span| span.covers(day))
            .fold(0i64, |held, span| held.saturating_add(span.qty))
    }

    /// Quantity of `product_id` held by every span overlapping `range`.
    ///
    /// This is a plain overlap sum: two spans that touch different days of
    /// the range both count. Use [`scan_conflicts`] for commit decisions.
    pub fn reserved_in_range(&self, product_id: &str, range: DateRange) -> i64 {
        self.spans(product_id)
            .filter(|span| span.overlaps(range))
            .fold(0i64, |held, span| held.saturating_add(span.qty))
    }

    pub fn is_empty(&self) -> bool {
        self.by_product.is_empty()
    }

    fn spans<'a>(&'a self, product_id: &str) -> impl Iterator<Item = &'a ReservationSpan> {
        self.by_product
            .get(product_id)
            .into_iter()
            .flat_map(|spans| spans.iter())
    }
}

// =============================================================================
// Operations
// =============================================================================

/// `max(total - reserved, 0)`.
#[inline]
pub fn available_qty(total_qty: i64, reserved: i64) -> i64 {
    (total_qty - reserved).max(0)
}

/// Sums requested quantities per product, keyed in ascending product id.
///
/// Two lines of 30 chairs are one request of 60.
pub fn aggregate_items<'a>(items: impl IntoIterator<Item = &'a ItemRequest>) -> BTreeMap<String, i64> {
    let mut requested = BTreeMap::new();
    for item in items {
        let qty = requested.entry(item.product_id.clone()).or_insert(0i64);
        *qty = qty.saturating_add(item.qty);
    }
    requested
}

/// Scans every day of `range` for every requested product.
///
/// Returns the complete list of conflicts, ordered by product id then day.
/// An empty list means the request fits. `stock` maps product id to
/// `total_qty`; a requested product missing from it is `NotFound`.
pub fn scan_conflicts(
    requested: &BTreeMap<String, i64>,
    stock: &BTreeMap<String, i64>,
    ledger: &ReservationLedger,
    range: DateRange,
) -> CoreResult<Vec<Conflict>> {
    let mut conflicts = Vec::new();

    for (product_id, &qty) in requested {
        let total_qty = *stock
            .get(product_id)
            .ok_or_else(|| CoreError::not_found("Product", product_id.as_str()))?;

        for day in range.days() {
            let available = available_qty(total_qty, ledger.reserved_on_day(product_id, day));
            if qty > available {
                conflicts.push(Conflict {
                    product_id: product_id.clone(),
                    day,
                    available,
                    requested: qty,
                });
            }
        }
    }

    Ok(conflicts)
}

/// Compares requested SALE quantities with what is still sellable.
///
/// `sellable` maps product id to its sale-available quantity.
pub fn sale_shortages(
    requested: &BTreeMap<String, i64>,
    sellable: &BTreeMap<String, i64>,
) -> CoreResult<Vec<StockShortage>> {
    let mut shortages = Vec::new();

    for (product_id, &qty) in requested {
        let available = *sellable
            .get(product_id)
            .ok_or_else(|| CoreError::not_found("Product", product_id.as_str()))?;
        if qty > available {
            shortages.push(StockShortage {
                product_id: product_id.clone(),
                available,
                requested: qty,
            });
        }
    }

    Ok(shortages)
}

/// Checks that `total_qty` still covers every blocking reservation of one
/// product over `range`.
///
/// Fails with every short day and the peak reserved quantity.
pub fn ensure_stock_covers(
    product_id: &str,
    total_qty: i64,
    ledger: &ReservationLedger,
    range: DateRange,
) -> Result<(), ValidationError> {
    let mut peak = 0;
    let mut days = Vec::new();

    for day in range.days() {
        let reserved = ledger.reserved_on_day(product_id, day);
        peak = peak.max(reserved);
        if reserved > total_qty {
            days.push(day);
        }
    }

    if days.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::StockBelowCommitted {
            product_id: product_id.to_string(),
            total_qty,
            committed: peak,
            days,
        })
    }
}

/// Turns a conflict list into the caller-facing result.
pub fn ensure_available(conflicts: Vec<Conflict>) -> Result<(), ValidationError> {
    if conflicts.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Unavailable { conflicts })
    }
}

/// Turns a shortage list into the caller-facing result.
pub fn ensure_sellable(shortages: Vec<StockShortage>) -> Result<(), ValidationError> {
    if shortages.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::InsufficientSaleStock { shortages })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
