//! # Finance Reports
//!
//! Read-only views over reconciled rentals and payments.
//!
//! ## Which Date Counts
//! ```text
//!   rental row      → COALESCE(start_date, event_date)   (order date)
//!   payment row     → paid_at (payments without it are not reported)
//!   canceled rental → never reported
//! ```
//!
//! Periods are inclusive on both ends, so `[Jan 1, Jan 31]` is the whole of
//! January.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{PaymentStatus, RentalStatus};

/// Inclusive `[from, to]` calendar period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ReportPeriod {
    #[ts(as = "String")]
    from: NaiveDate,
    #[ts(as = "String")]
    to: NaiveDate,
}

impl ReportPeriod {
    /// Fails when `to` is before `from`. A single day is allowed.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, ValidationError> {
        if to < from {
            return Err(ValidationError::InvalidDateRange {
                start: from,
                end: to,
            });
        }
        Ok(ReportPeriod { from, to })
    }

    #[inline]
    pub fn first_day(&self) -> NaiveDate {
        self.from
    }

    /// Last day included.
    #[inline]
    pub fn last_day(&self) -> NaiveDate {
        self.to
    }
}

/// Totals for one period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FinanceReport {
    /// Σ payments whose `paid_at` falls in the period.
    pub received_cents: i64,
    /// Σ outstanding balance of CONFIRMED rentals in the period.
    pub to_receive_cents: i64,
    /// Non-canceled rentals in the period.
    pub rentals_count: i64,
}

impl FinanceReport {
    pub fn received(&self) -> Money {
        Money::from_cents(self.received_cents)
    }

    pub fn to_receive(&self) -> Money {
        Money::from_cents(self.to_receive_cents)
    }
}

/// One rental as it appears in a finance listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RentalFinanceRow {
    pub rental_id: String,
    pub customer_name: String,
    #[ts(as = "String")]
    pub event_date: NaiveDate,
    #[ts(as = "Option<String>")]
    pub start_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub end_date: Option<NaiveDate>,
    pub status: RentalStatus,
    pub payment_status: PaymentStatus,
    pub total_cents: i64,
    pub paid_cents: i64,
}

/// One month (`YYYY-MM`) of a series. `value` is cents or a count,
/// depending on the series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthlyMetric {
    pub month: String,
    pub value: i64,
}

/// One product in a top-N ranking. `value` is a quantity or cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RankedProduct {
    pub product_id: String,
    pub name: String,
    pub value: i64,
}
