//! # rental-core: Pure Booking Logic for the Rental Engine
//!
//! This crate is the **heart** of the rental engine. It decides whether a set
//! of physical, date-ranged items can be committed without any product ever
//! being over-committed on any day. Everything here is a pure function over
//! plain data: the storage crate loads rows, this crate decides.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Rental Engine Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               Callers (desktop UI, scripts, API)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        rental-db services (transactions, lock ordering)         │   │
//! │  │   AvailabilityService  RentalService  PaymentService            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ rental-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌──────────────┐ ┌──────────┐ ┌───────────────┐   │   │
//! │  │  │  types  │ │ availability │ │ classify │ │   lifecycle   │   │   │
//! │  │  │ period  │ │   ledger     │ │          │ │    payment    │   │   │
//! │  │  └─────────┘ └──────────────┘ └──────────┘ └───────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entity model (Product, Rental, RentalItem, Payment, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`period`] - Half-open calendar ranges `[start, end)`
//! - [`availability`] - Reservation ledger and the day-by-day conflict scan
//! - [`classify`] - Partition of items by product kind
//! - [`lifecycle`] - Rental status state machine
//! - [`payment`] - Paid total and payment status derivation
//! - [`report`] - Finance report periods and rows
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use rental_core::availability::{scan_conflicts, ReservationLedger, ReservationSpan};
//! use rental_core::period::DateRange;
//! use std::collections::BTreeMap;
//!
//! let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
//! let range = DateRange::new(day(10), day(12)).unwrap();
//!
//! // 60 chairs already confirmed for the same two days
//! let ledger = ReservationLedger::from_spans(vec![ReservationSpan {
//!     product_id: "chair".into(),
//!     start: day(10),
//!     end: day(12),
//!     qty: 60,
//! }]);
//!
//! let requested = BTreeMap::from([("chair".to_string(), 50)]);
//! let stock = BTreeMap::from([("chair".to_string(), 100)]);
//!
//! let conflicts = scan_conflicts(&requested, &stock, &ledger, range).unwrap();
//! assert_eq!(conflicts.len(), 2); // one per short day
//! assert_eq!(conflicts[0].available, 40);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod availability;
pub mod classify;
pub mod error;
pub mod lifecycle;
pub mod money;
pub mod payment;
pub mod period;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use availability::{Conflict, ReservationLedger, ReservationSpan, StockShortage};
pub use classify::{ClassifiedItems, MissingProductPolicy};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use payment::PaymentSummary;
pub use period::DateRange;
pub use report::{FinanceReport, MonthlyMetric, RankedProduct, RentalFinanceRow, ReportPeriod};
pub use types::*;
