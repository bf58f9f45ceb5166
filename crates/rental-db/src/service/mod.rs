//! # Engine Services
//!
//! The operations callers use. Each service holds a cloned [`Database`]
//! handle and opens its own connection or transaction per call.
//!
//! ```text
//! ┌──────────────────────┬──────────────────────────────────────────────────┐
//! │ Service              │ Operations                                       │
//! ├──────────────────────┼──────────────────────────────────────────────────┤
//! │ AvailabilityService  │ reserved / available qty, conflict validation    │
//! │ OrderClassifier      │ rental / sale / service partition                │
//! │ RentalService        │ create, update, confirm, cancel, complete        │
//! │ PaymentService       │ add / update / delete payment, reconcile         │
//! │ CatalogService       │ products, stock adjustments, customers           │
//! │ ReportService        │ finance totals, monthly series, top products     │
//! └──────────────────────┴──────────────────────────────────────────────────┘
//! ```
//!
//! [`Database`]: crate::pool::Database

pub mod availability;
pub mod catalog;
pub mod classifier;
pub mod error;
pub mod payment;
pub mod rental;
pub mod report;

#[cfg(test)]
pub(crate) mod test_support;

pub use availability::AvailabilityService;
pub use catalog::CatalogService;
pub use classifier::OrderClassifier;
pub use error::{ServiceError, ServiceResult};
pub use payment::PaymentService;
pub use rental::RentalService;
pub use report::ReportService;
