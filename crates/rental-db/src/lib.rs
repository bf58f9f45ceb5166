//! # rental-db: Store and Engine Services for the Rental Manager
//!
//! SQLite storage (through sqlx) plus the services that enforce booking
//! availability, the rental lifecycle and payment reconciliation on top of
//! it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Rental Engine Data Flow                          │
//! │                                                                         │
//! │  Caller (UI command, script, seed binary)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    rental-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Services    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │ (service/)    │───►│ (repository/) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ Availability  │    │ ProductRepo   │    │ 001_initial  │  │   │
//! │  │   │ Rental        │    │ RentalRepo    │    │   _schema    │  │   │
//! │  │   │ Payment       │    │ PaymentRepo   │    │              │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │ rules                                              │   │
//! │  │           ▼                                                    │   │
//! │  │      rental-core (ranges, ledger, lifecycle, payment status)   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, write transactions, service accessors
//! - [`config`] - Layered engine configuration (defaults, TOML, env)
//! - [`migrations`] - Embedded database migrations
//! - [`lock`] - Lock ordering for commit paths
//! - [`repository`] - Row-level access to products, customers, rentals, payments, reports
//! - [`service`] - Availability, classification, lifecycle, payments, reports
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rental_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/rental.db")).await?;
//!
//! let rental = db.rentals().create_draft(draft).await?;
//! if let Err(err) = db.rentals().confirm(&rental.id).await {
//!     for c in err.conflicts().unwrap_or_default() {
//!         println!("{} on {}: {} available, {} requested", c.product_id, c.day, c.available, c.requested);
//!     }
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod lock;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, EngineConfig};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::customer::CustomerRepository;
pub use repository::payment::PaymentRepository;
pub use repository::product::ProductRepository;
pub use repository::rental::RentalRepository;
pub use repository::report::ReportRepository;

pub use service::{
    AvailabilityService, CatalogService, OrderClassifier, PaymentService, RentalService,
    ReportService, ServiceError, ServiceResult,
};

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,rental=debug,sqlx=warn";

/// Installs a `tracing` subscriber for binaries. Later calls are no-ops.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
