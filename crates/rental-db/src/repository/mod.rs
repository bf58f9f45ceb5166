//! # Repository Module
//!
//! SQL for each table, isolated in one place.
//!
//! ## Borrowed Connections
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every repository borrows a `&mut SqliteConnection` for its lifetime.  │
//! │                                                                         │
//! │  read-only path                      commit path                        │
//! │  ──────────────                      ───────────                        │
//! │  let mut conn = db.acquire()?;       let mut tx = db.begin_write()?;    │
//! │  ProductRepository::new(&mut conn)   lock_rental(&mut tx, id)?;         │
//! │      .get_by_id(id)                  RentalRepository::new(&mut tx)     │
//! │                                          .set_status(id, status)        │
//! │                                      tx.commit()?;                      │
//! │                                                                         │
//! │  The same SQL runs on a pooled connection or inside a transaction,     │
//! │  and a transaction never reaches back to the pool for a second one.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalogue and stock
//! - [`CustomerRepository`](customer::CustomerRepository) - Customers
//! - [`RentalRepository`](rental::RentalRepository) - Rentals, items, reservation sums
//! - [`PaymentRepository`](payment::PaymentRepository) - Payment ledger
//! - [`ReportRepository`](report::ReportRepository) - Finance aggregations

pub mod customer;
pub mod payment;
pub mod product;
pub mod rental;
pub mod report;

use uuid::Uuid;

/// `?, ?, ?` for an `IN (...)` list of `n` binds.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Generates a new entity ID (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[test]
    fn test_generate_id_is_uuid() {
        let id = generate_id();
        assert!(rental_core::validation::validate_uuid(&id).is_ok());
        assert_ne!(id, generate_id());
    }
}
