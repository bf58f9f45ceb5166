//! # Lock Ordering
//!
//! Commit paths (create, update, confirm, complete, cancel, payment
//! mutations) serialize on the rows they are about to change:
//!
//! ```text
//!   BEGIN
//!     ├─ lock_rental(R)          UPDATE rentals  SET updated_at = updated_at WHERE id = R
//!     ├─ lock_products([b,a,c])  UPDATE products ... WHERE id = a
//!     │                          UPDATE products ... WHERE id = b
//!     │                          UPDATE products ... WHERE id = c
//!     ├─ read availability
//!     ├─ write status / items / stock
//!   COMMIT
//! ```
//!
//! The touch is a no-op write. On SQLite the first one takes the database
//! write lock, so the availability read and the status write cannot
//! interleave with another writer. On a row-locking engine the same
//! statements take row locks, and ascending product order keeps two
//! multi-product confirms from deadlocking.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Write-locks a rental row. `NotFound` if it does not exist.
pub async fn lock_rental(conn: &mut SqliteConnection, rental_id: &str) -> DbResult<()> {
    let result = sqlx::query("UPDATE rentals SET updated_at = updated_at WHERE id = ?1")
        .bind(rental_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Rental", rental_id));
    }

    debug!(rental_id = %rental_id, "Locked rental");
    Ok(())
}

/// Write-locks product rows in ascending id order.
///
/// Duplicates are touched once. Unknown ids are skipped; validation reports
/// them. Returns the ids in the order they were locked.
pub async fn lock_products<I, S>(conn: &mut SqliteConnection, product_ids: I) -> DbResult<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut ids: Vec<String> = product_ids.into_iter().map(Into::into).collect();
    ids.sort();
    ids.dedup();

    for id in &ids {
        sqlx::query("UPDATE products SET updated_at = updated_at WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }

    debug!(count = ids.len(), "Locked products");
    Ok(ids)
}
