//! # Rental Repository
//!
//! Rentals, their items, and the reservation sums the availability engine
//! reads.
//!
//! ## Overlap Predicate
//! ```text
//!   stored rental  [s, e)     requested [start, end)
//!
//!   overlaps   ⇔  s < end  AND  start < e
//!   covers day ⇔  s <= day AND  day < e
//! ```
//! Dates are ISO TEXT, so these compare correctly in SQL.

use chrono::{NaiveDate, Utc};
use rental_core::lifecycle::{BLOCKING_STATUSES, SALE_HOLDING_STATUSES};
use rental_core::{
    DateRange, ItemRequest, PaymentStatus, Rental, RentalFilter, RentalItem, RentalStatus,
    ReservationSpan,
};
use sqlx::SqliteConnection;
use std::collections::BTreeMap;
use tracing::debug;

use super::{generate_id, placeholders};
use crate::error::{DbError, DbResult};

const RENTAL_COLUMNS: &str = "id, customer_id, event_date, start_date, end_date, address, \
                              contact_phone, delivery_required, status, total_cents, \
                              paid_cents, payment_status, created_at, updated_at";

/// `('confirmed', 'completed')` and the like, for `status IN ...`.
fn status_set(statuses: &[RentalStatus]) -> String {
    let quoted: Vec<String> = statuses.iter().map(|s| format!("'{}'", s.as_str())).collect();
    format!("({})", quoted.join(", "))
}

#[derive(Debug)]
pub struct RentalRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> RentalRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        RentalRepository { conn }
    }

    // =========================================================================
    // Rentals
    // =========================================================================

    pub async fn insert(&mut self, rental: &Rental) -> DbResult<()> {
        debug!(id = %rental.id, status = %rental.status, "Inserting rental");

        sqlx::query(
            r#"
            INSERT INTO rentals (
                id, customer_id, event_date, start_date, end_date, address,
                contact_phone, delivery_required, status, total_cents,
                paid_cents, payment_status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&rental.id)
        .bind(&rental.customer_id)
        .bind(rental.event_date)
        .bind(rental.start_date)
        .bind(rental.end_date)
        .bind(&rental.address)
        .bind(&rental.contact_phone)
        .bind(rental.delivery_required)
        .bind(rental.status)
        .bind(rental.total_cents)
        .bind(rental.paid_cents)
        .bind(rental.payment_status)
        .bind(rental.created_at)
        .bind(rental.updated_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&mut self, id: &str) -> DbResult<Option<Rental>> {
        let sql = format!("SELECT {RENTAL_COLUMNS} FROM rentals WHERE id = ?1");
        let rental = sqlx::query_as::<_, Rental>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(rental)
    }

    /// Like [`get_by_id`](Self::get_by_id), but a missing row is `NotFound`.
    pub async fn require(&mut self, id: &str) -> DbResult<Rental> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Rental", id))
    }

    /// Writes the caller-editable fields and the total. Status and payment
    /// fields are left alone.
    pub async fn update_details(&mut self, rental: &Rental) -> DbResult<()> {
        debug!(id = %rental.id, "Updating rental details");

        let result = sqlx::query(
            r#"
            UPDATE rentals SET
                customer_id = ?2,
                event_date = ?3,
                start_date = ?4,
                end_date = ?5,
                address = ?6,
                contact_phone = ?7,
                delivery_required = ?8,
                total_cents = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&rental.id)
        .bind(&rental.customer_id)
        .bind(rental.event_date)
        .bind(rental.start_date)
        .bind(rental.end_date)
        .bind(&rental.address)
        .bind(&rental.contact_phone)
        .bind(rental.delivery_required)
        .bind(rental.total_cents)
        .bind(Utc::now())
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Rental", &rental.id));
        }

        Ok(())
    }

    pub async fn set_status(&mut self, id: &str, status: RentalStatus) -> DbResult<()> {
        let result = sqlx::query("UPDATE rentals SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Rental", id));
        }

        Ok(())
    }

    /// Stores the derived payment fields.
    pub async fn set_payment_summary(
        &mut self,
        id: &str,
        paid_cents: i64,
        payment_status: PaymentStatus,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE rentals SET paid_cents = ?2, payment_status = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(id)
        .bind(paid_cents)
        .bind(payment_status)
        .bind(Utc::now())
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Rental", id));
        }

        Ok(())
    }

    /// Lists rentals matching `filter`, by event date.
    pub async fn list(&mut self, filter: &RentalFilter) -> DbResult<Vec<Rental>> {
        let sql = format!(
            "SELECT {RENTAL_COLUMNS} FROM rentals \
             WHERE (?1 IS NULL OR status = ?1) \
               AND (?2 IS NULL OR payment_status = ?2) \
               AND (?3 IS NULL OR event_date >= ?3) \
               AND (?4 IS NULL OR event_date <= ?4) \
             ORDER BY event_date, created_at"
        );
        let rentals = sqlx::query_as::<_, Rental>(&sql)
            .bind(filter.status)
            .bind(filter.payment_status)
            .bind(filter.event_from)
            .bind(filter.event_to)
            .fetch_all(&mut *self.conn)
            .await?;

        debug!(count = rentals.len(), "Listed rentals");
        Ok(rentals)
    }

    // =========================================================================
    // Items
    // =========================================================================

    pub async fn get_items(&mut self, rental_id: &str) -> DbResult<Vec<RentalItem>> {
        let items = sqlx::query_as::<_, RentalItem>(
            r#"
            SELECT id, rental_id, product_id, qty, unit_price_cents, line_total_cents, created_at
            FROM rental_items
            WHERE rental_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(rental_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(items)
    }

    /// Deletes every item of the rental and inserts `items` in order.
    pub async fn replace_items(
        &mut self,
        rental_id: &str,
        items: &[ItemRequest],
    ) -> DbResult<Vec<RentalItem>> {
        let deleted = sqlx::query("DELETE FROM rental_items WHERE rental_id = ?1")
            .bind(rental_id)
            .execute(&mut *self.conn)
            .await?
            .rows_affected();

        let now = Utc::now();
        let mut stored = Vec::with_capacity(items.len());
        for item in items {
            let row = RentalItem {
                id: generate_id(),
                rental_id: rental_id.to_string(),
                product_id: item.product_id.clone(),
                qty: item.qty,
                unit_price_cents: item.unit_price_cents,
                line_total_cents: item.line_total().cents(),
                created_at: now,
            };

            sqlx::query(
                r#"
                INSERT INTO rental_items (
                    id, rental_id, product_id, qty, unit_price_cents, line_total_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&row.id)
            .bind(&row.rental_id)
            .bind(&row.product_id)
            .bind(row.qty)
            .bind(row.unit_price_cents)
            .bind(row.line_total_cents)
            .bind(row.created_at)
            .execute(&mut *self.conn)
            .await?;

            stored.push(row);
        }

        debug!(rental_id = %rental_id, deleted, inserted = stored.len(), "Replaced rental items");
        Ok(stored)
    }

    // =========================================================================
    // Reservation Sums
    // =========================================================================

    /// Σ qty of `product_id` held by blocking rentals overlapping `range`.
    pub async fn reserved_qty(
        &mut self,
        product_id: &str,
        range: DateRange,
        exclude_rental_id: Option<&str>,
    ) -> DbResult<i64> {
        let blocking = status_set(&BLOCKING_STATUSES);
        let sql = format!(
            "SELECT COALESCE(SUM(ri.qty), 0) \
             FROM rental_items ri JOIN rentals r ON r.id = ri.rental_id \
             WHERE ri.product_id = ?1 \
               AND r.status IN {blocking} \
               AND r.start_date IS NOT NULL \
               AND r.start_date < ?2 AND ?3 < r.end_date \
               AND r.id IS NOT ?4"
        );
        let reserved: i64 = sqlx::query_scalar(&sql)
            .bind(product_id)
            .bind(range.end())
            .bind(range.start())
            .bind(exclude_rental_id)
            .fetch_one(&mut *self.conn)
            .await?;

        Ok(reserved)
    }

    /// Σ qty of `product_id` held by blocking rentals covering `day`.
    pub async fn reserved_qty_on_day(
        &mut self,
        product_id: &str,
        day: NaiveDate,
        exclude_rental_id: Option<&str>,
    ) -> DbResult<i64> {
        let blocking = status_set(&BLOCKING_STATUSES);
        let sql = format!(
            "SELECT COALESCE(SUM(ri.qty), 0) \
             FROM rental_items ri JOIN rentals r ON r.id = ri.rental_id \
             WHERE ri.product_id = ?1 \
               AND r.status IN {blocking} \
               AND r.start_date IS NOT NULL \
               AND r.start_date <= ?2 AND r.end_date > ?2 \
               AND r.id IS NOT ?3"
        );
        let reserved: i64 = sqlx::query_scalar(&sql)
            .bind(product_id)
            .bind(day)
            .bind(exclude_rental_id)
            .fetch_one(&mut *self.conn)
            .await?;

        Ok(reserved)
    }

    /// Every blocking item of the listed products whose rental overlaps
    /// `range`, in one query.
    pub async fn blocking_spans(
        &mut self,
        product_ids: &[String],
        range: DateRange,
        exclude_rental_id: Option<&str>,
    ) -> DbResult<Vec<ReservationSpan>> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }

        let blocking = status_set(&BLOCKING_STATUSES);
        let sql = format!(
            "SELECT ri.product_id, r.start_date, r.end_date, ri.qty \
             FROM rental_items ri JOIN rentals r ON r.id = ri.rental_id \
             WHERE r.status IN {blocking} \
               AND r.start_date IS NOT NULL \
               AND r.start_date < ? AND ? < r.end_date \
               AND r.id IS NOT ? \
               AND ri.product_id IN ({})",
            placeholders(product_ids.len())
        );
        let mut query = sqlx::query_as::<_, (String, NaiveDate, NaiveDate, i64)>(&sql)
            .bind(range.end())
            .bind(range.start())
            .bind(exclude_rental_id);
        for id in product_ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&mut *self.conn).await?;

        debug!(spans = rows.len(), range = %range, "Loaded blocking spans");
        Ok(rows
            .into_iter()
            .map(|(product_id, start, end, qty)| ReservationSpan {
                product_id,
                start,
                end,
                qty,
            })
            .collect())
    }

    /// Earliest start and latest end over every blocking rental holding
    /// `product_id`. `None` when nothing blocks it.
    pub async fn blocking_bounds(&mut self, product_id: &str) -> DbResult<Option<DateRange>> {
        let blocking = status_set(&BLOCKING_STATUSES);
        let sql = format!(
            "SELECT MIN(r.start_date), MAX(r.end_date) \
             FROM rental_items ri JOIN rentals r ON r.id = ri.rental_id \
             WHERE ri.product_id = ? \
               AND r.status IN {blocking} \
               AND r.start_date IS NOT NULL"
        );
        let (start, end) = sqlx::query_as::<_, (Option<NaiveDate>, Option<NaiveDate>)>(&sql)
            .bind(product_id)
            .fetch_one(&mut *self.conn)
            .await?;

        Ok(match (start, end) {
            (Some(start), Some(end)) => DateRange::new(start, end).ok(),
            _ => None,
        })
    }

    /// SALE quantity allocated to open (draft or confirmed) rentals, per
    /// product.
    pub async fn sale_held_qty(
        &mut self,
        product_ids: &[String],
        exclude_rental_id: Option<&str>,
    ) -> DbResult<BTreeMap<String, i64>> {
        if product_ids.is_empty() {
            return Ok(BTreeMap::new());
        }

        let holding = status_set(&SALE_HOLDING_STATUSES);
        let sql = format!(
            "SELECT ri.product_id, SUM(ri.qty) \
             FROM rental_items ri JOIN rentals r ON r.id = ri.rental_id \
             WHERE r.status IN {holding} \
               AND r.id IS NOT ? \
               AND ri.product_id IN ({}) \
             GROUP BY ri.product_id",
            placeholders(product_ids.len())
        );
        let mut query = sqlx::query_as::<_, (String, i64)>(&sql).bind(exclude_rental_id);
        for id in product_ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&mut *self.conn).await?;

        Ok(rows.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::customer::CustomerRepository;
    use crate::repository::product::ProductRepository;
    use rental_core::{Money, NewCustomer, NewProduct, ProductKind};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn rental(customer_id: &str, start: u32, end: u32, status: RentalStatus) -> Rental {
        let now = Utc::now();
        Rental {
            id: generate_id(),
            customer_id: customer_id.to_string(),
            event_date: day(start),
            start_date: Some(day(start)),
            end_date: Some(day(end)),
            address: None,
            contact_phone: None,
            delivery_required: false,
            status,
            total_cents: 0,
            paid_cents: 0,
            payment_status: PaymentStatus::Unpaid,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_status_set_matches_stored_values() {
        assert_eq!(status_set(&BLOCKING_STATUSES), "('confirmed', 'completed')");
        assert_eq!(status_set(&SALE_HOLDING_STATUSES), "('draft', 'confirmed')");
    }

    #[tokio::test]
    async fn test_reservation_sums_follow_status_and_range() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();

        let customer = CustomerRepository::new(&mut conn)
            .insert(&NewCustomer {
                name: "Ana".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let chair = ProductRepository::new(&mut conn)
            .insert(&NewProduct {
                name: "Chair".to_string(),
                category: None,
                kind: ProductKind::Rental,
                total_qty: 100,
                unit_price_cents: 350,
            })
            .await
            .unwrap();

        let mut repo = RentalRepository::new(&mut conn);
        let confirmed = rental(&customer.id, 10, 12, RentalStatus::Confirmed);
        let draft = rental(&customer.id, 10, 12, RentalStatus::Draft);
        for (r, qty) in [(&confirmed, 60), (&draft, 30)] {
            repo.insert(r).await.unwrap();
            repo.replace_items(&r.id, &[ItemRequest::new(chair.id.clone(), qty, Money::from_cents(350))])
                .await
                .unwrap();
        }

        let range = DateRange::new(day(10), day(12)).unwrap();
        assert_eq!(repo.reserved_qty(&chair.id, range, None).await.unwrap(), 60);
        assert_eq!(
            repo.reserved_qty(&chair.id, range, Some(&confirmed.id)).await.unwrap(),
            0
        );
        assert_eq!(repo.reserved_qty_on_day(&chair.id, day(11), None).await.unwrap(), 60);
        assert_eq!(repo.reserved_qty_on_day(&chair.id, day(12), None).await.unwrap(), 0);

        let later = DateRange::new(day(12), day(14)).unwrap();
        assert_eq!(repo.reserved_qty(&chair.id, later, None).await.unwrap(), 0);

        let spans = repo
            .blocking_spans(&[chair.id.clone()], range, None)
            .await
            .unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].qty, 60);
        assert_eq!(spans[0].start, day(10));

        assert_eq!(repo.blocking_bounds(&chair.id).await.unwrap(), Some(range));
        assert_eq!(repo.blocking_bounds("ghost").await.unwrap(), None);

        // Drafts and confirmed rentals both hold SALE quantity.
        let held = repo.sale_held_qty(&[chair.id.clone()], None).await.unwrap();
        assert_eq!(held[&chair.id], 90);
        let held = repo
            .sale_held_qty(&[chair.id.clone()], Some(&confirmed.id))
            .await
            .unwrap();
        assert_eq!(held[&chair.id], 30);
    }

    #[tokio::test]
    async fn test_replace_items_and_filters() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();

        let customer = CustomerRepository::new(&mut conn)
            .insert(&NewCustomer {
                name: "Ana".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let chair = ProductRepository::new(&mut conn)
            .insert(&NewProduct {
                name: "Chair".to_string(),
                category: None,
                kind: ProductKind::Rental,
                total_qty: 100,
                unit_price_cents: 350,
            })
            .await
            .unwrap();

        let mut repo = RentalRepository::new(&mut conn);
        let r = rental(&customer.id, 10, 12, RentalStatus::Draft);
        repo.insert(&r).await.unwrap();

        let items = [ItemRequest::new(chair.id.clone(), 4, Money::from_cents(350))];
        repo.replace_items(&r.id, &items).await.unwrap();
        let stored = repo
            .replace_items(&r.id, &[ItemRequest::new(chair.id.clone(), 6, Money::from_cents(300))])
            .await
            .unwrap();
        assert_eq!(stored[0].line_total_cents, 1800);
        assert_eq!(repo.get_items(&r.id).await.unwrap().len(), 1);

        repo.set_status(&r.id, RentalStatus::Confirmed).await.unwrap();
        let confirmed = repo
            .list(&RentalFilter {
                status: Some(RentalStatus::Confirmed),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(confirmed.len(), 1);

        let none = repo
            .list(&RentalFilter {
                event_from: Some(day(11)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());

        assert!(matches!(
            repo.require("ghost").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
