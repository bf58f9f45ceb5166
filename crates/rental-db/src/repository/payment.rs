//! # Payment Repository
//!
//! The payment ledger. `paid_cents` on the rental is derived from these rows
//! by the payment service; nothing here writes to `rentals`.

use chrono::Utc;
use rental_core::{Payment, PaymentInput};
use sqlx::SqliteConnection;
use tracing::debug;

use super::generate_id;
use crate::error::{DbError, DbResult};

const PAYMENT_COLUMNS: &str = "id, rental_id, amount_cents, method, paid_at, note, created_at";

#[derive(Debug)]
pub struct PaymentRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> PaymentRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        PaymentRepository { conn }
    }

    pub async fn insert(&mut self, rental_id: &str, input: &PaymentInput) -> DbResult<Payment> {
        let payment = Payment {
            id: generate_id(),
            rental_id: rental_id.to_string(),
            amount_cents: input.amount.cents(),
            method: input.method.clone(),
            paid_at: input.paid_at,
            note: input.note.clone(),
            created_at: Utc::now(),
        };

        debug!(id = %payment.id, rental_id = %rental_id, amount = %input.amount, "Inserting payment");

        sqlx::query(
            r#"
            INSERT INTO payments (id, rental_id, amount_cents, method, paid_at, note, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.rental_id)
        .bind(payment.amount_cents)
        .bind(&payment.method)
        .bind(payment.paid_at)
        .bind(&payment.note)
        .bind(payment.created_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(payment)
    }

    pub async fn get_by_id(&mut self, id: &str) -> DbResult<Option<Payment>> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?1");
        let payment = sqlx::query_as::<_, Payment>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(payment)
    }

    /// Overwrites amount, method, date and note. Returns the stored row.
    pub async fn update(&mut self, id: &str, input: &PaymentInput) -> DbResult<Payment> {
        debug!(id = %id, amount = %input.amount, "Updating payment");

        let result = sqlx::query(
            "UPDATE payments SET amount_cents = ?2, method = ?3, paid_at = ?4, note = ?5 WHERE id = ?1",
        )
        .bind(id)
        .bind(input.amount.cents())
        .bind(&input.method)
        .bind(input.paid_at)
        .bind(&input.note)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Payment", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Payment", id))
    }

    /// Deletes a payment and returns the removed row.
    pub async fn delete(&mut self, id: &str) -> DbResult<Payment> {
        debug!(id = %id, "Deleting payment");

        let sql = format!("DELETE FROM payments WHERE id = ?1 RETURNING {PAYMENT_COLUMNS}");
        sqlx::query_as::<_, Payment>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?
            .ok_or_else(|| DbError::not_found("Payment", id))
    }

    /// Payments of a rental, dated ones first by date, then by entry.
    pub async fn list_for_rental(&mut self, rental_id: &str) -> DbResult<Vec<Payment>> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE rental_id = ?1 \
             ORDER BY paid_at IS NULL, paid_at, created_at, rowid"
        );
        let payments = sqlx::query_as::<_, Payment>(&sql)
            .bind(rental_id)
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(payments)
    }

    /// Every amount recorded for a rental, in cents.
    pub async fn amounts_for_rental(&mut self, rental_id: &str) -> DbResult<Vec<i64>> {
        let amounts: Vec<i64> =
            sqlx::query_scalar("SELECT amount_cents FROM payments WHERE rental_id = ?1")
                .bind(rental_id)
                .fetch_all(&mut *self.conn)
                .await?;

        Ok(amounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::customer::CustomerRepository;
    use crate::repository::rental::RentalRepository;
    use chrono::NaiveDate;
    use rental_core::{Money, NewCustomer, PaymentStatus, Rental, RentalStatus};

    async fn seeded_rental(conn: &mut SqliteConnection) -> String {
        let customer = CustomerRepository::new(&mut *conn)
            .insert(&NewCustomer {
                name: "Ana".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let now = Utc::now();
        let rental = Rental {
            id: generate_id(),
            customer_id: customer.id,
            event_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            start_date: None,
            end_date: None,
            address: None,
            contact_phone: None,
            delivery_required: false,
            status: RentalStatus::Draft,
            total_cents: 10000,
            paid_cents: 0,
            payment_status: PaymentStatus::Unpaid,
            created_at: now,
            updated_at: now,
        };
        RentalRepository::new(&mut *conn).insert(&rental).await.unwrap();
        rental.id
    }

    #[tokio::test]
    async fn test_payment_crud() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let rental_id = seeded_rental(&mut conn).await;

        let mut repo = PaymentRepository::new(&mut conn);
        let first = repo
            .insert(&rental_id, &PaymentInput::new(Money::from_cents(4000)))
            .await
            .unwrap();
        let mut dated = PaymentInput::new(Money::from_cents(1000));
        dated.paid_at = NaiveDate::from_ymd_opt(2024, 1, 2);
        let second = repo.insert(&rental_id, &dated).await.unwrap();

        // Dated payment sorts before the undated one.
        let listed: Vec<_> = repo
            .list_for_rental(&rental_id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(listed, vec![second.id.clone(), first.id.clone()]);

        let updated = repo
            .update(&first.id, &PaymentInput::new(Money::from_cents(6000)))
            .await
            .unwrap();
        assert_eq!(updated.amount_cents, 6000);

        let removed = repo.delete(&second.id).await.unwrap();
        assert_eq!(removed.rental_id, rental_id);
        assert_eq!(repo.amounts_for_rental(&rental_id).await.unwrap(), vec![6000]);
        assert!(matches!(
            repo.delete(&second.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_non_positive_amount_rejected_by_schema() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let rental_id = seeded_rental(&mut conn).await;

        let err = PaymentRepository::new(&mut conn)
            .insert(&rental_id, &PaymentInput::new(Money::zero()))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }
}
