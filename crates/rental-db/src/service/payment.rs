//! # Payment Service
//!
//! Records payments and keeps `paid_cents`/`payment_status` on the rental in
//! step with the ledger.
//!
//! Every mutation ends in [`reconcile_in`], which recomputes both fields from
//! the full payment set through [`PaymentSummary::reconcile`]. There is no
//! incremental `paid += amount` anywhere, so the stored fields cannot drift.

use rental_core::validation::validate_payment_amount;
use rental_core::{Money, Payment, PaymentInput, PaymentSummary};
use sqlx::SqliteConnection;
use tracing::{debug, info};

use super::error::ServiceResult;
use crate::lock::lock_rental;
use crate::pool::Database;
use crate::repository::payment::PaymentRepository;
use crate::repository::rental::RentalRepository;

#[derive(Debug, Clone)]
pub struct PaymentService {
    db: Database,
}

impl PaymentService {
    pub fn new(db: Database) -> Self {
        PaymentService { db }
    }

    pub async fn add_payment(&self, rental_id: &str, input: PaymentInput) -> ServiceResult<Payment> {
        validate_input(&input)?;

        let mut tx = self.db.begin_write().await?;
        lock_rental(&mut tx, rental_id).await?;

        let payment = PaymentRepository::new(&mut tx).insert(rental_id, &input).await?;
        let summary = reconcile_in(&mut tx, rental_id).await?;

        tx.commit().await?;

        info!(
            id = %payment.id,
            rental_id = %rental_id,
            amount = %input.amount,
            paid = %summary.paid,
            payment_status = %summary.status,
            "Payment added"
        );
        Ok(payment)
    }

    pub async fn update_payment(&self, payment_id: &str, input: PaymentInput) -> ServiceResult<Payment> {
        validate_input(&input)?;

        let mut tx = self.db.begin_write().await?;
        let payment = PaymentRepository::new(&mut tx).update(payment_id, &input).await?;
        lock_rental(&mut tx, &payment.rental_id).await?;
        let summary = reconcile_in(&mut tx, &payment.rental_id).await?;

        tx.commit().await?;

        info!(
            id = %payment_id,
            rental_id = %payment.rental_id,
            amount = %input.amount,
            payment_status = %summary.status,
            "Payment updated"
        );
        Ok(payment)
    }

    /// Removes a payment and returns it as it was.
    pub async fn delete_payment(&self, payment_id: &str) -> ServiceResult<Payment> {
        let mut tx = self.db.begin_write().await?;
        let payment = PaymentRepository::new(&mut tx).delete(payment_id).await?;
        lock_rental(&mut tx, &payment.rental_id).await?;
        let summary = reconcile_in(&mut tx, &payment.rental_id).await?;

        tx.commit().await?;

        info!(
            id = %payment_id,
            rental_id = %payment.rental_id,
            payment_status = %summary.status,
            "Payment deleted"
        );
        Ok(payment)
    }

    /// Recomputes the derived payment fields. Running it twice changes
    /// nothing.
    pub async fn reconcile(&self, rental_id: &str) -> ServiceResult<PaymentSummary> {
        let mut tx = self.db.begin_write().await?;
        lock_rental(&mut tx, rental_id).await?;
        let summary = reconcile_in(&mut tx, rental_id).await?;
        tx.commit().await?;
        Ok(summary)
    }

    pub async fn list_payments(&self, rental_id: &str) -> ServiceResult<Vec<Payment>> {
        let mut conn = self.db.acquire().await?;
        RentalRepository::new(&mut conn).require(rental_id).await?;
        Ok(PaymentRepository::new(&mut conn).list_for_rental(rental_id).await?)
    }

    pub async fn paid_total(&self, rental_id: &str) -> ServiceResult<Money> {
        let mut conn = self.db.acquire().await?;
        RentalRepository::new(&mut conn).require(rental_id).await?;
        let amounts = PaymentRepository::new(&mut conn).amounts_for_rental(rental_id).await?;
        let amounts = amounts.into_iter().map(Money::from_cents);
        Ok(PaymentSummary::reconcile(Money::zero(), amounts)?.paid)
    }
}

fn validate_input(input: &PaymentInput) -> ServiceResult<()> {
    validate_payment_amount(input.amount.cents())?;
    Ok(())
}

/// Re-derives and stores `paid_cents`/`payment_status` for `rental_id` on
/// `conn`. The caller holds the rental lock.
pub(crate) async fn reconcile_in(
    conn: &mut SqliteConnection,
    rental_id: &str,
) -> ServiceResult<PaymentSummary> {
    let rental = RentalRepository::new(&mut *conn).require(rental_id).await?;
    let amounts = PaymentRepository::new(&mut *conn).amounts_for_rental(rental_id).await?;
    let summary =
        PaymentSummary::reconcile(rental.total(), amounts.into_iter().map(Money::from_cents))?;

    if summary.paid.cents() != rental.paid_cents || summary.status != rental.payment_status {
        RentalRepository::new(conn)
            .set_payment_summary(rental_id, summary.paid.cents(), summary.status)
            .await?;
    }

    debug!(
        rental_id = %rental_id,
        total = %summary.total,
        paid = %summary.paid,
        status = %summary.status,
        "Payments reconciled"
    );
    Ok(summary)
}
