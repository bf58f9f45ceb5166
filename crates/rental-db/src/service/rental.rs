//! # Rental Service
//!
//! Creates, edits and moves rentals through their lifecycle.
//!
//! ## Transaction Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  begin_write()                                                          │
//! │    lock_rental(id)            (update / confirm / cancel / complete)    │
//! │    lock_products(ids, asc)    (every product the operation touches)     │
//! │    ── reads from here on see a state no other writer can change ──     │
//! │    classify → validate → write                                          │
//! │  commit()                                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any `Err` drops the transaction, which rolls it back; nothing is written
//! on a failed validation.

use chrono::Utc;
use rental_core::lifecycle::RentalTransition;
use rental_core::validation::{validate_draft, validate_rental_dates};
use rental_core::{
    DateRange, ItemRequest, PaymentStatus, Rental, RentalDraft, RentalFilter, RentalItem,
    RentalStatus,
};
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

use super::availability::{ensure_rental_available, ensure_sale_stock};
use super::classifier::distinct_product_ids;
use super::error::{ServiceError, ServiceResult};
use super::payment::reconcile_in;
use crate::lock::{lock_products, lock_rental};
use crate::pool::Database;
use crate::repository::customer::CustomerRepository;
use crate::repository::generate_id;
use crate::repository::product::ProductRepository;
use crate::repository::rental::RentalRepository;

#[derive(Debug, Clone)]
pub struct RentalService {
    db: Database,
}

impl RentalService {
    pub fn new(db: Database) -> Self {
        RentalService { db }
    }

    // =========================================================================
    // Create / Update
    // =========================================================================

    /// Stores a new DRAFT rental with its items.
    ///
    /// RENTAL items are checked against confirmed bookings. Drafts never block
    /// each other, so two drafts may hold the same slot until one confirms.
    pub async fn create_draft(&self, draft: RentalDraft) -> ServiceResult<Rental> {
        validate_draft(&draft)?;

        let mut tx = self.db.begin_write().await?;
        lock_products(&mut tx, distinct_product_ids(&draft.items)).await?;

        ensure_customer(&mut tx, &draft.customer_id).await?;
        let range = self.check_rental_items(&mut tx, &draft, None).await?;

        let now = Utc::now();
        let total = draft.total_value();
        let rental = Rental {
            id: generate_id(),
            customer_id: draft.customer_id.clone(),
            event_date: draft.event_date,
            start_date: range.map(|r| r.start()),
            end_date: range.map(|r| r.end()),
            address: draft.address.clone(),
            contact_phone: draft.contact_phone.clone(),
            delivery_required: draft.delivery_required,
            status: RentalStatus::Draft,
            total_cents: total.cents(),
            paid_cents: 0,
            payment_status: PaymentStatus::Unpaid,
            created_at: now,
            updated_at: now,
        };

        let mut rentals = RentalRepository::new(&mut tx);
        rentals.insert(&rental).await?;
        let items = rentals.replace_items(&rental.id, &draft.items).await?;

        tx.commit().await?;

        info!(
            id = %rental.id,
            items = items.len(),
            total = %total,
            "Rental draft created"
        );
        Ok(rental)
    }

    /// Replaces the details and items of a DRAFT or CONFIRMED rental.
    ///
    /// The rental's own reservation is excluded from the availability check.
    /// Status is kept; `paid_cents`/`payment_status` are re-derived against
    /// the new total.
    pub async fn update(&self, id: &str, draft: RentalDraft) -> ServiceResult<Rental> {
        validate_draft(&draft)?;

        let mut tx = self.db.begin_write().await?;
        lock_rental(&mut tx, id).await?;

        let mut rentals = RentalRepository::new(&mut tx);
        let existing = rentals.require(id).await?;
        if let Err(err) = existing.status.ensure_editable() {
            warn!(id = %id, status = %existing.status, "Rejected update");
            return Err(err.into());
        }
        let previous = rentals.get_items(id).await?;

        let mut touched = requests(previous);
        touched.extend(draft.items.iter().cloned());
        lock_products(&mut tx, distinct_product_ids(&touched)).await?;

        ensure_customer(&mut tx, &draft.customer_id).await?;
        let range = self.check_rental_items(&mut tx, &draft, Some(id)).await?;

        let updated = Rental {
            customer_id: draft.customer_id.clone(),
            event_date: draft.event_date,
            start_date: range.map(|r| r.start()),
            end_date: range.map(|r| r.end()),
            address: draft.address.clone(),
            contact_phone: draft.contact_phone.clone(),
            delivery_required: draft.delivery_required,
            total_cents: draft.total_value().cents(),
            ..existing
        };

        let mut rentals = RentalRepository::new(&mut tx);
        rentals.update_details(&updated).await?;
        let items = rentals.replace_items(id, &draft.items).await?;
        let summary = reconcile_in(&mut tx, id).await?;
        let rental = RentalRepository::new(&mut tx).require(id).await?;

        tx.commit().await?;

        info!(
            id = %id,
            status = %rental.status,
            items = items.len(),
            total = %summary.total,
            payment_status = %summary.status,
            "Rental updated"
        );
        Ok(rental)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// DRAFT → CONFIRMED. From here on the rental blocks other bookings.
    ///
    /// Validation and the status write share one locked transaction, so two
    /// drafts racing for the last units cannot both confirm.
    pub async fn confirm(&self, id: &str) -> ServiceResult<Rental> {
        let mut tx = self.db.begin_write().await?;
        lock_rental(&mut tx, id).await?;

        let rental = RentalRepository::new(&mut tx).require(id).await?;
        let next = check_transition(&rental, RentalTransition::Confirm)?;

        let items = requests(RentalRepository::new(&mut tx).get_items(id).await?);
        lock_products(&mut tx, distinct_product_ids(&items)).await?;

        let classified = self.db.classifier().classify(&mut tx, &items).await?;
        let range = validate_rental_dates(
            rental.start_date,
            rental.end_date,
            classified.has_rental_items(),
        )?;
        if let Some(range) = range {
            if classified.has_rental_items() {
                ensure_rental_available(&mut tx, &classified.rental, range, Some(id)).await?;
            }
        }

        let rental = finish_transition(&mut tx, rental, next).await?;
        tx.commit().await?;

        info!(id = %id, "Rental confirmed");
        Ok(rental)
    }

    /// DRAFT or CONFIRMED → CANCELED. Releases every reservation at once.
    pub async fn cancel(&self, id: &str) -> ServiceResult<Rental> {
        let mut tx = self.db.begin_write().await?;
        lock_rental(&mut tx, id).await?;

        let rental = RentalRepository::new(&mut tx).require(id).await?;
        let next = check_transition(&rental, RentalTransition::Cancel)?;
        let rental = finish_transition(&mut tx, rental, next).await?;

        tx.commit().await?;

        info!(id = %id, "Rental canceled");
        Ok(rental)
    }

    /// CONFIRMED → COMPLETED. Consumes SALE stock.
    ///
    /// All SALE shortfalls are reported together and nothing is decremented
    /// unless every SALE line fits.
    pub async fn complete(&self, id: &str) -> ServiceResult<Rental> {
        let mut tx = self.db.begin_write().await?;
        lock_rental(&mut tx, id).await?;

        let rental = RentalRepository::new(&mut tx).require(id).await?;
        let next = check_transition(&rental, RentalTransition::Complete)?;

        let items = requests(RentalRepository::new(&mut tx).get_items(id).await?);
        let classified = self.db.classifier().classify(&mut tx, &items).await?;

        if classified.has_sale_items() {
            lock_products(&mut tx, distinct_product_ids(&classified.sale)).await?;
            let consumed = ensure_sale_stock(&mut tx, &classified.sale, Some(id)).await?;

            // BTreeMap iteration keeps the ascending lock order.
            let mut products = ProductRepository::new(&mut tx);
            for (product_id, qty) in &consumed {
                let remaining = products.adjust_stock(product_id, -qty).await?;
                info!(product_id = %product_id, qty, remaining, "Sale stock decremented");
            }
        }

        let rental = finish_transition(&mut tx, rental, next).await?;
        tx.commit().await?;

        info!(id = %id, sale_lines = classified.sale.len(), "Rental completed");
        Ok(rental)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_rental(&self, id: &str) -> ServiceResult<(Rental, Vec<RentalItem>)> {
        let mut conn = self.db.acquire().await?;
        let mut rentals = RentalRepository::new(&mut conn);

        let rental = rentals.require(id).await?;
        let items = rentals.get_items(id).await?;
        Ok((rental, items))
    }

    pub async fn list_rentals(&self, filter: &RentalFilter) -> ServiceResult<Vec<Rental>> {
        let mut conn = self.db.acquire().await?;
        Ok(RentalRepository::new(&mut conn).list(filter).await?)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Classifies the draft's items, checks its dates, and validates RENTAL
    /// lines against blocking bookings. Returns the booking range.
    async fn check_rental_items(
        &self,
        conn: &mut SqliteConnection,
        draft: &RentalDraft,
        exclude_rental_id: Option<&str>,
    ) -> ServiceResult<Option<DateRange>> {
        let classified = self.db.classifier().classify(&mut *conn, &draft.items).await?;
        let range = validate_rental_dates(
            draft.start_date,
            draft.end_date,
            classified.has_rental_items(),
        )?;

        if let Some(range) = range {
            if classified.has_rental_items() {
                ensure_rental_available(conn, &classified.rental, range, exclude_rental_id)
                    .await?;
            }
        }

        debug!(
            rental = classified.rental.len(),
            sale = classified.sale.len(),
            service = classified.service.len(),
            "Draft items checked"
        );
        Ok(range)
    }
}

async fn ensure_customer(conn: &mut SqliteConnection, customer_id: &str) -> ServiceResult<()> {
    if CustomerRepository::new(conn).exists(customer_id).await? {
        Ok(())
    } else {
        Err(ServiceError::not_found("Customer", customer_id))
    }
}

fn check_transition(rental: &Rental, transition: RentalTransition) -> ServiceResult<RentalStatus> {
    rental.status.apply(transition).map_err(|err| {
        warn!(id = %rental.id, from = %rental.status, %transition, "Rejected transition");
        err.into()
    })
}

async fn finish_transition(
    conn: &mut SqliteConnection,
    rental: Rental,
    status: RentalStatus,
) -> ServiceResult<Rental> {
    RentalRepository::new(conn).set_status(&rental.id, status).await?;
    Ok(Rental {
        status,
        updated_at: Utc::now(),
        ..rental
    })
}

fn requests(items: Vec<RentalItem>) -> Vec<ItemRequest> {
    items.iter().map(RentalItem::to_request).collect()
}
