//! # Availability Service
//!
//! Reserved/available quantities and the two stock checks, on top of the
//! store.
//!
//! ## Read Path vs Commit Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UI "how many chairs on the 10th?"                                     │
//! │      AvailabilityService::reserved_qty_on_day                          │
//! │      └── pooled connection, no transaction, may be stale               │
//! │                                                                         │
//! │  RentalService::confirm                                                │
//! │      begin_write → lock_rental → lock_products (ascending)             │
//! │      └── ensure_rental_available(&mut tx, ...)  ← same checks, locked  │
//! │      set_status → commit                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both paths share the connection-level functions at the bottom of this
//! file, so a read-only answer and a commit decision are computed the same
//! way.

use chrono::NaiveDate;
use rental_core::availability::{
    aggregate_items, available_qty, ensure_available, ensure_sellable, sale_shortages,
    scan_conflicts,
};
use rental_core::validation::{validate_items, validate_rental_dates};
use rental_core::{Conflict, DateRange, ItemRequest, ReservationLedger};
use sqlx::SqliteConnection;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::classifier::OrderClassifier;
use super::error::{ServiceError, ServiceResult};
use crate::pool::Database;
use crate::repository::product::ProductRepository;
use crate::repository::rental::RentalRepository;

#[derive(Debug, Clone)]
pub struct AvailabilityService {
    db: Database,
}

impl AvailabilityService {
    pub fn new(db: Database) -> Self {
        AvailabilityService { db }
    }

    /// Σ qty of blocking rentals whose range overlaps `[start, end)`.
    pub async fn reserved_qty(
        &self,
        product_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        exclude_rental_id: Option<&str>,
    ) -> ServiceResult<i64> {
        let range = DateRange::new(start, end)?;
        let mut conn = self.db.acquire().await?;
        Ok(RentalRepository::new(&mut conn)
            .reserved_qty(product_id, range, exclude_rental_id)
            .await?)
    }

    /// Σ qty of blocking rentals covering `day`.
    pub async fn reserved_qty_on_day(
        &self,
        product_id: &str,
        day: NaiveDate,
        exclude_rental_id: Option<&str>,
    ) -> ServiceResult<i64> {
        let mut conn = self.db.acquire().await?;
        Ok(RentalRepository::new(&mut conn)
            .reserved_qty_on_day(product_id, day, exclude_rental_id)
            .await?)
    }

    /// `max(total_qty - reserved_qty, 0)`. `NotFound` for an unknown product.
    pub async fn available_qty(
        &self,
        product_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        exclude_rental_id: Option<&str>,
    ) -> ServiceResult<i64> {
        let range = DateRange::new(start, end)?;
        let mut conn = self.db.acquire().await?;

        let product = ProductRepository::new(&mut conn)
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;
        let reserved = RentalRepository::new(&mut conn)
            .reserved_qty(product_id, range, exclude_rental_id)
            .await?;

        Ok(available_qty(product.total_qty, reserved))
    }

    /// Day-by-day check of `items` over `[start, end)`.
    ///
    /// Fails with the complete conflict list, never just the first one.
    pub async fn validate_rental_availability(
        &self,
        items: &[ItemRequest],
        start: NaiveDate,
        end: NaiveDate,
        exclude_rental_id: Option<&str>,
    ) -> ServiceResult<()> {
        validate_items(items)?;
        let range = DateRange::new(start, end)?;
        let mut conn = self.db.acquire().await?;
        ensure_rental_available(&mut conn, items, range, exclude_rental_id).await
    }

    /// SALE stock left for `product_id` once other open rentals take theirs.
    pub async fn sale_available_qty(
        &self,
        product_id: &str,
        exclude_rental_id: Option<&str>,
    ) -> ServiceResult<i64> {
        let mut conn = self.db.acquire().await?;
        let ids = vec![product_id.to_string()];
        let sellable = sale_available(&mut conn, &ids, exclude_rental_id).await?;

        sellable
            .get(product_id)
            .copied()
            .ok_or_else(|| ServiceError::not_found("Product", product_id))
    }

    /// Order-level check: RENTAL items against the dates, SALE items against
    /// stock, SERVICE items always pass.
    ///
    /// Dates are required only when a RENTAL item is present.
    pub async fn validate_availability(
        &self,
        items: &[ItemRequest],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        exclude_rental_id: Option<&str>,
    ) -> ServiceResult<()> {
        validate_items(items)?;

        let mut conn = self.db.acquire().await?;
        let classified = self.db.classifier().classify(&mut conn, items).await?;

        let range = validate_rental_dates(start, end, classified.has_rental_items())?;
        if let Some(range) = range {
            if classified.has_rental_items() {
                ensure_rental_available(&mut conn, &classified.rental, range, exclude_rental_id)
                    .await?;
            }
        }
        if classified.has_sale_items() {
            ensure_sale_stock(&mut conn, &classified.sale, exclude_rental_id).await?;
        }

        debug!(
            rental = classified.rental.len(),
            sale = classified.sale.len(),
            service = classified.service.len(),
            "Order availability validated"
        );
        Ok(())
    }

    pub fn classifier(&self) -> OrderClassifier {
        self.db.classifier()
    }
}

// =============================================================================
// Connection-Level Checks
// =============================================================================

/// Every (product, day) where `items` would exceed stock.
///
/// One query for stock, one for the overlapping blocking spans; the per-day
/// arithmetic runs in memory.
pub(crate) async fn rental_conflicts(
    conn: &mut SqliteConnection,
    items: &[ItemRequest],
    range: DateRange,
    exclude_rental_id: Option<&str>,
) -> ServiceResult<Vec<Conflict>> {
    let requested = aggregate_items(items);
    let ids: Vec<String> = requested.keys().cloned().collect();

    let stock = ProductRepository::new(&mut *conn).stock_for(&ids).await?;
    let spans = RentalRepository::new(&mut *conn)
        .blocking_spans(&ids, range, exclude_rental_id)
        .await?;
    let ledger = ReservationLedger::from_spans(spans);

    debug!(products = ids.len(), days = range.len_days(), range = %range, "Scanning availability");
    Ok(scan_conflicts(&requested, &stock, &ledger, range)?)
}

pub(crate) async fn ensure_rental_available(
    conn: &mut SqliteConnection,
    items: &[ItemRequest],
    range: DateRange,
    exclude_rental_id: Option<&str>,
) -> ServiceResult<()> {
    let conflicts = rental_conflicts(conn, items, range, exclude_rental_id).await?;
    if !conflicts.is_empty() {
        warn!(
            conflicts = conflicts.len(),
            range = %range,
            exclude = ?exclude_rental_id,
            "Insufficient availability"
        );
    }
    Ok(ensure_available(conflicts)?)
}

/// `total_qty - Σ SALE qty held by other open rentals`, floored at zero, per
/// product. Unknown products are absent.
pub(crate) async fn sale_available(
    conn: &mut SqliteConnection,
    product_ids: &[String],
    exclude_rental_id: Option<&str>,
) -> ServiceResult<BTreeMap<String, i64>> {
    let stock = ProductRepository::new(&mut *conn).stock_for(product_ids).await?;
    let held = RentalRepository::new(&mut *conn)
        .sale_held_qty(product_ids, exclude_rental_id)
        .await?;

    Ok(stock
        .into_iter()
        .map(|(id, total)| {
            let taken = held.get(&id).copied().unwrap_or(0);
            (id, available_qty(total, taken))
        })
        .collect())
}

pub(crate) async fn ensure_sale_stock(
    conn: &mut SqliteConnection,
    items: &[ItemRequest],
    exclude_rental_id: Option<&str>,
) -> ServiceResult<BTreeMap<String, i64>> {
    let requested = aggregate_items(items);
    let ids: Vec<String> = requested.keys().cloned().collect();
    let sellable = sale_available(conn, &ids, exclude_rental_id).await?;

    let shortages = sale_shortages(&requested, &sellable)?;
    if !shortages.is_empty() {
        warn!(shortages = shortages.len(), "Insufficient sale stock");
    }
    ensure_sellable(shortages)?;
    Ok(requested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::{day, init_test_tracing, item, TestStore};
    use rental_core::{Money, ProductKind, ValidationError};

    #[tokio::test]
    async fn test_overbooking_reports_both_days() {
        init_test_tracing();
        let store = TestStore::new().await;
        let chair = store.product("Chair", ProductKind::Rental, 100).await;

        let r1 = store
            .db
            .rentals()
            .create_draft(store.draft(10, 12, vec![item(&chair, 60)]))
            .await
            .unwrap();
        store.db.rentals().confirm(&r1.id).await.unwrap();

        let err = store
            .db
            .availability()
            .validate_rental_availability(&[item(&chair, 50)], day(10), day(12), None)
            .await
            .unwrap_err();

        let conflicts = err.conflicts().unwrap();
        assert_eq!(conflicts.len(), 2);
        assert_eq!(conflicts[0].day, day(10));
        assert_eq!(conflicts[1].day, day(11));
        for conflict in conflicts {
            assert_eq!(conflict.product_id, chair.id);
            assert_eq!(conflict.available, 40);
            assert_eq!(conflict.requested, 50);
        }
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_drafts_do_not_block() {
        let store = TestStore::new().await;
        let chair = store.product("Chair", ProductKind::Rental, 100).await;

        store
            .db
            .rentals()
            .create_draft(store.draft(10, 12, vec![item(&chair, 100)]))
            .await
            .unwrap();

        let availability = store.db.availability();
        assert_eq!(
            availability
                .reserved_qty(&chair.id, day(10), day(12), None)
                .await
                .unwrap(),
            0
        );
        availability
            .validate_rental_availability(&[item(&chair, 100)], day(10), day(12), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_boundary_exact_fit_and_one_over() {
        let store = TestStore::new().await;
        let chair = store.product("Chair", ProductKind::Rental, 100).await;
        let r1 = store
            .db
            .rentals()
            .create_draft(store.draft(11, 12, vec![item(&chair, 70)]))
            .await
            .unwrap();
        store.db.rentals().confirm(&r1.id).await.unwrap();

        let availability = store.db.availability();
        availability
            .validate_rental_availability(&[item(&chair, 30)], day(10), day(13), None)
            .await
            .unwrap();

        let err = availability
            .validate_rental_availability(&[item(&chair, 31)], day(10), day(13), None)
            .await
            .unwrap_err();
        let conflicts = err.conflicts().unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].day, day(11));
        assert_eq!(conflicts[0].available, 30);
    }

    #[tokio::test]
    async fn test_available_qty_and_on_day() {
        let store = TestStore::new().await;
        let chair = store.product("Chair", ProductKind::Rental, 100).await;
        let r1 = store
            .db
            .rentals()
            .create_draft(store.draft(10, 12, vec![item(&chair, 60)]))
            .await
            .unwrap();
        store.db.rentals().confirm(&r1.id).await.unwrap();

        let availability = store.db.availability();
        assert_eq!(
            availability
                .available_qty(&chair.id, day(10), day(12), None)
                .await
                .unwrap(),
            40
        );
        assert_eq!(
            availability
                .available_qty(&chair.id, day(10), day(12), Some(&r1.id))
                .await
                .unwrap(),
            100
        );
        assert_eq!(
            availability
                .reserved_qty_on_day(&chair.id, day(11), None)
                .await
                .unwrap(),
            60
        );
        assert_eq!(
            availability
                .reserved_qty_on_day(&chair.id, day(12), None)
                .await
                .unwrap(),
            0
        );
        assert!(availability
            .available_qty("ghost", day(10), day(12), None)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_inverted_range_is_distinct_error() {
        let store = TestStore::new().await;
        let chair = store.product("Chair", ProductKind::Rental, 100).await;

        let err = store
            .db
            .availability()
            .validate_rental_availability(&[item(&chair, 1)], day(12), day(12), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::InvalidDateRange { .. })
        ));
    }

    #[tokio::test]
    async fn test_rental_check_rejects_bad_lines() {
        let store = TestStore::new().await;
        let chair = store.product("Chair", ProductKind::Rental, 100).await;
        let availability = store.db.availability();

        let err = availability
            .validate_rental_availability(&[item(&chair, 0)], day(10), day(12), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::MustBePositive { .. })
        ));

        let err = availability
            .validate_rental_availability(&[], day(10), day(12), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::Required { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let store = TestStore::new().await;
        let err = store
            .db
            .availability()
            .validate_rental_availability(
                &[ItemRequest::new("ghost", 1, Money::zero())],
                day(10),
                day(11),
                None,
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_order_entry_point_dispatches_by_kind() {
        let store = TestStore::new().await;
        let chair = store.product("Chair", ProductKind::Rental, 10).await;
        let cup = store.product("Cup", ProductKind::Sale, 5).await;
        let delivery = store.product("Delivery", ProductKind::Service, 0).await;
        let availability = store.db.availability();

        // Service and sale items need no dates.
        availability
            .validate_availability(&[item(&cup, 5), item(&delivery, 3)], None, None, None)
            .await
            .unwrap();

        // Sale stock is checked without a date dimension.
        let err = availability
            .validate_availability(&[item(&cup, 6)], None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::InsufficientSaleStock { .. })
        ));

        // Rental items require dates.
        let err = availability
            .validate_availability(&[item(&chair, 1)], None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::MissingDates)
        ));

        availability
            .validate_availability(
                &[item(&chair, 10), item(&cup, 1), item(&delivery, 1)],
                Some(day(10)),
                Some(day(11)),
                None,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_lines_aggregated() {
        let store = TestStore::new().await;
        let chair = store.product("Chair", ProductKind::Rental, 50).await;

        let err = store
            .db
            .availability()
            .validate_rental_availability(
                &[item(&chair, 30), item(&chair, 30)],
                day(10),
                day(11),
                None,
            )
            .await
            .unwrap_err();
        let conflicts = err.conflicts().unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].requested, 60);
        assert_eq!(conflicts[0].available, 50);
    }
}
