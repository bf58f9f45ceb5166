//! # Catalogue Service
//!
//! Products and customers, with input validation in front of the
//! repositories.

use rental_core::validation::{
    validate_customer_name, validate_optional_text, validate_price_cents, validate_product_name,
    validate_stock_qty,
};
use rental_core::availability::ensure_stock_covers;
use rental_core::{
    Customer, NewCustomer, NewProduct, Product, ProductKind, ProductUpdate, ReservationLedger,
    ValidationError,
};
use sqlx::SqliteConnection;
use tracing::{info, warn};

use super::error::{ServiceError, ServiceResult};
use crate::lock::lock_products;
use crate::pool::Database;
use crate::repository::customer::CustomerRepository;
use crate::repository::product::ProductRepository;
use crate::repository::rental::RentalRepository;

#[derive(Debug, Clone)]
pub struct CatalogService {
    db: Database,
}

impl CatalogService {
    pub fn new(db: Database) -> Self {
        CatalogService { db }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Adds a product. SERVICE products carry no stock; their quantity is
    /// stored as zero.
    pub async fn add_product(&self, mut input: NewProduct) -> ServiceResult<Product> {
        validate_product_name(&input.name)?;
        if !input.kind.is_stock_tracked() {
            input.total_qty = 0;
        }
        validate_stock_qty(input.total_qty)?;
        validate_price_cents(input.unit_price_cents)?;
        validate_optional_text("category", input.category.as_deref(), 100)?;

        let mut conn = self.db.acquire().await?;
        let product = ProductRepository::new(&mut conn).insert(&input).await?;

        info!(id = %product.id, name = %product.name, kind = %product.kind, total_qty = product.total_qty, "Product added");
        Ok(product)
    }

    pub async fn get_product(&self, id: &str) -> ServiceResult<Product> {
        let mut conn = self.db.acquire().await?;
        ProductRepository::new(&mut conn)
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))
    }

    pub async fn list_products(&self, kind: Option<ProductKind>) -> ServiceResult<Vec<Product>> {
        let mut conn = self.db.acquire().await?;
        Ok(ProductRepository::new(&mut conn).list_active(kind).await?)
    }

    /// Case-insensitive substring search on the name.
    pub async fn search_products(
        &self,
        term: &str,
        include_inactive: bool,
    ) -> ServiceResult<Vec<Product>> {
        let mut conn = self.db.acquire().await?;
        Ok(ProductRepository::new(&mut conn)
            .search_by_name(term, include_inactive)
            .await?)
    }

    /// Replaces a product's details.
    ///
    /// A lower `total_qty` passes the same commitment check as
    /// [`set_stock`](Self::set_stock). SERVICE products keep zero stock.
    pub async fn update_product(&self, id: &str, mut input: ProductUpdate) -> ServiceResult<Product> {
        validate_product_name(&input.name)?;
        validate_stock_qty(input.total_qty)?;
        validate_price_cents(input.unit_price_cents)?;
        validate_optional_text("category", input.category.as_deref(), 100)?;

        let mut tx = self.db.begin_write().await?;
        lock_products(&mut tx, [id]).await?;

        let current = ProductRepository::new(&mut tx)
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))?;
        if !current.kind.is_stock_tracked() {
            input.total_qty = 0;
        }
        if input.total_qty < current.total_qty {
            ensure_covers_commitments(&mut tx, &current, input.total_qty).await?;
        }
        let product = ProductRepository::new(&mut tx).update(id, &input).await?;

        tx.commit().await?;

        info!(id = %id, name = %product.name, total_qty = product.total_qty, active = product.active, "Product updated");
        Ok(product)
    }

    /// Hides a product from listings. Existing bookings keep it.
    pub async fn deactivate_product(&self, id: &str) -> ServiceResult<()> {
        let mut conn = self.db.acquire().await?;
        ProductRepository::new(&mut conn).soft_delete(id).await?;

        info!(id = %id, "Product deactivated");
        Ok(())
    }

    /// Adds or removes physical stock. Returns the new `total_qty`.
    ///
    /// A decrease may not leave committed bookings uncovered.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> ServiceResult<i64> {
        let mut tx = self.db.begin_write().await?;
        lock_products(&mut tx, [id]).await?;

        let product = ProductRepository::new(&mut tx)
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))?;
        let target = product
            .total_qty
            .checked_add(delta)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "total_qty".to_string(),
                min: 0,
                max: i64::MAX,
            })?;
        validate_stock_qty(target)?;
        if delta < 0 {
            ensure_covers_commitments(&mut tx, &product, target).await?;
        }
        let total_qty = ProductRepository::new(&mut tx).adjust_stock(id, delta).await?;

        tx.commit().await?;

        info!(id = %id, delta, total_qty, "Stock adjusted");
        Ok(total_qty)
    }

    /// Overwrites the physical count after an inventory check.
    ///
    /// Rejected when the new count is below what bookings already hold.
    pub async fn set_stock(&self, id: &str, total_qty: i64) -> ServiceResult<()> {
        validate_stock_qty(total_qty)?;

        let mut tx = self.db.begin_write().await?;
        lock_products(&mut tx, [id]).await?;

        let product = ProductRepository::new(&mut tx)
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))?;
        if total_qty < product.total_qty {
            ensure_covers_commitments(&mut tx, &product, total_qty).await?;
        }
        ProductRepository::new(&mut tx).set_total_qty(id, total_qty).await?;
        tx.commit().await?;

        info!(id = %id, total_qty, "Stock set");
        Ok(())
    }

    // =========================================================================
    // Customers
    // =========================================================================

    pub async fn add_customer(&self, input: NewCustomer) -> ServiceResult<Customer> {
        validate_customer_name(&input.name)?;
        validate_optional_text("phone", input.phone.as_deref(), 50)?;
        validate_optional_text("notes", input.notes.as_deref(), 2000)?;

        let mut conn = self.db.acquire().await?;
        let customer = CustomerRepository::new(&mut conn).insert(&input).await?;

        info!(id = %customer.id, "Customer added");
        Ok(customer)
    }

    pub async fn get_customer(&self, id: &str) -> ServiceResult<Customer> {
        let mut conn = self.db.acquire().await?;
        CustomerRepository::new(&mut conn)
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", id))
    }

    pub async fn list_customers(&self) -> ServiceResult<Vec<Customer>> {
        let mut conn = self.db.acquire().await?;
        Ok(CustomerRepository::new(&mut conn).list().await?)
    }
}

// =============================================================================
// Stock Floor
// =============================================================================

/// Checks `total_qty` against what the product is already committed to.
///
/// RENTAL: every day from the earliest blocking start to the latest blocking
/// end. SALE: the quantity held by draft and confirmed rentals. The caller
/// holds the product lock.
async fn ensure_covers_commitments(
    conn: &mut SqliteConnection,
    product: &Product,
    total_qty: i64,
) -> ServiceResult<()> {
    let ids = std::slice::from_ref(&product.id);
    let mut rentals = RentalRepository::new(conn);

    let outcome = match product.kind {
        ProductKind::Rental => match rentals.blocking_bounds(&product.id).await? {
            Some(range) => {
                let spans = rentals.blocking_spans(ids, range, None).await?;
                let ledger = ReservationLedger::from_spans(spans);
                ensure_stock_covers(&product.id, total_qty, &ledger, range)
            }
            None => Ok(()),
        },
        ProductKind::Sale => {
            let held = rentals
                .sale_held_qty(ids, None)
                .await?
                .get(&product.id)
                .copied()
                .unwrap_or(0);
            if total_qty < held {
                Err(ValidationError::StockBelowCommitted {
                    product_id: product.id.clone(),
                    total_qty,
                    committed: held,
                    days: Vec::new(),
                })
            } else {
                Ok(())
            }
        }
        ProductKind::Service => Ok(()),
    };

    if let Err(err) = &outcome {
        warn!(id = %product.id, total_qty, error = %err, "Stock change rejected");
    }
    Ok(outcome?)
}
