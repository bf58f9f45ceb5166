//! Shared fixtures for service tests.

use chrono::NaiveDate;
use rental_core::{
    Customer, ItemRequest, Money, NewCustomer, NewProduct, Product, ProductKind, RentalDraft,
};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use crate::pool::{Database, DbConfig};

pub(crate) fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rental_db=debug")),
        )
        .with_test_writer()
        .try_init();
}

pub(crate) fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

pub(crate) fn item(product: &Product, qty: i64) -> ItemRequest {
    ItemRequest::new(product.id.clone(), qty, product.unit_price())
}

/// A migrated database plus one customer.
pub(crate) struct TestStore {
    pub db: Database,
    pub customer: Customer,
}

impl TestStore {
    pub async fn new() -> Self {
        Self::with_config(DbConfig::in_memory()).await
    }

    /// File-backed store with several pooled connections, for concurrency
    /// tests.
    pub async fn on_file(path: &Path, connections: u32) -> Self {
        Self::with_config(DbConfig::new(path).max_connections(connections)).await
    }

    async fn with_config(config: DbConfig) -> Self {
        let db = Database::new(config).await.unwrap();
        let customer = db
            .catalog()
            .add_customer(NewCustomer {
                name: "Test Customer".to_string(),
                phone: Some("555-0100".to_string()),
                notes: None,
            })
            .await
            .unwrap();
        TestStore { db, customer }
    }

    pub async fn product(&self, name: &str, kind: ProductKind, total_qty: i64) -> Product {
        self.db
            .catalog()
            .add_product(NewProduct {
                name: name.to_string(),
                category: None,
                kind,
                total_qty,
                unit_price_cents: 350,
            })
            .await
            .unwrap()
    }

    /// A draft for `[start, end)` in January 2024.
    pub fn draft(&self, start: u32, end: u32, items: Vec<ItemRequest>) -> RentalDraft {
        RentalDraft {
            customer_id: self.customer.id.clone(),
            event_date: day(start),
            start_date: Some(day(start)),
            end_date: Some(day(end)),
            address: Some("1 Main St".to_string()),
            contact_phone: None,
            delivery_required: false,
            items,
            total_override: None,
        }
    }

    /// A draft without dates, for orders with no rental items.
    pub fn undated_draft(&self, items: Vec<ItemRequest>) -> RentalDraft {
        RentalDraft {
            start_date: None,
            end_date: None,
            ..self.draft(10, 11, items)
        }
    }

    /// A draft whose total is fixed at `total`.
    pub fn priced_draft(&self, items: Vec<ItemRequest>, total: Money) -> RentalDraft {
        RentalDraft {
            total_override: Some(total),
            ..self.undated_draft(items)
        }
    }
}
