//! # Product Repository
//!
//! Catalogue rows, kind lookups and stock counts.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Sale stock is consumed with a delta, never an absolute write:     │
//! │                                                                     │
//! │     UPDATE products SET total_qty = total_qty - 30 WHERE id = ?     │
//! │                                                                     │
//! │  CHECK (total_qty >= 0) rejects a decrement that would go negative, │
//! │  so a bug upstream surfaces as a store error, not as bad stock.     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use rental_core::{NewProduct, Product, ProductKind, ProductUpdate};
use sqlx::SqliteConnection;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use super::{generate_id, placeholders};
use crate::error::{DbError, DbResult};

const PRODUCT_COLUMNS: &str = "id, name, category, kind, total_qty, unit_price_cents, active, \
                               created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let mut conn = db.acquire().await?;
/// let product = ProductRepository::new(&mut conn).get_by_id("uuid-here").await?;
/// ```
#[derive(Debug)]
pub struct ProductRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> ProductRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        ProductRepository { conn }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with generated fields
    /// * `Err(DbError::UniqueViolation)` - Name already exists
    pub async fn insert(&mut self, input: &NewProduct) -> DbResult<Product> {
        debug!(name = %input.name, kind = %input.kind, "Inserting product");

        let now = Utc::now();
        let product = Product {
            id: generate_id(),
            name: input.name.trim().to_string(),
            category: input.category.clone(),
            kind: input.kind,
            total_qty: input.total_qty,
            unit_price_cents: input.unit_price_cents,
            active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category, kind, total_qty, unit_price_cents,
                active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.kind)
        .bind(product.total_qty)
        .bind(product.unit_price_cents)
        .bind(product.active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *self.conn)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &product.name),
            other => other,
        })?;

        Ok(product)
    }

    /// Gets a product by its ID, active or not.
    pub async fn get_by_id(&mut self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(product)
    }

    /// Gets a product by its unique name.
    pub async fn get_by_name(&mut self, name: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE name = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(name.trim())
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(product)
    }

    /// Lists active products sorted by name, optionally of one kind.
    pub async fn list_active(&mut self, kind: Option<ProductKind>) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE active = 1 AND (?1 IS NULL OR kind = ?1) \
             ORDER BY name"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(kind)
            .fetch_all(&mut *self.conn)
            .await?;

        debug!(count = products.len(), "Listed active products");
        Ok(products)
    }

    /// Products whose name contains `term`, case-insensitively, sorted by
    /// name. A blank term lists everything.
    pub async fn search_by_name(
        &mut self,
        term: &str,
        include_inactive: bool,
    ) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE (?1 = '' OR instr(lower(name), lower(?1)) > 0) AND (?2 OR active = 1) \
             ORDER BY name"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(term.trim())
            .bind(include_inactive)
            .fetch_all(&mut *self.conn)
            .await?;

        debug!(term = %term, count = products.len(), "Searched products");
        Ok(products)
    }

    /// Replaces the editable fields of a product and returns the stored row.
    pub async fn update(&mut self, id: &str, input: &ProductUpdate) -> DbResult<Product> {
        debug!(id = %id, name = %input.name, "Updating product");

        let name = input.name.trim();
        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                category = ?3,
                total_qty = ?4,
                unit_price_cents = ?5,
                active = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(&input.category)
        .bind(input.total_qty)
        .bind(input.unit_price_cents)
        .bind(input.active)
        .bind(Utc::now())
        .execute(&mut *self.conn)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, name),
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Looks up the kind of every listed product in one query.
    ///
    /// Unknown ids are simply absent from the map.
    pub async fn kinds_for(&mut self, ids: &[String]) -> DbResult<HashMap<String, ProductKind>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT id, kind FROM products WHERE id IN ({})",
            placeholders(ids.len())
        );
        let mut query = sqlx::query_as::<_, (String, ProductKind)>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&mut *self.conn).await?;

        Ok(rows.into_iter().collect())
    }

    /// Current `total_qty` of every listed product, in one query.
    pub async fn stock_for(&mut self, ids: &[String]) -> DbResult<BTreeMap<String, i64>> {
        if ids.is_empty() {
            return Ok(BTreeMap::new());
        }

        let sql = format!(
            "SELECT id, total_qty FROM products WHERE id IN ({})",
            placeholders(ids.len())
        );
        let mut query = sqlx::query_as::<_, (String, i64)>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&mut *self.conn).await?;

        Ok(rows.into_iter().collect())
    }

    /// Changes stock by `delta` (negative for sales, positive for restocking).
    ///
    /// Returns the new `total_qty`.
    pub async fn adjust_stock(&mut self, id: &str, delta: i64) -> DbResult<i64> {
        debug!(id = %id, delta = %delta, "Adjusting stock");

        let total: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET total_qty = total_qty + ?2, updated_at = ?3
            WHERE id = ?1
            RETURNING total_qty
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .fetch_optional(&mut *self.conn)
        .await?;

        total.ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Sets the physical stock count outright (inventory correction).
    pub async fn set_total_qty(&mut self, id: &str, total_qty: i64) -> DbResult<()> {
        debug!(id = %id, total_qty = %total_qty, "Setting stock");

        let result = sqlx::query("UPDATE products SET total_qty = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(total_qty)
            .bind(Utc::now())
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Soft-deletes a product. Existing rental items keep referencing it.
    pub async fn soft_delete(&mut self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query("UPDATE products SET active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&mut self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE active = 1")
            .fetch_one(&mut *self.conn)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn new_product(name: &str, kind: ProductKind, total_qty: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            category: Some("party".to_string()),
            kind,
            total_qty,
            unit_price_cents: 350,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let mut repo = ProductRepository::new(&mut conn);

        let chair = repo
            .insert(&new_product("Chair", ProductKind::Rental, 100))
            .await
            .unwrap();
        let loaded = repo.get_by_id(&chair.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Chair");
        assert_eq!(loaded.kind, ProductKind::Rental);
        assert_eq!(loaded.total_qty, 100);
        assert!(loaded.active);

        let by_name = repo.get_by_name("Chair").await.unwrap().unwrap();
        assert_eq!(by_name.id, chair.id);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let mut repo = ProductRepository::new(&mut conn);

        repo.insert(&new_product("Chair", ProductKind::Rental, 1)).await.unwrap();
        let err = repo
            .insert(&new_product("Chair", ProductKind::Sale, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_kinds_and_stock_in_one_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let mut repo = ProductRepository::new(&mut conn);

        let chair = repo.insert(&new_product("Chair", ProductKind::Rental, 100)).await.unwrap();
        let cup = repo.insert(&new_product("Cup", ProductKind::Sale, 50)).await.unwrap();

        let ids = vec![chair.id.clone(), cup.id.clone(), "ghost".to_string()];
        let kinds = repo.kinds_for(&ids).await.unwrap();
        assert_eq!(kinds.len(), 2);
        assert_eq!(kinds[&cup.id], ProductKind::Sale);

        let stock = repo.stock_for(&ids).await.unwrap();
        assert_eq!(stock[&chair.id], 100);
        assert!(!stock.contains_key("ghost"));
    }

    #[tokio::test]
    async fn test_stock_never_negative() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let mut repo = ProductRepository::new(&mut conn);

        let cup = repo.insert(&new_product("Cup", ProductKind::Sale, 50)).await.unwrap();
        assert_eq!(repo.adjust_stock(&cup.id, -30).await.unwrap(), 20);

        let err = repo.adjust_stock(&cup.id, -25).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
        assert_eq!(repo.get_by_id(&cup.id).await.unwrap().unwrap().total_qty, 20);
    }

    #[tokio::test]
    async fn test_search_and_update() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let mut repo = ProductRepository::new(&mut conn);

        let chair = repo
            .insert(&new_product("Folding Chair", ProductKind::Rental, 10))
            .await
            .unwrap();
        let table = repo
            .insert(&new_product("Round Table", ProductKind::Rental, 4))
            .await
            .unwrap();
        repo.insert(&new_product("Chiavari chair", ProductKind::Rental, 8))
            .await
            .unwrap();

        let found = repo.search_by_name("CHAIR", false).await.unwrap();
        let names: Vec<_> = found.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Chiavari chair", "Folding Chair"]);
        assert_eq!(repo.search_by_name("  ", false).await.unwrap().len(), 3);
        // LIKE wildcards are plain characters here.
        assert!(repo.search_by_name("%", false).await.unwrap().is_empty());

        let updated = repo
            .update(
                &chair.id,
                &ProductUpdate {
                    name: " Folding Chair (white) ".to_string(),
                    category: None,
                    total_qty: 12,
                    unit_price_cents: 400,
                    active: false,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Folding Chair (white)");
        assert_eq!(updated.total_qty, 12);
        assert!(!updated.active);
        assert_eq!(updated.kind, ProductKind::Rental);

        assert_eq!(repo.search_by_name("chair", false).await.unwrap().len(), 1);
        assert_eq!(repo.search_by_name("chair", true).await.unwrap().len(), 2);

        let rename = ProductUpdate {
            name: "Round Table".to_string(),
            category: None,
            total_qty: 1,
            unit_price_cents: 0,
            active: true,
        };
        assert!(matches!(
            repo.update(&chair.id, &rename).await,
            Err(DbError::UniqueViolation { .. })
        ));
        assert!(repo.update(&table.id, &rename).await.is_ok());
        assert!(matches!(
            repo.update("ghost", &rename).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_listing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let mut repo = ProductRepository::new(&mut conn);

        let chair = repo.insert(&new_product("Chair", ProductKind::Rental, 10)).await.unwrap();
        repo.insert(&new_product("Cup", ProductKind::Sale, 10)).await.unwrap();
        assert_eq!(repo.list_active(None).await.unwrap().len(), 2);
        assert_eq!(repo.list_active(Some(ProductKind::Sale)).await.unwrap().len(), 1);

        repo.soft_delete(&chair.id).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);
        assert!(repo.get_by_id(&chair.id).await.unwrap().is_some());
        assert!(repo.soft_delete("ghost").await.is_err());
    }
}
