//! # Customer Repository

use chrono::Utc;
use rental_core::{Customer, NewCustomer};
use sqlx::SqliteConnection;
use tracing::debug;

use super::generate_id;
use crate::error::DbResult;

#[derive(Debug)]
pub struct CustomerRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> CustomerRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        CustomerRepository { conn }
    }

    pub async fn insert(&mut self, input: &NewCustomer) -> DbResult<Customer> {
        debug!(name = %input.name, "Inserting customer");

        let now = Utc::now();
        let customer = Customer {
            id: generate_id(),
            name: input.name.trim().to_string(),
            phone: input.phone.clone(),
            notes: input.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, phone, notes, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.notes)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(customer)
    }

    pub async fn get_by_id(&mut self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, name, phone, notes, created_at, updated_at FROM customers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(customer)
    }

    pub async fn exists(&mut self, id: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM customers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(found.is_some())
    }

    /// All customers by name.
    pub async fn list(&mut self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT id, name, phone, notes, created_at, updated_at FROM customers ORDER BY name",
        )
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(customers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_insert_get_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let mut repo = CustomerRepository::new(&mut conn);

        let zoe = repo
            .insert(&NewCustomer {
                name: "Zoe".to_string(),
                phone: Some("555-0101".to_string()),
                notes: None,
            })
            .await
            .unwrap();
        repo.insert(&NewCustomer {
            name: "Adam".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

        assert!(repo.exists(&zoe.id).await.unwrap());
        assert!(!repo.exists("ghost").await.unwrap());
        assert_eq!(
            repo.get_by_id(&zoe.id).await.unwrap().unwrap().phone.as_deref(),
            Some("555-0101")
        );

        let names: Vec<_> = repo.list().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Adam", "Zoe"]);
    }
}
