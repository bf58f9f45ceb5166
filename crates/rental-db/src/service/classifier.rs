//! # Order Classifier
//!
//! Looks up product kinds for an item list in one batched query and hands
//! the partition rules to [`rental_core::classify`].

use rental_core::classify::{self, LineRevenue};
use rental_core::{ClassifiedItems, ItemRequest, MissingProductPolicy};
use sqlx::SqliteConnection;
use std::collections::BTreeSet;
use tracing::debug;

use super::error::ServiceResult;
use crate::repository::product::ProductRepository;

#[derive(Debug, Clone, Copy)]
pub struct OrderClassifier {
    policy: MissingProductPolicy,
}

impl OrderClassifier {
    pub fn new(policy: MissingProductPolicy) -> Self {
        OrderClassifier { policy }
    }

    pub fn policy(&self) -> MissingProductPolicy {
        self.policy
    }

    /// Partitions `items` by product kind using `conn`, which may be a
    /// transaction.
    pub async fn classify(
        &self,
        conn: &mut SqliteConnection,
        items: &[ItemRequest],
    ) -> ServiceResult<ClassifiedItems> {
        let ids: Vec<String> = distinct_product_ids(items);
        let kinds = ProductRepository::new(conn).kinds_for(&ids).await?;

        debug!(
            items = items.len(),
            known = kinds.len(),
            policy = %self.policy,
            "Classifying items"
        );

        Ok(classify::classify(items, &kinds, self.policy)?)
    }

    pub async fn has_rental_items(
        &self,
        conn: &mut SqliteConnection,
        items: &[ItemRequest],
    ) -> ServiceResult<bool> {
        Ok(self.classify(conn, items).await?.has_rental_items())
    }

    /// Per-line revenue; needs no catalogue lookup.
    pub fn revenue_by_item(&self, items: &[ItemRequest]) -> Vec<LineRevenue> {
        classify::revenue_by_item(items)
    }
}

/// Distinct product ids in ascending order.
pub(crate) fn distinct_product_ids<'a>(items: impl IntoIterator<Item = &'a ItemRequest>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.product_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::{init_test_tracing, TestStore};
    use crate::service::ServiceError;
    use rental_core::{Money, ProductKind};

    #[tokio::test]
    async fn test_classify_with_one_lookup() {
        init_test_tracing();
        let store = TestStore::new().await;
        let chair = store.product("Chair", ProductKind::Rental, 100).await;
        let cup = store.product("Cup", ProductKind::Sale, 50).await;
        let delivery = store.product("Delivery", ProductKind::Service, 0).await;

        let items = vec![
            ItemRequest::new(cup.id.clone(), 2, Money::from_cents(150)),
            ItemRequest::new(chair.id.clone(), 10, Money::from_cents(350)),
            ItemRequest::new(delivery.id.clone(), 1, Money::from_cents(5000)),
            ItemRequest::new("ghost", 1, Money::zero()),
        ];

        let mut conn = store.db.acquire().await.unwrap();
        let classified = store.db.classifier().classify(&mut conn, &items).await.unwrap();
        assert_eq!(classified.rental.len(), 2); // chair + unknown product
        assert_eq!(classified.sale[0].product_id, cup.id);
        assert_eq!(classified.service[0].product_id, delivery.id);
    }

    #[tokio::test]
    async fn test_reject_policy_fails_on_unknown_product() {
        let store = TestStore::new().await;
        let classifier = OrderClassifier::new(MissingProductPolicy::Reject);
        let items = vec![ItemRequest::new("ghost", 1, Money::zero())];

        let mut conn = store.db.acquire().await.unwrap();
        let err = classifier.classify(&mut conn, &items).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { ref entity, .. } if entity == "Product"));
        assert!(classifier
            .has_rental_items(&mut conn, &[])
            .await
            .map(|has| !has)
            .unwrap());
    }

    #[test]
    fn test_distinct_ids_sorted() {
        let items = vec![
            ItemRequest::new("b", 1, Money::zero()),
            ItemRequest::new("a", 1, Money::zero()),
            ItemRequest::new("b", 2, Money::zero()),
        ];
        assert_eq!(distinct_product_ids(&items), vec!["a", "b"]);
        assert_eq!(
            OrderClassifier::new(MissingProductPolicy::default())
                .revenue_by_item(&items)
                .len(),
            3
        );
    }
}
