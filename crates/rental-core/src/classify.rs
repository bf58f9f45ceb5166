//! # Item Classification
//!
//! Splits a candidate item list by product kind so each line gets the right
//! stock rule:
//!
//! ```text
//!   items ──► kinds (one batched lookup) ──► ┌ RENTAL  → date-ranged scan
//!                                            ├ SALE    → stock check / decrement
//!                                            └ SERVICE → always passes
//! ```
//!
//! The kind is never guessed from the item itself; it always comes from the
//! product catalogue.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{ItemRequest, ProductKind};

/// What to do with an item whose product does not exist.
///
/// `TreatAsRental` applies the strictest rule and lets availability
/// validation report the missing product. `Reject` fails classification
/// outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingProductPolicy {
    TreatAsRental,
    Reject,
}

impl Default for MissingProductPolicy {
    fn default() -> Self {
        MissingProductPolicy::TreatAsRental
    }
}

impl fmt::Display for MissingProductPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingProductPolicy::TreatAsRental => write!(f, "treat_as_rental"),
            MissingProductPolicy::Reject => write!(f, "reject"),
        }
    }
}

impl FromStr for MissingProductPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "treat_as_rental" | "rental" => Ok(MissingProductPolicy::TreatAsRental),
            "reject" => Ok(MissingProductPolicy::Reject),
            other => Err(ValidationError::UnknownValue {
                field: "missing_product_policy".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Items partitioned by product kind, input order preserved within a group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedItems {
    pub rental: Vec<ItemRequest>,
    pub sale: Vec<ItemRequest>,
    pub service: Vec<ItemRequest>,
}

impl ClassifiedItems {
    pub fn has_rental_items(&self) -> bool {
        !self.rental.is_empty()
    }

    pub fn has_sale_items(&self) -> bool {
        !self.sale.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rental.len() + self.sale.len() + self.service.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partitions `items` using the looked-up `kinds`.
pub fn classify(
    items: &[ItemRequest],
    kinds: &HashMap<String, ProductKind>,
    policy: MissingProductPolicy,
) -> CoreResult<ClassifiedItems> {
    let mut classified = ClassifiedItems::default();

    for item in items {
        let kind = match (kinds.get(&item.product_id), policy) {
            (Some(kind), _) => *kind,
            (None, MissingProductPolicy::TreatAsRental) => ProductKind::Rental,
            (None, MissingProductPolicy::Reject) => {
                return Err(CoreError::not_found("Product", item.product_id.as_str()))
            }
        };

        match kind {
            ProductKind::Rental => classified.rental.push(item.clone()),
            ProductKind::Sale => classified.sale.push(item.clone()),
            ProductKind::Service => classified.service.push(item.clone()),
        }
    }

    Ok(classified)
}

/// Revenue of a single order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRevenue {
    pub product_id: String,
    pub qty: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

/// Per-line revenue, in input order.
pub fn revenue_by_item(items: &[ItemRequest]) -> Vec<LineRevenue> {
    items
        .iter()
        .map(|item| LineRevenue {
            product_id: item.product_id.clone(),
            qty: item.qty,
            unit_price: item.unit_price(),
            line_total: item.line_total(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product: &str, qty: i64) -> ItemRequest {
        ItemRequest::new(product, qty, Money::from_cents(100))
    }

    fn kinds() -> HashMap<String, ProductKind> {
        HashMap::from([
            ("chair".to_string(), ProductKind::Rental),
            ("cup".to_string(), ProductKind::Sale),
            ("delivery".to_string(), ProductKind::Service),
        ])
    }

    #[test]
    fn test_partitions_by_kind() {
        let items = vec![item("cup", 3), item("chair", 10), item("delivery", 1), item("chair", 5)];
        let classified = classify(&items, &kinds(), MissingProductPolicy::default()).unwrap();

        assert_eq!(classified.rental, vec![item("chair", 10), item("chair", 5)]);
        assert_eq!(classified.sale, vec![item("cup", 3)]);
        assert_eq!(classified.service, vec![item("delivery", 1)]);
        assert_eq!(classified.len(), 4);
        assert!(classified.has_rental_items());
    }

    #[test]
    fn test_missing_product_defaults_to_rental() {
        let items = vec![item("ghost", 1)];
        let classified = classify(&items, &kinds(), MissingProductPolicy::TreatAsRental).unwrap();
        assert_eq!(classified.rental, items);
    }

    #[test]
    fn test_missing_product_rejected_by_policy() {
        let err = classify(&[item("ghost", 1)], &kinds(), MissingProductPolicy::Reject).unwrap_err();
        assert_eq!(err.to_string(), "Product not found: ghost");
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            "reject".parse::<MissingProductPolicy>().unwrap(),
            MissingProductPolicy::Reject
        );
        assert_eq!(
            "TREAT_AS_RENTAL".parse::<MissingProductPolicy>().unwrap(),
            MissingProductPolicy::TreatAsRental
        );
        assert!("ignore".parse::<MissingProductPolicy>().is_err());
        assert_eq!(MissingProductPolicy::Reject.to_string(), "reject");
    }

    #[test]
    fn test_revenue_by_item() {
        let items = vec![ItemRequest::new("chair", 60, Money::from_cents(350))];
        let revenue = revenue_by_item(&items);
        assert_eq!(revenue[0].line_total, Money::from_cents(21000));
        assert_eq!(revenue[0].unit_price, Money::from_cents(350));
    }
}
