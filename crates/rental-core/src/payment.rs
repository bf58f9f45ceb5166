//! # Payment Reconciliation
//!
//! The single place where `paid_value` and `payment_status` are derived.
//! Every payment mutation and every rental total change goes through
//! [`PaymentSummary::reconcile`], so the two stored fields can never drift
//! from the payment ledger.
//!
//! ```text
//!   paid <= 0              → UNPAID
//!   0 < paid < total       → PARTIAL
//!   paid >= total          → PAID
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::PaymentStatus;

impl PaymentStatus {
    /// Derives the status from the paid and total amounts.
    pub fn derive(paid: Money, total: Money) -> PaymentStatus {
        if !paid.is_positive() {
            PaymentStatus::Unpaid
        } else if paid < total {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Paid
        }
    }
}

/// The derived payment fields of one rental.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub total: Money,
    pub paid: Money,
    pub status: PaymentStatus,
}

impl PaymentSummary {
    /// Recomputes from scratch. Same inputs, same summary.
    ///
    /// Fails when the payments do not sum to a representable amount.
    pub fn reconcile(
        total: Money,
        amounts: impl IntoIterator<Item = Money>,
    ) -> Result<Self, ValidationError> {
        let paid = Money::checked_sum(amounts).ok_or_else(|| ValidationError::OutOfRange {
            field: "paid total".to_string(),
            min: 0,
            max: i64::MAX,
        })?;
        Ok(PaymentSummary {
            total,
            paid,
            status: PaymentStatus::derive(paid, total),
        })
    }

    /// Amount still owed; zero once fully paid.
    pub fn balance_due(&self) -> Money {
        let due = self.total.saturating_sub(self.paid);
        if due.is_negative() {
            Money::zero()
        } else {
            due
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cents(v: i64) -> Money {
        Money::from_cents(v)
    }

    #[test]
    fn test_derive_thresholds() {
        assert_eq!(PaymentStatus::derive(cents(0), cents(10000)), PaymentStatus::Unpaid);
        assert_eq!(PaymentStatus::derive(cents(1), cents(10000)), PaymentStatus::Partial);
        assert_eq!(PaymentStatus::derive(cents(9999), cents(10000)), PaymentStatus::Partial);
        assert_eq!(PaymentStatus::derive(cents(10000), cents(10000)), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::derive(cents(12000), cents(10000)), PaymentStatus::Paid);
    }

    #[test]
    fn test_zero_total_with_no_payments_is_unpaid() {
        let summary = PaymentSummary::reconcile(Money::zero(), Vec::new()).unwrap();
        assert_eq!(summary.status, PaymentStatus::Unpaid);
    }

    #[test]
    fn test_two_part_payment_reaches_paid() {
        let total = cents(10000);
        let mut amounts = Vec::new();
        assert_eq!(
            PaymentSummary::reconcile(total, amounts.clone()).unwrap().status,
            PaymentStatus::Unpaid
        );

        amounts.push(cents(4000));
        let summary = PaymentSummary::reconcile(total, amounts.clone()).unwrap();
        assert_eq!(summary.status, PaymentStatus::Partial);
        assert_eq!(summary.balance_due(), cents(6000));

        amounts.push(cents(6000));
        let summary = PaymentSummary::reconcile(total, amounts).unwrap();
        assert_eq!(summary.status, PaymentStatus::Paid);
        assert_eq!(summary.paid, cents(10000));
        assert_eq!(summary.balance_due(), Money::zero());
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let amounts = [cents(2500), cents(2500)];
        let first = PaymentSummary::reconcile(cents(8000), amounts).unwrap();
        let second = PaymentSummary::reconcile(cents(8000), amounts).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unrepresentable_paid_total_is_rejected() {
        let err = PaymentSummary::reconcile(cents(100), [cents(i64::MAX), cents(1)]).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
    }
}
