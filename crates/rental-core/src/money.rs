//! # Money
//!
//! Integer cents for rental totals, line prices and payments. Payments of
//! 4000 and 6000 cents sum to exactly a 10000-cent total, so `paid >= total`
//! is a reliable PAID test.
//!
//! Arithmetic never panics. Validation uses the `checked_*` forms to reject
//! amounts that do not fit; derived values computed after validation use the
//! `saturating_*` forms.
//!
//! ```rust
//! use rental_core::money::Money;
//!
//! let chair = Money::from_cents(350);
//! assert_eq!(chair.checked_mul(60), Some(Money::from_cents(21000)));
//! assert_eq!(Money::from_cents(i64::MAX).checked_mul(2), None);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// An amount in cents. Signed, so an overpaid balance can be negative.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Unit price times a line quantity, `None` on overflow.
    #[inline]
    pub fn checked_mul(self, qty: i64) -> Option<Money> {
        self.0.checked_mul(qty).map(Money)
    }

    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    #[inline]
    pub fn saturating_mul(self, qty: i64) -> Money {
        Money(self.0.saturating_mul(qty))
    }

    #[inline]
    pub fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }

    #[inline]
    pub fn saturating_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }

    /// Sums `amounts`, `None` if the total does not fit.
    pub fn checked_sum(amounts: impl IntoIterator<Item = Money>) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |total, amount| total.checked_add(amount))
    }
}

/// Plain two-decimal rendering for logs and error messages.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(10000).to_string(), "100.00");
        assert_eq!(Money::from_cents(505).to_string(), "5.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(i64::MIN).to_string(), "-92233720368547758.08");
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let price = Money::from_cents(i64::MAX / 10);
        assert_eq!(price.checked_mul(10), Some(Money::from_cents(i64::MAX / 10 * 10)));
        assert_eq!(price.checked_mul(100), None);
        assert_eq!(price.saturating_mul(100), Money::from_cents(i64::MAX));

        assert_eq!(
            Money::checked_sum([Money::from_cents(4000), Money::from_cents(6000)]),
            Some(Money::from_cents(10000))
        );
        assert_eq!(
            Money::checked_sum([Money::from_cents(i64::MAX), Money::from_cents(1)]),
            None
        );
        assert_eq!(
            Money::from_cents(3000).saturating_sub(Money::from_cents(5000)),
            Money::from_cents(-2000)
        );
    }
}
