use std::fmt;
use std::iter::Sum;

use serde::{Deserialize, Serialize};

/// Monetary amount in minor units (centavos).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    pub const fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }

    /// Difference clamped at zero.
    pub fn non_negative_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0).max(0))
    }

    pub fn checked_mul(self, factor: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(factor)).map(Money)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Money::saturating_add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_two_decimals() {
        assert_eq!(Money::from_major(1500).to_string(), "1500.00");
        assert_eq!(Money::from_minor(205).to_string(), "2.05");
        assert_eq!(Money::from_minor(-50).to_string(), "-0.50");
    }

    #[test]
    fn test_non_negative_sub_clamps() {
        let total = Money::from_major(3000);
        let paid = Money::from_major(5000);
        assert_eq!(total.non_negative_sub(paid), Money::ZERO);
        assert_eq!(paid.non_negative_sub(total), Money::from_major(2000));
    }

    #[test]
    fn test_sum_and_mul() {
        let amounts = [Money::from_major(2400), Money::from_major(3600)];
        assert_eq!(amounts.into_iter().sum::<Money>(), Money::from_major(6000));
        assert_eq!(Money::from_major(1500).checked_mul(3), Some(Money::from_major(4500)));
        assert_eq!(Money::from_minor(i64::MAX).checked_mul(2), None);
    }

    #[test]
    fn test_serializes_as_minor_units() {
        let json = serde_json::to_string(&Money::from_major(12)).unwrap();
        assert_eq!(json, "1200");
        let back: Money = serde_json::from_str("1250").unwrap();
        assert_eq!(back, Money::from_minor(1250));
    }
}
