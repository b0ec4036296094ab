//! Monetary amounts in minor currency units.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Basis points representing 100%.
const BASIS_POINTS_SCALE: u128 = 10_000;

/// Non-negative amount of money in minor currency units.
///
/// Fee arithmetic is integer-only; rates are expressed in basis points.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from minor currency units.
    #[must_use]
    pub const fn from_minor(units: u64) -> Self {
        Self(units)
    }

    /// Returns the amount in minor currency units.
    #[must_use]
    pub const fn minor_units(self) -> u64 {
        self.0
    }

    /// Returns whether the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Adds two amounts, saturating at the numeric bound.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Returns `basis_points / 10000` of this amount, rounded down.
    #[must_use]
    pub fn apply_basis_points(self, basis_points: u32) -> Self {
        let scaled = u128::from(self.0)
            .saturating_mul(u128::from(basis_points))
            .div_euclid(BASIS_POINTS_SCALE);
        Self(u64::try_from(scaled).unwrap_or(u64::MAX))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Money;
    use rstest::rstest;

    #[rstest]
    #[case(10_000, 150, 150)]
    #[case(12_345, 250, 308)]
    #[case(0, 500, 0)]
    #[case(u64::MAX, 10_000, u64::MAX)]
    fn apply_basis_points_rounds_down(
        #[case] amount: u64,
        #[case] basis_points: u32,
        #[case] expected: u64,
    ) {
        assert_eq!(
            Money::from_minor(amount).apply_basis_points(basis_points),
            Money::from_minor(expected)
        );
    }
}
