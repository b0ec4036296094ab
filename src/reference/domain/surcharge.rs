//! Tiered cash-on-delivery surcharge policy.

use super::{Money, ReferenceDomainError};
use serde::{Deserialize, Serialize};

/// Basis points representing 100%.
pub(crate) const MAX_BASIS_POINTS: u32 = 10_000;

/// Surcharge applied by a COD tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Surcharge {
    /// Fixed amount regardless of the COD value.
    Flat {
        /// Surcharge amount.
        amount: Money,
    },
    /// Percentage of the COD value with a floor.
    Rate {
        /// Rate in basis points.
        basis_points: u32,
        /// Minimum surcharge.
        minimum: Money,
    },
}

impl Surcharge {
    /// Computes the surcharge for a COD amount.
    #[must_use]
    pub fn amount_for(self, cod_amount: Money) -> Money {
        match self {
            Self::Flat { amount } => amount,
            Self::Rate {
                basis_points,
                minimum,
            } => cod_amount.apply_basis_points(basis_points).max(minimum),
        }
    }
}

/// One tier of the COD surcharge table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodSurchargeTier {
    /// Smallest COD amount this tier applies to.
    pub threshold: Money,
    /// Surcharge charged within this tier.
    pub surcharge: Surcharge,
}

/// Tiered COD surcharge table keyed on amount thresholds.
///
/// The tier with the highest threshold not exceeding the COD amount applies.
/// A zero COD amount is never surcharged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodSurchargePolicy {
    tiers: Vec<CodSurchargeTier>,
}

impl CodSurchargePolicy {
    /// Creates a validated policy.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceDomainError::UnorderedSurchargeTiers`] when the
    /// thresholds are not strictly ascending and positive, and
    /// [`ReferenceDomainError::BasisPointsOutOfRange`] for rates above 100%.
    pub fn new(tiers: Vec<CodSurchargeTier>) -> Result<Self, ReferenceDomainError> {
        let ascending = tiers
            .iter()
            .try_fold(Money::ZERO, |previous, tier| {
                (tier.threshold > previous).then_some(tier.threshold)
            })
            .is_some();
        if !ascending {
            return Err(ReferenceDomainError::UnorderedSurchargeTiers);
        }
        for tier in &tiers {
            if let Surcharge::Rate { basis_points, .. } = tier.surcharge {
                if basis_points > MAX_BASIS_POINTS {
                    return Err(ReferenceDomainError::BasisPointsOutOfRange {
                        field: "surcharge rate",
                        value: basis_points,
                    });
                }
            }
        }
        Ok(Self { tiers })
    }

    /// Returns a policy that never surcharges.
    #[must_use]
    pub const fn none() -> Self {
        Self { tiers: Vec::new() }
    }

    /// Returns the configured tiers in ascending threshold order.
    #[must_use]
    pub fn tiers(&self) -> &[CodSurchargeTier] {
        &self.tiers
    }

    /// Returns the surcharge owed for `cod_amount`.
    #[must_use]
    pub fn surcharge_for(&self, cod_amount: Money) -> Money {
        if cod_amount.is_zero() {
            return Money::ZERO;
        }
        self.tiers
            .iter()
            .rev()
            .find(|tier| tier.threshold <= cod_amount)
            .map_or(Money::ZERO, |tier| tier.surcharge.amount_for(cod_amount))
    }
}
