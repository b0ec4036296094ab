//! Carrier pricing rules.

use super::{
    CodSurchargePolicy, DeliveryArea, Money, ReferenceDomainError, area::same_place,
    surcharge::MAX_BASIS_POINTS,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pricing schema of a carrier, validated when reference data is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PricingRule {
    /// One fee everywhere; COD is surcharged by the house policy.
    Flat {
        /// Delivery fee.
        fee: Money,
    },
    /// Fee per destination province; COD is surcharged by the house policy.
    ProvinceZoned {
        /// Fee keyed by province name.
        zones: BTreeMap<String, Money>,
        /// Fee for provinces without a zone entry. Provinces without a zone
        /// are not priced when this is absent.
        #[serde(default)]
        default_fee: Option<Money>,
    },
    /// Base fee plus the carrier's own COD commission, replacing the house
    /// surcharge.
    CodRate {
        /// Delivery fee before COD commission.
        base_fee: Money,
        /// COD commission in basis points.
        rate_basis_points: u32,
        /// Minimum COD commission when COD is collected.
        minimum_cod_fee: Money,
    },
}

impl PricingRule {
    /// Validates the rule.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceDomainError::EmptyPricingZones`] for a zoned rule
    /// with nothing to price and
    /// [`ReferenceDomainError::BasisPointsOutOfRange`] for rates above 100%.
    pub fn validate(&self) -> Result<(), ReferenceDomainError> {
        match self {
            Self::Flat { .. } => Ok(()),
            Self::ProvinceZoned { zones, default_fee } => {
                if zones.is_empty() && default_fee.is_none() {
                    return Err(ReferenceDomainError::EmptyPricingZones);
                }
                Ok(())
            }
            Self::CodRate {
                rate_basis_points, ..
            } => {
                if *rate_basis_points > MAX_BASIS_POINTS {
                    return Err(ReferenceDomainError::BasisPointsOutOfRange {
                        field: "carrier COD rate",
                        value: *rate_basis_points,
                    });
                }
                Ok(())
            }
        }
    }

    /// Quotes the customer fee for a delivery to `area` collecting
    /// `cod_amount`.
    ///
    /// Returns `None` when the rule has no price for the area.
    #[must_use]
    pub fn quote(
        &self,
        area: &DeliveryArea,
        cod_amount: Money,
        house_policy: &CodSurchargePolicy,
    ) -> Option<Money> {
        match self {
            Self::Flat { fee } => Some(fee.saturating_add(house_policy.surcharge_for(cod_amount))),
            Self::ProvinceZoned { zones, default_fee } => zones
                .iter()
                .find(|(province, _)| same_place(province, area.province()))
                .map(|(_, fee)| *fee)
                .or(*default_fee)
                .map(|fee| fee.saturating_add(house_policy.surcharge_for(cod_amount))),
            Self::CodRate {
                base_fee,
                rate_basis_points,
                minimum_cod_fee,
            } => {
                let commission = if cod_amount.is_zero() {
                    Money::ZERO
                } else {
                    cod_amount
                        .apply_basis_points(*rate_basis_points)
                        .max(*minimum_cod_fee)
                };
                Some(base_fee.saturating_add(commission))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::domain::{CodSurchargeTier, Surcharge};
    use rstest::{fixture, rstest};

    #[fixture]
    fn house_policy() -> CodSurchargePolicy {
        CodSurchargePolicy::new(vec![CodSurchargeTier {
            threshold: Money::from_minor(1),
            surcharge: Surcharge::Flat {
                amount: Money::from_minor(1_000),
            },
        }])
        .expect("valid policy")
    }

    fn area(province: &str) -> DeliveryArea {
        DeliveryArea::new(province, "Mueang", "Nai Mueang").expect("valid area")
    }

    #[rstest]
    fn zoned_rule_prices_known_province(house_policy: CodSurchargePolicy) {
        let rule = PricingRule::ProvinceZoned {
            zones: BTreeMap::from([("Bangkok".to_owned(), Money::from_minor(4_500))]),
            default_fee: None,
        };
        assert_eq!(
            rule.quote(&area("bangkok"), Money::ZERO, &house_policy),
            Some(Money::from_minor(4_500))
        );
        assert_eq!(
            rule.quote(&area("Chiang Mai"), Money::ZERO, &house_policy),
            None
        );
    }

    #[rstest]
    fn flat_rule_adds_house_surcharge(house_policy: CodSurchargePolicy) {
        let rule = PricingRule::Flat {
            fee: Money::from_minor(3_000),
        };
        assert_eq!(
            rule.quote(&area("Bangkok"), Money::from_minor(50_000), &house_policy),
            Some(Money::from_minor(4_000))
        );
    }

    #[rstest]
    #[case(0, 5_000)]
    #[case(10_000, 7_000)]
    #[case(500_000, 15_000)]
    fn cod_rate_rule_replaces_house_surcharge(
        house_policy: CodSurchargePolicy,
        #[case] cod: u64,
        #[case] expected: u64,
    ) {
        let rule = PricingRule::CodRate {
            base_fee: Money::from_minor(5_000),
            rate_basis_points: 200,
            minimum_cod_fee: Money::from_minor(2_000),
        };
        assert_eq!(
            rule.quote(&area("Bangkok"), Money::from_minor(cod), &house_policy),
            Some(Money::from_minor(expected))
        );
    }

    #[test]
    fn empty_zoned_rule_is_invalid() {
        let rule = PricingRule::ProvinceZoned {
            zones: BTreeMap::new(),
            default_fee: None,
        };
        assert_eq!(rule.validate(), Err(ReferenceDomainError::EmptyPricingZones));
    }
}
