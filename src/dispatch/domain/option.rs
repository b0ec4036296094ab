//! Ranked delivery options offered for an address.

use super::DeliveryMethod;
use crate::reference::domain::{CarrierId, Money, RouteCode};
use chrono::NaiveDate;
use serde::Serialize;

/// A viable way to deliver to an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryOption {
    method: DeliveryMethod,
    route_code: Option<RouteCode>,
    fee: Money,
    estimated_delivery: NaiveDate,
    cod_capable: bool,
    ranking_cost: Money,
    recommended: bool,
}

impl DeliveryOption {
    /// Creates a self-delivery option along `route_code`.
    #[must_use]
    pub const fn self_delivery(
        route_code: RouteCode,
        fee: Money,
        estimated_delivery: NaiveDate,
        cod_capable: bool,
        ranking_cost: Money,
    ) -> Self {
        Self {
            method: DeliveryMethod::SelfDelivery,
            route_code: Some(route_code),
            fee,
            estimated_delivery,
            cod_capable,
            ranking_cost,
            recommended: false,
        }
    }

    /// Creates a carrier option.
    #[must_use]
    pub const fn carrier(
        carrier_id: CarrierId,
        fee: Money,
        estimated_delivery: NaiveDate,
        cod_capable: bool,
        ranking_cost: Money,
    ) -> Self {
        Self {
            method: DeliveryMethod::Carrier(carrier_id),
            route_code: None,
            fee,
            estimated_delivery,
            cod_capable,
            ranking_cost,
            recommended: false,
        }
    }

    /// Returns the delivery method.
    #[must_use]
    pub const fn method(&self) -> &DeliveryMethod {
        &self.method
    }

    /// Returns the route code for self-delivery options.
    #[must_use]
    pub const fn route_code(&self) -> Option<&RouteCode> {
        self.route_code.as_ref()
    }

    /// Returns the customer fee.
    #[must_use]
    pub const fn fee(&self) -> Money {
        self.fee
    }

    /// Returns the estimated delivery date. For self-delivery this is also
    /// the planned date.
    #[must_use]
    pub const fn estimated_delivery(&self) -> NaiveDate {
        self.estimated_delivery
    }

    /// Returns whether the option can collect cash on delivery.
    #[must_use]
    pub const fn cod_capable(&self) -> bool {
        self.cod_capable
    }

    /// Returns the fee plus the weighted COD risk used for ranking.
    #[must_use]
    pub const fn ranking_cost(&self) -> Money {
        self.ranking_cost
    }

    /// Returns whether this is the top-ranked option.
    #[must_use]
    pub const fn is_recommended(&self) -> bool {
        self.recommended
    }

    fn sort_key(&self) -> (Money, bool, Option<&CarrierId>) {
        (
            self.ranking_cost,
            !self.method.is_self_delivery(),
            self.method.carrier_id(),
        )
    }
}

/// Orders options by ascending ranking cost, preferring self-delivery and
/// then the lower carrier id on ties, and flags the first as recommended.
#[must_use]
pub fn rank_options(mut options: Vec<DeliveryOption>) -> Vec<DeliveryOption> {
    options.sort_by(|left, right| left.sort_key().cmp(&right.sort_key()));
    for option in &mut options {
        option.recommended = false;
    }
    if let Some(first) = options.first_mut() {
        first.recommended = true;
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).expect("valid date")
    }

    fn carrier(id: &str, cost: u64) -> DeliveryOption {
        DeliveryOption::carrier(
            CarrierId::new(id).expect("valid carrier id"),
            Money::from_minor(cost),
            date(),
            true,
            Money::from_minor(cost),
        )
    }

    fn route(cost: u64) -> DeliveryOption {
        DeliveryOption::self_delivery(
            RouteCode::new("A").expect("valid route code"),
            Money::from_minor(cost),
            date(),
            true,
            Money::from_minor(cost),
        )
    }

    #[test]
    fn cheapest_option_is_recommended() {
        let ranked = rank_options(vec![route(5_000), carrier("kerry", 4_000)]);
        let methods: Vec<_> = ranked.iter().map(|option| option.method().to_storage()).collect();
        assert_eq!(methods, vec!["carrier:kerry", "self_delivery"]);
        assert!(ranked.first().is_some_and(DeliveryOption::is_recommended));
        assert!(!ranked.get(1).is_some_and(DeliveryOption::is_recommended));
    }

    #[test]
    fn ties_prefer_self_delivery_then_carrier_id() {
        let ranked = rank_options(vec![
            carrier("zeta", 4_000),
            carrier("alpha", 4_000),
            route(4_000),
        ]);
        let methods: Vec<_> = ranked.iter().map(|option| option.method().to_storage()).collect();
        assert_eq!(
            methods,
            vec!["self_delivery", "carrier:alpha", "carrier:zeta"]
        );
    }
}
