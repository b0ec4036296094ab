//! Self-delivery fee calculation.

use crate::reference::domain::{CodSurchargePolicy, DeliveryRoute, Money};

/// Computes the customer fee for delivering along `route`.
///
/// The fee is the route's base fee plus the COD surcharge tier matching
/// `cod_amount`. The calculation reads nothing but its arguments.
#[must_use]
pub fn calculate_delivery_fee(
    route: &DeliveryRoute,
    cod_amount: Money,
    policy: &CodSurchargePolicy,
) -> Money {
    route.delivery_fee(cod_amount, policy)
}
