//! Delivery option planning over immutable reference snapshots.

use super::{DispatchError, DispatchResult};
use crate::dispatch::domain::{
    DeliveryAddress, DeliveryOption, calculate_delivery_fee, rank_options,
};
use crate::reference::{
    domain::{CarrierRegistrySnapshot, CodSurchargePolicy, Money, RouteCatalogSnapshot},
    ports::{CarrierRegistry, RouteCatalog},
};
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};
use mockable::Clock;
use std::sync::Arc;
use tracing::debug;

/// Settings for option planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionPlannerSettings {
    /// Offset of the operating timezone used for "today" and cutoffs.
    pub operating_offset: FixedOffset,
    /// House COD surcharge tiers.
    pub cod_surcharge: CodSurchargePolicy,
    /// Weighting applied to COD amounts on self-delivery when ranking.
    pub self_delivery_cod_risk_basis_points: u32,
}

impl Default for OptionPlannerSettings {
    fn default() -> Self {
        Self {
            operating_offset: Utc.fix(),
            cod_surcharge: CodSurchargePolicy::none(),
            self_delivery_cod_risk_basis_points: 0,
        }
    }
}

/// Produces ranked delivery options for an address.
#[derive(Clone)]
pub struct DeliveryOptionPlanner<C>
where
    C: Clock + Send + Sync,
{
    routes: Arc<dyn RouteCatalog>,
    carriers: Arc<dyn CarrierRegistry>,
    clock: Arc<C>,
    settings: OptionPlannerSettings,
}

impl<C> DeliveryOptionPlanner<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a planner over the given reference data.
    #[must_use]
    pub fn new(
        routes: Arc<dyn RouteCatalog>,
        carriers: Arc<dyn CarrierRegistry>,
        clock: Arc<C>,
        settings: OptionPlannerSettings,
    ) -> Self {
        Self {
            routes,
            carriers,
            clock,
            settings,
        }
    }

    /// Returns the local date and time in the operating timezone.
    #[must_use]
    pub fn local_now(&self) -> NaiveDateTime {
        self.clock
            .utc()
            .with_timezone(&self.settings.operating_offset)
            .naive_local()
    }

    /// Returns today's date in the operating timezone.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.local_now().date()
    }

    /// Returns the ranked viable options for delivering to `address`
    /// while collecting `cod_amount`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NoCoverage`] when nothing serves the
    /// address, or a reference data error when a snapshot cannot be read.
    pub async fn plan(
        &self,
        address: &DeliveryAddress,
        cod_amount: Money,
    ) -> DispatchResult<Vec<DeliveryOption>> {
        let routes = self.routes.snapshot().await?;
        let carriers = self.carriers.snapshot().await?;
        let options = self.plan_with(&routes, &carriers, address, cod_amount);
        if options.is_empty() {
            return Err(DispatchError::NoCoverage(address.id().clone()));
        }
        debug!(
            address_id = %address.id(),
            options = options.len(),
            "planned delivery options"
        );
        Ok(options)
    }

    /// Plans against explicit snapshots.
    #[must_use]
    pub fn plan_with(
        &self,
        routes: &RouteCatalogSnapshot,
        carriers: &CarrierRegistrySnapshot,
        address: &DeliveryAddress,
        cod_amount: Money,
    ) -> Vec<DeliveryOption> {
        let local_now = self.local_now();
        let today = local_now.date();
        let area = address.area();
        let policy = &self.settings.cod_surcharge;

        let route_option = routes
            .best_match(area, address.route_hint())
            .map(|route| {
                let fee = calculate_delivery_fee(route, cod_amount, policy);
                let risk = cod_amount
                    .apply_basis_points(self.settings.self_delivery_cod_risk_basis_points);
                DeliveryOption::self_delivery(
                    route.code().clone(),
                    fee,
                    route.next_delivery_date(today),
                    route.accepts_cod(),
                    fee.saturating_add(risk),
                )
            });

        let carrier_options = carriers.covering(area).filter_map(|carrier| {
            let fee = carrier.quote(area, cod_amount, policy)?;
            let risk = cod_amount.apply_basis_points(carrier.cod_risk_basis_points());
            Some(DeliveryOption::carrier(
                carrier.id().clone(),
                fee,
                carrier.estimated_delivery(local_now),
                carrier.cod_supported(),
                fee.saturating_add(risk),
            ))
        });

        rank_options(route_option.into_iter().chain(carrier_options).collect())
    }

    pub(super) fn route_catalog(&self) -> &Arc<dyn RouteCatalog> {
        &self.routes
    }

    pub(super) fn carrier_registry(&self) -> &Arc<dyn CarrierRegistry> {
        &self.carriers
    }

    pub(super) const fn clock(&self) -> &Arc<C> {
        &self.clock
    }
}
