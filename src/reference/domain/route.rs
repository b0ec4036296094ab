//! Self-delivery route reference data.

use super::{
    CodSurchargePolicy, CoverageArea, CoverageSpecificity, DeliveryArea, DeliverySchedule, Money,
    ReferenceDomainError, RouteCode,
};
use chrono::NaiveDate;

/// Parameter object for constructing a [`DeliveryRoute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    /// Route code.
    pub code: RouteCode,
    /// Areas served by the route.
    pub coverage: Vec<CoverageArea>,
    /// Weekly delivery days.
    pub schedule: DeliverySchedule,
    /// Base delivery fee.
    pub base_fee: Money,
    /// Whether drivers on this route collect cash on delivery.
    pub accepts_cod: bool,
    /// Whether the route is currently offered.
    pub active: bool,
}

/// Predefined coverage area with a weekly delivery-day schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRoute {
    code: RouteCode,
    coverage: Vec<CoverageArea>,
    schedule: DeliverySchedule,
    base_fee: Money,
    accepts_cod: bool,
    active: bool,
}

impl DeliveryRoute {
    /// Creates a validated route.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceDomainError::EmptyRouteCoverage`] when the route
    /// covers no area.
    pub fn new(spec: RouteSpec) -> Result<Self, ReferenceDomainError> {
        if spec.coverage.is_empty() {
            return Err(ReferenceDomainError::EmptyRouteCoverage(
                spec.code.as_str().to_owned(),
            ));
        }
        Ok(Self {
            code: spec.code,
            coverage: spec.coverage,
            schedule: spec.schedule,
            base_fee: spec.base_fee,
            accepts_cod: spec.accepts_cod,
            active: spec.active,
        })
    }

    /// Returns the route code.
    #[must_use]
    pub const fn code(&self) -> &RouteCode {
        &self.code
    }

    /// Returns the covered areas.
    #[must_use]
    pub fn coverage(&self) -> &[CoverageArea] {
        &self.coverage
    }

    /// Returns the weekly schedule.
    #[must_use]
    pub const fn schedule(&self) -> DeliverySchedule {
        self.schedule
    }

    /// Returns the base delivery fee.
    #[must_use]
    pub const fn base_fee(&self) -> Money {
        self.base_fee
    }

    /// Returns whether the route collects cash on delivery.
    #[must_use]
    pub const fn accepts_cod(&self) -> bool {
        self.accepts_cod
    }

    /// Returns whether the route is offered.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the most specific coverage match for `area`, if any.
    #[must_use]
    pub fn coverage_match(&self, area: &DeliveryArea) -> Option<CoverageSpecificity> {
        self.coverage
            .iter()
            .filter_map(|coverage| coverage.specificity_for(area))
            .max()
    }

    /// Returns the first delivery date on or after `today`.
    #[must_use]
    pub fn next_delivery_date(&self, today: NaiveDate) -> NaiveDate {
        self.schedule.next_on_or_after(today)
    }

    /// Computes the customer fee for this route.
    ///
    /// The result depends only on the route's base fee, the COD amount, and
    /// the surcharge policy.
    #[must_use]
    pub fn delivery_fee(&self, cod_amount: Money, policy: &CodSurchargePolicy) -> Money {
        self.base_fee.saturating_add(policy.surcharge_for(cod_amount))
    }
}
