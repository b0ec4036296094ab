//! Third-party carrier reference data.

use super::{
    CarrierId, CodSurchargePolicy, DeliveryArea, Money, PricingRule, ReferenceDomainError,
    area::same_place, surcharge::MAX_BASIS_POINTS,
};
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use minijinja::{Environment, context};
use std::collections::BTreeSet;

/// Provinces served by a carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarrierCoverage {
    /// Every province.
    Nationwide,
    /// Only the listed provinces.
    Provinces(BTreeSet<String>),
}

impl CarrierCoverage {
    /// Returns whether the coverage includes the province of `area`.
    #[must_use]
    pub fn covers(&self, area: &DeliveryArea) -> bool {
        match self {
            Self::Nationwide => true,
            Self::Provinces(provinces) => provinces
                .iter()
                .any(|province| same_place(province, area.province())),
        }
    }
}

/// Compiled-once tracking-URL template, for example
/// `https://track.example.com/{{ tracking_number }}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingUrlTemplate(String);

impl TrackingUrlTemplate {
    /// Creates a template after checking that it compiles.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceDomainError::InvalidTrackingTemplate`] when the
    /// template has a syntax error.
    pub fn new(
        carrier: &CarrierId,
        source: impl Into<String>,
    ) -> Result<Self, ReferenceDomainError> {
        let template = source.into();
        let environment = Environment::new();
        if let Err(error) = environment.template_from_str(&template) {
            return Err(ReferenceDomainError::InvalidTrackingTemplate {
                carrier: carrier.as_str().to_owned(),
                reason: error.to_string(),
            });
        }
        Ok(Self(template))
    }

    /// Returns the template source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Parameter object for constructing a [`DeliveryCarrier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierSpec {
    /// Carrier identifier.
    pub id: CarrierId,
    /// Human-readable name.
    pub display_name: String,
    /// Whether the carrier is currently offered.
    pub active: bool,
    /// Provinces served.
    pub coverage: CarrierCoverage,
    /// Pricing schema.
    pub pricing: PricingRule,
    /// Local time after which same-day handover moves to the next day.
    pub cutoff: NaiveTime,
    /// Days from handover to delivery.
    pub transit_days: u32,
    /// Whether the carrier collects cash on delivery.
    pub cod_supported: bool,
    /// Ranking weight applied to the COD amount, in basis points.
    pub cod_risk_basis_points: u32,
    /// Tracking-URL template.
    pub tracking_url: TrackingUrlTemplate,
}

/// Third-party delivery provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryCarrier {
    spec: CarrierSpec,
}

impl DeliveryCarrier {
    /// Creates a validated carrier.
    ///
    /// # Errors
    ///
    /// Returns pricing validation errors, and
    /// [`ReferenceDomainError::EmptyCarrierCoverage`] for province coverage
    /// without provinces.
    pub fn new(spec: CarrierSpec) -> Result<Self, ReferenceDomainError> {
        spec.pricing.validate()?;
        if let CarrierCoverage::Provinces(provinces) = &spec.coverage {
            if provinces.is_empty() {
                return Err(ReferenceDomainError::EmptyCarrierCoverage(
                    spec.id.as_str().to_owned(),
                ));
            }
        }
        if spec.cod_risk_basis_points > MAX_BASIS_POINTS {
            return Err(ReferenceDomainError::BasisPointsOutOfRange {
                field: "COD risk weighting",
                value: spec.cod_risk_basis_points,
            });
        }
        Ok(Self { spec })
    }

    /// Returns the carrier identifier.
    #[must_use]
    pub const fn id(&self) -> &CarrierId {
        &self.spec.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.spec.display_name
    }

    /// Returns whether the carrier is offered.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.spec.active
    }

    /// Returns the pricing rule.
    #[must_use]
    pub const fn pricing(&self) -> &PricingRule {
        &self.spec.pricing
    }

    /// Returns the daily cutoff time.
    #[must_use]
    pub const fn cutoff(&self) -> NaiveTime {
        self.spec.cutoff
    }

    /// Returns whether the carrier collects cash on delivery.
    #[must_use]
    pub const fn cod_supported(&self) -> bool {
        self.spec.cod_supported
    }

    /// Returns the COD ranking weight in basis points.
    #[must_use]
    pub const fn cod_risk_basis_points(&self) -> u32 {
        self.spec.cod_risk_basis_points
    }

    /// Returns whether the carrier serves `area`.
    #[must_use]
    pub fn covers(&self, area: &DeliveryArea) -> bool {
        self.spec.coverage.covers(area)
    }

    /// Quotes the customer fee, or `None` when the pricing rule does not
    /// price the area.
    #[must_use]
    pub fn quote(
        &self,
        area: &DeliveryArea,
        cod_amount: Money,
        house_policy: &CodSurchargePolicy,
    ) -> Option<Money> {
        self.spec.pricing.quote(area, cod_amount, house_policy)
    }

    /// Estimates the delivery date for a handover requested at `local_now`.
    ///
    /// Requests after the cutoff are handed over the next day.
    #[must_use]
    pub fn estimated_delivery(&self, local_now: NaiveDateTime) -> NaiveDate {
        let handover_delay = u64::from(local_now.time() > self.spec.cutoff);
        let total_days = handover_delay.saturating_add(u64::from(self.spec.transit_days));
        local_now
            .date()
            .checked_add_days(Days::new(total_days))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Renders the public tracking URL for a tracking number.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceDomainError::TrackingRender`] when rendering fails.
    pub fn tracking_url(&self, tracking_number: &str) -> Result<String, ReferenceDomainError> {
        let environment = Environment::new();
        environment
            .render_str(
                self.spec.tracking_url.as_str(),
                context! { tracking_number => tracking_number, carrier => self.spec.id.as_str() },
            )
            .map_err(|error| ReferenceDomainError::TrackingRender {
                carrier: self.spec.id.as_str().to_owned(),
                reason: error.to_string(),
            })
    }
}
