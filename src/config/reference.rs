//! Route and carrier reference data documents.

use super::{ConfigError, ConfigResult};
use crate::reference::domain::{
    CarrierCoverage, CarrierId, CarrierRegistrySnapshot, CarrierSpec, CoverageArea,
    DeliveryCarrier, DeliveryRoute, DeliverySchedule, Money, PricingRule, RouteCatalogSnapshot,
    RouteCode, RouteSpec, TrackingUrlTemplate,
};
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference data as written in TOML: `[[routes]]` and `[[carriers]]`
/// tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReferenceDataDocument {
    /// Self-delivery routes.
    pub routes: Vec<RouteDocument>,
    /// Third-party carriers.
    pub carriers: Vec<CarrierDocument>,
}

/// One route entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteDocument {
    /// Route code.
    pub code: String,
    /// Weekday names, for example `["tue", "fri"]`.
    pub days: Vec<String>,
    /// Fee before COD surcharge.
    pub base_fee: Money,
    /// Whether the route collects COD.
    #[serde(default)]
    pub accepts_cod: bool,
    /// Inactive routes are kept but never offered.
    #[serde(default = "enabled")]
    pub active: bool,
    /// Areas the route serves.
    pub coverage: Vec<CoverageDocument>,
}

/// One coverage entry of a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoverageDocument {
    /// Province name.
    pub province: String,
    /// District name.
    #[serde(default)]
    pub district: Option<String>,
    /// Subdistrict name; requires `district`.
    #[serde(default)]
    pub subdistrict: Option<String>,
}

/// One carrier entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CarrierDocument {
    /// Carrier identifier.
    pub id: String,
    /// Human-readable name.
    pub display_name: String,
    /// Inactive carriers are kept but never offered.
    #[serde(default = "enabled")]
    pub active: bool,
    /// Served provinces. Omit for nationwide coverage.
    #[serde(default)]
    pub provinces: Option<Vec<String>>,
    /// Pricing rule.
    pub pricing: PricingRule,
    /// Local time after which a pickup moves to the next day.
    pub cutoff: NaiveTime,
    /// Days in transit after pickup.
    pub transit_days: u32,
    /// Whether the carrier collects COD.
    #[serde(default)]
    pub cod_supported: bool,
    /// COD risk weighting used when ranking.
    #[serde(default)]
    pub cod_risk_basis_points: u32,
    /// Tracking URL template with a `tracking_number` variable.
    pub tracking_url: String,
}

const fn enabled() -> bool {
    true
}

impl ReferenceDataDocument {
    /// Parses a document from TOML without building snapshots.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        toml::from_str(source).map_err(|err| ConfigError::parse("reference data", err))
    }

    /// Builds the route catalog snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Reference`] for invalid routes, schedules, or
    /// duplicate codes.
    pub fn route_catalog(&self, loaded_at: DateTime<Utc>) -> ConfigResult<RouteCatalogSnapshot> {
        let routes = self
            .routes
            .iter()
            .map(RouteDocument::to_route)
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(RouteCatalogSnapshot::new(routes, loaded_at)?)
    }

    /// Builds the carrier registry snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Reference`] for invalid pricing, coverage,
    /// tracking templates, or duplicate identifiers.
    pub fn carrier_registry(
        &self,
        loaded_at: DateTime<Utc>,
    ) -> ConfigResult<CarrierRegistrySnapshot> {
        let carriers = self
            .carriers
            .iter()
            .map(CarrierDocument::to_carrier)
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(CarrierRegistrySnapshot::new(carriers, loaded_at)?)
    }
}

impl RouteDocument {
    fn to_route(&self) -> ConfigResult<DeliveryRoute> {
        let coverage = self
            .coverage
            .iter()
            .map(|area| {
                CoverageArea::new(
                    area.province.as_str(),
                    area.district.clone(),
                    area.subdistrict.clone(),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DeliveryRoute::new(RouteSpec {
            code: RouteCode::new(self.code.as_str())?,
            coverage,
            schedule: DeliverySchedule::parse(&self.days)?,
            base_fee: self.base_fee,
            accepts_cod: self.accepts_cod,
            active: self.active,
        })?)
    }
}

impl CarrierDocument {
    fn to_carrier(&self) -> ConfigResult<DeliveryCarrier> {
        let id = CarrierId::new(self.id.as_str())?;
        let coverage = self.provinces.as_ref().map_or(CarrierCoverage::Nationwide, |names| {
            CarrierCoverage::Provinces(names.iter().map(|name| name.trim().to_owned()).collect())
        });
        let tracking_url = TrackingUrlTemplate::new(&id, self.tracking_url.as_str())?;
        Ok(DeliveryCarrier::new(CarrierSpec {
            id,
            display_name: self.display_name.clone(),
            active: self.active,
            coverage,
            pricing: self.pricing.clone(),
            cutoff: self.cutoff,
            transit_days: self.transit_days,
            cod_supported: self.cod_supported,
            cod_risk_basis_points: self.cod_risk_basis_points,
            tracking_url,
        })?)
    }
}
