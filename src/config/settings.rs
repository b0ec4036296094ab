//! Typed dispatch settings read from TOML.

use super::{ConfigError, ConfigResult};
use crate::dispatch::{
    adapters::memory::StaticFleetRoster,
    domain::{Crew, DriverId, PickupRetryPolicy, VehicleId},
    services::{DispatchPolicy, OptionPlannerSettings, RoutePlanningSettings},
};
use crate::reference::domain::{CodSurchargePolicy, CodSurchargeTier, RouteCode};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Largest accepted basis-point value.
const MAX_BASIS_POINTS: u32 = 10_000;

/// Widest offset from UTC accepted for the operating timezone.
const MAX_OFFSET_MINUTES: i32 = 18 * 60;

/// Top-level dispatch configuration.
///
/// Every section is optional; missing values fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchSettings {
    /// Operating timezone.
    pub operations: OperationsSettings,
    /// Task lifecycle policy.
    pub delivery: DeliverySettings,
    /// House COD surcharge tiers in ascending threshold order.
    pub cod_surcharge: Vec<CodSurchargeTier>,
    /// Daily route planning.
    pub planning: PlanningSettings,
    /// Crews available per route.
    pub fleet: Vec<FleetCrewSettings>,
    /// Carrier pickup retries and polling.
    pub pickup: PickupSettings,
    /// Outbox relay polling.
    pub outbox: OutboxSettings,
}

/// Operating timezone settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OperationsSettings {
    /// Offset from UTC in minutes, for example `420` for UTC+7.
    pub utc_offset_minutes: i32,
}

/// Task lifecycle settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeliverySettings {
    /// `failed -> pending` retries per task.
    pub retry_limit: u32,
    /// COD risk weighting for self-delivery ranking.
    pub self_delivery_cod_risk_basis_points: u32,
    /// Attempts for an update that keeps hitting version conflicts.
    pub max_update_attempts: u32,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        let policy = DispatchPolicy::default();
        Self {
            retry_limit: policy.retry_limit,
            self_delivery_cod_risk_basis_points: 0,
            max_update_attempts: policy.max_update_attempts,
        }
    }
}

/// Route planning settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlanningSettings {
    /// Stops per vehicle per day.
    pub vehicle_capacity: usize,
    /// Lease lifetime in seconds.
    pub lease_ttl_seconds: u64,
    /// Lease holder name.
    pub holder: String,
}

impl Default for PlanningSettings {
    fn default() -> Self {
        Self {
            vehicle_capacity: 20,
            lease_ttl_seconds: 600,
            holder: "route-planner".to_owned(),
        }
    }
}

/// One crew entry of the fleet roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FleetCrewSettings {
    /// Route the crew drives.
    pub route: String,
    /// Vehicle identifier.
    pub vehicle_id: String,
    /// Driver identifier.
    pub driver_id: String,
}

/// Carrier pickup settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PickupSettings {
    /// Attempts before a task fails.
    pub max_attempts: u32,
    /// Delay after the first failure, in seconds.
    pub base_delay_seconds: u64,
    /// Upper bound for the backoff delay, in seconds.
    pub max_delay_seconds: u64,
    /// Whether task creation books the pickup immediately.
    pub schedule_on_create: bool,
    /// Seconds between scans for due pickups.
    pub poll_interval_seconds: u64,
    /// Tasks read per scan.
    pub batch_size: usize,
    /// Seconds a worker holds a claimed pickup before others may retry it.
    pub claim_ttl_seconds: u64,
}

impl Default for PickupSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_seconds: 30,
            max_delay_seconds: 1_800,
            schedule_on_create: true,
            poll_interval_seconds: 30,
            batch_size: 50,
            claim_ttl_seconds: 300,
        }
    }
}

impl PickupSettings {
    /// Returns the scan interval.
    #[must_use]
    pub const fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval_seconds)
    }
}

/// Outbox relay settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutboxSettings {
    /// Events relayed per pass.
    pub batch_size: usize,
    /// Seconds between passes.
    pub poll_interval_seconds: u64,
}

impl Default for OutboxSettings {
    fn default() -> Self {
        Self {
            batch_size: 100,
            poll_interval_seconds: 5,
        }
    }
}

impl OutboxSettings {
    /// Returns the pass interval.
    #[must_use]
    pub const fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval_seconds)
    }
}

impl DispatchSettings {
    /// Parses and validates settings from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and validation
    /// errors from [`Self::validate`].
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let settings: Self =
            toml::from_str(source).map_err(|err| ConfigError::parse("settings", err))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks every section, including the COD tiers and fleet
    /// identifiers.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> ConfigResult<()> {
        self.operating_offset()?;
        self.option_planner()?;
        self.route_planning()?;
        self.pickup_policy()?;
        self.pickup_claim_ttl()?;
        self.fleet_roster()?;
        if self.delivery.max_update_attempts == 0 {
            return Err(ConfigError::invalid(
                "delivery.max_update_attempts",
                "must be at least 1",
            ));
        }
        if self.pickup.poll_interval_seconds == 0 {
            return Err(ConfigError::invalid(
                "pickup.poll_interval_seconds",
                "must be at least 1",
            ));
        }
        if self.pickup.batch_size == 0 {
            return Err(ConfigError::invalid("pickup.batch_size", "must be at least 1"));
        }
        if self.outbox.poll_interval_seconds == 0 {
            return Err(ConfigError::invalid(
                "outbox.poll_interval_seconds",
                "must be at least 1",
            ));
        }
        if self.outbox.batch_size == 0 {
            return Err(ConfigError::invalid("outbox.batch_size", "must be at least 1"));
        }
        Ok(())
    }

    /// Returns the operating timezone offset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the offset exceeds 18 hours.
    pub fn operating_offset(&self) -> ConfigResult<FixedOffset> {
        let minutes = self.operations.utc_offset_minutes;
        minutes
            .checked_mul(60)
            .filter(|_| minutes.abs() <= MAX_OFFSET_MINUTES)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                ConfigError::invalid(
                    "operations.utc_offset_minutes",
                    format!("{minutes} is outside +/-{MAX_OFFSET_MINUTES}"),
                )
            })
    }

    /// Builds the option planner settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Reference`] for unordered COD tiers and
    /// [`ConfigError::Invalid`] for an out-of-range risk weighting.
    pub fn option_planner(&self) -> ConfigResult<OptionPlannerSettings> {
        let risk = self.delivery.self_delivery_cod_risk_basis_points;
        if risk > MAX_BASIS_POINTS {
            return Err(ConfigError::invalid(
                "delivery.self_delivery_cod_risk_basis_points",
                format!("{risk} exceeds {MAX_BASIS_POINTS}"),
            ));
        }
        Ok(OptionPlannerSettings {
            operating_offset: self.operating_offset()?,
            cod_surcharge: CodSurchargePolicy::new(self.cod_surcharge.clone())?,
            self_delivery_cod_risk_basis_points: risk,
        })
    }

    /// Builds the task lifecycle policy.
    #[must_use]
    pub const fn dispatch_policy(&self) -> DispatchPolicy {
        DispatchPolicy {
            retry_limit: self.delivery.retry_limit,
            schedule_pickup_on_create: self.pickup.schedule_on_create,
            max_update_attempts: self.delivery.max_update_attempts,
        }
    }

    /// Builds the pickup backoff policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when there are no attempts or the
    /// base delay exceeds the maximum.
    pub fn pickup_policy(&self) -> ConfigResult<PickupRetryPolicy> {
        let pickup = &self.pickup;
        if pickup.max_attempts == 0 {
            return Err(ConfigError::invalid("pickup.max_attempts", "must be at least 1"));
        }
        if pickup.base_delay_seconds > pickup.max_delay_seconds {
            return Err(ConfigError::invalid(
                "pickup.base_delay_seconds",
                "must not exceed pickup.max_delay_seconds",
            ));
        }
        Ok(PickupRetryPolicy::new(
            pickup.max_attempts,
            seconds("pickup.base_delay_seconds", pickup.base_delay_seconds)?,
            seconds("pickup.max_delay_seconds", pickup.max_delay_seconds)?,
        ))
    }

    /// Returns how long a claimed pickup stays hidden from other workers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero or out-of-range value.
    pub fn pickup_claim_ttl(&self) -> ConfigResult<chrono::Duration> {
        if self.pickup.claim_ttl_seconds == 0 {
            return Err(ConfigError::invalid(
                "pickup.claim_ttl_seconds",
                "must be at least 1",
            ));
        }
        seconds("pickup.claim_ttl_seconds", self.pickup.claim_ttl_seconds)
    }

    /// Builds the route planning settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for zero capacity, a zero lease
    /// lifetime, or a blank holder name.
    pub fn route_planning(&self) -> ConfigResult<RoutePlanningSettings> {
        let planning = &self.planning;
        if planning.vehicle_capacity == 0 {
            return Err(ConfigError::invalid(
                "planning.vehicle_capacity",
                "must be at least 1",
            ));
        }
        if planning.lease_ttl_seconds == 0 {
            return Err(ConfigError::invalid(
                "planning.lease_ttl_seconds",
                "must be at least 1",
            ));
        }
        let holder = planning.holder.trim();
        if holder.is_empty() {
            return Err(ConfigError::invalid("planning.holder", "must not be blank"));
        }
        Ok(RoutePlanningSettings {
            vehicle_capacity: planning.vehicle_capacity,
            lease_ttl: seconds("planning.lease_ttl_seconds", planning.lease_ttl_seconds)?,
            holder: holder.to_owned(),
        })
    }

    /// Builds the fleet roster from the `[[fleet]]` entries.
    ///
    /// # Errors
    ///
    /// Returns identifier validation errors for malformed route, vehicle, or
    /// driver values.
    pub fn fleet_roster(&self) -> ConfigResult<StaticFleetRoster> {
        let mut roster: BTreeMap<RouteCode, Vec<Crew>> = BTreeMap::new();
        for entry in &self.fleet {
            let crew = Crew::new(
                VehicleId::new(entry.vehicle_id.as_str())?,
                DriverId::new(entry.driver_id.as_str())?,
            );
            roster
                .entry(RouteCode::new(entry.route.as_str())?)
                .or_default()
                .push(crew);
        }
        Ok(StaticFleetRoster::new(roster))
    }
}

fn seconds(field: &'static str, value: u64) -> ConfigResult<chrono::Duration> {
    chrono::Duration::from_std(std::time::Duration::from_secs(value))
        .map_err(|err| ConfigError::invalid(field, err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ports::FleetRoster;
    use crate::reference::domain::{Money, ReferenceDomainError};
    use chrono::NaiveDate;
    use rstest::rstest;

    #[rstest]
    fn empty_document_uses_defaults() {
        let settings = DispatchSettings::from_toml_str("").expect("defaults are valid");

        assert_eq!(settings, DispatchSettings::default());
        assert_eq!(settings.dispatch_policy(), DispatchPolicy::default());
        assert_eq!(
            settings.route_planning().expect("planning settings"),
            RoutePlanningSettings::default()
        );
    }

    #[rstest]
    fn full_document_builds_service_settings() {
        let settings = DispatchSettings::from_toml_str(
            r#"
            [operations]
            utc_offset_minutes = 420

            [delivery]
            retry_limit = 2
            self_delivery_cod_risk_basis_points = 100

            [[cod_surcharge]]
            threshold = 50000
            surcharge = { kind = "flat", amount = 1000 }

            [[cod_surcharge]]
            threshold = 100000
            surcharge = { kind = "rate", basis_points = 250, minimum = 2500 }

            [planning]
            vehicle_capacity = 2

            [[fleet]]
            route = "BKK-EAST"
            vehicle_id = "VAN-1"
            driver_id = "DRV-1"

            [pickup]
            max_attempts = 3
            base_delay_seconds = 60
            max_delay_seconds = 600
            "#,
        )
        .expect("settings should parse");

        let planner = settings.option_planner().expect("planner settings");
        assert_eq!(planner.operating_offset.local_minus_utc(), 7 * 3600);
        assert_eq!(
            planner.cod_surcharge.surcharge_for(Money::from_minor(60_000)),
            Money::from_minor(1_000)
        );
        assert_eq!(settings.dispatch_policy().retry_limit, 2);
        assert_eq!(settings.route_planning().expect("planning").vehicle_capacity, 2);
        assert_eq!(settings.pickup_policy().expect("pickup").max_attempts(), 3);
        assert_eq!(
            settings.pickup_claim_ttl().expect("claim ttl"),
            chrono::Duration::minutes(5)
        );
    }

    #[rstest]
    fn zero_claim_ttl_is_rejected() {
        let result = DispatchSettings::from_toml_str("[pickup]\nclaim_ttl_seconds = 0\n");

        assert!(matches!(
            result,
            Err(ConfigError::Invalid { field: "pickup.claim_ttl_seconds", .. })
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn fleet_entries_build_roster() {
        let settings = DispatchSettings::from_toml_str(
            r#"
            [[fleet]]
            route = "BKK-EAST"
            vehicle_id = "VAN-2"
            driver_id = "DRV-2"

            [[fleet]]
            route = "BKK-EAST"
            vehicle_id = "VAN-1"
            driver_id = "DRV-1"
            "#,
        )
        .expect("settings should parse");
        let roster = settings.fleet_roster().expect("roster");
        let route = RouteCode::new("BKK-EAST").expect("route code");
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).expect("valid date");

        let crews = roster.crews_for(&route, date).await.expect("crews");

        let vehicles: Vec<&str> = crews.iter().map(|crew| crew.vehicle_id().as_str()).collect();
        assert_eq!(vehicles, vec!["VAN-1", "VAN-2"]);
    }

    #[rstest]
    fn unordered_cod_tiers_are_rejected() {
        let result = DispatchSettings::from_toml_str(
            r#"
            [[cod_surcharge]]
            threshold = 100000
            surcharge = { kind = "flat", amount = 2000 }

            [[cod_surcharge]]
            threshold = 50000
            surcharge = { kind = "flat", amount = 1000 }
            "#,
        );

        assert!(matches!(
            result,
            Err(ConfigError::Reference(
                ReferenceDomainError::UnorderedSurchargeTiers
            ))
        ));
    }

    #[rstest]
    #[case("[planning]\nvehicle_capacity = 0", "planning.vehicle_capacity")]
    #[case("[pickup]\nmax_attempts = 0", "pickup.max_attempts")]
    #[case(
        "[pickup]\nbase_delay_seconds = 900\nmax_delay_seconds = 60",
        "pickup.base_delay_seconds"
    )]
    #[case("[operations]\nutc_offset_minutes = 1200", "operations.utc_offset_minutes")]
    #[case("[outbox]\nbatch_size = 0", "outbox.batch_size")]
    #[case("[planning]\nholder = \"  \"", "planning.holder")]
    fn out_of_range_settings_are_rejected(#[case] source: &str, #[case] expected_field: &str) {
        let result = DispatchSettings::from_toml_str(source);

        match result {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected_field),
            other => panic!("expected invalid {expected_field}, got {other:?}"),
        }
    }

    #[rstest]
    fn unknown_keys_are_rejected() {
        let result = DispatchSettings::from_toml_str("[planning]\ncapacity = 4");

        assert!(matches!(
            result,
            Err(ConfigError::Parse {
                document: "settings",
                ..
            })
        ));
    }
}
