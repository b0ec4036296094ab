//! Dispatch stack wired from the fixture configuration files.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use haulier::config::{ConfigDirectory, DispatchSettings, ReferenceDataDocument};
use haulier::dispatch::{
    adapters::memory::{
        InMemoryAddressDirectory, InMemoryCarrierGateway, InMemoryDeliveryTaskRepository,
        InMemoryPlanningLease, RecordingEventPublisher,
    },
    domain::{AddressId, DeliveryAddress, OrderId},
    ports::{AddressDirectory, CarrierGateway, EventOutbox, EventPublisher, FleetRoster},
    services::{
        DeliveryOptionPlanner, DispatchService, OutboxRelay, PickupScheduler, RoutePlanner,
    },
};
use haulier::reference::{
    adapters::memory::{InMemoryCarrierRegistry, InMemoryRouteCatalog},
    domain::DeliveryArea,
    ports::{CarrierRegistry, RouteCatalog},
};
use mockable::Clock;

/// Directory holding `dispatch.toml` and `reference_data.toml`.
pub const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

/// Wednesday 2026-10-14, 10:00 in the UTC+7 operating timezone.
pub const WEDNESDAY_MORNING: &str = "2026-10-14T03:00:00Z";

/// Addresses every stack knows about.
pub const ADDRESSES: [(&str, &str, &str, &str); 4] = [
    ("addr-bangkapi", "Bangkok", "Bang Kapi", "Khlong Chan"),
    ("addr-buengkum", "Bangkok", "Bueng Kum", "Nawamin"),
    ("addr-lat-phrao", "Bangkok", "Lat Phrao", "Chorakhe Bua"),
    ("addr-phuket", "Phuket", "Mueang", "Talat Yai"),
];

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Creates a clock stopped at an RFC 3339 timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error when the timestamp does not parse.
    pub fn at(timestamp: &str) -> Result<Self, eyre::Report> {
        let now = DateTime::parse_from_rfc3339(timestamp)?.with_timezone(&Utc);
        Ok(Self {
            now: Mutex::new(now),
        })
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.now
            .lock()
            .map(|now| *now)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}

/// Repository type used by every stack.
pub type TestRepository = InMemoryDeliveryTaskRepository;

/// Dispatch service type used by every stack.
pub type TestService = DispatchService<TestRepository, FixedClock>;

/// In-memory dispatch services sharing one repository and clock.
pub struct DispatchStack {
    pub clock: Arc<FixedClock>,
    pub settings: DispatchSettings,
    pub repository: Arc<TestRepository>,
    pub routes: Arc<InMemoryRouteCatalog>,
    pub gateway: Arc<InMemoryCarrierGateway>,
    pub pickups: Arc<PickupScheduler<TestRepository, FixedClock>>,
    pub service: TestService,
}

impl DispatchStack {
    /// Loads the fixture configuration and wires the stack.
    ///
    /// # Errors
    ///
    /// Returns an error when a fixture file is missing or invalid.
    pub fn from_fixtures() -> Result<Self, eyre::Report> {
        let config = ConfigDirectory::open(FIXTURES)?;
        let settings = config.load_settings("dispatch.toml")?;
        let reference = config.load_reference_data("reference_data.toml")?;
        Self::wire(settings, &reference)
    }

    fn wire(
        settings: DispatchSettings,
        reference: &ReferenceDataDocument,
    ) -> Result<Self, eyre::Report> {
        let clock = Arc::new(FixedClock::at(WEDNESDAY_MORNING)?);
        let routes = Arc::new(InMemoryRouteCatalog::new(
            reference.route_catalog(clock.utc())?,
        ));
        let carriers: Arc<dyn CarrierRegistry> = Arc::new(InMemoryCarrierRegistry::new(
            reference.carrier_registry(clock.utc())?,
        ));

        let directory = InMemoryAddressDirectory::new();
        for (id, province, district, subdistrict) in ADDRESSES {
            directory.insert(DeliveryAddress::new(
                AddressId::new(id)?,
                DeliveryArea::new(province, district, subdistrict)?,
            ))?;
        }
        let addresses: Arc<dyn AddressDirectory> = Arc::new(directory);

        let repository = Arc::new(InMemoryDeliveryTaskRepository::new());
        let gateway = Arc::new(InMemoryCarrierGateway::new());
        let carrier_gateway: Arc<dyn CarrierGateway> =
            Arc::clone(&gateway) as Arc<dyn CarrierGateway>;
        let pickups = Arc::new(
            PickupScheduler::new(
                Arc::clone(&repository),
                carrier_gateway,
                Arc::clone(&clock),
                settings.pickup_policy()?,
                settings.pickup.batch_size,
            )
            .with_claim_ttl(settings.pickup_claim_ttl()?),
        );
        let route_catalog: Arc<dyn RouteCatalog> = Arc::clone(&routes) as Arc<dyn RouteCatalog>;
        let planner = DeliveryOptionPlanner::new(
            route_catalog,
            carriers,
            Arc::clone(&clock),
            settings.option_planner()?,
        );
        let service = DispatchService::new(
            Arc::clone(&repository),
            addresses,
            planner,
            Arc::clone(&pickups),
            settings.dispatch_policy(),
        );

        Ok(Self {
            clock,
            settings,
            repository,
            routes,
            gateway,
            pickups,
            service,
        })
    }

    /// Builds a route planner from the fixture fleet and planning settings.
    ///
    /// # Errors
    ///
    /// Returns an error when the planning settings are invalid.
    pub fn route_planner(&self) -> Result<RoutePlanner<TestRepository, FixedClock>, eyre::Report> {
        let route_catalog: Arc<dyn RouteCatalog> =
            Arc::clone(&self.routes) as Arc<dyn RouteCatalog>;
        let fleet: Arc<dyn FleetRoster> = Arc::new(self.settings.fleet_roster()?);
        Ok(RoutePlanner::new(
            Arc::clone(&self.repository),
            route_catalog,
            fleet,
            Arc::new(InMemoryPlanningLease::new(Arc::clone(&self.clock))),
            Arc::clone(&self.clock),
            self.settings.route_planning()?,
        ))
    }

    /// Builds an outbox relay that publishes into `publisher`.
    #[must_use]
    pub fn outbox_relay(&self, publisher: &Arc<RecordingEventPublisher>) -> OutboxRelay {
        let outbox: Arc<dyn EventOutbox> = Arc::clone(&self.repository) as Arc<dyn EventOutbox>;
        let bus: Arc<dyn EventPublisher> = Arc::clone(publisher) as Arc<dyn EventPublisher>;
        OutboxRelay::new(outbox, bus, self.settings.outbox.batch_size)
    }
}

/// Parses an order identifier.
///
/// # Errors
///
/// Returns an error for a blank identifier.
pub fn order(value: &str) -> Result<OrderId, eyre::Report> {
    Ok(OrderId::new(value)?)
}

/// Parses an address identifier.
///
/// # Errors
///
/// Returns an error for a blank identifier.
pub fn address(value: &str) -> Result<AddressId, eyre::Report> {
    Ok(AddressId::new(value)?)
}

/// Builds a calendar date.
///
/// # Errors
///
/// Returns an error for an impossible date.
pub fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate, eyre::Report> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| eyre::eyre!("invalid date {year}-{month}-{day}"))
}
