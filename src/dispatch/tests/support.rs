//! Shared fixtures for dispatch tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use mockable::Clock;

use crate::config::{DispatchSettings, ReferenceDataDocument};
use crate::dispatch::{
    adapters::memory::{
        InMemoryAddressDirectory, InMemoryCarrierGateway, InMemoryDeliveryTaskRepository,
        InMemoryPlanningLease, StaticFleetRoster,
    },
    domain::{
        AddressId, Crew, DeliveryAddress, DeliveryTask, DriverId, OrderId, PickupRetryPolicy,
        VehicleId,
    },
    ports::{AddressDirectory, CarrierGateway, PlanningLease},
    services::{
        CreateDeliveryTaskRequest, DeliveryOptionPlanner, DispatchPolicy, DispatchService,
        PickupScheduler, RoutePlanner, RoutePlanningSettings,
    },
};
use crate::reference::{
    adapters::memory::{InMemoryCarrierRegistry, InMemoryRouteCatalog},
    domain::{DeliveryArea, RouteCatalogSnapshot, RouteCode},
    ports::{CarrierRegistry, ReferenceDataResult, RouteCatalog},
};

/// Wednesday 2026-10-14, 10:00 at UTC+7.
pub(super) const WEDNESDAY_MORNING: &str = "2026-10-14T03:00:00Z";

pub(super) const REFERENCE_DATA: &str = r#"
[[routes]]
code = "BKK-EAST"
days = ["tue", "fri"]
base_fee = 4000
accepts_cod = true
coverage = [{ province = "Bangkok", district = "Bang Kapi" }]

[[routes]]
code = "NBI-1"
days = ["mon"]
base_fee = 3500
coverage = [{ province = "Nonthaburi" }]

[[carriers]]
id = "kerry"
display_name = "Kerry Express"
provinces = ["Bangkok", "Nonthaburi", "Chiang Mai"]
pricing = { kind = "flat", fee = 6000 }
cutoff = "14:00:00"
transit_days = 1
cod_supported = true
tracking_url = "https://track.example.com/kerry/{{ tracking_number }}"

[[carriers]]
id = "flash"
display_name = "Flash Express"
provinces = ["Chiang Mai"]
pricing = { kind = "flat", fee = 4500 }
cutoff = "12:00:00"
transit_days = 2
tracking_url = "https://flash.example.com/t/{{ tracking_number }}"
"#;

pub(super) const SETTINGS: &str = r#"
[operations]
utc_offset_minutes = 420

[[cod_surcharge]]
threshold = 1
surcharge = { kind = "flat", amount = 1000 }
"#;

/// Clock that only moves when told to.
#[derive(Debug)]
pub(super) struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub(super) fn at(timestamp: &str) -> Self {
        Self {
            now: Mutex::new(parse_utc(timestamp)),
        }
    }

    pub(super) fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock");
        *now += by;
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

pub(super) fn parse_utc(timestamp: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(timestamp)
        .expect("valid RFC 3339 timestamp")
        .with_timezone(&Utc)
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn order(value: &str) -> OrderId {
    OrderId::new(value).expect("valid order id")
}

pub(super) fn route(value: &str) -> RouteCode {
    RouteCode::new(value).expect("valid route code")
}

pub(super) fn crew(vehicle: &str, driver: &str) -> Crew {
    Crew::new(
        VehicleId::new(vehicle).expect("valid vehicle id"),
        DriverId::new(driver).expect("valid driver id"),
    )
}

/// Route catalog that counts snapshot reads.
pub(super) struct CountingRouteCatalog {
    inner: Arc<InMemoryRouteCatalog>,
    reads: AtomicUsize,
}

impl CountingRouteCatalog {
    pub(super) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RouteCatalog for CountingRouteCatalog {
    async fn snapshot(&self) -> ReferenceDataResult<Arc<RouteCatalogSnapshot>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.snapshot().await
    }
}

pub(super) type TestRepository = InMemoryDeliveryTaskRepository;
pub(super) type TestService = DispatchService<TestRepository, FixedClock>;
pub(super) type TestScheduler = PickupScheduler<TestRepository, FixedClock>;

/// Addresses registered by [`Harness::new`].
pub(super) const ADDRESSES: [(&str, &str, &str, &str); 5] = [
    ("addr-bangkapi-1", "Bangkok", "Bang Kapi", "Khlong Chan"),
    ("addr-bangkapi-2", "Bangkok", "Bang Kapi", "Hua Mak"),
    ("addr-bangkapi-3", "Bangkok", "bang kapi", "Khlong Chan"),
    ("addr-chiangmai", "Chiang Mai", "Mueang", "Si Phum"),
    ("addr-phuket", "Phuket", "Mueang", "Talat Yai"),
];

/// Dispatch service wired to in-memory adapters.
pub(super) struct Harness {
    pub(super) clock: Arc<FixedClock>,
    pub(super) repository: Arc<TestRepository>,
    pub(super) gateway: Arc<InMemoryCarrierGateway>,
    pub(super) routes: Arc<InMemoryRouteCatalog>,
    pub(super) service_routes: Arc<CountingRouteCatalog>,
    pub(super) pickups: Arc<TestScheduler>,
    pub(super) service: TestService,
    settings: DispatchSettings,
}

impl Harness {
    pub(super) fn new() -> Self {
        Self::with_gateway_and_policy(
            Arc::new(InMemoryCarrierGateway::new()),
            DispatchPolicy {
                schedule_pickup_on_create: false,
                ..DispatchPolicy::default()
            },
        )
    }

    pub(super) fn with_gateway_and_policy(
        gateway: Arc<InMemoryCarrierGateway>,
        policy: DispatchPolicy,
    ) -> Self {
        let clock = Arc::new(FixedClock::at(WEDNESDAY_MORNING));
        let settings = DispatchSettings::from_toml_str(SETTINGS).expect("valid settings");
        let document =
            ReferenceDataDocument::from_toml_str(REFERENCE_DATA).expect("valid reference data");
        let loaded_at = clock.utc();
        let routes = Arc::new(InMemoryRouteCatalog::new(
            document.route_catalog(loaded_at).expect("route catalog"),
        ));
        let carriers = Arc::new(InMemoryCarrierRegistry::new(
            document.carrier_registry(loaded_at).expect("carrier registry"),
        ));

        let directory = InMemoryAddressDirectory::new();
        for (id, province, district, subdistrict) in ADDRESSES {
            let area = DeliveryArea::new(province, district, subdistrict).expect("valid area");
            directory
                .insert(DeliveryAddress::new(
                    AddressId::new(id).expect("valid address id"),
                    area,
                ))
                .expect("address stored");
        }

        let repository = Arc::new(InMemoryDeliveryTaskRepository::new());
        let service_routes = Arc::new(CountingRouteCatalog {
            inner: Arc::clone(&routes),
            reads: AtomicUsize::new(0),
        });
        let route_catalog: Arc<dyn RouteCatalog> =
            Arc::clone(&service_routes) as Arc<dyn RouteCatalog>;
        let carrier_registry: Arc<dyn CarrierRegistry> = carriers;
        let planner = DeliveryOptionPlanner::new(
            route_catalog,
            carrier_registry,
            Arc::clone(&clock),
            settings.option_planner().expect("planner settings"),
        );
        let carrier_gateway: Arc<dyn CarrierGateway> =
            Arc::clone(&gateway) as Arc<dyn CarrierGateway>;
        let pickups = Arc::new(PickupScheduler::new(
            Arc::clone(&repository),
            carrier_gateway,
            Arc::clone(&clock),
            PickupRetryPolicy::new(3, Duration::seconds(30), Duration::minutes(10)),
            50,
        ));
        let addresses: Arc<dyn AddressDirectory> = Arc::new(directory);
        let service = DispatchService::new(
            Arc::clone(&repository),
            addresses,
            planner,
            Arc::clone(&pickups),
            policy,
        );

        Self {
            clock,
            repository,
            gateway,
            routes,
            service_routes,
            pickups,
            service,
            settings,
        }
    }

    /// Creates a task for `order_id` at `address_id` with the recommended
    /// method.
    pub(super) async fn create(&self, order_id: &str, address_id: &str) -> DeliveryTask {
        self.service
            .create_delivery_task(CreateDeliveryTaskRequest::new(
                order(order_id),
                AddressId::new(address_id).expect("valid address id"),
            ))
            .await
            .expect("task creation should succeed")
    }

    /// Runs route planning for the task's date and returns the stored task.
    pub(super) async fn plan(&self, task: &DeliveryTask) -> DeliveryTask {
        self.route_planner(10)
            .plan_daily_routes(task.planned_date())
            .await
            .expect("route planning succeeds");
        self.service
            .get_task(task.id())
            .await
            .expect("task exists")
    }

    /// Builds a route planner with two crews on `BKK-EAST`.
    pub(super) fn route_planner(
        &self,
        vehicle_capacity: usize,
    ) -> RoutePlanner<TestRepository, FixedClock> {
        self.route_planner_with_lease(
            vehicle_capacity,
            Arc::new(InMemoryPlanningLease::new(Arc::clone(&self.clock))),
        )
    }

    pub(super) fn route_planner_with_lease(
        &self,
        vehicle_capacity: usize,
        lease: Arc<dyn PlanningLease>,
    ) -> RoutePlanner<TestRepository, FixedClock> {
        let mut roster = BTreeMap::new();
        roster.insert(
            route("BKK-EAST"),
            vec![crew("VAN-1", "DRV-1"), crew("VAN-2", "DRV-2")],
        );
        let route_catalog: Arc<dyn RouteCatalog> =
            Arc::clone(&self.routes) as Arc<dyn RouteCatalog>;
        RoutePlanner::new(
            Arc::clone(&self.repository),
            route_catalog,
            Arc::new(StaticFleetRoster::new(roster)),
            lease,
            Arc::clone(&self.clock),
            RoutePlanningSettings {
                vehicle_capacity,
                ..self.settings.route_planning().expect("planning settings")
            },
        )
    }
}
