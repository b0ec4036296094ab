//! Domain model for delivery dispatch.
//!
//! The dispatch domain models delivery options, the delivery task lifecycle,
//! carrier pickup retries, route manifests, and outbox events while keeping
//! all infrastructure concerns outside of the domain boundary.

mod address;
mod assignment;
mod error;
mod event;
mod fee;
mod ids;
mod manifest;
mod method;
mod option;
mod pickup;
mod status;
mod task;

pub use address::DeliveryAddress;
pub use assignment::{Assignment, Crew};
pub use error::{DeliveryDomainError, ParseDeliveryMethodError, ParseTaskStatusError};
pub use event::{DeliveryEvent, DeliveryEventKind};
pub use fee::calculate_delivery_fee;
pub use ids::{AddressId, DeliveryTaskId, DriverId, OrderId, TrackingNumber, VehicleId};
pub use manifest::{CapacityExceeded, RouteManifest, RouteOutcome, RoutePlanSummary};
pub use method::DeliveryMethod;
pub use option::{DeliveryOption, rank_options};
pub use pickup::{PickupRetryPolicy, PickupState};
pub use status::TaskStatus;
pub use task::{DeliveryTask, NewDeliveryTask, PersistedDeliveryTask};
