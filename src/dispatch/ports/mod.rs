//! Port contracts for delivery dispatch.

mod directory;
mod gateway;
mod outbox;
mod planning;
mod repository;

pub use directory::{AddressDirectory, AddressDirectoryError, AddressDirectoryResult};
pub use gateway::{
    CarrierGateway, CarrierGatewayError, CarrierGatewayResult, PickupConfirmation, PickupRequest,
    TrackingInfo,
};
pub use outbox::{EventOutbox, EventPublisher, OutboxError, OutboxResult, PublishError};
pub use planning::{
    FleetRoster, FleetRosterError, LeaseToken, PlanningLease, PlanningLeaseError,
    PlanningLeaseResult,
};
pub use repository::{
    DeliveryTaskRepository, DeliveryTaskRepositoryError, DeliveryTaskRepositoryResult,
};
