//! In-memory adapters for dispatch ports, used by tests and embedders.

mod directory;
mod gateway;
mod planning;
mod publisher;
mod task;

pub use directory::InMemoryAddressDirectory;
pub use gateway::InMemoryCarrierGateway;
pub use planning::{InMemoryPlanningLease, StaticFleetRoster};
pub use publisher::RecordingEventPublisher;
pub use task::InMemoryDeliveryTaskRepository;
