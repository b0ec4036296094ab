//! Application services orchestrating dispatch workflows.

mod dispatch;
mod error;
mod options;
mod outbox;
mod pickup;
mod routing;

pub use dispatch::{CreateDeliveryTaskRequest, DispatchPolicy, DispatchService, TrackingDetails};
pub use error::{DispatchError, DispatchResult, ErrorKind};
pub use options::{DeliveryOptionPlanner, OptionPlannerSettings};
pub use outbox::OutboxRelay;
pub use pickup::{PickupOutcome, PickupRunSummary, PickupScheduler, PickupTaskError};
pub use routing::{RoutePlanner, RoutePlanningSettings};
