//! Shared world state for delivery task status scenarios.

use haulier::dispatch::{domain::DeliveryTask, services::DispatchError};
use rstest::fixture;

use crate::test_helpers::DispatchStack;

/// Scenario world for delivery task status behaviour tests.
#[derive(Default)]
pub struct DeliveryStatusWorld {
    pub stack: Option<DispatchStack>,
    pub task: Option<DeliveryTask>,
    pub last_update: Option<Result<DeliveryTask, DispatchError>>,
}

impl DeliveryStatusWorld {
    /// Returns the dispatch stack created by the first given step.
    ///
    /// # Errors
    ///
    /// Returns an error when no task has been set up yet.
    pub fn stack(&self) -> Result<&DispatchStack, eyre::Report> {
        self.stack
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing dispatch stack in scenario world"))
    }

    /// Returns the task under test.
    ///
    /// # Errors
    ///
    /// Returns an error when no task has been created yet.
    pub fn task(&self) -> Result<&DeliveryTask, eyre::Report> {
        self.task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing delivery task in scenario world"))
    }
}

/// Fixture that creates an empty scenario world.
#[fixture]
pub fn world() -> DeliveryStatusWorld {
    DeliveryStatusWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
