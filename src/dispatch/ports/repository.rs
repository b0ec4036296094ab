//! Repository port for delivery task persistence.

use crate::dispatch::domain::{DeliveryEvent, DeliveryTask, DeliveryTaskId, OrderId};
use crate::reference::domain::RouteCode;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for delivery task repository operations.
pub type DeliveryTaskRepositoryResult<T> = Result<T, DeliveryTaskRepositoryError>;

/// Delivery task persistence contract.
///
/// Every write stores its outbox events in the same commit as the task
/// change.
#[async_trait]
pub trait DeliveryTaskRepository: Send + Sync {
    /// Stores a new task with its events.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryTaskRepositoryError::DuplicateTask`] when the task
    /// ID already exists or [`DeliveryTaskRepositoryError::ActiveTaskExists`]
    /// when the order already has an active task.
    async fn create(
        &self,
        task: &DeliveryTask,
        events: &[DeliveryEvent],
    ) -> DeliveryTaskRepositoryResult<()>;

    /// Persists a changed task with its events and returns the stored task
    /// carrying its new version.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryTaskRepositoryError::NotFound`] when the task does
    /// not exist or [`DeliveryTaskRepositoryError::VersionConflict`] when the
    /// stored version differs from `task.version()`.
    async fn update(
        &self,
        task: &DeliveryTask,
        events: &[DeliveryEvent],
    ) -> DeliveryTaskRepositoryResult<DeliveryTask>;

    /// Persists several changed tasks and their events atomically.
    ///
    /// # Errors
    ///
    /// Fails as [`Self::update`] does for any task; nothing is written then.
    async fn save_batch(
        &self,
        tasks: &[DeliveryTask],
        events: &[DeliveryEvent],
    ) -> DeliveryTaskRepositoryResult<Vec<DeliveryTask>>;

    /// Finds a task by identifier.
    async fn find_by_id(
        &self,
        id: DeliveryTaskId,
    ) -> DeliveryTaskRepositoryResult<Option<DeliveryTask>>;

    /// Returns every task for an order, newest first.
    async fn find_by_order_id(
        &self,
        order_id: &OrderId,
    ) -> DeliveryTaskRepositoryResult<Vec<DeliveryTask>>;

    /// Returns pending self-delivery tasks planned for `date`.
    async fn find_pending_for_date(
        &self,
        date: NaiveDate,
    ) -> DeliveryTaskRepositoryResult<Vec<DeliveryTask>>;

    /// Returns self-delivery tasks on a route planned for `date`, whatever
    /// their status.
    async fn find_by_route(
        &self,
        route_code: &RouteCode,
        date: NaiveDate,
    ) -> DeliveryTaskRepositoryResult<Vec<DeliveryTask>>;

    /// Returns up to `limit` pending carrier tasks whose pickup is due at
    /// `now`, oldest due first.
    async fn find_due_pickups(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> DeliveryTaskRepositoryResult<Vec<DeliveryTask>>;
}

/// Errors returned by delivery task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum DeliveryTaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate delivery task identifier: {0}")]
    DuplicateTask(DeliveryTaskId),

    /// The order already has an active task.
    #[error("order {0} already has an active delivery task")]
    ActiveTaskExists(OrderId),

    /// The task was not found.
    #[error("delivery task not found: {0}")]
    NotFound(DeliveryTaskId),

    /// The task changed since it was read.
    #[error(
        "delivery task {task_id} changed concurrently: expected version {expected}, found {actual}"
    )]
    VersionConflict {
        /// Task identifier.
        task_id: DeliveryTaskId,
        /// Version the caller read.
        expected: u64,
        /// Version in storage.
        actual: u64,
    },

    /// A stored record could not be turned back into a task.
    #[error("invalid persisted delivery task: {0}")]
    InvalidPersistedData(String),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl DeliveryTaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
