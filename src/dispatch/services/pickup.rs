//! Carrier pickup scheduling with persisted backoff.

use super::{DispatchError, DispatchResult};
use crate::dispatch::{
    domain::{
        DeliveryEvent, DeliveryTask, DeliveryTaskId, PickupRetryPolicy, TaskStatus,
        TrackingNumber,
    },
    ports::{
        CarrierGateway, DeliveryTaskRepository, DeliveryTaskRepositoryError, PickupRequest,
    },
};
use crate::reference::domain::CarrierId;
use chrono::Duration;
use mockable::Clock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

/// What happened to one task during a pickup pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupOutcome {
    /// The carrier booked the pickup; the task is now `planned`.
    Booked,
    /// The attempt failed and another is scheduled.
    RetryScheduled,
    /// The attempt limit was reached; the task failed.
    Exhausted,
    /// The task was not waiting for a pickup.
    Skipped,
}

/// A task whose pickup could not be claimed or recorded during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickupTaskError {
    /// Task left for a later pass.
    pub task_id: DeliveryTaskId,
    /// Rendered error.
    pub error: String,
}

/// Counts from one [`PickupScheduler::process_due`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickupRunSummary {
    /// Pickups booked.
    pub booked: usize,
    /// Attempts that will be retried.
    pub retried: usize,
    /// Tasks that failed after exhausting attempts.
    pub exhausted: usize,
    /// Tasks that changed underneath the pass and were left alone.
    pub skipped: usize,
    /// Tasks whose claim or result could not be stored.
    pub errors: Vec<PickupTaskError>,
}

impl PickupRunSummary {
    const fn record(&mut self, outcome: PickupOutcome) {
        match outcome {
            PickupOutcome::Booked => self.booked = self.booked.saturating_add(1),
            PickupOutcome::RetryScheduled => self.retried = self.retried.saturating_add(1),
            PickupOutcome::Exhausted => self.exhausted = self.exhausted.saturating_add(1),
            PickupOutcome::Skipped => self.skipped = self.skipped.saturating_add(1),
        }
    }

    fn record_error(&mut self, task_id: DeliveryTaskId, error: &DispatchError) {
        self.errors.push(PickupTaskError {
            task_id,
            error: error.to_string(),
        });
    }

    /// Returns whether any task could not be handled.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// How long a claimed pickup stays hidden from other workers by default.
const DEFAULT_CLAIM_TTL_SECONDS: i64 = 300;

/// Books carrier pickups for pending carrier tasks.
///
/// Attempt counts and the next due time live on the task, so a restart
/// resumes where the previous process stopped. Before calling the carrier
/// a worker claims each task by pushing its due time forward with a
/// versioned write; only the worker whose write wins books the parcel.
pub struct PickupScheduler<R, C>
where
    R: DeliveryTaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    gateway: Arc<dyn CarrierGateway>,
    clock: Arc<C>,
    policy: PickupRetryPolicy,
    batch_size: usize,
    claim_ttl: Duration,
}

impl<R, C> PickupScheduler<R, C>
where
    R: DeliveryTaskRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a scheduler.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        gateway: Arc<dyn CarrierGateway>,
        clock: Arc<C>,
        policy: PickupRetryPolicy,
        batch_size: usize,
    ) -> Self {
        Self {
            repository,
            gateway,
            clock,
            policy,
            batch_size: batch_size.max(1),
            claim_ttl: Duration::seconds(DEFAULT_CLAIM_TTL_SECONDS),
        }
    }

    /// Sets how long a claimed pickup stays hidden from other workers.
    ///
    /// A worker that dies mid-attempt releases its tasks once this expires.
    #[must_use]
    pub const fn with_claim_ttl(mut self, claim_ttl: Duration) -> Self {
        self.claim_ttl = claim_ttl;
        self
    }

    /// Attempts the pickup for one task right away.
    ///
    /// The task is skipped when it is not a due carrier pickup or another
    /// worker claims it first.
    ///
    /// # Errors
    ///
    /// Returns a repository error when the task cannot be read, claimed, or
    /// saved. Carrier failures are recorded on the task, not returned.
    #[instrument(skip(self))]
    pub async fn attempt(&self, task_id: DeliveryTaskId) -> DispatchResult<PickupOutcome> {
        let Some(task) = self.repository.find_by_id(task_id).await? else {
            return Ok(PickupOutcome::Skipped);
        };
        let Some(carrier_id) = task.method().carrier_id().cloned() else {
            return Ok(PickupOutcome::Skipped);
        };
        if task.status() != TaskStatus::Pending || !task.pickup().is_due(self.clock.utc()) {
            return Ok(PickupOutcome::Skipped);
        }
        let Some(claimed) = self.claim(task).await? else {
            return Ok(PickupOutcome::Skipped);
        };
        self.process_batch(&carrier_id, vec![claimed])
            .await
            .pop()
            .map_or(Ok(PickupOutcome::Skipped), |(_, result)| result)
    }

    /// Runs [`Self::attempt`] on a background task. Failures are logged.
    pub fn spawn_attempt(self: &Arc<Self>, task_id: DeliveryTaskId) {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            match scheduler.attempt(task_id).await {
                Ok(outcome) => debug!(%task_id, ?outcome, "background pickup attempt finished"),
                Err(err) => warn!(%task_id, error = %err, "background pickup attempt failed"),
            }
        });
    }

    /// Attempts every due pickup, one carrier call per carrier.
    ///
    /// A task that cannot be claimed or recorded is reported in
    /// [`PickupRunSummary::errors`] and the rest of the pass carries on.
    ///
    /// # Errors
    ///
    /// Returns a repository error when due tasks cannot be listed.
    #[instrument(skip(self))]
    pub async fn process_due(&self) -> DispatchResult<PickupRunSummary> {
        let now = self.clock.utc();
        let due = self
            .repository
            .find_due_pickups(now, self.batch_size)
            .await?;

        let mut summary = PickupRunSummary::default();
        let mut by_carrier: BTreeMap<CarrierId, Vec<DeliveryTask>> = BTreeMap::new();
        for task in due {
            let Some(carrier_id) = task.method().carrier_id().cloned() else {
                continue;
            };
            let task_id = task.id();
            match self.claim(task).await {
                Ok(Some(claimed)) => by_carrier.entry(carrier_id).or_default().push(claimed),
                Ok(None) => summary.record(PickupOutcome::Skipped),
                Err(err) => {
                    warn!(%task_id, error = %err, "failed to claim pickup");
                    summary.record_error(task_id, &err);
                }
            }
        }

        for (carrier_id, tasks) in by_carrier {
            for (task_id, result) in self.process_batch(&carrier_id, tasks).await {
                match result {
                    Ok(outcome) => summary.record(outcome),
                    Err(err) => summary.record_error(task_id, &err),
                }
            }
        }
        if summary != PickupRunSummary::default() {
            info!(
                booked = summary.booked,
                retried = summary.retried,
                exhausted = summary.exhausted,
                errors = summary.errors.len(),
                "processed due pickups"
            );
        }
        Ok(summary)
    }

    /// Polls for due pickups every `interval` until a shutdown signal arrives or
    /// its sender is dropped.
    pub async fn run(
        &self,
        interval: std::time::Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.process_due().await {
                        warn!(error = %err, "pickup pass failed");
                    }
                }
                _ = shutdown.recv() => {
                    info!("pickup scheduler stopping");
                    break;
                }
            }
        }
    }

    async fn claim(&self, mut task: DeliveryTask) -> DispatchResult<Option<DeliveryTask>> {
        let until = self.clock.utc() + self.claim_ttl;
        task.claim_pickup(until, &*self.clock)?;
        match self.repository.update(&task, &[]).await {
            Ok(stored) => Ok(Some(stored)),
            Err(DeliveryTaskRepositoryError::VersionConflict { .. }) => {
                debug!(task_id = %task.id(), "pickup claimed by another worker");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn process_batch(
        &self,
        carrier_id: &CarrierId,
        tasks: Vec<DeliveryTask>,
    ) -> Vec<(DeliveryTaskId, DispatchResult<PickupOutcome>)> {
        let requests: Vec<PickupRequest> = tasks.iter().map(PickupRequest::from).collect();
        let (confirmed, failure) = match self.gateway.schedule_pickup(carrier_id, &requests).await {
            Ok(confirmations) => (
                confirmations
                    .into_iter()
                    .map(|confirmation| (confirmation.task_id, confirmation.tracking_number))
                    .collect::<HashMap<_, _>>(),
                "carrier did not confirm the pickup".to_owned(),
            ),
            Err(err) => {
                warn!(carrier_id = %carrier_id, error = %err, "carrier pickup call failed");
                (HashMap::new(), err.to_string())
            }
        };

        let mut results = Vec::with_capacity(tasks.len());
        for task in tasks {
            let task_id = task.id();
            let tracking = confirmed.get(&task_id).cloned();
            let result = self.settle(task, tracking, &failure).await;
            if let Err(err) = &result {
                warn!(%task_id, error = %err, "failed to record pickup result");
            }
            results.push((task_id, result));
        }
        results
    }

    async fn settle(
        &self,
        mut task: DeliveryTask,
        tracking: Option<TrackingNumber>,
        failure: &str,
    ) -> DispatchResult<PickupOutcome> {
        let version = task.version();
        let (outcome, events) = if let Some(tracking_number) = tracking {
            task.record_pickup_scheduled(tracking_number, &*self.clock)?;
            (
                PickupOutcome::Booked,
                vec![DeliveryEvent::status_changed(
                    &task,
                    TaskStatus::Pending,
                    version,
                )],
            )
        } else {
            let failures = task.pickup().attempts().saturating_add(1);
            let next = self.policy.next_attempt(failures, self.clock.utc());
            if task.record_pickup_failure(failure, next, &*self.clock)? {
                warn!(task_id = %task.id(), attempts = failures, "pickup attempts exhausted");
                (
                    PickupOutcome::Exhausted,
                    vec![
                        DeliveryEvent::status_changed(&task, TaskStatus::Pending, version),
                        DeliveryEvent::pickup_failed(&task),
                    ],
                )
            } else {
                (PickupOutcome::RetryScheduled, Vec::new())
            }
        };

        match self.repository.update(&task, &events).await {
            Ok(_) => Ok(outcome),
            Err(DeliveryTaskRepositoryError::VersionConflict { .. }) => {
                debug!(task_id = %task.id(), "task changed during pickup, leaving it");
                Ok(PickupOutcome::Skipped)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub(super) fn gateway(&self) -> &Arc<dyn CarrierGateway> {
        &self.gateway
    }
}
