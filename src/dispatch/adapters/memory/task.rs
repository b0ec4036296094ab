//! In-memory delivery task store with an attached outbox.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::dispatch::{
    domain::{DeliveryEvent, DeliveryTask, DeliveryTaskId, OrderId, TaskStatus},
    ports::{
        DeliveryTaskRepository, DeliveryTaskRepositoryError, DeliveryTaskRepositoryResult,
        EventOutbox, OutboxError, OutboxResult,
    },
};
use crate::reference::domain::RouteCode;

/// Thread-safe in-memory task repository.
///
/// Task writes and their outbox events are applied under one write lock,
/// which gives the same atomicity as a database transaction. Events whose
/// deduplication key is already stored are dropped.
///
/// Every event stays in memory for [`Self::all_events`], so the store grows
/// with the number of writes. It backs tests and single-process runs; use
/// the Postgres adapter for long-lived deployments.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDeliveryTaskRepository {
    state: Arc<RwLock<InMemoryDispatchState>>,
}

#[derive(Debug, Default)]
struct InMemoryDispatchState {
    tasks: HashMap<DeliveryTaskId, DeliveryTask>,
    outbox: OutboxLog,
}

/// Outbox events in write order.
#[derive(Debug, Default)]
struct OutboxLog {
    events: Vec<DeliveryEvent>,
    dedup_keys: HashSet<String>,
    /// Positions in `events` not yet published, oldest first.
    unpublished: VecDeque<usize>,
}

impl OutboxLog {
    fn append(&mut self, event: &DeliveryEvent) {
        if !self.dedup_keys.insert(event.dedup_key().to_owned()) {
            return;
        }
        self.unpublished.push_back(self.events.len());
        self.events.push(event.clone());
    }

    fn pending(&self, limit: usize) -> Vec<DeliveryEvent> {
        self.unpublished
            .iter()
            .filter_map(|position| self.events.get(*position))
            .take(limit)
            .cloned()
            .collect()
    }

    fn mark_published(&mut self, event_ids: &[Uuid]) {
        let published: HashSet<&Uuid> = event_ids.iter().collect();
        let events = &self.events;
        self.unpublished.retain(|position| {
            events
                .get(*position)
                .is_some_and(|event| !published.contains(&event.id()))
        });
    }
}

impl InMemoryDispatchState {
    fn active_task_for(&self, order_id: &OrderId, except: DeliveryTaskId) -> bool {
        self.tasks
            .values()
            .any(|task| task.id() != except && task.order_id() == order_id && task.is_active())
    }

    fn check_update(&self, task: &DeliveryTask) -> DeliveryTaskRepositoryResult<()> {
        let stored = self
            .tasks
            .get(&task.id())
            .ok_or(DeliveryTaskRepositoryError::NotFound(task.id()))?;
        if stored.version() != task.version() {
            return Err(DeliveryTaskRepositoryError::VersionConflict {
                task_id: task.id(),
                expected: task.version(),
                actual: stored.version(),
            });
        }
        if task.is_active() && self.active_task_for(task.order_id(), task.id()) {
            return Err(DeliveryTaskRepositoryError::ActiveTaskExists(
                task.order_id().clone(),
            ));
        }
        Ok(())
    }

    fn apply_update(&mut self, task: &DeliveryTask) -> DeliveryTask {
        let stored = task.clone().with_version(task.version().saturating_add(1));
        self.tasks.insert(stored.id(), stored.clone());
        stored
    }

    fn append_events(&mut self, events: &[DeliveryEvent]) {
        for event in events {
            self.outbox.append(event);
        }
    }
}

impl InMemoryDeliveryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every event ever written, published or not, in write order.
    ///
    /// # Errors
    ///
    /// Returns [`OutboxError::Persistence`] when the lock is poisoned.
    pub fn all_events(&self) -> OutboxResult<Vec<DeliveryEvent>> {
        let state = self.state.read().map_err(outbox_lock_error)?;
        Ok(state.outbox.events.clone())
    }

    fn find_where(
        &self,
        predicate: impl Fn(&DeliveryTask) -> bool,
    ) -> DeliveryTaskRepositoryResult<Vec<DeliveryTask>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut matches: Vec<DeliveryTask> = state
            .tasks
            .values()
            .filter(|task| predicate(task))
            .cloned()
            .collect();
        matches.sort_by_key(|task| (task.created_at(), task.id()));
        Ok(matches)
    }
}

fn lock_error(err: impl std::fmt::Display) -> DeliveryTaskRepositoryError {
    DeliveryTaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

fn outbox_lock_error(err: impl std::fmt::Display) -> OutboxError {
    OutboxError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl DeliveryTaskRepository for InMemoryDeliveryTaskRepository {
    async fn create(
        &self,
        task: &DeliveryTask,
        events: &[DeliveryEvent],
    ) -> DeliveryTaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.tasks.contains_key(&task.id()) {
            return Err(DeliveryTaskRepositoryError::DuplicateTask(task.id()));
        }
        if task.is_active() && state.active_task_for(task.order_id(), task.id()) {
            return Err(DeliveryTaskRepositoryError::ActiveTaskExists(
                task.order_id().clone(),
            ));
        }
        state.tasks.insert(task.id(), task.clone());
        state.append_events(events);
        Ok(())
    }

    async fn update(
        &self,
        task: &DeliveryTask,
        events: &[DeliveryEvent],
    ) -> DeliveryTaskRepositoryResult<DeliveryTask> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.check_update(task)?;
        let stored = state.apply_update(task);
        state.append_events(events);
        Ok(stored)
    }

    async fn save_batch(
        &self,
        tasks: &[DeliveryTask],
        events: &[DeliveryEvent],
    ) -> DeliveryTaskRepositoryResult<Vec<DeliveryTask>> {
        let mut state = self.state.write().map_err(lock_error)?;
        for task in tasks {
            state.check_update(task)?;
        }
        let stored = tasks.iter().map(|task| state.apply_update(task)).collect();
        state.append_events(events);
        Ok(stored)
    }

    async fn find_by_id(
        &self,
        id: DeliveryTaskId,
    ) -> DeliveryTaskRepositoryResult<Option<DeliveryTask>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn find_by_order_id(
        &self,
        order_id: &OrderId,
    ) -> DeliveryTaskRepositoryResult<Vec<DeliveryTask>> {
        let mut tasks = self.find_where(|task| task.order_id() == order_id)?;
        tasks.reverse();
        Ok(tasks)
    }

    async fn find_pending_for_date(
        &self,
        date: NaiveDate,
    ) -> DeliveryTaskRepositoryResult<Vec<DeliveryTask>> {
        self.find_where(|task| {
            task.status() == TaskStatus::Pending
                && task.method().is_self_delivery()
                && task.planned_date() == date
        })
    }

    async fn find_by_route(
        &self,
        route_code: &RouteCode,
        date: NaiveDate,
    ) -> DeliveryTaskRepositoryResult<Vec<DeliveryTask>> {
        self.find_where(|task| {
            task.route_code() == Some(route_code) && task.planned_date() == date
        })
    }

    async fn find_due_pickups(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> DeliveryTaskRepositoryResult<Vec<DeliveryTask>> {
        let mut due = self.find_where(|task| {
            task.status() == TaskStatus::Pending
                && !task.method().is_self_delivery()
                && task.pickup().is_due(now)
        })?;
        due.sort_by_key(|task| (task.pickup().next_attempt_at(), task.created_at(), task.id()));
        due.truncate(limit);
        Ok(due)
    }
}

#[async_trait]
impl EventOutbox for InMemoryDeliveryTaskRepository {
    async fn pending_events(&self, limit: usize) -> OutboxResult<Vec<DeliveryEvent>> {
        let state = self.state.read().map_err(outbox_lock_error)?;
        Ok(state.outbox.pending(limit))
    }

    async fn mark_published(&self, event_ids: &[Uuid]) -> OutboxResult<()> {
        let mut state = self.state.write().map_err(outbox_lock_error)?;
        state.outbox.mark_published(event_ids);
        Ok(())
    }
}
