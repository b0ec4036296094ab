//! Delivery task creation and lifecycle orchestration.

use super::{DeliveryOptionPlanner, DispatchError, DispatchResult, PickupScheduler};
use crate::dispatch::{
    domain::{
        AddressId, DeliveryAddress, DeliveryEvent, DeliveryMethod,
        DeliveryOption, DeliveryTask, DeliveryTaskId, NewDeliveryTask, OrderId, TaskStatus,
        TrackingNumber,
    },
    ports::{
        AddressDirectory, DeliveryTaskRepository, DeliveryTaskRepositoryError, TrackingInfo,
    },
};
use crate::reference::domain::{CarrierId, Money};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Request payload for creating a delivery task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDeliveryTaskRequest {
    order_id: OrderId,
    address_id: AddressId,
    cod_amount: Money,
    method: Option<DeliveryMethod>,
    notes: Option<String>,
}

impl CreateDeliveryTaskRequest {
    /// Creates a request without COD, letting the planner pick the method.
    #[must_use]
    pub const fn new(order_id: OrderId, address_id: AddressId) -> Self {
        Self {
            order_id,
            address_id,
            cod_amount: Money::ZERO,
            method: None,
            notes: None,
        }
    }

    /// Sets the cash to collect at drop-off.
    #[must_use]
    pub const fn with_cod_amount(mut self, cod_amount: Money) -> Self {
        self.cod_amount = cod_amount;
        self
    }

    /// Requests a specific delivery method instead of the recommended one.
    #[must_use]
    pub fn with_method(mut self, method: DeliveryMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets an initial note.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Tracking view of a carrier task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingDetails {
    /// Task identifier.
    pub task_id: DeliveryTaskId,
    /// Carrier handling the parcel.
    pub carrier_id: CarrierId,
    /// Carrier tracking number.
    pub tracking_number: TrackingNumber,
    /// Public tracking page.
    pub tracking_url: String,
    /// Carrier-reported status.
    pub info: TrackingInfo,
}

/// Behavioural settings for [`DispatchService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchPolicy {
    /// Number of `failed -> pending` retries each task gets.
    pub retry_limit: u32,
    /// Whether creating a carrier task immediately attempts the pickup.
    pub schedule_pickup_on_create: bool,
    /// How often an update is re-read and retried after a version conflict.
    pub max_update_attempts: u32,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            retry_limit: 3,
            schedule_pickup_on_create: true,
            max_update_attempts: 3,
        }
    }
}

/// Delivery task orchestration service.
pub struct DispatchService<R, C>
where
    R: DeliveryTaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    addresses: Arc<dyn AddressDirectory>,
    planner: DeliveryOptionPlanner<C>,
    pickups: Arc<PickupScheduler<R, C>>,
    clock: Arc<C>,
    policy: DispatchPolicy,
}

impl<R, C> DispatchService<R, C>
where
    R: DeliveryTaskRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a dispatch service.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        addresses: Arc<dyn AddressDirectory>,
        planner: DeliveryOptionPlanner<C>,
        pickups: Arc<PickupScheduler<R, C>>,
        policy: DispatchPolicy,
    ) -> Self {
        let clock = Arc::clone(planner.clock());
        Self {
            repository,
            addresses,
            planner,
            pickups,
            clock,
            policy,
        }
    }

    /// Returns the ranked delivery options for an address, without COD.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::AddressNotFound`] for unknown addresses and
    /// [`DispatchError::NoCoverage`] when nothing serves the address.
    #[instrument(skip(self), fields(address_id = %address_id))]
    pub async fn get_delivery_options(
        &self,
        address_id: &AddressId,
    ) -> DispatchResult<Vec<DeliveryOption>> {
        let address = self.resolve_address(address_id).await?;
        self.planner.plan(&address, Money::ZERO).await
    }

    /// Creates a `pending` delivery task for an order.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ActiveTaskExists`] when the order already
    /// has an active task, including when a concurrent request wins the
    /// race; [`DispatchError::AddressNotFound`],
    /// [`DispatchError::NoCoverage`], or [`DispatchError::MethodNotViable`]
    /// when no acceptable option exists; and a COD domain error when the
    /// chosen method cannot collect cash.
    #[instrument(
        skip(self, request),
        fields(order_id = %request.order_id, address_id = %request.address_id)
    )]
    pub async fn create_delivery_task(
        &self,
        request: CreateDeliveryTaskRequest,
    ) -> DispatchResult<DeliveryTask> {
        let CreateDeliveryTaskRequest {
            order_id,
            address_id,
            cod_amount,
            method,
            notes,
        } = request;

        let existing = self.repository.find_by_order_id(&order_id).await?;
        if existing.iter().any(DeliveryTask::is_active) {
            return Err(DispatchError::ActiveTaskExists(order_id));
        }

        let address = self.resolve_address(&address_id).await?;
        let options = self.planner.plan(&address, cod_amount).await?;
        let option = select_option(options, method.as_ref(), &address)?;

        let task = DeliveryTask::new(
            NewDeliveryTask {
                order_id: order_id.clone(),
                address_id,
                area: address.area().clone(),
                option,
                cod_amount,
                note: notes,
                retry_limit: self.policy.retry_limit,
            },
            &*self.clock,
        )?;

        let events = [DeliveryEvent::task_created(&task)];
        self.repository
            .create(&task, &events)
            .await
            .map_err(|err| match err {
                DeliveryTaskRepositoryError::ActiveTaskExists(order) => {
                    DispatchError::ActiveTaskExists(order)
                }
                other => other.into(),
            })?;

        info!(
            task_id = %task.id(),
            method = %task.method(),
            planned_date = %task.planned_date(),
            fee = %task.delivery_fee(),
            "created delivery task"
        );

        if !task.method().is_self_delivery() && self.policy.schedule_pickup_on_create {
            self.pickups.spawn_attempt(task.id());
        }
        Ok(task)
    }

    /// Moves a task to `status`.
    ///
    /// Repeating the current status is a no-op that writes no event.
    /// `failed -> pending` consumes a retry and reschedules the delivery;
    /// only that retry on a routed task reads the route catalog. Moving to
    /// `planned` requires a crew or a booked pickup, which route planning
    /// and the pickup scheduler record.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::TaskNotFound`] for unknown tasks, a
    /// transition domain error for stale or illegal moves, and
    /// [`DispatchError::ConcurrentUpdate`] when the task keeps changing.
    #[instrument(skip(self))]
    pub async fn update_task_status(
        &self,
        task_id: DeliveryTaskId,
        status: TaskStatus,
    ) -> DispatchResult<DeliveryTask> {
        let routes = if status == TaskStatus::Pending && self.is_route_retry(task_id).await? {
            Some(self.planner.route_catalog().snapshot().await?)
        } else {
            None
        };
        let today = self.planner.today();

        self.mutate(task_id, |task, clock| {
            let old_status = task.status();
            let version = task.version();
            if !task.transition_to(status, clock)? {
                return Ok(None);
            }
            if old_status == TaskStatus::Failed && status == TaskStatus::Pending {
                if let Some(route_code) = task.route_code().cloned() {
                    // The task failed after it was first read.
                    let catalog = routes
                        .as_ref()
                        .ok_or(DispatchError::ConcurrentUpdate(task_id))?;
                    let route = catalog
                        .find(&route_code)
                        .ok_or(DispatchError::RouteUnavailable(route_code))?;
                    task.reschedule(route.schedule().next_after(today), clock);
                }
            }
            let mut events = vec![DeliveryEvent::status_changed(task, old_status, version)];
            if status == TaskStatus::Delivered && !task.cod_amount().is_zero() {
                events.push(DeliveryEvent::cod_collected(task));
            }
            Ok(Some(events))
        })
        .await
    }

    /// Cancels a task, recording the reason in its notes.
    ///
    /// Cancelling a cancelled task is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::TaskNotFound`] for unknown tasks and a
    /// transition domain error for tasks that can no longer be cancelled.
    #[instrument(skip(self))]
    pub async fn cancel_task(
        &self,
        task_id: DeliveryTaskId,
        reason: &str,
    ) -> DispatchResult<DeliveryTask> {
        self.mutate(task_id, |task, clock| {
            let old_status = task.status();
            let version = task.version();
            if !task.transition_to(TaskStatus::Cancelled, clock)? {
                return Ok(None);
            }
            task.append_note(&format!("cancelled: {reason}"), clock);
            Ok(Some(vec![DeliveryEvent::status_changed(
                task, old_status, version,
            )]))
        })
        .await
    }

    /// Returns the order's active task, or its most recent closed task.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::OrderNotFound`] when the order has no task.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_task_by_order_id(&self, order_id: &OrderId) -> DispatchResult<DeliveryTask> {
        let tasks = self.repository.find_by_order_id(order_id).await?;
        let active = tasks.iter().position(DeliveryTask::is_active);
        tasks
            .into_iter()
            .nth(active.unwrap_or(0))
            .ok_or_else(|| DispatchError::OrderNotFound(order_id.clone()))
    }

    /// Returns a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::TaskNotFound`] for unknown tasks.
    pub async fn get_task(&self, task_id: DeliveryTaskId) -> DispatchResult<DeliveryTask> {
        self.repository
            .find_by_id(task_id)
            .await?
            .ok_or(DispatchError::TaskNotFound(task_id))
    }

    /// Returns the carrier tracking status and public URL for a task.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::TrackingUnavailable`] for tasks without a
    /// carrier consignment and a carrier error when the carrier API fails.
    #[instrument(skip(self))]
    pub async fn get_tracking_info(
        &self,
        task_id: DeliveryTaskId,
    ) -> DispatchResult<TrackingDetails> {
        let task = self.get_task(task_id).await?;
        let (Some(carrier_id), Some(tracking_number)) = (
            task.method().carrier_id().cloned(),
            task.assignment().tracking_number().cloned(),
        ) else {
            return Err(DispatchError::TrackingUnavailable(task_id));
        };

        let registry = self.planner.carrier_registry().snapshot().await?;
        let carrier = registry
            .find(&carrier_id)
            .ok_or_else(|| DispatchError::CarrierUnavailable(carrier_id.clone()))?;
        let tracking_url = carrier.tracking_url(tracking_number.as_str())?;
        let info = self
            .pickups
            .gateway()
            .tracking_info(&carrier_id, &tracking_number)
            .await?;

        Ok(TrackingDetails {
            task_id,
            carrier_id,
            tracking_number,
            tracking_url,
            info,
        })
    }

    async fn resolve_address(&self, address_id: &AddressId) -> DispatchResult<DeliveryAddress> {
        self.addresses
            .get_by_id(address_id)
            .await?
            .ok_or_else(|| DispatchError::AddressNotFound(address_id.clone()))
    }

    async fn is_route_retry(&self, task_id: DeliveryTaskId) -> DispatchResult<bool> {
        let task = self.get_task(task_id).await?;
        Ok(task.status() == TaskStatus::Failed && task.route_code().is_some())
    }

    /// Applies `change` to a fresh copy of the task and saves it, re-reading
    /// and retrying after version conflicts. `change` returns the events
    /// to write, or `None` when nothing changed.
    async fn mutate<F>(&self, task_id: DeliveryTaskId, change: F) -> DispatchResult<DeliveryTask>
    where
        F: Fn(&mut DeliveryTask, &C) -> DispatchResult<Option<Vec<DeliveryEvent>>> + Send + Sync,
    {
        let attempts = self.policy.max_update_attempts.max(1);
        for attempt in 1..=attempts {
            let mut task = self.get_task(task_id).await?;
            let Some(events) = change(&mut task, &*self.clock)? else {
                debug!(%task_id, status = %task.status(), "status unchanged");
                return Ok(task);
            };
            match self.repository.update(&task, &events).await {
                Ok(stored) => {
                    info!(%task_id, status = %stored.status(), "updated delivery task");
                    return Ok(stored);
                }
                Err(DeliveryTaskRepositoryError::VersionConflict { .. }) => {
                    warn!(%task_id, attempt, "version conflict, retrying update");
                }
                Err(DeliveryTaskRepositoryError::ActiveTaskExists(order_id)) => {
                    return Err(DispatchError::ActiveTaskExists(order_id));
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(DispatchError::ConcurrentUpdate(task_id))
    }
}

fn select_option(
    options: Vec<DeliveryOption>,
    requested: Option<&DeliveryMethod>,
    address: &DeliveryAddress,
) -> DispatchResult<DeliveryOption> {
    let chosen = match requested {
        Some(method) => options
            .into_iter()
            .find(|option| option.method() == method)
            .ok_or_else(|| DispatchError::MethodNotViable {
                address_id: address.id().clone(),
                method: method.to_storage(),
            })?,
        None => options
            .into_iter()
            .next()
            .ok_or_else(|| DispatchError::NoCoverage(address.id().clone()))?,
    };
    Ok(chosen)
}
