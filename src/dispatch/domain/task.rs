//! Delivery task aggregate root.

use super::{
    AddressId, Assignment, Crew, DeliveryDomainError, DeliveryMethod, DeliveryOption,
    DeliveryTaskId, OrderId, PickupState, TaskStatus, TrackingNumber,
};
use crate::reference::domain::{DeliveryArea, Money, RouteCode};
use chrono::{DateTime, NaiveDate, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Delivery task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryTask {
    id: DeliveryTaskId,
    order_id: OrderId,
    address_id: AddressId,
    area: DeliveryArea,
    method: DeliveryMethod,
    route_code: Option<RouteCode>,
    assignment: Assignment,
    planned_date: NaiveDate,
    estimated_delivery: NaiveDate,
    delivered_at: Option<DateTime<Utc>>,
    delivery_fee: Money,
    cod_amount: Money,
    status: TaskStatus,
    notes: Vec<String>,
    retry_count: u32,
    retry_limit: u32,
    pickup: PickupState,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for creating a delivery task from a chosen option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDeliveryTask {
    /// Order being delivered.
    pub order_id: OrderId,
    /// Customer address.
    pub address_id: AddressId,
    /// Administrative area captured at creation.
    pub area: DeliveryArea,
    /// Chosen delivery option.
    pub option: DeliveryOption,
    /// Cash to collect at drop-off.
    pub cod_amount: Money,
    /// Initial note, if any.
    pub note: Option<String>,
    /// Number of `failed -> pending` retries allowed.
    pub retry_limit: u32,
}

/// Parameter object for reconstructing a persisted delivery task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedDeliveryTask {
    /// Task identifier.
    pub id: DeliveryTaskId,
    /// Order reference.
    pub order_id: OrderId,
    /// Address reference.
    pub address_id: AddressId,
    /// Area snapshot.
    pub area: DeliveryArea,
    /// Delivery method.
    pub method: DeliveryMethod,
    /// Route code for self-delivery.
    pub route_code: Option<RouteCode>,
    /// Fulfilment assignment.
    pub assignment: Assignment,
    /// Planned delivery date.
    pub planned_date: NaiveDate,
    /// Estimated delivery date.
    pub estimated_delivery: NaiveDate,
    /// Actual delivery timestamp.
    pub delivered_at: Option<DateTime<Utc>>,
    /// Customer fee.
    pub delivery_fee: Money,
    /// COD amount.
    pub cod_amount: Money,
    /// Lifecycle status.
    pub status: TaskStatus,
    /// Free-text notes, oldest first.
    pub notes: Vec<String>,
    /// Delivery retries consumed.
    pub retry_count: u32,
    /// Delivery retries allowed.
    pub retry_limit: u32,
    /// Carrier pickup retry state.
    pub pickup: PickupState,
    /// Storage version.
    pub version: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest change timestamp.
    pub updated_at: DateTime<Utc>,
}

impl DeliveryTask {
    /// Creates a `pending` task from the chosen option.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryDomainError::CodNotSupported`] when a COD amount is
    /// requested on an option that cannot collect it.
    pub fn new(data: NewDeliveryTask, clock: &impl Clock) -> Result<Self, DeliveryDomainError> {
        let NewDeliveryTask {
            order_id,
            address_id,
            area,
            option,
            cod_amount,
            note,
            retry_limit,
        } = data;

        if !cod_amount.is_zero() && !option.cod_capable() {
            return Err(DeliveryDomainError::CodNotSupported {
                method: option.method().to_storage(),
            });
        }

        let timestamp = clock.utc();
        let id = DeliveryTaskId::new();
        let method = option.method().clone();
        let pickup = if method.is_self_delivery() {
            PickupState::default()
        } else {
            PickupState::due_at(timestamp)
        };
        let route_code = option.route_code().cloned();
        if method.is_self_delivery() && route_code.is_none() {
            return Err(DeliveryDomainError::MissingRoute(id));
        }

        Ok(Self {
            id,
            order_id,
            address_id,
            area,
            method,
            route_code,
            assignment: Assignment::Unassigned,
            planned_date: option.estimated_delivery(),
            estimated_delivery: option.estimated_delivery(),
            delivered_at: None,
            delivery_fee: option.fee(),
            cod_amount,
            status: TaskStatus::Pending,
            notes: note
                .map(|text| text.trim().to_owned())
                .filter(|text| !text.is_empty())
                .into_iter()
                .collect(),
            retry_count: 0,
            retry_limit,
            pickup,
            version: 1,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a task from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns a domain error when the stored record breaks the fulfilment
    /// invariant: crews only on self-delivery, tracking numbers only on
    /// carrier methods, and route codes only on self-delivery.
    pub fn from_persisted(data: PersistedDeliveryTask) -> Result<Self, DeliveryDomainError> {
        let task = Self {
            id: data.id,
            order_id: data.order_id,
            address_id: data.address_id,
            area: data.area,
            method: data.method,
            route_code: data.route_code,
            assignment: data.assignment,
            planned_date: data.planned_date,
            estimated_delivery: data.estimated_delivery,
            delivered_at: data.delivered_at,
            delivery_fee: data.delivery_fee,
            cod_amount: data.cod_amount,
            status: data.status,
            notes: data.notes,
            retry_count: data.retry_count,
            retry_limit: data.retry_limit,
            pickup: data.pickup,
            version: data.version,
            created_at: data.created_at,
            updated_at: data.updated_at,
        };
        task.check_fulfilment()?;
        Ok(task)
    }

    /// Returns the persistence form of this task.
    #[must_use]
    pub fn to_persisted(&self) -> PersistedDeliveryTask {
        PersistedDeliveryTask {
            id: self.id,
            order_id: self.order_id.clone(),
            address_id: self.address_id.clone(),
            area: self.area.clone(),
            method: self.method.clone(),
            route_code: self.route_code.clone(),
            assignment: self.assignment.clone(),
            planned_date: self.planned_date,
            estimated_delivery: self.estimated_delivery,
            delivered_at: self.delivered_at,
            delivery_fee: self.delivery_fee,
            cod_amount: self.cod_amount,
            status: self.status,
            notes: self.notes.clone(),
            retry_count: self.retry_count,
            retry_limit: self.retry_limit,
            pickup: self.pickup.clone(),
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> DeliveryTaskId {
        self.id
    }

    /// Returns the order reference.
    #[must_use]
    pub const fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    /// Returns the address reference.
    #[must_use]
    pub const fn address_id(&self) -> &AddressId {
        &self.address_id
    }

    /// Returns the area captured at creation.
    #[must_use]
    pub const fn area(&self) -> &DeliveryArea {
        &self.area
    }

    /// Returns the delivery method.
    #[must_use]
    pub const fn method(&self) -> &DeliveryMethod {
        &self.method
    }

    /// Returns the route code for self-delivery tasks.
    #[must_use]
    pub const fn route_code(&self) -> Option<&RouteCode> {
        self.route_code.as_ref()
    }

    /// Returns the fulfilment assignment.
    #[must_use]
    pub const fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// Returns the planned delivery date.
    #[must_use]
    pub const fn planned_date(&self) -> NaiveDate {
        self.planned_date
    }

    /// Returns the estimated delivery date.
    #[must_use]
    pub const fn estimated_delivery(&self) -> NaiveDate {
        self.estimated_delivery
    }

    /// Returns when the parcel was delivered.
    #[must_use]
    pub const fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    /// Returns the customer fee.
    #[must_use]
    pub const fn delivery_fee(&self) -> Money {
        self.delivery_fee
    }

    /// Returns the COD amount.
    #[must_use]
    pub const fn cod_amount(&self) -> Money {
        self.cod_amount
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the notes, oldest first.
    #[must_use]
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Returns the number of delivery retries consumed.
    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Returns the number of delivery retries allowed.
    #[must_use]
    pub const fn retry_limit(&self) -> u32 {
        self.retry_limit
    }

    /// Returns the carrier pickup retry state.
    #[must_use]
    pub const fn pickup(&self) -> &PickupState {
        &self.pickup
    }

    /// Returns the storage version.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest change timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether the task still blocks a new task for its order.
    ///
    /// Delivered and cancelled tasks are closed; failed tasks stay active
    /// until their retries are exhausted.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        match self.status {
            TaskStatus::Delivered | TaskStatus::Cancelled => false,
            TaskStatus::Failed => self.retry_count < self.retry_limit,
            TaskStatus::Pending
            | TaskStatus::Planned
            | TaskStatus::Dispatched
            | TaskStatus::InTransit => true,
        }
    }

    /// Returns the task stamped with the version assigned by storage.
    #[must_use]
    pub const fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Moves the task to `target`.
    ///
    /// Returns `false` without touching the task when it is already in
    /// `target`. Only an assigned task may become `planned`: a crew from
    /// route planning or a tracking number from a booked pickup. Reaching
    /// `delivered` stamps the delivery time. The `failed -> pending` retry
    /// edge consumes one retry, clears the assignment, and makes a carrier
    /// pickup due again; callers move the planned date with
    /// [`Self::reschedule`].
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryDomainError::InvalidTransition`] for moves outside
    /// the lifecycle table or planning an unassigned task, and
    /// [`DeliveryDomainError::RetriesExhausted`] when no retry is left.
    pub fn transition_to(
        &mut self,
        target: TaskStatus,
        clock: &impl Clock,
    ) -> Result<bool, DeliveryDomainError> {
        if self.status == target {
            return Ok(false);
        }
        let unassigned = matches!(self.assignment, Assignment::Unassigned);
        if !self.status.can_transition_to(target) || (target == TaskStatus::Planned && unassigned)
        {
            return Err(DeliveryDomainError::InvalidTransition {
                task_id: self.id,
                from: self.status,
                to: target,
            });
        }

        let now = clock.utc();
        match (self.status, target) {
            (TaskStatus::Failed, TaskStatus::Pending) => {
                if self.retry_count >= self.retry_limit {
                    return Err(DeliveryDomainError::RetriesExhausted(self.id));
                }
                self.retry_count = self.retry_count.saturating_add(1);
                self.delivered_at = None;
                self.assignment = Assignment::Unassigned;
                if !self.method.is_self_delivery() {
                    self.pickup = PickupState::due_at(now);
                }
            }
            (_, TaskStatus::Delivered) => self.delivered_at = Some(now),
            (_, TaskStatus::Cancelled) => self.pickup.settle(),
            _ => {}
        }
        self.status = target;
        self.updated_at = now;
        Ok(true)
    }

    /// Assigns a crew to a pending self-delivery task.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryDomainError::AssignmentMismatch`] for carrier tasks
    /// and [`DeliveryDomainError::InvalidTransition`] when the task is not
    /// pending.
    pub fn assign_crew(
        &mut self,
        crew: Crew,
        clock: &impl Clock,
    ) -> Result<(), DeliveryDomainError> {
        if !self.method.is_self_delivery() {
            return Err(self.assignment_mismatch());
        }
        self.ensure_pending(TaskStatus::Planned)?;
        self.assignment = Assignment::Crew { crew };
        self.touch(clock);
        Ok(())
    }

    /// Records a booked carrier pickup and moves the task to `planned`.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryDomainError::AssignmentMismatch`] for self-delivery
    /// tasks and [`DeliveryDomainError::InvalidTransition`] when the task is
    /// not pending.
    pub fn record_pickup_scheduled(
        &mut self,
        tracking_number: TrackingNumber,
        clock: &impl Clock,
    ) -> Result<(), DeliveryDomainError> {
        if self.method.is_self_delivery() {
            return Err(self.assignment_mismatch());
        }
        self.ensure_pending(TaskStatus::Planned)?;
        self.assignment = Assignment::Carrier { tracking_number };
        self.pickup.settle();
        self.status = TaskStatus::Planned;
        self.touch(clock);
        Ok(())
    }

    /// Records a failed pickup attempt.
    ///
    /// `next_attempt_at` is `None` once the attempt limit is reached; the
    /// task then fails with its delivery retries exhausted. Returns whether
    /// the task failed.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryDomainError::AssignmentMismatch`] for self-delivery
    /// tasks and [`DeliveryDomainError::InvalidTransition`] when the task is
    /// not pending.
    pub fn record_pickup_failure(
        &mut self,
        error: impl Into<String>,
        next_attempt_at: Option<DateTime<Utc>>,
        clock: &impl Clock,
    ) -> Result<bool, DeliveryDomainError> {
        if self.method.is_self_delivery() {
            return Err(self.assignment_mismatch());
        }
        self.ensure_pending(TaskStatus::Failed)?;
        self.pickup.record_failure(error.into(), next_attempt_at);
        let exhausted = next_attempt_at.is_none();
        if exhausted {
            self.status = TaskStatus::Failed;
            self.retry_count = self.retry_limit;
        }
        self.touch(clock);
        Ok(exhausted)
    }

    /// Holds a due pickup until `until` so that no other worker books it
    /// in the meantime. The attempt count is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryDomainError::AssignmentMismatch`] for self-delivery
    /// tasks and [`DeliveryDomainError::InvalidTransition`] when the task is
    /// not pending.
    pub fn claim_pickup(
        &mut self,
        until: DateTime<Utc>,
        clock: &impl Clock,
    ) -> Result<(), DeliveryDomainError> {
        if self.method.is_self_delivery() {
            return Err(self.assignment_mismatch());
        }
        self.ensure_pending(TaskStatus::Planned)?;
        self.pickup.hold_until(until);
        self.touch(clock);
        Ok(())
    }

    /// Moves the planned and estimated delivery dates to `date`.
    ///
    /// Used when a route runs out of capacity or a failed delivery is
    /// retried.
    pub fn reschedule(&mut self, date: NaiveDate, clock: &impl Clock) {
        self.planned_date = date;
        self.estimated_delivery = date;
        self.touch(clock);
    }

    /// Appends a note. Blank notes are ignored.
    pub fn append_note(&mut self, note: &str, clock: &impl Clock) {
        let trimmed = note.trim();
        if trimmed.is_empty() {
            return;
        }
        self.notes.push(trimmed.to_owned());
        self.touch(clock);
    }

    fn ensure_pending(&self, target: TaskStatus) -> Result<(), DeliveryDomainError> {
        if self.status == TaskStatus::Pending {
            return Ok(());
        }
        Err(DeliveryDomainError::InvalidTransition {
            task_id: self.id,
            from: self.status,
            to: target,
        })
    }

    fn assignment_mismatch(&self) -> DeliveryDomainError {
        DeliveryDomainError::AssignmentMismatch {
            task_id: self.id,
            method: self.method.to_storage(),
        }
    }

    fn check_fulfilment(&self) -> Result<(), DeliveryDomainError> {
        let self_delivery = self.method.is_self_delivery();
        let assignment_fits = match &self.assignment {
            Assignment::Unassigned => true,
            Assignment::Crew { .. } => self_delivery,
            Assignment::Carrier { .. } => !self_delivery,
        };
        if !assignment_fits {
            return Err(self.assignment_mismatch());
        }
        match (self_delivery, self.route_code.is_some()) {
            (true, false) => Err(DeliveryDomainError::MissingRoute(self.id)),
            (false, true) => Err(DeliveryDomainError::RouteMismatch(self.id)),
            _ => Ok(()),
        }
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
