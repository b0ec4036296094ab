//! Delivery events written to the transactional outbox.

use super::{DeliveryTask, DeliveryTaskId, OrderId, RouteManifest, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Kind of delivery event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryEventKind {
    /// A task was created.
    #[serde(rename = "task.created")]
    TaskCreated,
    /// A task changed status.
    #[serde(rename = "task.status_changed")]
    StatusChanged,
    /// A route manifest gained tasks.
    #[serde(rename = "route.planned")]
    RoutePlanned,
    /// COD cash was collected on delivery.
    #[serde(rename = "cod.collected")]
    CodCollected,
    /// Carrier pickup scheduling gave up.
    #[serde(rename = "task.pickup_failed")]
    PickupFailed,
}

impl DeliveryEventKind {
    /// Returns the topic name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskCreated => "task.created",
            Self::StatusChanged => "task.status_changed",
            Self::RoutePlanned => "route.planned",
            Self::CodCollected => "cod.collected",
            Self::PickupFailed => "task.pickup_failed",
        }
    }
}

impl fmt::Display for DeliveryEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event recorded alongside the state change that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryEvent {
    id: Uuid,
    kind: DeliveryEventKind,
    task_id: Option<DeliveryTaskId>,
    order_id: Option<OrderId>,
    old_status: Option<TaskStatus>,
    new_status: Option<TaskStatus>,
    occurred_at: DateTime<Utc>,
    detail: Value,
    dedup_key: String,
}

impl DeliveryEvent {
    /// Event for a newly created task.
    #[must_use]
    pub fn task_created(task: &DeliveryTask) -> Self {
        Self::for_task(
            DeliveryEventKind::TaskCreated,
            task,
            None,
            json!({
                "method": task.method().to_storage(),
                "planned_date": task.planned_date(),
                "delivery_fee": task.delivery_fee(),
            }),
            &task.id().to_string(),
        )
    }

    /// Event for a status change.
    ///
    /// `version` is the task version the change was applied to, so a
    /// replayed change yields the same deduplication key.
    #[must_use]
    pub fn status_changed(task: &DeliveryTask, old_status: TaskStatus, version: u64) -> Self {
        Self::for_task(
            DeliveryEventKind::StatusChanged,
            task,
            Some(old_status),
            Value::Null,
            &format!("{}:{old_status}:{}:{version}", task.id(), task.status()),
        )
    }

    /// Event for COD collected on delivery.
    #[must_use]
    pub fn cod_collected(task: &DeliveryTask) -> Self {
        Self::for_task(
            DeliveryEventKind::CodCollected,
            task,
            None,
            json!({ "cod_amount": task.cod_amount() }),
            &task.id().to_string(),
        )
    }

    /// Alert raised when pickup scheduling exhausts its attempts.
    #[must_use]
    pub fn pickup_failed(task: &DeliveryTask) -> Self {
        Self::for_task(
            DeliveryEventKind::PickupFailed,
            task,
            Some(TaskStatus::Pending),
            json!({
                "attempts": task.pickup().attempts(),
                "last_error": task.pickup().last_error(),
            }),
            &format!("{}:{}", task.id(), task.pickup().attempts()),
        )
    }

    /// Event for a manifest that gained tasks.
    #[must_use]
    pub fn route_planned(manifest: &RouteManifest, occurred_at: DateTime<Utc>) -> Self {
        let task_ids: Vec<String> = manifest
            .task_ids()
            .iter()
            .map(ToString::to_string)
            .collect();
        let identity = format!(
            "{}:{}:{}:{}",
            manifest.route_code(),
            manifest.date(),
            manifest.crew().vehicle_id(),
            task_ids.join(",")
        );
        Self::build(
            DeliveryEventKind::RoutePlanned,
            EventSubject::default(),
            occurred_at,
            json!({
                "route_code": manifest.route_code(),
                "date": manifest.date(),
                "vehicle_id": manifest.crew().vehicle_id(),
                "driver_id": manifest.crew().driver_id(),
                "task_ids": task_ids,
            }),
            &identity,
        )
    }

    /// Returns the event identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the event kind.
    #[must_use]
    pub const fn kind(&self) -> DeliveryEventKind {
        self.kind
    }

    /// Returns the task the event is about, if it concerns one task.
    #[must_use]
    pub const fn task_id(&self) -> Option<DeliveryTaskId> {
        self.task_id
    }

    /// Returns the order the event is about, if it concerns one task.
    #[must_use]
    pub const fn order_id(&self) -> Option<&OrderId> {
        self.order_id.as_ref()
    }

    /// Returns the status before the change.
    #[must_use]
    pub const fn old_status(&self) -> Option<TaskStatus> {
        self.old_status
    }

    /// Returns the status after the change.
    #[must_use]
    pub const fn new_status(&self) -> Option<TaskStatus> {
        self.new_status
    }

    /// Returns when the change happened.
    #[must_use]
    pub const fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// Returns kind-specific detail.
    #[must_use]
    pub const fn detail(&self) -> &Value {
        &self.detail
    }

    /// Returns the hex SHA-256 key consumers use to drop redeliveries.
    #[must_use]
    pub fn dedup_key(&self) -> &str {
        &self.dedup_key
    }

    fn for_task(
        kind: DeliveryEventKind,
        task: &DeliveryTask,
        old_status: Option<TaskStatus>,
        detail: Value,
        identity: &str,
    ) -> Self {
        let subject = EventSubject {
            task_id: Some(task.id()),
            order_id: Some(task.order_id().clone()),
            old_status,
            new_status: Some(task.status()),
        };
        Self::build(kind, subject, task.updated_at(), detail, identity)
    }

    fn build(
        kind: DeliveryEventKind,
        subject: EventSubject,
        occurred_at: DateTime<Utc>,
        detail: Value,
        identity: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            task_id: subject.task_id,
            order_id: subject.order_id,
            old_status: subject.old_status,
            new_status: subject.new_status,
            occurred_at,
            detail,
            dedup_key: dedup_key(kind, identity),
        }
    }
}

#[derive(Default)]
struct EventSubject {
    task_id: Option<DeliveryTaskId>,
    order_id: Option<OrderId>,
    old_status: Option<TaskStatus>,
    new_status: Option<TaskStatus>,
}

fn dedup_key(kind: DeliveryEventKind, identity: &str) -> String {
    let digest = Sha256::digest(format!("{kind}|{identity}").as_bytes());
    digest
        .iter()
        .flat_map(|byte| [byte >> 4, byte & 0x0f])
        .filter_map(|nibble| char::from_digit(u32::from(nibble), 16))
        .collect()
}
