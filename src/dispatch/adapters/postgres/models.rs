//! Diesel row models for delivery dispatch persistence.

use super::schema::{delivery_outbox, delivery_tasks};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for delivery tasks.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = delivery_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DeliveryTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Order reference.
    pub order_id: String,
    /// Lifecycle status.
    pub status: String,
    /// Delivery method in storage form.
    pub method: String,
    /// Route code for self-delivery.
    pub route_code: Option<String>,
    /// Planned delivery date.
    pub planned_date: NaiveDate,
    /// Assigned vehicle.
    pub vehicle_id: Option<String>,
    /// Assigned driver.
    pub driver_id: Option<String>,
    /// Carrier tracking number.
    pub tracking_number: Option<String>,
    /// Whether the task blocks a new task for its order.
    pub is_active: bool,
    /// When the next pickup attempt is due.
    pub next_pickup_at: Option<DateTime<Utc>>,
    /// Full task body.
    pub record: Value,
    /// Optimistic concurrency version.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert and update model for delivery tasks.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = delivery_tasks)]
#[diesel(treat_none_as_null = true)]
pub struct DeliveryTaskRecordRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Order reference.
    pub order_id: String,
    /// Lifecycle status.
    pub status: String,
    /// Delivery method in storage form.
    pub method: String,
    /// Route code for self-delivery.
    pub route_code: Option<String>,
    /// Planned delivery date.
    pub planned_date: NaiveDate,
    /// Assigned vehicle.
    pub vehicle_id: Option<String>,
    /// Assigned driver.
    pub driver_id: Option<String>,
    /// Carrier tracking number.
    pub tracking_number: Option<String>,
    /// Whether the task blocks a new task for its order.
    pub is_active: bool,
    /// When the next pickup attempt is due.
    pub next_pickup_at: Option<DateTime<Utc>>,
    /// Full task body.
    pub record: Value,
    /// Optimistic concurrency version.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for outbox events.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = delivery_outbox)]
pub struct NewOutboxRow {
    /// Event identifier.
    pub id: uuid::Uuid,
    /// Event topic.
    pub kind: String,
    /// Task the event concerns, if any.
    pub task_id: Option<uuid::Uuid>,
    /// Consumer deduplication key.
    pub dedup_key: String,
    /// Serialized event.
    pub payload: Value,
    /// When the change happened.
    pub occurred_at: DateTime<Utc>,
}
