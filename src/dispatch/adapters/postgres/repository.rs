//! `PostgreSQL` repository implementation for delivery task storage.

use super::{
    models::{DeliveryTaskRecordRow, DeliveryTaskRow, NewOutboxRow},
    schema::{delivery_outbox, delivery_tasks},
};
use crate::dispatch::{
    domain::{
        Assignment, Crew, DeliveryEvent, DeliveryTask, DeliveryTaskId, DriverId, OrderId,
        PersistedDeliveryTask, TaskStatus, TrackingNumber, VehicleId,
    },
    ports::{
        DeliveryTaskRepository, DeliveryTaskRepositoryError, DeliveryTaskRepositoryResult,
        EventOutbox, OutboxError, OutboxResult,
    },
};
use crate::reference::domain::RouteCode;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

/// `PostgreSQL` connection pool type used by dispatch adapters.
pub type DispatchPgPool = Pool<ConnectionManager<PgConnection>>;

/// Name of the partial unique index guarding one active task per order.
const ACTIVE_ORDER_INDEX: &str = "idx_delivery_tasks_active_order";

/// `PostgreSQL`-backed delivery task repository and outbox.
///
/// The `record` column holds the task body; the assignment, status, and
/// version columns are authoritative when reading a task back.
#[derive(Debug, Clone)]
pub struct PostgresDeliveryTaskRepository {
    pool: DispatchPgPool,
}

impl PostgresDeliveryTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: DispatchPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> DeliveryTaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> DeliveryTaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(DeliveryTaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(DeliveryTaskRepositoryError::persistence)?
    }

    async fn run_outbox<F, T>(&self, f: F) -> OutboxResult<T>
    where
        F: FnOnce(&mut PgConnection) -> OutboxResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(OutboxError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(OutboxError::persistence)?
    }

    async fn load_where<F>(&self, query: F) -> DeliveryTaskRepositoryResult<Vec<DeliveryTask>>
    where
        F: FnOnce(&mut PgConnection) -> QueryResult<Vec<DeliveryTaskRow>> + Send + 'static,
    {
        self.run_blocking(move |connection| {
            query(connection)
                .map_err(DeliveryTaskRepositoryError::persistence)?
                .into_iter()
                .map(row_to_task)
                .collect()
        })
        .await
    }
}

/// Error carried out of a Diesel transaction closure.
enum TxError {
    Repository(DeliveryTaskRepositoryError),
    Diesel(DieselError),
}

impl From<DieselError> for TxError {
    fn from(err: DieselError) -> Self {
        Self::Diesel(err)
    }
}

impl From<DeliveryTaskRepositoryError> for TxError {
    fn from(err: DeliveryTaskRepositoryError) -> Self {
        Self::Repository(err)
    }
}

impl TxError {
    fn into_repository_error(self, order_id: Option<&OrderId>) -> DeliveryTaskRepositoryError {
        match self {
            Self::Repository(err) => err,
            Self::Diesel(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info))
                if is_active_order_violation(info.as_ref()) =>
            {
                order_id.map_or_else(
                    || DeliveryTaskRepositoryError::InvalidPersistedData(info.message().to_owned()),
                    |id| DeliveryTaskRepositoryError::ActiveTaskExists(id.clone()),
                )
            }
            Self::Diesel(err) => DeliveryTaskRepositoryError::persistence(err),
        }
    }
}

#[async_trait]
impl DeliveryTaskRepository for PostgresDeliveryTaskRepository {
    async fn create(
        &self,
        task: &DeliveryTask,
        events: &[DeliveryEvent],
    ) -> DeliveryTaskRepositoryResult<()> {
        let task_id = task.id();
        let order_id = task.order_id().clone();
        let row = to_record_row(task, task.version())?;
        let outbox_rows = to_outbox_rows(events)?;

        self.run_blocking(move |connection| {
            connection
                .transaction::<_, TxError, _>(|tx| {
                    diesel::insert_into(delivery_tasks::table)
                        .values(&row)
                        .execute(tx)
                        .map_err(|err| match err {
                            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                                if !is_active_order_violation(info.as_ref()) =>
                            {
                                TxError::Repository(DeliveryTaskRepositoryError::DuplicateTask(
                                    task_id,
                                ))
                            }
                            other => TxError::Diesel(other),
                        })?;
                    insert_outbox(tx, &outbox_rows)?;
                    Ok(())
                })
                .map_err(|err| err.into_repository_error(Some(&order_id)))
        })
        .await
    }

    async fn update(
        &self,
        task: &DeliveryTask,
        events: &[DeliveryEvent],
    ) -> DeliveryTaskRepositoryResult<DeliveryTask> {
        let stored = task.clone().with_version(task.version().saturating_add(1));
        let order_id = task.order_id().clone();
        let expected = task.version();
        let row = to_record_row(&stored, stored.version())?;
        let outbox_rows = to_outbox_rows(events)?;

        self.run_blocking(move |connection| {
            connection
                .transaction::<_, TxError, _>(|tx| {
                    apply_update(tx, &row, expected)?;
                    insert_outbox(tx, &outbox_rows)?;
                    Ok(())
                })
                .map_err(|err| err.into_repository_error(Some(&order_id)))?;
            Ok(stored)
        })
        .await
    }

    async fn save_batch(
        &self,
        tasks: &[DeliveryTask],
        events: &[DeliveryEvent],
    ) -> DeliveryTaskRepositoryResult<Vec<DeliveryTask>> {
        let stored: Vec<DeliveryTask> = tasks
            .iter()
            .map(|task| task.clone().with_version(task.version().saturating_add(1)))
            .collect();
        let rows = stored
            .iter()
            .zip(tasks)
            .map(|(next, previous)| {
                to_record_row(next, next.version()).map(|row| (row, previous.version()))
            })
            .collect::<DeliveryTaskRepositoryResult<Vec<_>>>()?;
        let outbox_rows = to_outbox_rows(events)?;

        self.run_blocking(move |connection| {
            connection
                .transaction::<_, TxError, _>(|tx| {
                    for (row, expected) in &rows {
                        apply_update(tx, row, *expected)?;
                    }
                    insert_outbox(tx, &outbox_rows)?;
                    Ok(())
                })
                .map_err(|err| err.into_repository_error(None))?;
            Ok(stored)
        })
        .await
    }

    async fn find_by_id(
        &self,
        id: DeliveryTaskId,
    ) -> DeliveryTaskRepositoryResult<Option<DeliveryTask>> {
        self.run_blocking(move |connection| {
            let row = delivery_tasks::table
                .filter(delivery_tasks::id.eq(id.into_inner()))
                .select(DeliveryTaskRow::as_select())
                .first::<DeliveryTaskRow>(connection)
                .optional()
                .map_err(DeliveryTaskRepositoryError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn find_by_order_id(
        &self,
        order_id: &OrderId,
    ) -> DeliveryTaskRepositoryResult<Vec<DeliveryTask>> {
        let order = order_id.as_str().to_owned();
        self.load_where(move |connection| {
            delivery_tasks::table
                .filter(delivery_tasks::order_id.eq(order))
                .order((delivery_tasks::created_at.desc(), delivery_tasks::id.desc()))
                .select(DeliveryTaskRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn find_pending_for_date(
        &self,
        date: NaiveDate,
    ) -> DeliveryTaskRepositoryResult<Vec<DeliveryTask>> {
        self.load_where(move |connection| {
            delivery_tasks::table
                .filter(delivery_tasks::status.eq(TaskStatus::Pending.as_str()))
                .filter(delivery_tasks::route_code.is_not_null())
                .filter(delivery_tasks::planned_date.eq(date))
                .order((delivery_tasks::created_at.asc(), delivery_tasks::id.asc()))
                .select(DeliveryTaskRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn find_by_route(
        &self,
        route_code: &RouteCode,
        date: NaiveDate,
    ) -> DeliveryTaskRepositoryResult<Vec<DeliveryTask>> {
        let route = route_code.as_str().to_owned();
        self.load_where(move |connection| {
            delivery_tasks::table
                .filter(delivery_tasks::route_code.eq(route))
                .filter(delivery_tasks::planned_date.eq(date))
                .order((delivery_tasks::created_at.asc(), delivery_tasks::id.asc()))
                .select(DeliveryTaskRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn find_due_pickups(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> DeliveryTaskRepositoryResult<Vec<DeliveryTask>> {
        let row_limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.load_where(move |connection| {
            delivery_tasks::table
                .filter(delivery_tasks::status.eq(TaskStatus::Pending.as_str()))
                .filter(delivery_tasks::route_code.is_null())
                .filter(delivery_tasks::next_pickup_at.le(now))
                .order((
                    delivery_tasks::next_pickup_at.asc(),
                    delivery_tasks::created_at.asc(),
                    delivery_tasks::id.asc(),
                ))
                .limit(row_limit)
                .select(DeliveryTaskRow::as_select())
                .load(connection)
        })
        .await
    }
}

#[async_trait]
impl EventOutbox for PostgresDeliveryTaskRepository {
    async fn pending_events(&self, limit: usize) -> OutboxResult<Vec<DeliveryEvent>> {
        let row_limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.run_outbox(move |connection| {
            let payloads = delivery_outbox::table
                .filter(delivery_outbox::published_at.is_null())
                .order(delivery_outbox::seq.asc())
                .limit(row_limit)
                .select(delivery_outbox::payload)
                .load::<serde_json::Value>(connection)
                .map_err(OutboxError::persistence)?;
            payloads
                .into_iter()
                .map(|payload| serde_json::from_value(payload).map_err(OutboxError::persistence))
                .collect()
        })
        .await
    }

    async fn mark_published(&self, event_ids: &[Uuid]) -> OutboxResult<()> {
        let ids = event_ids.to_vec();
        self.run_outbox(move |connection| {
            diesel::sql_query(
                "UPDATE delivery_outbox SET published_at = now() \
                 WHERE id = ANY($1) AND published_at IS NULL",
            )
            .bind::<diesel::sql_types::Array<diesel::sql_types::Uuid>, _>(ids)
            .execute(connection)
            .map_err(OutboxError::persistence)?;
            Ok(())
        })
        .await
    }
}

fn apply_update(
    connection: &mut PgConnection,
    row: &DeliveryTaskRecordRow,
    expected: u64,
) -> Result<(), TxError> {
    let expected_version = to_db_version(expected)?;
    let updated = diesel::update(
        delivery_tasks::table
            .filter(delivery_tasks::id.eq(row.id))
            .filter(delivery_tasks::version.eq(expected_version)),
    )
    .set(row)
    .execute(connection)?;
    if updated == 1 {
        return Ok(());
    }

    let task_id = DeliveryTaskId::from_uuid(row.id);
    let actual = delivery_tasks::table
        .filter(delivery_tasks::id.eq(row.id))
        .select(delivery_tasks::version)
        .first::<i64>(connection)
        .optional()?;
    Err(TxError::Repository(actual.map_or(
        DeliveryTaskRepositoryError::NotFound(task_id),
        |stored| DeliveryTaskRepositoryError::VersionConflict {
            task_id,
            expected,
            actual: u64::try_from(stored).unwrap_or_default(),
        },
    )))
}

fn insert_outbox(connection: &mut PgConnection, rows: &[NewOutboxRow]) -> Result<(), TxError> {
    if rows.is_empty() {
        return Ok(());
    }
    diesel::insert_into(delivery_outbox::table)
        .values(rows)
        .on_conflict(delivery_outbox::dedup_key)
        .do_nothing()
        .execute(connection)?;
    Ok(())
}

fn to_db_version(version: u64) -> Result<i64, DeliveryTaskRepositoryError> {
    i64::try_from(version).map_err(DeliveryTaskRepositoryError::persistence)
}

fn to_record_row(
    task: &DeliveryTask,
    version: u64,
) -> DeliveryTaskRepositoryResult<DeliveryTaskRecordRow> {
    let record = serde_json::to_value(task.to_persisted())
        .map_err(DeliveryTaskRepositoryError::persistence)?;
    let crew = task.assignment().crew();
    Ok(DeliveryTaskRecordRow {
        id: task.id().into_inner(),
        order_id: task.order_id().as_str().to_owned(),
        status: task.status().as_str().to_owned(),
        method: task.method().to_storage(),
        route_code: task.route_code().map(|code| code.as_str().to_owned()),
        planned_date: task.planned_date(),
        vehicle_id: crew.map(|assigned| assigned.vehicle_id().as_str().to_owned()),
        driver_id: crew.map(|assigned| assigned.driver_id().as_str().to_owned()),
        tracking_number: task
            .assignment()
            .tracking_number()
            .map(|number| number.as_str().to_owned()),
        is_active: task.is_active(),
        next_pickup_at: task.pickup().next_attempt_at(),
        record,
        version: to_db_version(version)?,
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

fn to_outbox_rows(events: &[DeliveryEvent]) -> DeliveryTaskRepositoryResult<Vec<NewOutboxRow>> {
    events
        .iter()
        .map(|event| {
            let payload =
                serde_json::to_value(event).map_err(DeliveryTaskRepositoryError::persistence)?;
            Ok(NewOutboxRow {
                id: event.id(),
                kind: event.kind().as_str().to_owned(),
                task_id: event.task_id().map(DeliveryTaskId::into_inner),
                dedup_key: event.dedup_key().to_owned(),
                payload,
                occurred_at: event.occurred_at(),
            })
        })
        .collect()
}

fn row_to_task(row: DeliveryTaskRow) -> DeliveryTaskRepositoryResult<DeliveryTask> {
    let DeliveryTaskRow {
        record,
        status,
        vehicle_id,
        driver_id,
        tracking_number,
        version,
        ..
    } = row;

    let invalid = |err: &dyn std::fmt::Display| {
        DeliveryTaskRepositoryError::InvalidPersistedData(err.to_string())
    };
    let mut data: PersistedDeliveryTask =
        serde_json::from_value(record).map_err(|err| invalid(&err))?;
    data.status = TaskStatus::try_from(status.as_str()).map_err(|err| invalid(&err))?;
    data.version = u64::try_from(version).map_err(|err| invalid(&err))?;
    data.assignment = assignment_from_columns(vehicle_id, driver_id, tracking_number)
        .map_err(|err| invalid(&err))?;
    DeliveryTask::from_persisted(data).map_err(|err| invalid(&err))
}

fn assignment_from_columns(
    vehicle_id: Option<String>,
    driver_id: Option<String>,
    tracking_number: Option<String>,
) -> Result<Assignment, crate::dispatch::domain::DeliveryDomainError> {
    let crew = match (vehicle_id, driver_id) {
        (Some(vehicle), Some(driver)) => {
            Some(Crew::new(VehicleId::new(vehicle)?, DriverId::new(driver)?))
        }
        _ => None,
    };
    let tracking = tracking_number.map(TrackingNumber::new).transpose()?;
    Assignment::from_parts(crew, tracking)
}

fn is_active_order_violation(info: &dyn DatabaseErrorInformation) -> bool {
    info.constraint_name()
        .is_some_and(|name| name == ACTIVE_ORDER_INDEX)
}
