//! `PostgreSQL` planning lease backed by the `planning_leases` table.

use super::repository::DispatchPgPool;
use crate::dispatch::ports::{LeaseToken, PlanningLease, PlanningLeaseError, PlanningLeaseResult};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Date, Text};
use uuid::Uuid;

/// Planning lease shared by every process using the same database.
///
/// Expiry is judged by the database clock so competing hosts agree.
#[derive(Debug, Clone)]
pub struct PostgresPlanningLease {
    pool: DispatchPgPool,
}

impl PostgresPlanningLease {
    /// Creates a lease adapter from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: DispatchPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> PlanningLeaseResult<T>
    where
        F: FnOnce(&mut PgConnection) -> PlanningLeaseResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(PlanningLeaseError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(PlanningLeaseError::persistence)?
    }
}

#[async_trait]
impl PlanningLease for PostgresPlanningLease {
    async fn try_acquire(
        &self,
        date: NaiveDate,
        holder: &str,
        ttl: Duration,
    ) -> PlanningLeaseResult<Option<LeaseToken>> {
        let holder_name = holder.to_owned();
        let token = Uuid::new_v4();
        let ttl_seconds = ttl.num_seconds().max(1);
        self.run_blocking(move |connection| {
            let acquired = diesel::sql_query(concat!(
                "INSERT INTO planning_leases (plan_date, holder, token, expires_at) ",
                "VALUES ($1, $2, $3, now() + $4 * interval '1 second') ",
                "ON CONFLICT (plan_date) DO UPDATE SET ",
                "holder = EXCLUDED.holder, token = EXCLUDED.token, ",
                "expires_at = EXCLUDED.expires_at ",
                "WHERE planning_leases.expires_at <= now()",
            ))
            .bind::<Date, _>(date)
            .bind::<Text, _>(holder_name)
            .bind::<diesel::sql_types::Uuid, _>(token)
            .bind::<BigInt, _>(ttl_seconds)
            .execute(connection)
            .map_err(PlanningLeaseError::persistence)?;
            Ok((acquired == 1).then_some(LeaseToken { date, token }))
        })
        .await
    }

    async fn release(&self, token: &LeaseToken) -> PlanningLeaseResult<()> {
        let LeaseToken { date, token } = token.clone();
        self.run_blocking(move |connection| {
            diesel::sql_query("DELETE FROM planning_leases WHERE plan_date = $1 AND token = $2")
                .bind::<Date, _>(date)
                .bind::<diesel::sql_types::Uuid, _>(token)
                .execute(connection)
                .map_err(PlanningLeaseError::persistence)?;
            Ok(())
        })
        .await
    }
}
