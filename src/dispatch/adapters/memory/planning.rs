//! In-memory fleet roster and planning lease.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use mockable::Clock;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::dispatch::{
    domain::Crew,
    ports::{
        FleetRoster, FleetRosterError, LeaseToken, PlanningLease, PlanningLeaseError,
        PlanningLeaseResult,
    },
};
use crate::reference::domain::RouteCode;

/// Fleet roster that assigns the same crews to a route every day.
#[derive(Debug, Clone, Default)]
pub struct StaticFleetRoster {
    crews: BTreeMap<RouteCode, Vec<Crew>>,
}

impl StaticFleetRoster {
    /// Creates a roster from per-route crews, kept in vehicle order.
    #[must_use]
    pub fn new(roster: BTreeMap<RouteCode, Vec<Crew>>) -> Self {
        let crews = roster
            .into_iter()
            .map(|(route, mut route_crews)| {
                route_crews.sort();
                route_crews.dedup();
                (route, route_crews)
            })
            .collect();
        Self { crews }
    }
}

#[async_trait]
impl FleetRoster for StaticFleetRoster {
    async fn crews_for(
        &self,
        route_code: &RouteCode,
        _date: NaiveDate,
    ) -> Result<Vec<Crew>, FleetRosterError> {
        Ok(self.crews.get(route_code).cloned().unwrap_or_default())
    }
}

/// Planning lease held in process memory.
#[derive(Clone)]
pub struct InMemoryPlanningLease<C: Clock + Send + Sync> {
    leases: Arc<Mutex<HashMap<NaiveDate, HeldLease>>>,
    clock: Arc<C>,
}

#[derive(Debug, Clone)]
struct HeldLease {
    token: Uuid,
    expires_at: DateTime<Utc>,
}

impl<C: Clock + Send + Sync> InMemoryPlanningLease<C> {
    /// Creates a lease table that reads expiry times from `clock`.
    #[must_use]
    pub fn new(clock: Arc<C>) -> Self {
        Self {
            leases: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }
}

fn poisoned(err: impl std::fmt::Display) -> PlanningLeaseError {
    PlanningLeaseError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl<C: Clock + Send + Sync> PlanningLease for InMemoryPlanningLease<C> {
    async fn try_acquire(
        &self,
        date: NaiveDate,
        _holder: &str,
        ttl: Duration,
    ) -> PlanningLeaseResult<Option<LeaseToken>> {
        let now = self.clock.utc();
        let mut leases = self.leases.lock().map_err(poisoned)?;
        if leases.get(&date).is_some_and(|held| held.expires_at > now) {
            return Ok(None);
        }
        let token = Uuid::new_v4();
        leases.insert(
            date,
            HeldLease {
                token,
                expires_at: now + ttl,
            },
        );
        Ok(Some(LeaseToken { date, token }))
    }

    async fn release(&self, token: &LeaseToken) -> PlanningLeaseResult<()> {
        let mut leases = self.leases.lock().map_err(poisoned)?;
        if leases
            .get(&token.date)
            .is_some_and(|held| held.token == token.token)
        {
            leases.remove(&token.date);
        }
        Ok(())
    }
}
