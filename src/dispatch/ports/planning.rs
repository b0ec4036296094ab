//! Ports used by daily route planning.

use crate::dispatch::domain::Crew;
use crate::reference::domain::RouteCode;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Crews available to run routes.
#[async_trait]
pub trait FleetRoster: Send + Sync {
    /// Returns the crews for a route on a date, in vehicle order.
    async fn crews_for(
        &self,
        route_code: &RouteCode,
        date: NaiveDate,
    ) -> Result<Vec<Crew>, FleetRosterError>;
}

/// Errors returned by fleet roster adapters.
#[derive(Debug, Clone, Error)]
pub enum FleetRosterError {
    /// The roster could not be read.
    #[error("fleet roster unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl FleetRosterError {
    /// Wraps a transport error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}

/// Result type for planning lease operations.
pub type PlanningLeaseResult<T> = Result<T, PlanningLeaseError>;

/// Proof of holding the planning lease for a date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseToken {
    /// Leased date.
    pub date: NaiveDate,
    /// Unique token for this acquisition.
    pub token: Uuid,
}

/// Mutual exclusion for planning runs, one holder per date.
#[async_trait]
pub trait PlanningLease: Send + Sync {
    /// Takes the lease for `date` unless another holder has an unexpired
    /// lease. Returns `None` when the lease is held elsewhere.
    async fn try_acquire(
        &self,
        date: NaiveDate,
        holder: &str,
        ttl: Duration,
    ) -> PlanningLeaseResult<Option<LeaseToken>>;

    /// Releases a lease. Releasing an expired or replaced lease is a no-op.
    async fn release(&self, token: &LeaseToken) -> PlanningLeaseResult<()>;
}

/// Errors returned by planning lease adapters.
#[derive(Debug, Clone, Error)]
pub enum PlanningLeaseError {
    /// Persistence-layer failure.
    #[error("planning lease persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl PlanningLeaseError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
