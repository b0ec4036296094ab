//! Snapshot ports for the route catalog and carrier registry.

use crate::reference::domain::{CarrierRegistrySnapshot, RouteCatalogSnapshot};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for reference data operations.
pub type ReferenceDataResult<T> = Result<T, ReferenceDataError>;

/// Source of route catalog snapshots.
#[async_trait]
pub trait RouteCatalog: Send + Sync {
    /// Returns the current catalog snapshot.
    async fn snapshot(&self) -> ReferenceDataResult<Arc<RouteCatalogSnapshot>>;
}

/// Source of carrier registry snapshots.
#[async_trait]
pub trait CarrierRegistry: Send + Sync {
    /// Returns the current registry snapshot.
    async fn snapshot(&self) -> ReferenceDataResult<Arc<CarrierRegistrySnapshot>>;
}

/// Errors returned by reference data adapters.
#[derive(Debug, Clone, Error)]
pub enum ReferenceDataError {
    /// The backing store could not produce a snapshot.
    #[error("reference data unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl ReferenceDataError {
    /// Wraps a backing-store failure.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
