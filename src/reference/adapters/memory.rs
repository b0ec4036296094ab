//! In-memory reference data holders with atomic snapshot replacement.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::reference::{
    domain::{CarrierRegistrySnapshot, RouteCatalogSnapshot},
    ports::{CarrierRegistry, ReferenceDataError, ReferenceDataResult, RouteCatalog},
};

/// Route catalog backed by a swappable in-memory snapshot.
///
/// Replacing the catalog never mutates a snapshot already handed out.
#[derive(Debug, Clone)]
pub struct InMemoryRouteCatalog {
    current: Arc<RwLock<Arc<RouteCatalogSnapshot>>>,
}

impl InMemoryRouteCatalog {
    /// Creates a catalog serving `snapshot`.
    #[must_use]
    pub fn new(snapshot: RouteCatalogSnapshot) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(snapshot))),
        }
    }

    /// Replaces the served snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceDataError::Unavailable`] when the lock is
    /// poisoned.
    pub fn replace(&self, snapshot: RouteCatalogSnapshot) -> ReferenceDataResult<()> {
        let mut current = self.current.write().map_err(|err| {
            ReferenceDataError::unavailable(std::io::Error::other(err.to_string()))
        })?;
        *current = Arc::new(snapshot);
        Ok(())
    }
}

#[async_trait]
impl RouteCatalog for InMemoryRouteCatalog {
    async fn snapshot(&self) -> ReferenceDataResult<Arc<RouteCatalogSnapshot>> {
        let current = self.current.read().map_err(|err| {
            ReferenceDataError::unavailable(std::io::Error::other(err.to_string()))
        })?;
        Ok(Arc::clone(&current))
    }
}

/// Carrier registry backed by a swappable in-memory snapshot.
#[derive(Debug, Clone)]
pub struct InMemoryCarrierRegistry {
    current: Arc<RwLock<Arc<CarrierRegistrySnapshot>>>,
}

impl InMemoryCarrierRegistry {
    /// Creates a registry serving `snapshot`.
    #[must_use]
    pub fn new(snapshot: CarrierRegistrySnapshot) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(snapshot))),
        }
    }

    /// Replaces the served snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceDataError::Unavailable`] when the lock is
    /// poisoned.
    pub fn replace(&self, snapshot: CarrierRegistrySnapshot) -> ReferenceDataResult<()> {
        let mut current = self.current.write().map_err(|err| {
            ReferenceDataError::unavailable(std::io::Error::other(err.to_string()))
        })?;
        *current = Arc::new(snapshot);
        Ok(())
    }
}

#[async_trait]
impl CarrierRegistry for InMemoryCarrierRegistry {
    async fn snapshot(&self) -> ReferenceDataResult<Arc<CarrierRegistrySnapshot>> {
        let current = self.current.read().map_err(|err| {
            ReferenceDataError::unavailable(std::io::Error::other(err.to_string()))
        })?;
        Ok(Arc::clone(&current))
    }
}
