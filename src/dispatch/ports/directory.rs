//! Address lookup port.

use crate::dispatch::domain::{AddressId, DeliveryAddress};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for address lookups.
pub type AddressDirectoryResult<T> = Result<T, AddressDirectoryError>;

/// Read access to customer addresses owned by the address service.
#[async_trait]
pub trait AddressDirectory: Send + Sync {
    /// Returns the address, or `None` when it does not exist.
    async fn get_by_id(&self, id: &AddressId) -> AddressDirectoryResult<Option<DeliveryAddress>>;
}

/// Errors returned by address directory adapters.
#[derive(Debug, Clone, Error)]
pub enum AddressDirectoryError {
    /// The address service could not be reached.
    #[error("address directory unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl AddressDirectoryError {
    /// Wraps a transport error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
