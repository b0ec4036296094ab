//! In-memory address directory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::dispatch::{
    domain::{AddressId, DeliveryAddress},
    ports::{AddressDirectory, AddressDirectoryError, AddressDirectoryResult},
};

/// Address directory backed by a map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAddressDirectory {
    addresses: Arc<RwLock<HashMap<AddressId, DeliveryAddress>>>,
}

impl InMemoryAddressDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an address.
    ///
    /// # Errors
    ///
    /// Returns [`AddressDirectoryError::Unavailable`] when the lock is
    /// poisoned.
    pub fn insert(&self, address: DeliveryAddress) -> AddressDirectoryResult<()> {
        let mut addresses = self.addresses.write().map_err(|err| {
            AddressDirectoryError::unavailable(std::io::Error::other(err.to_string()))
        })?;
        addresses.insert(address.id().clone(), address);
        Ok(())
    }
}

#[async_trait]
impl AddressDirectory for InMemoryAddressDirectory {
    async fn get_by_id(&self, id: &AddressId) -> AddressDirectoryResult<Option<DeliveryAddress>> {
        let addresses = self.addresses.read().map_err(|err| {
            AddressDirectoryError::unavailable(std::io::Error::other(err.to_string()))
        })?;
        Ok(addresses.get(id).cloned())
    }
}
