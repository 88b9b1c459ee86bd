use std::sync::Arc;

use url::Origin;

use super::types::SessionId;
use crate::errors::Result;

/// Object-safe key/value storage area (DOM's Storage).
///
/// Keys and values are plain strings; enumeration order is defined by the
/// implementation and is only stable between structural mutations.
pub trait StorageArea: Send + Sync {
    /// Retrieves the value associated with the given key, or `None` if not found.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Sets the value for the given key, overwriting any existing value.
    ///
    /// Fails with [`StorageError::QuotaExceeded`](crate::errors::StorageError::QuotaExceeded)
    /// when the area cannot hold the new value.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removes the item with the given key. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Clears all items in the storage area.
    fn clear(&self) -> Result<()>;

    /// Returns the number of items in the storage area.
    fn len(&self) -> Result<usize>;

    /// Returns the key at `index` in enumeration order, or `None` when out of bounds.
    fn key(&self, index: usize) -> Result<Option<String>>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Returns all keys in enumeration order.
    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut index = 0;
        while let Some(key) = self.key(index)? {
            keys.push(key);
            index += 1;
        }
        Ok(keys)
    }
}

/// Store for localStorage-like areas (one shared area per origin).
pub trait LocalStore: Send + Sync {
    /// Retrieves the storage area for the given origin.
    fn area(&self, origin: &Origin) -> Result<Arc<dyn StorageArea>>;
}

/// Store for sessionStorage-like areas (isolated per session and origin).
pub trait SessionStore: Send + Sync {
    /// Retrieves the storage area for the given session and origin.
    fn area(&self, session: SessionId, origin: &Origin) -> Result<Arc<dyn StorageArea>>;

    /// Drops all session storage belonging to the given session.
    fn drop_session(&self, session: SessionId);
}
