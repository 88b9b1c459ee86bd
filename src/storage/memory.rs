//! Insertion-ordered in-memory storage area.
//!
//! Shared by the in-memory local and session stores. Entries keep the position
//! of their first insertion; overwriting a key does not move it.

use std::collections::HashMap;
use std::sync::RwLock;

use log::{debug, warn};

use crate::config::DEFAULT_QUOTA_BYTES;
use crate::errors::{Result, StorageError};
use crate::storage::area::StorageArea;

#[derive(Default)]
struct Entries {
    order: Vec<String>,
    map: HashMap<String, String>,
    /// Bytes held by all entries (key + value, UTF-8)
    used: usize,
}

fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

/// In-memory [`StorageArea`] with an optional byte quota.
pub struct InMemoryArea {
    entries: RwLock<Entries>,
    quota: Option<usize>,
}

impl Default for InMemoryArea {
    fn default() -> Self {
        Self::new(Some(DEFAULT_QUOTA_BYTES))
    }
}

impl InMemoryArea {
    pub fn new(quota: Option<usize>) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            quota,
        }
    }

    /// An area that never rejects a write.
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Bytes currently held by the area.
    pub fn used_bytes(&self) -> Result<usize> {
        Ok(self.entries.read().map_err(|_| StorageError::Poisoned)?.used)
    }
}

impl StorageArea for InMemoryArea {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.map.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;

        let old_size = entries.map.get(key).map(|old| entry_size(key, old)).unwrap_or(0);
        let needed = entries.used - old_size + entry_size(key, value);
        if let Some(quota) = self.quota {
            if needed > quota {
                warn!("Rejecting write of '{key}': {needed} bytes exceeds quota of {quota}");
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }

        if entries.map.insert(key.to_string(), value.to_string()).is_none() {
            entries.order.push(key.to_string());
        }
        entries.used = needed;
        debug!("Stored '{key}' ({} bytes in use)", entries.used);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        if let Some(old) = entries.map.remove(key) {
            entries.used -= entry_size(key, &old);
            entries.order.retain(|k| k != key);
            debug!("Removed '{key}'");
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        *entries = Entries::default();
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.entries.read().map_err(|_| StorageError::Poisoned)?.map.len())
    }

    fn key(&self, index: usize) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.order.get(index).cloned())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().map_err(|_| StorageError::Poisoned)?.order.clone())
    }
}
