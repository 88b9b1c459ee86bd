use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use url::Origin;

use crate::config::StorageConfig;
use crate::errors::{Result, StorageError};
use crate::storage::area::{LocalStore, StorageArea};
use crate::storage::memory::InMemoryArea;
use crate::storage::types::origin_key;

/// In‑memory local storage (no persistence). Used for private/ephemeral setups and tests.
pub struct InMemoryLocalStore {
    areas: Mutex<HashMap<String, Arc<dyn StorageArea>>>,
    quota: Option<usize>,
}

impl Default for InMemoryLocalStore {
    fn default() -> Self {
        Self::with_config(&StorageConfig::default())
    }
}

impl InMemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &StorageConfig) -> Self {
        Self {
            areas: Mutex::new(HashMap::new()),
            quota: config.quota_bytes,
        }
    }
}

impl LocalStore for InMemoryLocalStore {
    fn area(&self, origin: &Origin) -> Result<Arc<dyn StorageArea>> {
        let key = origin_key(origin)?;
        let mut guard = self.areas.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(guard
            .entry(key)
            .or_insert_with(|| Arc::new(InMemoryArea::new(self.quota)) as Arc<dyn StorageArea>)
            .clone())
    }
}
