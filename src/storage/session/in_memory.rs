use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::{debug, warn};
use url::Origin;

use crate::config::StorageConfig;
use crate::errors::{Result, StorageError};
use crate::storage::area::{SessionStore, StorageArea};
use crate::storage::memory::InMemoryArea;
use crate::storage::types::SessionId;

type SessionAreas = HashMap<(SessionId, Origin), Arc<dyn StorageArea>>;

// In memory storage
pub struct InMemorySessionStore {
    data: RwLock<SessionAreas>,
    quota: Option<usize>,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::with_config(&StorageConfig::default())
    }
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &StorageConfig) -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            quota: config.quota_bytes,
        }
    }
}

impl SessionStore for InMemorySessionStore {
    fn area(&self, session: SessionId, origin: &Origin) -> Result<Arc<dyn StorageArea>> {
        let mut guard = self.data.write().map_err(|_| StorageError::Poisoned)?;
        Ok(guard
            .entry((session, origin.clone()))
            .or_insert_with(|| Arc::new(InMemoryArea::new(self.quota)) as Arc<dyn StorageArea>)
            .clone())
    }

    fn drop_session(&self, session: SessionId) {
        // retain only removes entries, so a poisoned map is still safe to use
        let mut guard = self.data.write().unwrap_or_else(|poisoned| {
            warn!("Session storage lock poisoned while dropping {session}; recovering");
            poisoned.into_inner()
        });
        guard.retain(|(s, _), _| *s != session);
        debug!("Dropped session storage for {session}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::origin_of;

    #[test]
    fn sessions_are_isolated_per_session_and_origin() {
        let store = InMemorySessionStore::new();
        let origin = origin_of("https://example.com").unwrap();
        let s1 = SessionId::new();
        let s2 = SessionId::new();

        let a = store.area(s1, &origin).unwrap();
        a.set_item("k", "v").unwrap();

        // same session + origin sees the same area
        let again = store.area(s1, &origin).unwrap();
        assert_eq!(again.get_item("k").unwrap().as_deref(), Some("v"));

        // other session does not
        let other = store.area(s2, &origin).unwrap();
        assert!(other.get_item("k").unwrap().is_none());

        // other origin within the same session does not
        let other_origin = store.area(s1, &origin_of("https://other.test").unwrap()).unwrap();
        assert!(other_origin.get_item("k").unwrap().is_none());
    }

    #[test]
    fn drop_session_discards_only_that_session() {
        let store = InMemorySessionStore::new();
        let origin = origin_of("https://example.com").unwrap();
        let s1 = SessionId::new();
        let s2 = SessionId::new();

        store.area(s1, &origin).unwrap().set_item("k", "1").unwrap();
        store.area(s2, &origin).unwrap().set_item("k", "2").unwrap();

        store.drop_session(s1);

        assert!(store.area(s1, &origin).unwrap().get_item("k").unwrap().is_none());
        assert_eq!(store.area(s2, &origin).unwrap().get_item("k").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn drop_session_recovers_from_poisoned_lock() {
        let store = Arc::new(InMemorySessionStore::new());
        let origin = origin_of("https://example.com").unwrap();
        let session = SessionId::new();
        let other = SessionId::new();
        store.area(session, &origin).unwrap().set_item("k", "1").unwrap();
        store.area(other, &origin).unwrap().set_item("k", "2").unwrap();

        let poisoner = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.data.write().unwrap();
            panic!("writer panicked while holding the lock");
        })
        .join();
        assert!(store.data.is_poisoned());

        store.drop_session(session);

        let areas = store.data.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        assert!(!areas.contains_key(&(session, origin.clone())));
        assert!(areas.contains_key(&(other, origin)));
    }

    #[test]
    fn opaque_origins_get_session_storage() {
        let store = InMemorySessionStore::new();
        let opaque = origin_of("data:text/plain,x").unwrap();
        let area = store.area(SessionId::new(), &opaque).unwrap();
        area.set_item("k", "v").unwrap();
        assert_eq!(area.len().unwrap(), 1);
    }
}
