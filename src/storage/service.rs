use std::fmt::Debug;
use std::sync::Arc;

use tokio::sync::broadcast;
use url::Origin;

use super::area::{LocalStore, SessionStore, StorageArea};
use super::event::{StorageEvent, StorageScope};
use super::local::in_memory::InMemoryLocalStore;
use super::session::in_memory::InMemorySessionStore;
use super::typed::{PersistentStorage, SessionStorage};
use super::types::SessionId;
use crate::config::{StorageConfig, DEFAULT_CHANNEL_CAPACITY};
use crate::errors::Result;

/// A handle for receiving storage change notifications.
pub type Subscription = broadcast::Receiver<StorageEvent>;

#[derive(Debug)]
struct StorageBus {
    tx: broadcast::Sender<StorageEvent>,
}

impl StorageBus {
    fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    fn subscribe(&self) -> Subscription {
        self.tx.subscribe()
    }

    fn publish(&self, ev: StorageEvent) {
        // send() only fails when nobody is subscribed
        let _ = self.tx.send(ev);
    }
}

/// Host-side provider of local and session storage.
///
/// Hands out typed wrappers whose areas report every mutation on a broadcast
/// channel. The wrappers never see that channel; only [`subscribe`](Self::subscribe)
/// callers do.
#[derive(Clone)]
pub struct StorageService {
    local: Arc<dyn LocalStore>,
    session: Arc<dyn SessionStore>,
    bus: Arc<StorageBus>,
}

impl Debug for StorageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageService").finish_non_exhaustive()
    }
}

impl StorageService {
    pub fn new(local: Arc<dyn LocalStore>, session: Arc<dyn SessionStore>) -> Self {
        Self::with_capacity(local, session, DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(
        local: Arc<dyn LocalStore>,
        session: Arc<dyn SessionStore>,
        capacity: usize,
    ) -> Self {
        Self {
            local,
            session,
            bus: Arc::new(StorageBus::new(capacity)),
        }
    }

    /// Service where both local and session storage live in memory.
    pub fn in_memory(config: &StorageConfig) -> Self {
        Self::with_capacity(
            Arc::new(InMemoryLocalStore::with_config(config)),
            Arc::new(InMemorySessionStore::with_config(config)),
            config.event_channel_capacity,
        )
    }

    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe()
    }

    /// Persistent storage for `origin`, shared by every session.
    pub fn local_for(&self, origin: &Origin) -> Result<PersistentStorage> {
        let inner = self.local.area(origin)?;
        Ok(PersistentStorage::new(self.wrap_notifying(
            inner,
            None,
            origin.clone(),
            StorageScope::Local,
        )))
    }

    /// Session storage for `origin` within `session`.
    pub fn session_for(&self, session: SessionId, origin: &Origin) -> Result<SessionStorage> {
        let inner = self.session.area(session, origin)?;
        Ok(SessionStorage::new(self.wrap_notifying(
            inner,
            Some(session),
            origin.clone(),
            StorageScope::Session,
        )))
    }

    /// Ends a session, discarding all of its session storage.
    pub fn drop_session(&self, session: SessionId) {
        self.session.drop_session(session);
    }

    fn wrap_notifying(
        &self,
        inner: Arc<dyn StorageArea>,
        session: Option<SessionId>,
        origin: Origin,
        scope: StorageScope,
    ) -> Arc<dyn StorageArea> {
        Arc::new(NotifyingArea {
            inner,
            origin,
            session,
            bus: self.bus.clone(),
            scope,
        })
    }
}

struct NotifyingArea {
    inner: Arc<dyn StorageArea>,
    origin: Origin,
    session: Option<SessionId>,
    bus: Arc<StorageBus>,
    scope: StorageScope,
}

impl NotifyingArea {
    fn publish(&self, key: Option<&str>, old_value: Option<String>, new_value: Option<String>) {
        self.bus.publish(StorageEvent {
            scope: self.scope,
            origin: self.origin.clone(),
            session: self.session,
            key: key.map(str::to_string),
            old_value,
            new_value,
        });
    }
}

impl StorageArea for NotifyingArea {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let old = self.inner.get_item(key)?;
        self.inner.set_item(key, value)?;
        self.publish(Some(key), old, Some(value.to_string()));
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        // removing a missing key changes nothing, so nothing is reported
        let Some(old) = self.inner.get_item(key)? else {
            return Ok(());
        };
        self.inner.remove_item(key)?;
        self.publish(Some(key), Some(old), None);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let was_empty = self.inner.is_empty()?;
        self.inner.clear()?;
        if !was_empty {
            self.publish(None, None, None);
        }
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        self.inner.len()
    }

    fn key(&self, index: usize) -> Result<Option<String>> {
        self.inner.key(index)
    }

    fn keys(&self) -> Result<Vec<String>> {
        self.inner.keys()
    }
}
