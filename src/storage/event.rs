use url::Origin;

use super::types::SessionId;

/// Which kind of storage an area or event belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StorageScope {
    /// Durable, origin-scoped storage (localStorage)
    Local,
    /// Storage scoped to one browsing session (sessionStorage)
    Session,
}

/// A change made to a storage area handed out by a [`StorageService`](super::StorageService).
///
/// `key` is `None` when the whole area was cleared.
#[derive(Clone, Debug)]
pub struct StorageEvent {
    pub scope: StorageScope,
    pub origin: Origin,
    pub session: Option<SessionId>, // None for local storage
    pub key: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl StorageEvent {
    /// Whether this event reports a full clear rather than a single key change.
    pub fn is_clear(&self) -> bool {
        self.key.is_none()
    }
}
