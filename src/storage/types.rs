use std::fmt::Display;

use serde::{Deserialize, Serialize};
use url::{Origin, Url};
use uuid::Uuid;

use crate::errors::{Result, StorageError};

/// Identifies one browsing session (a tab's lifetime). Session storage is scoped to it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for SessionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Serialized form of an origin usable as a durable storage key.
///
/// Opaque origins have no stable serialization (they all print as `null`), so
/// they cannot own persistent storage.
pub fn origin_key(origin: &Origin) -> Result<String> {
    if !origin.is_tuple() {
        return Err(StorageError::OpaqueOrigin);
    }
    Ok(origin.ascii_serialization())
}

/// Parses `s` as a URL and returns its origin.
pub fn origin_of(s: &str) -> std::result::Result<Origin, url::ParseError> {
    Ok(Url::parse(s)?.origin())
}
