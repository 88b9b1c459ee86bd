//! JSON-aware façade over a [`StorageArea`].
//!
//! [`TypedStorage`] owns no state of its own: every call goes straight to the
//! injected area, so `len()` is always live and two wrappers over the same area
//! observe the same entries. The kind parameter ([`Persistent`] or [`Session`])
//! keeps local and session wrappers from being mixed up at compile time.
//!
//! # Absent keys
//!
//! A missing key reads as `Ok(None)`. A key whose stored text cannot be decoded
//! fails with [`StorageError::Parse`]; the two are never conflated. A stored JSON
//! `null` is a present value: `get_value` returns `Some(Value::Null)` for it.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use gosub_webstorage::storage::{InMemoryArea, SessionStorage};
//!
//! let session = SessionStorage::new(Arc::new(InMemoryArea::default()));
//! session.set("cart", &vec![1, 2, 3]).unwrap();
//! let cart: Option<Vec<u32>> = session.get("cart").unwrap();
//! assert_eq!(cart, Some(vec![1, 2, 3]));
//! assert_eq!(session.len().unwrap(), 1);
//! ```

use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::area::StorageArea;
use super::event::StorageScope;
use crate::errors::{Result, StorageError};

/// Marker for the kind of store a [`TypedStorage`] wraps.
pub trait StorageKind: 'static {
    const SCOPE: StorageScope;
}

/// Durable, origin-scoped storage.
#[derive(Debug)]
pub enum Persistent {}

/// Storage that lives as long as one browsing session.
#[derive(Debug)]
pub enum Session {}

impl StorageKind for Persistent {
    const SCOPE: StorageScope = StorageScope::Local;
}

impl StorageKind for Session {
    const SCOPE: StorageScope = StorageScope::Session;
}

/// Typed wrapper over persistent (local) storage.
pub type PersistentStorage = TypedStorage<Persistent>;
/// Typed wrapper over session storage.
pub type SessionStorage = TypedStorage<Session>;

/// Stateless JSON (de)serializing wrapper over a storage area.
pub struct TypedStorage<K: StorageKind> {
    area: Arc<dyn StorageArea>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: StorageKind> Clone for TypedStorage<K> {
    fn clone(&self) -> Self {
        Self {
            area: self.area.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: StorageKind> Debug for TypedStorage<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedStorage")
            .field("scope", &K::SCOPE)
            .finish_non_exhaustive()
    }
}

impl<K: StorageKind> TypedStorage<K> {
    /// Wraps the given area. The area is shared, not copied.
    pub fn new(area: Arc<dyn StorageArea>) -> Self {
        Self {
            area,
            _kind: PhantomData,
        }
    }

    pub fn scope(&self) -> StorageScope {
        K::SCOPE
    }

    /// The raw area behind this wrapper.
    pub fn area(&self) -> &Arc<dyn StorageArea> {
        &self.area
    }

    /// Reads and decodes the value stored under `key`.
    ///
    /// Returns `Ok(None)` when the key is absent and [`StorageError::Parse`] when
    /// the stored text is not valid JSON or does not decode as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.area.get_item(key)? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(source) => {
                warn!("{:?} storage holds an undecodable value under '{key}': {source}", K::SCOPE);
                Err(StorageError::Parse {
                    key: key.to_string(),
                    source,
                })
            }
        }
    }

    /// Reads the value stored under `key` as untyped JSON.
    pub fn get_value(&self, key: &str) -> Result<Option<Value>> {
        self.get(key)
    }

    /// Returns true when an entry exists for `key`, without decoding it.
    pub fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.area.get_item(key)?.is_some())
    }

    /// Serializes `value` to JSON and stores it under `key`, replacing any existing entry.
    ///
    /// A capacity rejection from the area surfaces as [`StorageError::QuotaExceeded`].
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let text = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.area.set_item(key, &text)?;
        debug!("{:?} storage: set '{key}'", K::SCOPE);
        Ok(())
    }

    /// Removes the entry for `key`. A missing key is a no-op.
    pub fn delete(&self, key: &str) -> Result<()> {
        self.area.remove_item(key)
    }

    /// Removes every entry from the underlying area. Cannot be undone.
    pub fn drop(&self) -> Result<()> {
        self.area.clear()?;
        debug!("{:?} storage: dropped all entries", K::SCOPE);
        Ok(())
    }

    /// Key at position `index` in the area's current enumeration order.
    ///
    /// Only stable until the next insert or removal.
    pub fn key_at(&self, index: usize) -> Result<Option<String>> {
        self.area.key(index)
    }

    /// Live number of entries.
    pub fn len(&self) -> Result<usize> {
        self.area.len()
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.area.is_empty()
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        self.area.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::InMemoryArea;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Profile {
        name: String,
        age: u32,
        tags: Vec<String>,
        nickname: Option<String>,
    }

    fn session() -> SessionStorage {
        SessionStorage::new(Arc::new(InMemoryArea::unbounded()))
    }

    #[test]
    fn values_round_trip() {
        let store = session();
        let profile = Profile {
            name: "Ada".into(),
            age: 36,
            tags: vec!["math".into(), "engines".into()],
            nickname: None,
        };
        store.set("profile", &profile).unwrap();
        assert_eq!(store.get::<Profile>("profile").unwrap(), Some(profile));

        let doc = json!({"a": [1, 2.5, "three", null, true], "b": {"nested": {}}});
        store.set("doc", &doc).unwrap();
        assert_eq!(store.get_value("doc").unwrap(), Some(doc));

        store.set("greeting", "hello").unwrap();
        assert_eq!(store.area().get_item("greeting").unwrap().as_deref(), Some("\"hello\""));
        assert_eq!(store.get::<String>("greeting").unwrap().as_deref(), Some("hello"));
    }

    #[test]
    fn floats_round_trip_bit_exact() {
        let store = session();
        let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut checked = 0;

        while checked < 20_000 {
            // xorshift64
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let value = f64::from_bits(state);
            if !value.is_finite() {
                continue;
            }

            store.set("f", &value).unwrap();
            let back = store.get::<f64>("f").unwrap().unwrap();
            assert_eq!(back.to_bits(), value.to_bits(), "{value:e} came back as {back:e}");
            checked += 1;
        }

        for value in [0.1, -0.0, f64::MIN_POSITIVE, 5e-324, f64::MAX, 1.0715660391465826e-75] {
            store.set("f", &value).unwrap();
            assert_eq!(store.get::<f64>("f").unwrap().map(f64::to_bits), Some(value.to_bits()));
        }
    }

    #[test]
    fn absent_key_is_none_not_an_error() {
        let store = session();
        assert_eq!(store.get::<u32>("missing").unwrap(), None);
        assert_eq!(store.get_value("missing").unwrap(), None);
        assert!(!store.contains("missing").unwrap());
    }

    #[test]
    fn stored_null_is_distinct_from_absence() {
        let store = session();
        store.set("nothing", &Value::Null).unwrap();
        assert_eq!(store.get_value("nothing").unwrap(), Some(Value::Null));
        assert_eq!(store.get::<Option<u32>>("nothing").unwrap(), Some(None));
        assert!(store.contains("nothing").unwrap());
    }

    #[test]
    fn delete_yields_absence() {
        let store = session();
        store.set("a", &1).unwrap();
        store.delete("a").unwrap();
        assert_eq!(store.get::<i32>("a").unwrap(), None);
        assert_eq!(store.len().unwrap(), 0);

        // deleting a missing key is fine
        store.delete("a").unwrap();
    }

    #[test]
    fn overwrite_keeps_single_entry() {
        let store = session();
        store.set("a", &1).unwrap();
        store.set("a", &2).unwrap();
        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.get::<i32>("a").unwrap(), Some(2));
        assert_eq!(store.keys().unwrap(), vec!["a"]);
    }

    #[test]
    fn drop_is_idempotent() {
        let store = session();
        store.set("a", &1).unwrap();
        store.set("b", &2).unwrap();

        store.drop().unwrap();
        assert_eq!(store.len().unwrap(), 0);
        assert!(store.is_empty().unwrap());

        store.drop().unwrap();
        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn key_at_out_of_bounds_is_none() {
        let store = session();
        assert_eq!(store.key_at(0).unwrap(), None);

        store.set("first", &1).unwrap();
        store.set("second", &2).unwrap();
        assert_eq!(store.key_at(0).unwrap().as_deref(), Some("first"));
        assert_eq!(store.key_at(1).unwrap().as_deref(), Some("second"));
        assert_eq!(store.key_at(2).unwrap(), None);
        assert_eq!(store.key_at(usize::MAX).unwrap(), None);
    }

    #[test]
    fn length_is_live() {
        let area: Arc<dyn StorageArea> = Arc::new(InMemoryArea::unbounded());
        let store = PersistentStorage::new(area.clone());
        assert_eq!(store.len().unwrap(), 0);

        // mutations through another handle are visible immediately
        area.set_item("x", "1").unwrap();
        assert_eq!(store.len().unwrap(), 1);
        store.set("y", &2).unwrap();
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn corrupt_value_surfaces_parse_error() {
        let store = session();
        store.area().set_item("x", "{not json").unwrap();

        match store.get_value("x") {
            Err(StorageError::Parse { key, .. }) => assert_eq!(key, "x"),
            other => panic!("expected Parse error, got {other:?}"),
        }
        // still present, so not treated as absent
        assert!(store.contains("x").unwrap());
    }

    #[test]
    fn type_mismatch_surfaces_parse_error() {
        let store = session();
        store.set("n", "not a number").unwrap();
        assert!(matches!(store.get::<u32>("n"), Err(StorageError::Parse { .. })));
    }

    #[test]
    fn unserializable_value_is_rejected_before_writing() {
        let store = session();
        let mut map = HashMap::new();
        map.insert((1, 2), "tuple keys are not JSON object keys");

        assert!(matches!(store.set("bad", &map), Err(StorageError::Serialize { .. })));
        assert!(!store.contains("bad").unwrap());
    }

    #[test]
    fn quota_failure_propagates_from_set() {
        let store = SessionStorage::new(Arc::new(InMemoryArea::new(Some(8))));
        store.set("k", "abc").unwrap(); // "k" + "\"abc\"" = 6 bytes
        let err = store.set("k", "abcdef").unwrap_err();
        assert!(err.is_quota_exceeded());
        assert_eq!(store.get::<String>("k").unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn persistent_and_session_wrappers_are_isolated() {
        let local = PersistentStorage::new(Arc::new(InMemoryArea::unbounded()));
        let session = SessionStorage::new(Arc::new(InMemoryArea::unbounded()));

        local.set("shared", "local").unwrap();
        session.set("shared", "session").unwrap();

        assert_eq!(local.get::<String>("shared").unwrap().as_deref(), Some("local"));
        assert_eq!(session.get::<String>("shared").unwrap().as_deref(), Some("session"));

        session.drop().unwrap();
        assert_eq!(local.len().unwrap(), 1);
        assert_eq!(local.scope(), StorageScope::Local);
        assert_eq!(session.scope(), StorageScope::Session);
    }

    #[test]
    fn clones_share_the_area() {
        let a = session();
        let b = a.clone();
        a.set("k", &true).unwrap();
        assert_eq!(b.get::<bool>("k").unwrap(), Some(true));
        assert!(format!("{a:?}").contains("Session"));
    }
}
