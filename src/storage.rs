//! Typed local and session storage.
//!
//! This module defines the traits, types, and implementations behind
//! browser-style **LocalStorage** and **SessionStorage**, plus a JSON-aware
//! façade over both.
//!
//! # Concepts
//!
//! - **Local storage**: durable key/value data per origin, shared by every
//!   session. Provisioned by a [`LocalStore`].
//! - **Session storage**: key/value data per `(session, origin)`, discarded
//!   when the session ends. Provisioned by a [`SessionStore`].
//!
//! Every raw store implements [`StorageArea`] (`get_item`, `set_item`,
//! `remove_item`, `clear`, `len`, `key`). Application code talks to a
//! [`TypedStorage`] instead: [`PersistentStorage`] or [`SessionStorage`], which
//! serialize values to JSON on the way in and decode them on the way out.
//!
//! A [`StorageService`] bundles one local and one session store and hands out
//! typed wrappers, reporting mutations as [`StorageEvent`]s to subscribers.
//!
//! # Choosing a backend
//!
//! - For durable local storage, use [`SqliteLocalStore`].
//! - For session storage, use [`InMemorySessionStore`].
//! - For tests or private modes, use [`InMemoryLocalStore`] or a bare [`InMemoryArea`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use gosub_webstorage::storage::{InMemorySessionStore, SessionId, SqliteLocalStore, StorageService};
//!
//! let storage = StorageService::new(
//!     Arc::new(SqliteLocalStore::new("local.db").unwrap()),
//!     Arc::new(InMemorySessionStore::new()),
//! );
//!
//! let origin = url::Url::parse("https://example.com").unwrap().origin();
//! let local = storage.local_for(&origin).unwrap();
//! local.set("theme", "dark").unwrap();
//!
//! let session = storage.session_for(SessionId::new(), &origin).unwrap();
//! assert_eq!(session.get::<String>("theme").unwrap(), None);
//! ```

/// Storage area module, defining the key/value storage interface.
pub mod area;
/// Event module, providing storage change events.
pub mod event;
/// Insertion-ordered in-memory area shared by the in-memory stores.
pub mod memory;
/// Service module, providing local and session storage from one handle.
pub mod service;
/// JSON façade over storage areas.
pub mod typed;
/// Storage types
pub mod types;

/// Local storage module, providing persistent storage areas.
pub mod local {
    /// In-memory local storage implementation.
    pub mod in_memory;
    /// SQLite-backed local storage implementation.
    #[cfg(feature = "sqlite_store")]
    pub mod sqlite_store;
}

/// Session storage module, providing in-memory session storage.
pub mod session {
    /// In-memory session storage implementation.
    pub mod in_memory;
}

pub use area::{LocalStore, SessionStore, StorageArea};
pub use event::{StorageEvent, StorageScope};
pub use local::in_memory::InMemoryLocalStore;
#[cfg(feature = "sqlite_store")]
pub use local::sqlite_store::SqliteLocalStore;
pub use memory::InMemoryArea;
pub use service::{StorageService, Subscription};
pub use session::in_memory::InMemorySessionStore;
pub use typed::{Persistent, PersistentStorage, Session, SessionStorage, StorageKind, TypedStorage};
pub use types::SessionId;
