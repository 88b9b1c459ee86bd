/// Errors surfaced by storage areas and the typed storage wrappers.
///
/// A missing key is never an error: reads return `Ok(None)` for it.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Stored value for key '{key}' cannot be decoded: {source}")]
    Parse {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Value for key '{key}' cannot be serialized: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Quota exceeded while writing '{key}': {needed} bytes needed, quota is {quota} bytes")]
    QuotaExceeded { key: String, needed: usize, quota: usize },

    #[error("Persistent storage is not available for opaque origins")]
    OpaqueOrigin,

    #[error("Storage lock poisoned")]
    Poisoned,

    #[cfg(feature = "sqlite_store")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] r2d2_sqlite::rusqlite::Error),

    #[cfg(feature = "sqlite_store")]
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

impl StorageError {
    /// Returns true when the backing store rejected a write for lack of capacity.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, StorageError::QuotaExceeded { .. })
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
