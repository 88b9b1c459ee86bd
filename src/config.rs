use std::time::Duration;

/// Per-origin quota browsers commonly apply to local and session storage.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Capacity of the storage change-notification channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 128;

/// Storage configuration shared by the in-memory and SQLite backends.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Maximum bytes (key + value, UTF-8) a single area may hold. `None` disables the check.
    pub quota_bytes: Option<usize>,
    /// Maximum pooled SQLite connections
    pub sqlite_max_connections: u32,
    /// How long SQLite waits on a locked database before failing
    pub sqlite_busy_timeout: Duration,
    /// How long to wait for a pooled connection
    pub sqlite_connection_timeout: Duration,
    /// Buffered storage events per subscriber
    pub event_channel_capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            quota_bytes: Some(DEFAULT_QUOTA_BYTES),
            sqlite_max_connections: 16,
            sqlite_busy_timeout: Duration::from_millis(500),
            sqlite_connection_timeout: Duration::from_secs(5),
            event_channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl StorageConfig {
    /// Configuration without any quota enforcement.
    pub fn unbounded() -> Self {
        Self {
            quota_bytes: None,
            ..Self::default()
        }
    }
}
