use std::path::Path;
use std::sync::Arc;

use log::{debug, warn};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::rusqlite::{params, OpenFlags, OptionalExtension, TransactionBehavior};
use r2d2_sqlite::SqliteConnectionManager;
use url::Origin;

use crate::config::StorageConfig;
use crate::errors::{Result, StorageError};
use crate::storage::area::{LocalStore, StorageArea};
use crate::storage::types::origin_key;

/// SQLite-based local storage implementation
///
/// All origins share one table. Keys enumerate in insertion order (by row id);
/// an upsert keeps the original row so overwriting does not reorder.
pub struct SqliteLocalStore {
    pool: Pool<SqliteConnectionManager>,
    quota: Option<usize>,
}

impl SqliteLocalStore {
    /// Creates a new SQLite local store with the specified database file path.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(path, &StorageConfig::default())
    }

    pub fn with_config(path: impl AsRef<Path>, config: &StorageConfig) -> Result<Self> {
        let busy_timeout = config.sqlite_busy_timeout;
        let manager = SqliteConnectionManager::file(path.as_ref())
            .with_flags(
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_URI,
            )
            .with_init(move |c| {
                c.busy_timeout(busy_timeout)?;
                // journal_mode reports the resulting mode as a row
                c.query_row("PRAGMA journal_mode=WAL", [], |_| Ok(()))?;
                c.execute_batch(
                    "CREATE TABLE IF NOT EXISTS local_storage (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        origin TEXT NOT NULL,
                        key TEXT NOT NULL,
                        value TEXT NOT NULL,
                        updated_at INTEGER NOT NULL DEFAULT (strftime('%s','now')),
                        UNIQUE(origin, key)
                    );",
                )?;
                Ok(())
            });

        let pool = Pool::builder()
            .max_size(config.sqlite_max_connections)
            .connection_timeout(config.sqlite_connection_timeout)
            .build(manager)?;

        debug!("Opened SQLite local storage at {}", path.as_ref().display());
        Ok(Self {
            pool,
            quota: config.quota_bytes,
        })
    }
}

impl LocalStore for SqliteLocalStore {
    fn area(&self, origin: &Origin) -> Result<Arc<dyn StorageArea>> {
        Ok(Arc::new(SqliteLocalArea {
            pool: self.pool.clone(),
            origin: origin_key(origin)?,
            quota: self.quota,
        }))
    }
}

struct SqliteLocalArea {
    pool: Pool<SqliteConnectionManager>,
    origin: String,
    quota: Option<usize>,
}

impl SqliteLocalArea {
    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }
}

impl StorageArea for SqliteLocalArea {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM local_storage WHERE origin=?1 AND key=?2",
                params![self.origin, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some(quota) = self.quota {
            let others: i64 = tx.query_row(
                "SELECT COALESCE(SUM(length(CAST(key AS BLOB)) + length(CAST(value AS BLOB))), 0)
                 FROM local_storage WHERE origin=?1 AND key<>?2",
                params![self.origin, key],
                |row| row.get(0),
            )?;
            let needed = others as usize + key.len() + value.len();
            if needed > quota {
                warn!("Rejecting write of '{key}' for {}: {needed} bytes exceeds quota of {quota}", self.origin);
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }

        tx.execute(
            "INSERT INTO local_storage(origin,key,value) VALUES (?1,?2,?3)
             ON CONFLICT(origin,key) DO UPDATE
             SET value=excluded.value, updated_at=strftime('%s','now')",
            params![self.origin, key, value],
        )?;
        tx.commit()?;
        debug!("Stored '{key}' for {}", self.origin);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM local_storage WHERE origin=?1 AND key=?2",
            params![self.origin, key],
        )?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM local_storage WHERE origin=?1",
            params![self.origin],
        )?;
        debug!("Cleared {removed} entries for {}", self.origin);
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM local_storage WHERE origin=?1",
            params![self.origin],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn key(&self, index: usize) -> Result<Option<String>> {
        let Ok(offset) = i64::try_from(index) else {
            return Ok(None);
        };
        let conn = self.conn()?;
        let key = conn
            .query_row(
                "SELECT key FROM local_storage WHERE origin=?1 ORDER BY id LIMIT 1 OFFSET ?2",
                params![self.origin, offset],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT key FROM local_storage WHERE origin=?1 ORDER BY id")?;
        let rows = stmt.query_map(params![self.origin], |row| row.get::<_, String>(0))?;
        let keys = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}
