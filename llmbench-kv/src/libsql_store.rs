//! libSQL implementation of the key-value store.
//!
//! Any number of service instances pointed at the same database (a local
//! file or a remote Turso database) observe the same entries, which is what
//! makes the pipeline lock work across processes. Expiry is stored as an
//! absolute unix timestamp in milliseconds and evaluated at read time.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use libsql::{Builder, Connection, Database, Value};
use tracing::{debug, instrument};

use crate::error::Result;
use crate::traits::KeyValueStore;

/// SQL schema for the entries table.
const SCHEMA_ENTRIES: &str = r#"
CREATE TABLE IF NOT EXISTS kv_entries (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    expires_at_ms INTEGER
)
"#;

/// libSQL-backed key-value store.
#[derive(Clone)]
pub struct LibsqlKeyValueStore {
    _db: Arc<Database>,
    conn: Connection,
}

impl LibsqlKeyValueStore {
    /// Open a store backed by a local database file.
    pub async fn new_local(path: &Path) -> Result<Self> {
        let db = Builder::new_local(path).build().await?;
        Self::from_database(db).await
    }

    /// Open a store backed by a remote Turso database.
    pub async fn new_remote(url: &str, token: &str) -> Result<Self> {
        let db = Builder::new_remote(url.to_string(), token.to_string())
            .build()
            .await?;
        Self::from_database(db).await
    }

    /// Open a private in-memory store (for testing).
    pub async fn new_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        Self::from_database(db).await
    }

    async fn from_database(db: Database) -> Result<Self> {
        let conn = db.connect()?;
        conn.execute(SCHEMA_ENTRIES, ()).await?;
        Ok(Self {
            _db: Arc::new(db),
            conn,
        })
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn expiry(ttl: Option<Duration>) -> Value {
    match ttl {
        Some(ttl) => {
            let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
            Value::Integer(now_ms().saturating_add(ttl_ms))
        }
        None => Value::Null,
    }
}

#[async_trait]
impl KeyValueStore for LibsqlKeyValueStore {
    #[instrument(skip(self), level = "trace")]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query(
                "SELECT value FROM kv_entries
                 WHERE key = ?1 AND (expires_at_ms IS NULL OR expires_at_ms > ?2)",
                libsql::params![key, now_ms()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row.get::<String>(0)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, value), level = "trace")]
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv_entries (key, value, expires_at_ms) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     expires_at_ms = excluded.expires_at_ms",
                libsql::params![key, value, expiry(ttl)],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, value), level = "trace")]
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        // The upsert only overwrites a row whose expiry has passed, so a
        // live entry leaves the statement with zero changed rows.
        let changed = self
            .conn
            .execute(
                "INSERT INTO kv_entries (key, value, expires_at_ms) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     expires_at_ms = excluded.expires_at_ms
                 WHERE kv_entries.expires_at_ms IS NOT NULL
                   AND kv_entries.expires_at_ms <= ?4",
                libsql::params![key, value, expiry(Some(ttl)), now_ms()],
            )
            .await?;
        debug!(key, written = changed > 0, "set_if_absent");
        Ok(changed > 0)
    }

    #[instrument(skip(self), level = "trace")]
    async fn delete(&self, key: &str) -> Result<bool> {
        // One statement removes the row whatever its expiry; liveness is
        // judged from the returned expiry.
        let mut rows = self
            .conn
            .query(
                "DELETE FROM kv_entries WHERE key = ?1 RETURNING expires_at_ms",
                libsql::params![key],
            )
            .await?;

        match rows.next().await? {
            Some(row) => match row.get_value(0)? {
                Value::Integer(at) => Ok(at > now_ms()),
                _ => Ok(true),
            },
            None => Ok(false),
        }
    }

    #[instrument(skip(self, expected), level = "trace")]
    async fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM kv_entries
                 WHERE key = ?1 AND value = ?2
                   AND (expires_at_ms IS NULL OR expires_at_ms > ?3)",
                libsql::params![key, expected, now_ms()],
            )
            .await?;
        Ok(removed > 0)
    }
}
