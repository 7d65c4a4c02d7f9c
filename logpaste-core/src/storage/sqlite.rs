use super::{LogRecord, LogStore, StorageError};
use crate::identifier::{is_valid_identifier, LogId};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

const ID_LENGTH: usize = 12;
const MAX_ID_ATTEMPTS: usize = 5;

/// [`LogStore`] backed by a single SQLite table.
#[derive(Clone)]
pub struct SqliteLogStore {
    pool: Pool<Sqlite>,
    storage_time: Duration,
}

impl SqliteLogStore {
    pub async fn connect(database_url: &str, storage_time: Duration) -> Result<Self, StorageError> {
        // Ensure parent directory exists
        if let Some(db_path) = database_url.strip_prefix("sqlite://") {
            let db_path = db_path.split('?').next().unwrap_or(db_path);
            if let Some(parent) = std::path::Path::new(db_path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        let store = Self { pool, storage_time };
        store.create_tables().await?;
        info!("Log store ready at {}", database_url);
        Ok(store)
    }

    /// Private in-memory database; lives as long as the store.
    pub async fn in_memory(storage_time: Duration) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // every connection to :memory: is its own database, so keep exactly one
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool, storage_time };
        store.create_tables().await?;
        Ok(store)
    }

    async fn create_tables(&self) -> Result<(), StorageError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS logs (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_logs_expires_at ON logs(expires_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    fn expiry_from(&self, now: i64) -> i64 {
        let storage_secs = i64::try_from(self.storage_time.as_secs()).unwrap_or(i64::MAX);
        now.saturating_add(storage_secs)
    }

    fn generate_id() -> String {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(ID_LENGTH);
        id
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_default()
}

#[async_trait::async_trait]
impl LogStore for SqliteLogStore {
    async fn exists(&self, id: &LogId) -> Result<bool, StorageError> {
        let row = sqlx::query("SELECT 1 FROM logs WHERE id = ? AND expires_at > ?")
            .bind(id.as_str())
            .bind(Utc::now().timestamp())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn get(&self, id: &LogId) -> Result<Option<LogRecord>, StorageError> {
        let row = sqlx::query(
            "SELECT id, content, created_at, expires_at FROM logs WHERE id = ? AND expires_at > ?",
        )
        .bind(id.as_str())
        .bind(Utc::now().timestamp())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let stored_id: String = row.try_get("id")?;
        if !is_valid_identifier(&stored_id) {
            return Err(StorageError::CorruptRecord(stored_id));
        }

        Ok(Some(LogRecord {
            id: LogId::from_generated(stored_id),
            content: row.try_get("content")?,
            created_at: timestamp(row.try_get("created_at")?),
            expires_at: timestamp(row.try_get("expires_at")?),
        }))
    }

    async fn put(&self, content: &str) -> Result<LogId, StorageError> {
        let now = Utc::now().timestamp();
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = Self::generate_id();
            let result = sqlx::query(
                "INSERT OR IGNORE INTO logs (id, content, created_at, expires_at) VALUES (?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(content)
            .bind(now)
            .bind(self.expiry_from(now))
            .execute(&self.pool)
            .await?;

            if result.rows_affected() == 1 {
                debug!(id = %id, bytes = content.len(), "Stored log");
                return Ok(LogId::from_generated(id));
            }
            debug!(id = %id, "Generated log id already taken, retrying");
        }
        Err(StorageError::IdSpaceExhausted(MAX_ID_ATTEMPTS))
    }

    async fn delete(&self, id: &LogId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM logs WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn renew(&self, id: &LogId) -> Result<(), StorageError> {
        let now = Utc::now().timestamp();
        sqlx::query("UPDATE logs SET expires_at = ? WHERE id = ? AND expires_at > ?")
            .bind(self.expiry_from(now))
            .bind(id.as_str())
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM logs WHERE expires_at <= ?")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
