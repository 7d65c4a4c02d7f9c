use crate::identifier::LogId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

pub mod sqlite;

pub use sqlite::SqliteLogStore;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Could not allocate a unique log id after {0} attempts")]
    IdSpaceExhausted(usize),
    #[error("Stored record has a malformed id: {0}")]
    CorruptRecord(String),
}

/// A stored log body with its lifetime.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub id: LogId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl LogRecord {
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Persistence for submitted logs.
///
/// Expired records behave as if they did not exist. Implementations own any
/// locking needed for concurrent access to the same id.
#[async_trait::async_trait]
pub trait LogStore: Send + Sync {
    async fn exists(&self, id: &LogId) -> Result<bool, StorageError>;
    async fn get(&self, id: &LogId) -> Result<Option<LogRecord>, StorageError>;
    async fn put(&self, content: &str) -> Result<LogId, StorageError>;
    /// Returns false when nothing was deleted.
    async fn delete(&self, id: &LogId) -> Result<bool, StorageError>;
    /// Pushes the expiry of a live record back to a full storage period.
    async fn renew(&self, id: &LogId) -> Result<(), StorageError>;
    /// Removes expired records, returning how many were dropped.
    async fn purge_expired(&self) -> Result<u64, StorageError>;
}
