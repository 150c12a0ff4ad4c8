//! Waiting queue storage.
//!
//! # Tables
//!
//! - `chat.queued_message` - Messages received while the store was closed
//! - `tower_sessions.session` - Visitor sessions (created by the session store)
//!
//! # Backends
//!
//! - [`PgQueueStore`] - durable `PostgreSQL` table, used when a database URL is configured
//! - [`MemoryQueueStore`] - process-local vector, used in in-memory mode and tests
//!
//! Both backends are single writers of queue state: `PostgreSQL` mutations
//! serialize on a transaction-scoped advisory lock, the memory store on a mutex.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/chat/migrations/` and run via:
//! ```bash
//! cargo run -p techstore-cli -- migrate
//! ```

pub mod memory;
pub mod queue;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::models::{QueueFilter, QueuedMessage};

pub use memory::MemoryQueueStore;
pub use queue::PgQueueStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Persistence seam for the waiting queue.
///
/// Queue depth is the number of records with `handled = false`.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Append a record and return its position: the queue depth including it.
    async fn enqueue(&self, content: &str) -> Result<u64, RepositoryError>;

    /// Mark every pending record as handled in one update.
    ///
    /// Returns the number of records this call flipped. Two concurrent
    /// flushes never both observe the same records.
    async fn flush_pending(&self) -> Result<u64, RepositoryError>;

    /// Current queue depth.
    async fn pending_count(&self) -> Result<u64, RepositoryError>;

    /// Browse records, newest first.
    async fn list(&self, filter: &QueueFilter) -> Result<Vec<QueuedMessage>, RepositoryError>;

    /// Verify the backend is reachable.
    async fn health_check(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Convert a database count to an unsigned depth.
pub(crate) fn count_to_u64(count: i64) -> Result<u64, RepositoryError> {
    u64::try_from(count)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative count: {count}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_to_u64() {
        assert_eq!(count_to_u64(3).ok(), Some(3));
        assert!(matches!(
            count_to_u64(-1),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
