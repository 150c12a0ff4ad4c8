//! `PostgreSQL` waiting queue.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use techstore_core::QueuedMessageId;

use super::{QueueStore, RepositoryError, count_to_u64};
use crate::models::{QueueFilter, QueuedMessage};

/// Advisory lock key serializing queue writers ("techqueu" in ASCII).
const QUEUE_LOCK_KEY: i64 = 0x7465_6368_7175_6575;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` queue queries.
#[derive(Debug, sqlx::FromRow)]
struct QueuedMessageRow {
    id: i32,
    content: String,
    created_at: DateTime<Utc>,
    handled: bool,
}

impl From<QueuedMessageRow> for QueuedMessage {
    fn from(row: QueuedMessageRow) -> Self {
        Self {
            id: QueuedMessageId::new(row.id),
            content: row.content,
            created_at: row.created_at,
            handled: row.handled,
        }
    }
}

// =============================================================================
// Store
// =============================================================================

/// Durable waiting queue backed by `chat.queued_message`.
#[derive(Clone)]
pub struct PgQueueStore {
    pool: PgPool,
}

impl PgQueueStore {
    /// Create a new queue store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a transaction holding the queue writer lock until commit.
    async fn begin_locked(&self) -> Result<Transaction<'static, Postgres>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(QUEUE_LOCK_KEY)
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }
}

#[async_trait]
impl QueueStore for PgQueueStore {
    #[instrument(skip(self, content))]
    async fn enqueue(&self, content: &str) -> Result<u64, RepositoryError> {
        let mut tx = self.begin_locked().await?;

        sqlx::query("INSERT INTO chat.queued_message (content) VALUES ($1)")
            .bind(content)
            .execute(&mut *tx)
            .await?;

        let (depth,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM chat.queued_message WHERE NOT handled")
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;
        count_to_u64(depth)
    }

    #[instrument(skip(self))]
    async fn flush_pending(&self) -> Result<u64, RepositoryError> {
        let mut tx = self.begin_locked().await?;

        let result = sqlx::query("UPDATE chat.queued_message SET handled = TRUE WHERE NOT handled")
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn pending_count(&self) -> Result<u64, RepositoryError> {
        let (depth,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM chat.queued_message WHERE NOT handled")
                .fetch_one(&self.pool)
                .await?;
        count_to_u64(depth)
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: &QueueFilter) -> Result<Vec<QueuedMessage>, RepositoryError> {
        let rows: Vec<QueuedMessageRow> = sqlx::query_as(
            r"
            SELECT id, content, created_at, handled
            FROM chat.queued_message
            WHERE ($1::BOOLEAN IS NULL OR handled = $1)
              AND ($2::TEXT IS NULL OR strpos(lower(content), lower($2)) > 0)
              AND ($3::TIMESTAMPTZ IS NULL OR created_at >= $3)
              AND ($4::TIMESTAMPTZ IS NULL OR created_at < $4)
            ORDER BY id DESC
            LIMIT $5
            ",
        )
        .bind(filter.handled)
        .bind(filter.search.as_deref())
        .bind(filter.since)
        .bind(filter.until)
        .bind(i64::from(filter.limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(QueuedMessage::from).collect())
    }

    async fn health_check(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
