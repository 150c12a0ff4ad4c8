//! In-memory waiting queue.
//!
//! Used when no database is configured. Contents are lost on restart, and only
//! the most recent handled records are kept for browsing.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use techstore_core::QueuedMessageId;

use super::{QueueStore, RepositoryError};
use crate::models::{QueueFilter, QueuedMessage};

/// Handled records kept by default. Pending records are never dropped.
pub const DEFAULT_HANDLED_RETENTION: usize = 1000;

/// Process-local waiting queue guarded by a single mutex.
#[derive(Debug)]
pub struct MemoryQueueStore {
    inner: Mutex<MemoryQueue>,
    handled_retention: usize,
}

#[derive(Debug, Default)]
struct MemoryQueue {
    last_id: i32,
    records: Vec<QueuedMessage>,
}

impl MemoryQueue {
    fn depth(&self) -> u64 {
        self.records.iter().filter(|r| !r.handled).count() as u64
    }

    /// Drop the oldest handled records beyond `keep`.
    fn prune_handled(&mut self, keep: usize) {
        let handled = self.records.iter().filter(|r| r.handled).count();
        let mut excess = handled.saturating_sub(keep);
        if excess == 0 {
            return;
        }
        self.records.retain(|r| {
            if r.handled && excess > 0 {
                excess -= 1;
                false
            } else {
                true
            }
        });
    }
}

impl Default for MemoryQueueStore {
    fn default() -> Self {
        Self::with_handled_retention(DEFAULT_HANDLED_RETENTION)
    }
}

impl MemoryQueueStore {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty queue that keeps at most `keep` handled records.
    #[must_use]
    pub fn with_handled_retention(keep: usize) -> Self {
        Self {
            inner: Mutex::new(MemoryQueue::default()),
            handled_retention: keep,
        }
    }
}

#[async_trait]
impl QueueStore for MemoryQueueStore {
    async fn enqueue(&self, content: &str) -> Result<u64, RepositoryError> {
        let mut queue = self.inner.lock().await;
        queue.last_id += 1;
        let id = QueuedMessageId::new(queue.last_id);
        queue.records.push(QueuedMessage {
            id,
            content: content.to_owned(),
            created_at: Utc::now(),
            handled: false,
        });
        Ok(queue.depth())
    }

    async fn flush_pending(&self) -> Result<u64, RepositoryError> {
        let mut queue = self.inner.lock().await;
        let mut flushed = 0;
        for record in queue.records.iter_mut().filter(|r| !r.handled) {
            record.handled = true;
            flushed += 1;
        }
        queue.prune_handled(self.handled_retention);
        Ok(flushed)
    }

    async fn pending_count(&self) -> Result<u64, RepositoryError> {
        Ok(self.inner.lock().await.depth())
    }

    async fn list(&self, filter: &QueueFilter) -> Result<Vec<QueuedMessage>, RepositoryError> {
        let queue = self.inner.lock().await;
        Ok(queue
            .records
            .iter()
            .rev()
            .filter(|r| filter.matches(r))
            .take(filter.limit as usize)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[tokio::test]
    async fn test_enqueue_reports_position() {
        let store = MemoryQueueStore::new();
        assert_eq!(store.enqueue("[aaaa1111] oi").await.unwrap(), 1);
        assert_eq!(store.enqueue("[bbbb2222] olá").await.unwrap(), 2);
        assert_eq!(store.pending_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_flush_marks_all_pending_once() {
        let store = MemoryQueueStore::new();
        store.enqueue("one").await.unwrap();
        store.enqueue("two").await.unwrap();

        assert_eq!(store.flush_pending().await.unwrap(), 2);
        assert_eq!(store.flush_pending().await.unwrap(), 0);
        assert_eq!(store.pending_count().await.unwrap(), 0);

        let all = store.list(&QueueFilter::default()).await.unwrap();
        assert!(all.iter().all(|r| r.handled));
    }

    #[tokio::test]
    async fn test_position_restarts_after_flush() {
        let store = MemoryQueueStore::new();
        store.enqueue("one").await.unwrap();
        store.flush_pending().await.unwrap();
        assert_eq!(store.enqueue("two").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_newest_first_with_filters() {
        let store = MemoryQueueStore::new();
        store.enqueue("[aaaa1111] Notebook Dell").await.unwrap();
        store.flush_pending().await.unwrap();
        store.enqueue("[bbbb2222] mouse sem fio").await.unwrap();
        store.enqueue("[cccc3333] teclado").await.unwrap();

        let all = store.list(&QueueFilter::default()).await.unwrap();
        let ids: Vec<i32> = all.iter().map(|r| r.id.as_i32()).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        let pending = store
            .list(&QueueFilter {
                handled: Some(false),
                ..QueueFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);

        let search = store
            .list(&QueueFilter {
                search: Some("NOTEBOOK".to_string()),
                ..QueueFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(search.len(), 1);
        assert!(search[0].handled);

        let limited = store
            .list(&QueueFilter {
                limit: 1,
                ..QueueFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].id.as_i32(), 3);
    }

    #[tokio::test]
    async fn test_list_filters_by_creation_range() {
        let store = MemoryQueueStore::new();
        store.enqueue("[aaaa1111] segunda").await.unwrap();
        store.enqueue("[bbbb2222] terça").await.unwrap();
        store.enqueue("[cccc3333] quarta").await.unwrap();

        let monday = Utc.with_ymd_and_hms(2024, 6, 3, 22, 0, 0).unwrap();
        {
            let mut queue = store.inner.lock().await;
            for (i, record) in queue.records.iter_mut().enumerate() {
                record.created_at = monday + Duration::days(i64::try_from(i).unwrap());
            }
        }

        let tuesday = monday + Duration::days(1);
        let from_tuesday = store
            .list(&QueueFilter {
                since: Some(tuesday),
                ..QueueFilter::default()
            })
            .await
            .unwrap();
        let ids: Vec<i32> = from_tuesday.iter().map(|r| r.id.as_i32()).collect();
        assert_eq!(ids, vec![3, 2]);

        // `until` is exclusive.
        let only_tuesday = store
            .list(&QueueFilter {
                since: Some(tuesday),
                until: Some(tuesday + Duration::days(1)),
                ..QueueFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(only_tuesday.len(), 1);
        assert_eq!(only_tuesday[0].id.as_i32(), 2);

        let before_monday = store
            .list(&QueueFilter {
                until: Some(monday),
                ..QueueFilter::default()
            })
            .await
            .unwrap();
        assert!(before_monday.is_empty());
    }

    #[tokio::test]
    async fn test_flush_keeps_only_recent_handled_records() {
        let store = MemoryQueueStore::with_handled_retention(2);
        for content in ["one", "two", "three"] {
            store.enqueue(content).await.unwrap();
        }
        assert_eq!(store.flush_pending().await.unwrap(), 3);
        store.enqueue("four").await.unwrap();

        let all = store.list(&QueueFilter::default()).await.unwrap();
        let ids: Vec<i32> = all.iter().map(|r| r.id.as_i32()).collect();
        assert_eq!(ids, vec![4, 3, 2]);
        assert_eq!(store.pending_count().await.unwrap(), 1);
        assert_eq!(store.enqueue("five").await.unwrap(), 2);
    }
}
