//! Waiting queue inspection.
//!
//! # Usage
//!
//! ```bash
//! # Latest 50 records
//! ts-cli queue list
//!
//! # Only records still waiting for an agent
//! ts-cli queue list --pending
//!
//! # Search content, case-insensitive
//! ts-cli queue list --search notebook --limit 10
//! ```

use techstore_chat::db::{PgQueueStore, QueueStore, create_pool};
use techstore_chat::models::{QueueFilter, QueuedMessage};

use super::{CommandError, database_url};

/// List queue records, newest first.
///
/// # Errors
///
/// Returns error if the database is unreachable or the query fails.
pub async fn list(filter: &QueueFilter) -> Result<(), CommandError> {
    let pool = create_pool(&database_url()?).await?;
    let store = PgQueueStore::new(pool);

    let records = store.list(filter).await?;
    let pending = store.pending_count().await?;

    #[allow(clippy::print_stdout)]
    {
        for record in &records {
            println!("{}", format_record(record));
        }
        println!("{} shown, {pending} pending", records.len());
    }

    Ok(())
}

/// One line per record: id, timestamp, state, content.
fn format_record(record: &QueuedMessage) -> String {
    let state = if record.handled { "handled" } else { "pending" };
    format!(
        "#{:<6} {} {:<7} {}",
        record.id,
        record.created_at.format("%Y-%m-%d %H:%M"),
        state,
        record.content
    )
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use techstore_core::QueuedMessageId;

    use super::*;

    #[test]
    fn test_format_record() {
        let record = QueuedMessage {
            id: QueuedMessageId::new(42),
            content: "[ab12cd34] quero um notebook".to_string(),
            created_at: Utc
                .with_ymd_and_hms(2026, 3, 10, 22, 15, 0)
                .single()
                .expect("timestamp"),
            handled: false,
        };

        assert_eq!(
            format_record(&record),
            "#42     2026-03-10 22:15 pending [ab12cd34] quero um notebook"
        );
    }
}
