//! Waiting queue records.

use chrono::{DateTime, Utc};
use serde::Serialize;

use techstore_core::QueuedMessageId;

/// A message received while the store was closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueuedMessage {
    /// Queue order.
    pub id: QueuedMessageId,
    /// `"[<visitor prefix>] <message>"`, at most 255 characters.
    pub content: String,
    /// When the message entered the queue.
    pub created_at: DateTime<Utc>,
    /// Set once a flush has picked the message up.
    pub handled: bool,
}

/// Read-only browsing filter for queue records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueFilter {
    /// Only records with this handled flag; `None` for all.
    pub handled: Option<bool>,
    /// Case-insensitive substring match on content.
    pub search: Option<String>,
    /// Only records created at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Only records created before this instant.
    pub until: Option<DateTime<Utc>>,
    /// Maximum number of records, newest first.
    pub limit: u32,
}

impl Default for QueueFilter {
    fn default() -> Self {
        Self {
            handled: None,
            search: None,
            since: None,
            until: None,
            limit: 50,
        }
    }
}

impl QueueFilter {
    /// Returns true if `message` passes this filter (ignoring the limit).
    #[must_use]
    pub fn matches(&self, message: &QueuedMessage) -> bool {
        if self.handled.is_some_and(|handled| handled != message.handled) {
            return false;
        }
        if self.since.is_some_and(|since| message.created_at < since)
            || self.until.is_some_and(|until| message.created_at >= until)
        {
            return false;
        }
        self.search.as_ref().is_none_or(|needle| {
            message
                .content
                .to_lowercase()
                .contains(&needle.to_lowercase())
        })
    }
}
