//! Newtype ID for queued message records.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a row in the waiting queue.
///
/// IDs are assigned by the store in insertion order, so comparing two IDs
/// compares their queue positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type), sqlx(transparent))]
#[serde(transparent)]
pub struct QueuedMessageId(i32);

impl QueuedMessageId {
    /// Create a new ID from an i32 value.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Get the underlying i32 value.
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for QueuedMessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<i32> for QueuedMessageId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl From<QueuedMessageId> for i32 {
    fn from(id: QueuedMessageId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_order_by_insertion() {
        assert!(QueuedMessageId::new(1) < QueuedMessageId::new(2));
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&QueuedMessageId::new(42)).expect("serialize");
        assert_eq!(json, "42");
    }
}
