//! Opaque per-browser visitor token.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one browser across chat requests.
///
/// The token lives in the visitor's session; only its short prefix is ever
/// written to the queue or sent to the webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitorToken(Uuid);

impl VisitorToken {
    /// Number of characters kept by [`VisitorToken::prefix`].
    pub const PREFIX_LEN: usize = 8;

    /// Generate a fresh random token.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Truncated form used in queue records and webhook payloads.
    #[must_use]
    pub fn prefix(&self) -> String {
        self.0
            .simple()
            .to_string()
            .chars()
            .take(Self::PREFIX_LEN)
            .collect()
    }
}

impl fmt::Display for VisitorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
