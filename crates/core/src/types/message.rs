//! Customer chat message type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CustomerMessage`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// The input is empty or whitespace only.
    #[error("message cannot be empty")]
    Empty,
}

/// A message typed by a customer in the chat widget.
///
/// Leading and trailing whitespace is trimmed on parse. The body itself is
/// forwarded to the model untouched; length limits only apply when the
/// message is stored in the waiting queue (see [`CustomerMessage::queue_content`]).
///
/// ## Examples
///
/// ```
/// use techstore_core::CustomerMessage;
///
/// assert!(CustomerMessage::parse("  hello ").is_ok());
/// assert!(CustomerMessage::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CustomerMessage(String);

impl CustomerMessage {
    /// Maximum length of a stored queue record, in characters.
    pub const MAX_QUEUE_CONTENT_CHARS: usize = 255;

    /// Parse a `CustomerMessage` from raw input.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::Empty`] if the input is empty after trimming.
    pub fn parse(s: &str) -> Result<Self, MessageError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(MessageError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the message as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds the text persisted for this message in the waiting queue.
    ///
    /// The visitor prefix identifies who sent it; the result is cut at
    /// [`Self::MAX_QUEUE_CONTENT_CHARS`] characters to fit the column.
    #[must_use]
    pub fn queue_content(&self, visitor_prefix: &str) -> String {
        format!("[{visitor_prefix}] {}", self.0)
            .chars()
            .take(Self::MAX_QUEUE_CONTENT_CHARS)
            .collect()
    }
}

impl fmt::Display for CustomerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CustomerMessage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        let msg = CustomerMessage::parse("  quanto custa o mouse?\n").unwrap();
        assert_eq!(msg.as_str(), "quanto custa o mouse?");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(CustomerMessage::parse(""), Err(MessageError::Empty));
        assert_eq!(CustomerMessage::parse(" \t\n"), Err(MessageError::Empty));
    }

    #[test]
    fn test_queue_content_prefix() {
        let msg = CustomerMessage::parse("hello").unwrap();
        assert_eq!(msg.queue_content("ab12cd34"), "[ab12cd34] hello");
    }

    #[test]
    fn test_queue_content_truncates_on_char_boundary() {
        let msg = CustomerMessage::parse(&"ç".repeat(400)).unwrap();
        let content = msg.queue_content("ab12cd34");
        assert_eq!(content.chars().count(), CustomerMessage::MAX_QUEUE_CONTENT_CHARS);
        assert!(content.starts_with("[ab12cd34] ç"));
    }
}
