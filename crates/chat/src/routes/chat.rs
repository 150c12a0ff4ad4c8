//! Chat API handler.

use axum::{Json, body::Bytes, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{instrument, warn};

use techstore_core::VisitorToken;

use crate::error::{AppError, Result};
use crate::models::session::keys;
use crate::state::AppState;

/// Chat request body.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Raw customer message. A missing or null field counts as empty.
    #[serde(default)]
    pub message: Option<String>,
}

/// Chat response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Text shown to the customer.
    pub reply: String,
}

/// `POST /api/chat/`
///
/// Runs one message through the relay and returns the reply text. The body is
/// parsed as JSON whatever its `Content-Type`.
#[instrument(skip(state, session, body))]
pub async fn send(
    State(state): State<AppState>,
    session: Session,
    body: Bytes,
) -> Result<Json<ChatResponse>> {
    let request: ChatRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Malformed chat request");
        AppError::MalformedRequest(e.to_string())
    })?;
    let message = request.message.unwrap_or_default();

    let visitor = visitor_token(&session).await?;
    let reply = state.relay().handle(&message, &visitor).await?;

    Ok(Json(ChatResponse {
        reply: reply.into_text(),
    }))
}

/// Any other method on the chat endpoint.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the visitor token from the session, creating it on first contact.
async fn visitor_token(session: &Session) -> Result<VisitorToken> {
    if let Some(token) = session
        .get::<VisitorToken>(keys::VISITOR_TOKEN)
        .await
        .map_err(|e| AppError::Internal(format!("failed to read visitor token: {e}")))?
    {
        return Ok(token);
    }

    let token = VisitorToken::generate();
    session
        .insert(keys::VISITOR_TOKEN, token)
        .await
        .map_err(|e| AppError::Internal(format!("failed to store visitor token: {e}")))?;
    Ok(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use tower_sessions::{
        MemoryStore, SessionStore,
        session::{Id, Record},
        session_store,
    };

    use super::*;

    /// Session store whose backend is always down.
    #[derive(Debug, Clone)]
    struct BrokenStore;

    #[async_trait]
    impl SessionStore for BrokenStore {
        async fn save(&self, _record: &Record) -> session_store::Result<()> {
            Err(session_store::Error::Backend("connection refused".to_string()))
        }

        async fn load(&self, _session_id: &Id) -> session_store::Result<Option<Record>> {
            Err(session_store::Error::Backend("connection refused".to_string()))
        }

        async fn delete(&self, _session_id: &Id) -> session_store::Result<()> {
            Err(session_store::Error::Backend("connection refused".to_string()))
        }
    }

    #[test]
    fn test_null_message_counts_as_empty() {
        let request: ChatRequest = serde_json::from_str(r#"{"message": null}"#).unwrap();
        assert_eq!(request.message, None);

        let request: ChatRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.message, None);
    }

    #[tokio::test]
    async fn test_visitor_token_is_stable_within_session() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        let first = visitor_token(&session).await.unwrap();
        let second = visitor_token(&session).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unreadable_session_is_an_error() {
        let session = Session::new(Some(Id::default()), Arc::new(BrokenStore), None);

        let err = visitor_token(&session).await.unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
    }
}
