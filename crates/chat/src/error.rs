//! Unified error handling with Sentry integration.
//!
//! Chat handlers return `Result<T, AppError>`. Every error is rendered as
//! `{"error": "..."}` with a customer-facing message; server-side failures are
//! captured to Sentry before responding.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::gemini::GeminiError;
use crate::services::RelayError;

/// Shown when the model is not configured or not reachable.
pub const UNAVAILABLE_MESSAGE: &str =
    "O sistema de IA está indisponível no momento (Erro de Chave ou Modelo).";

/// Shown for empty messages.
pub const EMPTY_MESSAGE: &str = "Mensagem vazia";

/// Shown for any other failure.
pub const GENERIC_MESSAGE: &str = "Ocorreu um erro ao processar. Tente novamente.";

/// Shown for methods other than POST on the chat endpoint.
pub const INVALID_METHOD_MESSAGE: &str = "Método inválido";

/// Application-level error type for the chat service.
#[derive(Debug, Error)]
pub enum AppError {
    /// No model configured or reachable.
    #[error("model unavailable")]
    Unavailable,

    /// Empty customer message.
    #[error("empty message")]
    EmptyMessage,

    /// Body was not a JSON object with a `message` string.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Method other than POST.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// Queue storage failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Model call failed.
    #[error("Gemini error: {0}")]
    Model(#[from] GeminiError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RelayError> for AppError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::Unavailable => Self::Unavailable,
            RelayError::InvalidMessage(_) => Self::EmptyMessage,
            RelayError::Queue(e) => Self::Database(e),
            RelayError::Model(e) => Self::Model(e),
        }
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::EmptyMessage | Self::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Database(_) | Self::Model(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Customer-facing message. Internal details are never exposed.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::Unavailable => UNAVAILABLE_MESSAGE,
            Self::EmptyMessage => EMPTY_MESSAGE,
            Self::MethodNotAllowed => INVALID_METHOD_MESSAGE,
            Self::MalformedRequest(_) | Self::Database(_) | Self::Model(_) | Self::Internal(_) => {
                GENERIC_MESSAGE
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Database(_) | Self::Model(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Rejected chat request");
        }

        let body = Json(json!({ "error": self.public_message() }));
        (self.status(), body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use techstore_core::MessageError;

    use super::*;

    #[test]
    fn test_relay_errors_map_to_statuses() {
        let cases = [
            (RelayError::Unavailable, StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE_MESSAGE),
            (
                RelayError::InvalidMessage(MessageError::Empty),
                StatusCode::BAD_REQUEST,
                EMPTY_MESSAGE,
            ),
            (
                RelayError::Model(GeminiError::RateLimited),
                StatusCode::INTERNAL_SERVER_ERROR,
                GENERIC_MESSAGE,
            ),
        ];

        for (relay_err, status, message) in cases {
            let err = AppError::from(relay_err);
            assert_eq!(err.status(), status);
            assert_eq!(err.public_message(), message);
        }
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Internal("pool exhausted at 10.0.0.3".to_string());
        assert_eq!(err.public_message(), GENERIC_MESSAGE);
    }
}
