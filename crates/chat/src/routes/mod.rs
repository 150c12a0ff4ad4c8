//! HTTP route handlers for the chat server.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                - Chat page
//! POST /api/chat/       - Relay one message (also without trailing slash)
//! GET  /health          - Liveness
//! GET  /health/ready    - Readiness (queue storage)
//! GET  /static/*        - Widget assets
//! ```

pub mod chat;
pub mod health;
pub mod home;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::session_store::SessionStore;

use crate::middleware::{create_session_layer, request_id_middleware};
use crate::state::AppState;

/// Directory served under `/static`, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/chat/static";

/// Create the chat API router.
pub fn chat_routes() -> Router<AppState> {
    let endpoint = post(chat::send).fallback(chat::method_not_allowed);

    Router::new()
        .route("/chat", endpoint.clone())
        .route("/chat/", endpoint)
}

/// Create all routes for the chat server.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", chat_routes())
}

/// Build the full application with its middleware stack.
pub fn app<S>(state: AppState, session_store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = create_session_layer(session_store, state.config());

    routes()
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &axum::extract::Request| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
