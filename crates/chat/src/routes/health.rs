//! Health check endpoints.

use axum::extract::State;
use axum::http::StatusCode;

use crate::state::AppState;

/// `GET /health`
///
/// Liveness: returns "ok" while the process is serving. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// `GET /health/ready`
///
/// Readiness: 503 when queue storage is unreachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.queue().health_check().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
