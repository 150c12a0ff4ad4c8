//! Session middleware configuration.
//!
//! Sessions only carry the visitor token. The backing store is chosen at
//! startup: `PostgresStore` when a database is configured, `MemoryStore`
//! otherwise.

use tower_sessions::session_store::SessionStore;
use tower_sessions::{Expiry, SessionManagerLayer};

use crate::config::ChatConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "ts_chat_session";

/// Session expiry time in seconds (30 days).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Create the session layer over `store`.
#[must_use]
pub fn create_session_layer<S>(store: S, config: &ChatConfig) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    let is_secure = config.base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
