//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! ts-cli migrate
//! ```
//!
//! Applies `crates/chat/migrations/` (the `chat` schema) and creates the
//! session table used by `tower-sessions-sqlx-store`.
//!
//! # Environment Variables
//!
//! - `CHAT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use techstore_chat::db::create_pool;
use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, database_url};

/// Run chat database migrations.
///
/// # Errors
///
/// Returns error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to chat database...");
    let pool = create_pool(&database_url).await?;

    tracing::info!("Running chat migrations...");
    sqlx::migrate!("../chat/migrations").run(&pool).await?;

    tracing::info!("Creating session table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Chat migrations complete!");
    Ok(())
}
