//! CLI command implementations.

pub mod migrate;
pub mod models;
pub mod queue;

use secrecy::SecretString;

/// Errors shared by the database-backed commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Queue repository error.
    #[error("Queue error: {0}")]
    Queue(#[from] techstore_chat::db::RepositoryError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] techstore_chat::config::ConfigError),

    /// Gemini API error.
    #[error("Gemini error: {0}")]
    Gemini(#[from] techstore_chat::gemini::GeminiError),
}

/// Read the chat database URL, `CHAT_DATABASE_URL` first.
pub(crate) fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("CHAT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("CHAT_DATABASE_URL"))
}
