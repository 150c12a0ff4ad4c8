//! TechStore chat server.
//!
//! Serves the chat page and the chat API on port 8000.
//!
//! # Modes
//!
//! - With `CHAT_DATABASE_URL`: waiting queue and sessions in `PostgreSQL`
//! - Without it: in-memory mode, state is lost on restart
//!
//! Migrations are NOT run on startup. Run them via:
//! `cargo run -p techstore-cli -- migrate`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use sentry::integrations::tracing as sentry_tracing;
use tower_sessions::MemoryStore;
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use techstore_chat::config::ChatConfig;
use techstore_chat::db::{self, MemoryQueueStore, PgQueueStore, QueueStore};
use techstore_chat::gemini::GeminiClient;
use techstore_chat::routes;
use techstore_chat::services::{ChatRelay, SystemClock, render_store_manual};
use techstore_chat::state::AppState;
use techstore_chat::webhook::WebhookClient;

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ChatConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        tracing::error!("Chat server failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ChatConfig::from_env()?;

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "techstore_chat=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let addr = config.socket_addr();

    match config.database_url.clone() {
        Some(database_url) => {
            let pool = db::create_pool(&database_url).await?;
            tracing::info!("Database pool created");

            let queue: Arc<dyn QueueStore> = Arc::new(PgQueueStore::new(pool.clone()));
            let state = build_state(config, queue).await;
            serve(routes::app(state, PostgresStore::new(pool)), addr).await
        }
        None => {
            tracing::warn!("No database configured, running in in-memory mode");

            let queue: Arc<dyn QueueStore> = Arc::new(MemoryQueueStore::new());
            let state = build_state(config, queue).await;
            serve(routes::app(state, MemoryStore::default()), addr).await
        }
    }
}

/// Connect the model and webhook and assemble the relay.
///
/// Model and webhook failures are logged; the server still starts and
/// answers with the "unavailable" error until restarted with a working key.
async fn build_state(config: ChatConfig, queue: Arc<dyn QueueStore>) -> AppState {
    let mut relay = ChatRelay::new(config.store.clone(), Arc::clone(&queue), Arc::new(SystemClock));

    match config.gemini.api_key() {
        Some(api_key) => match GeminiClient::connect(api_key, &config.gemini).await {
            Ok(client) => {
                let client = client.with_system_instruction(render_store_manual(&config.store.name));
                relay = relay.with_model(Arc::new(client));
            }
            Err(e) => tracing::error!(error = %e, "Gemini unavailable, chat requests will fail"),
        },
        None => tracing::warn!("No Gemini API key configured, chat requests will fail"),
    }

    if let Some(url) = &config.webhook.url {
        match WebhookClient::new(url.clone()) {
            Ok(client) => {
                tracing::info!(host = ?url.host_str(), "Sale webhook configured");
                relay = relay.with_notifier(Arc::new(client), config.webhook.origin.clone());
            }
            Err(e) => tracing::error!(error = %e, "Failed to build webhook client"),
        }
    }

    tracing::info!(
        store = %config.store.name,
        window = %config.store.hours.window_label(),
        force_closed = config.store.force_closed,
        "Chat relay ready"
    );

    AppState::new(config, queue, relay)
}

async fn serve(app: Router, addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("chat listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
