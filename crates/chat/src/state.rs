//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ChatConfig;
use crate::db::QueueStore;
use crate::services::ChatRelay;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Storage, model and webhook sit behind trait
/// objects so tests can swap them for fakes.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ChatConfig,
    queue: Arc<dyn QueueStore>,
    relay: ChatRelay,
}

impl AppState {
    /// Create a new application state.
    ///
    /// `queue` must be the same store the relay was built with; the readiness
    /// probe checks it directly.
    #[must_use]
    pub fn new(config: ChatConfig, queue: Arc<dyn QueueStore>, relay: ChatRelay) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                queue,
                relay,
            }),
        }
    }

    /// Get a reference to the chat configuration.
    #[must_use]
    pub fn config(&self) -> &ChatConfig {
        &self.inner.config
    }

    /// Get a reference to the waiting queue.
    #[must_use]
    pub fn queue(&self) -> &dyn QueueStore {
        self.inner.queue.as_ref()
    }

    /// Get a reference to the chat relay.
    #[must_use]
    pub fn relay(&self) -> &ChatRelay {
        &self.inner.relay
    }
}
