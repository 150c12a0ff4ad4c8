//! Integration tests for the TechStore chat gate.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p techstore-integration-tests
//! ```
//!
//! No external services are needed: the chat server runs in in-memory mode
//! on an ephemeral port, the model is scripted, and Gemini and webhook
//! receivers are local axum servers.
//!
//! # Test Categories
//!
//! - `chat_api` - Chat endpoint over HTTP with sessions
//! - `gemini_client` - Gemini REST client against a mock API
//! - `webhook` - Sale delivery against a mock receiver

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use tower_sessions::MemoryStore;

use techstore_chat::config::ChatConfig;
use techstore_chat::db::{MemoryQueueStore, QueueStore};
use techstore_chat::gemini::GeminiError;
use techstore_chat::routes;
use techstore_chat::services::{ChatModel, ChatRelay, Clock, SaleNotifier};
use techstore_chat::state::AppState;
use techstore_chat::webhook::{SaleEvent, WebhookError};

/// 14:00 in São Paulo (UTC-3), inside the default 08h-18h window.
#[must_use]
pub fn open_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 17, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// 22:00 in São Paulo (UTC-3), after closing.
#[must_use]
pub fn closed_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 11, 1, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Clock the test can move.
#[derive(Debug)]
pub struct TestClock {
    now: Mutex<DateTime<Utc>>,
}

impl TestClock {
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().expect("clock lock") = now;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

/// Model returning a scripted reply and recording what it was asked.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    reply: Mutex<String>,
    received: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    #[must_use]
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(reply.to_string()),
            ..Self::default()
        })
    }

    pub fn set_reply(&self, reply: &str) {
        *self.reply.lock().expect("reply lock") = reply.to_string();
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn received(&self) -> Vec<String> {
        self.received.lock().expect("received lock").clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn generate(&self, message: &str) -> Result<String, GeminiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.received
            .lock()
            .expect("received lock")
            .push(message.to_string());
        Ok(self.reply.lock().expect("reply lock").clone())
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Notifier recording every sale.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<SaleEvent>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn events(&self) -> Vec<SaleEvent> {
        self.events.lock().expect("events lock").clone()
    }
}

#[async_trait]
impl SaleNotifier for RecordingNotifier {
    async fn notify(&self, event: &SaleEvent) -> Result<(), WebhookError> {
        self.events.lock().expect("events lock").push(event.clone());
        Ok(())
    }
}

/// Running chat server plus handles on its collaborators.
pub struct TestContext {
    /// Client with a cookie store, so one client is one visitor.
    pub client: reqwest::Client,
    pub base_url: String,
    pub clock: Arc<TestClock>,
    pub queue: Arc<MemoryQueueStore>,
    pub model: Option<Arc<ScriptedModel>>,
    pub notifier: Arc<RecordingNotifier>,
    config: ChatConfig,
}

/// Builder for [`TestContext`].
pub struct TestContextBuilder {
    config: ChatConfig,
    now: DateTime<Utc>,
    model: Option<Arc<ScriptedModel>>,
    notifier: Option<Arc<dyn SaleNotifier>>,
}

impl TestContextBuilder {
    #[must_use]
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    #[must_use]
    pub fn config(mut self, config: ChatConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn model(mut self, model: Option<Arc<ScriptedModel>>) -> Self {
        self.model = model;
        self
    }

    /// Use `notifier` instead of the recording notifier.
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn SaleNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub async fn spawn(self) -> TestContext {
        let clock = TestClock::at(self.now);
        let queue = Arc::new(MemoryQueueStore::new());
        let recording = Arc::new(RecordingNotifier::default());

        let mut relay = ChatRelay::new(
            self.config.store.clone(),
            Arc::clone(&queue) as Arc<dyn QueueStore>,
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        if let Some(model) = &self.model {
            relay = relay.with_model(Arc::clone(model) as Arc<dyn ChatModel>);
        }
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::clone(&recording) as Arc<dyn SaleNotifier>);
        relay = relay.with_notifier(notifier, self.config.webhook.origin.clone());

        let state = AppState::new(self.config.clone(), Arc::clone(&queue) as Arc<dyn QueueStore>, relay);
        let addr = serve(routes::app(state, MemoryStore::default())).await;

        TestContext {
            client: visitor_client(),
            base_url: format!("http://{addr}"),
            clock,
            queue,
            model: self.model,
            notifier: recording,
            config: self.config,
        }
    }
}

impl TestContext {
    /// Default context: store closed, scripted model answering "Olá!".
    #[must_use]
    pub fn builder() -> TestContextBuilder {
        TestContextBuilder {
            config: ChatConfig::default(),
            now: closed_instant(),
            model: Some(ScriptedModel::replying("Olá!")),
            notifier: None,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ChatConfig {
        &self.config
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// The scripted model; panics if the context was built without one.
    #[must_use]
    pub fn model(&self) -> &ScriptedModel {
        self.model.as_deref().expect("context has a model")
    }

    /// POST `{"message": message}` to the chat endpoint as `client`.
    pub async fn chat_as(&self, client: &reqwest::Client, message: &str) -> (u16, serde_json::Value) {
        let response = client
            .post(self.url("/api/chat/"))
            .json(&serde_json::json!({ "message": message }))
            .send()
            .await
            .expect("chat request");
        let status = response.status().as_u16();
        let body = response.json().await.expect("chat response body");
        (status, body)
    }

    /// POST a message as the context's default visitor.
    pub async fn chat(&self, message: &str) -> (u16, serde_json::Value) {
        self.chat_as(&self.client, message).await
    }
}

/// A client with its own cookie jar, i.e. a distinct visitor.
#[must_use]
pub fn visitor_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("reqwest client")
}

/// Serve `app` on an ephemeral local port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });

    addr
}
