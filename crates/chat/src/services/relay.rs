//! Chat relay: business-hours gate, waiting queue and sale detection.
//!
//! Every chat request goes through one decision:
//!
//! ```text
//! model missing ─────────────► Unavailable
//! store closed  ─────────────► enqueue, reply with queue position
//! store open    ─► flush queue (notice once) ─► model ─► sale marker? ─► webhook
//! ```
//!
//! The flush and the enqueue are the only queue mutations; both go through
//! the [`QueueStore`], which is the single writer of queue state.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, instrument, warn};

use techstore_core::{CustomerMessage, GateStatus, MessageError, SaleDetection, VisitorToken, detect_sale};

use crate::config::StoreConfig;
use crate::db::{QueueStore, RepositoryError};
use crate::gemini::GeminiError;
use crate::services::Clock;
use crate::webhook::{SaleEvent, WebhookError};

/// Line appended to the reply when a sale is confirmed.
const SALE_CONFIRMATION: &str =
    "✅ Pedido confirmado! Nossa equipe vai entrar em contato para finalizar a compra.";

/// Conversational model answering customer messages.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Answer one customer message.
    async fn generate(&self, message: &str) -> Result<String, GeminiError>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}

/// Receiver of confirmed sales.
#[async_trait]
pub trait SaleNotifier: Send + Sync {
    /// Deliver one sale.
    async fn notify(&self, event: &SaleEvent) -> Result<(), WebhookError>;
}

/// Errors that can occur while relaying a message.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// No model is configured or reachable.
    #[error("language model unavailable")]
    Unavailable,

    /// The customer message was rejected.
    #[error("invalid message: {0}")]
    InvalidMessage(#[from] MessageError),

    /// Queue storage failed.
    #[error("queue error: {0}")]
    Queue(#[from] RepositoryError),

    /// The model call failed.
    #[error("model error: {0}")]
    Model(#[from] GeminiError),
}

/// Outcome of a relayed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    /// Store closed: the message joined the waiting queue.
    Queued {
        /// Queue depth including this message.
        position: u64,
        /// Customer-facing text.
        text: String,
    },
    /// Store open: the model answered.
    Answered {
        /// Customer-facing text, including any flush notice.
        text: String,
        /// Queue records flushed by this request.
        flushed: u64,
        /// Whether the model confirmed a sale.
        sale: bool,
    },
}

impl ChatReply {
    /// Customer-facing text.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Queued { text, .. } | Self::Answered { text, .. } => text,
        }
    }

    /// Consume the reply and return the customer-facing text.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Queued { text, .. } | Self::Answered { text, .. } => text,
        }
    }
}

/// Request-scoped chat service shared through the application state.
pub struct ChatRelay {
    store: StoreConfig,
    origin: String,
    queue: Arc<dyn QueueStore>,
    clock: Arc<dyn Clock>,
    model: Option<Arc<dyn ChatModel>>,
    notifier: Option<Arc<dyn SaleNotifier>>,
}

impl ChatRelay {
    /// Create a relay with no model and no sale webhook.
    #[must_use]
    pub fn new(store: StoreConfig, queue: Arc<dyn QueueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            origin: String::new(),
            queue,
            clock,
            model: None,
            notifier: None,
        }
    }

    /// Attach the conversational model.
    #[must_use]
    pub fn with_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Attach the sale webhook and the origin label sent with each sale.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn SaleNotifier>, origin: impl Into<String>) -> Self {
        self.notifier = Some(notifier);
        self.origin = origin.into();
        self
    }

    /// Returns true if a model is attached.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.model.is_some()
    }

    /// Store settings used by the gate.
    #[must_use]
    pub const fn store(&self) -> &StoreConfig {
        &self.store
    }

    /// Gate decision for the current instant.
    #[must_use]
    pub fn gate_status(&self) -> GateStatus {
        self.store
            .hours
            .status_at(self.clock.now(), self.store.force_closed)
    }

    /// Relay one raw customer message.
    ///
    /// # Errors
    ///
    /// - `RelayError::Unavailable` when no model is attached, before anything else
    /// - `RelayError::InvalidMessage` for empty input
    /// - `RelayError::Queue` / `RelayError::Model` when a collaborator fails
    ///
    /// Webhook failures are logged and never returned.
    #[instrument(skip(self, raw), fields(visitor = %visitor.prefix()))]
    pub async fn handle(&self, raw: &str, visitor: &VisitorToken) -> Result<ChatReply, RelayError> {
        let model = self.model.as_ref().ok_or(RelayError::Unavailable)?;
        let message = CustomerMessage::parse(raw)?;

        match self.gate_status() {
            GateStatus::Closed => self.enqueue(&message, visitor).await,
            GateStatus::Open => self.answer(model.as_ref(), &message, visitor).await,
        }
    }

    async fn enqueue(
        &self,
        message: &CustomerMessage,
        visitor: &VisitorToken,
    ) -> Result<ChatReply, RelayError> {
        let position = self
            .queue
            .enqueue(&message.queue_content(&visitor.prefix()))
            .await?;

        info!(position, "Store closed, message queued");

        Ok(ChatReply::Queued {
            position,
            text: self.closed_text(position),
        })
    }

    async fn answer(
        &self,
        model: &dyn ChatModel,
        message: &CustomerMessage,
        visitor: &VisitorToken,
    ) -> Result<ChatReply, RelayError> {
        let flushed = self.queue.flush_pending().await?;
        if flushed > 0 {
            info!(flushed, "Store open, pending queue flushed");
        }

        let response = model.generate(message.as_str()).await?;
        debug!(model = model.model_name(), "Model replied");

        let (text, sale) = match detect_sale(&response) {
            SaleDetection::NoSale(text) => (text, false),
            SaleDetection::Confirmed(summary) => {
                self.report_sale(&summary, visitor).await;
                (format!("{summary}\n\n{SALE_CONFIRMATION}"), true)
            }
        };

        let text = if flushed > 0 {
            format!("{}{text}", flush_notice(flushed))
        } else {
            text
        };

        Ok(ChatReply::Answered {
            text,
            flushed,
            sale,
        })
    }

    /// Best-effort sale delivery.
    async fn report_sale(&self, summary: &str, visitor: &VisitorToken) {
        let Some(notifier) = &self.notifier else {
            warn!("Sale confirmed but no webhook configured");
            return;
        };

        let event = SaleEvent {
            timestamp: self.clock.now(),
            summary: summary.to_owned(),
            session: visitor.prefix(),
            origin: self.origin.clone(),
        };

        match notifier.notify(&event).await {
            Ok(()) => info!(session = %event.session, "Sale sent to webhook"),
            Err(e) => error!(error = %e, session = %event.session, "Failed to send sale to webhook"),
        }
    }

    fn closed_text(&self, position: u64) -> String {
        format!(
            "🛑 A {} encerrou o expediente ({}).\nVocê está na posição #{position} da fila de espera.",
            self.store.name,
            self.store.hours.window_label()
        )
    }
}

/// One-time notice prefixed to the first answer after a flush.
fn flush_notice(flushed: u64) -> String {
    format!("🔔 [SISTEMA: {flushed} atendimentos pendentes iniciados!]\n\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::db::MemoryQueueStore;
    use crate::models::QueueFilter;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    /// 14:00 local (UTC-3).
    fn open_clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 3, 10, 17, 0, 0).unwrap()))
    }

    /// 22:00 local (UTC-3).
    fn closed_clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 3, 11, 1, 0, 0).unwrap()))
    }

    struct ScriptedModel {
        reply: String,
        calls: AtomicUsize,
    }

    impl ScriptedModel {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn generate(&self, _message: &str) -> Result<String, GeminiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        events: Mutex<Vec<SaleEvent>>,
        fail: bool,
    }

    #[async_trait]
    impl SaleNotifier for RecordingNotifier {
        async fn notify(&self, event: &SaleEvent) -> Result<(), WebhookError> {
            self.events.lock().unwrap().push(event.clone());
            if self.fail {
                return Err(WebhookError::Rejected {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(())
        }
    }

    fn visitor() -> VisitorToken {
        VisitorToken::from_uuid(uuid::Uuid::from_u128(0xab12_cd34_0000_0000_0000_0000_0000_0000))
    }

    #[tokio::test]
    async fn test_missing_model_is_unavailable_before_anything_else() {
        let queue = Arc::new(MemoryQueueStore::new());
        let relay = ChatRelay::new(StoreConfig::default(), queue.clone(), closed_clock());

        let result = relay.handle("", &visitor()).await;
        assert!(matches!(result, Err(RelayError::Unavailable)));
        assert_eq!(queue.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let relay = ChatRelay::new(
            StoreConfig::default(),
            Arc::new(MemoryQueueStore::new()),
            open_clock(),
        )
        .with_model(ScriptedModel::new("oi"));

        let result = relay.handle("   ", &visitor()).await;
        assert!(matches!(result, Err(RelayError::InvalidMessage(MessageError::Empty))));
    }

    #[tokio::test]
    async fn test_closed_queues_without_calling_model() {
        let model = ScriptedModel::new("never");
        let queue = Arc::new(MemoryQueueStore::new());
        let relay = ChatRelay::new(StoreConfig::default(), queue.clone(), closed_clock())
            .with_model(model.clone());

        let first = relay.handle("quero um mouse", &visitor()).await.unwrap();
        let second = relay.handle("e um teclado", &visitor()).await.unwrap();

        assert!(matches!(first, ChatReply::Queued { position: 1, .. }));
        assert_eq!(
            second.text(),
            "🛑 A TechStore encerrou o expediente (08h às 18h).\nVocê está na posição #2 da fila de espera."
        );
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);

        let records = queue.list(&QueueFilter::default()).await.unwrap();
        assert_eq!(records[1].content, "[ab12cd34] quero um mouse");
    }

    #[tokio::test]
    async fn test_force_closed_queues_during_business_hours() {
        let store = StoreConfig {
            force_closed: true,
            ..StoreConfig::default()
        };
        let relay = ChatRelay::new(store, Arc::new(MemoryQueueStore::new()), open_clock())
            .with_model(ScriptedModel::new("never"));

        let reply = relay.handle("oi", &visitor()).await.unwrap();
        assert!(matches!(reply, ChatReply::Queued { .. }));
    }

    #[tokio::test]
    async fn test_open_flushes_once_then_relays() {
        let queue = Arc::new(MemoryQueueStore::new());
        queue.enqueue("[aaaa1111] um").await.unwrap();
        queue.enqueue("[bbbb2222] dois").await.unwrap();

        let relay = ChatRelay::new(StoreConfig::default(), queue.clone(), open_clock())
            .with_model(ScriptedModel::new("Olá! Como posso ajudar?"));

        let first = relay.handle("bom dia", &visitor()).await.unwrap();
        assert_eq!(
            first,
            ChatReply::Answered {
                text: "🔔 [SISTEMA: 2 atendimentos pendentes iniciados!]\n\nOlá! Como posso ajudar?"
                    .to_string(),
                flushed: 2,
                sale: false,
            }
        );
        assert_eq!(queue.pending_count().await.unwrap(), 0);

        let second = relay.handle("bom dia", &visitor()).await.unwrap();
        assert_eq!(second.text(), "Olá! Como posso ajudar?");
    }

    #[tokio::test]
    async fn test_sale_marker_triggers_one_webhook_call() {
        let notifier = Arc::new(RecordingNotifier::default());
        let relay = ChatRelay::new(
            StoreConfig::default(),
            Arc::new(MemoryQueueStore::new()),
            open_clock(),
        )
        .with_model(ScriptedModel::new("Pedido: 1x Mouse Sem Fio Logitech. [SALE_CONFIRMED]"))
        .with_notifier(notifier.clone(), "TechStore Chat");

        let reply = relay.handle("pode fechar", &visitor()).await.unwrap();

        assert!(matches!(reply, ChatReply::Answered { sale: true, .. }));
        assert!(!reply.text().contains("[SALE_CONFIRMED]"));
        assert!(reply.text().starts_with("Pedido: 1x Mouse Sem Fio Logitech."));
        assert!(reply.text().ends_with(SALE_CONFIRMATION));

        let events = notifier.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].summary, "Pedido: 1x Mouse Sem Fio Logitech.");
        assert_eq!(events[0].session, "ab12cd34");
        assert_eq!(events[0].origin, "TechStore Chat");
    }

    #[tokio::test]
    async fn test_webhook_failure_is_not_surfaced() {
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        });
        let relay = ChatRelay::new(
            StoreConfig::default(),
            Arc::new(MemoryQueueStore::new()),
            open_clock(),
        )
        .with_model(ScriptedModel::new("Fechado! [SALE_CONFIRMED]"))
        .with_notifier(notifier.clone(), "TechStore Chat");

        let reply = relay.handle("sim", &visitor()).await.unwrap();
        assert!(matches!(reply, ChatReply::Answered { sale: true, .. }));
        assert_eq!(notifier.events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sale_without_webhook_still_strips_marker() {
        let relay = ChatRelay::new(
            StoreConfig::default(),
            Arc::new(MemoryQueueStore::new()),
            open_clock(),
        )
        .with_model(ScriptedModel::new("Fechado! [SALE_CONFIRMED]"));

        let reply = relay.handle("sim", &visitor()).await.unwrap();
        assert!(reply.text().starts_with("Fechado!\n\n"));
    }

    #[test]
    fn test_flush_notice() {
        assert_eq!(
            flush_notice(3),
            "🔔 [SISTEMA: 3 atendimentos pendentes iniciados!]\n\n"
        );
    }
}
