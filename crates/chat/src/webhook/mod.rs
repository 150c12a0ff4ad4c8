//! Sale automation webhook.
//!
//! Confirmed sales are posted as a small JSON document to an external
//! automation endpoint (Zapier, Make, n8n...). Delivery is fire-and-forget:
//! the caller logs failures and never retries.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::services::SaleNotifier;

/// Upper bound on one delivery attempt.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when delivering a sale.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// HTTP request failed.
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Receiver answered with a non-success status.
    #[error("webhook rejected sale ({status}): {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body, for logging.
        body: String,
    },
}

/// Payload describing one confirmed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleEvent {
    /// When the sale was detected.
    pub timestamp: DateTime<Utc>,
    /// Model reply with the sale marker removed.
    pub summary: String,
    /// Truncated visitor token.
    pub session: String,
    /// Fixed label naming this service.
    pub origin: String,
}

/// HTTP client posting sales to the configured URL.
#[derive(Clone)]
pub struct WebhookClient {
    client: reqwest::Client,
    url: Url,
}

impl std::fmt::Debug for WebhookClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Automation URLs usually embed their secret in the path
        f.debug_struct("WebhookClient")
            .field("host", &self.url.host_str())
            .finish_non_exhaustive()
    }
}

impl WebhookClient {
    /// Create a new webhook client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(url: Url) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()?;
        Ok(Self { client, url })
    }

    /// Post one sale.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the receiver rejects it.
    #[instrument(skip(self, event), fields(session = %event.session))]
    pub async fn post_sale(&self, event: &SaleEvent) -> Result<(), WebhookError> {
        let response = self.client.post(self.url.clone()).json(event).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WebhookError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), "Sale delivered to webhook");
        Ok(())
    }
}

#[async_trait]
impl SaleNotifier for WebhookClient {
    async fn notify(&self, event: &SaleEvent) -> Result<(), WebhookError> {
        self.post_sale(event).await
    }
}
