//! Gemini API client for chat replies.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::StatusCode;
use tracing::{info, instrument, warn};
use url::Url;

use crate::config::GeminiConfig;
use crate::services::ChatModel;

use super::error::{ApiErrorResponse, GeminiError};
use super::types::{Content, GenerateContentRequest, GenerateContentResponse, ListModelsResponse, ModelInfo};

const API_KEY_HEADER: &str = "x-goog-api-key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const LIST_PAGE_SIZE: &str = "100";

/// Gemini API client.
///
/// Cheap to clone. Bound to one model and, optionally, one system
/// instruction sent with every request.
#[derive(Clone)]
pub struct GeminiClient {
    inner: Arc<GeminiClientInner>,
}

struct GeminiClientInner {
    client: reqwest::Client,
    base_url: String,
    model: String,
    system_instruction: Option<String>,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.inner.base_url)
            .field("model", &self.inner.model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a client for the configured primary model.
    ///
    /// # Errors
    ///
    /// Returns `GeminiError::InvalidApiKey` if the key cannot be used as a
    /// header value, or `GeminiError::Http` if the HTTP client fails to build.
    pub fn new(api_key: &str, config: &GeminiConfig) -> Result<Self, GeminiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut key = HeaderValue::from_str(api_key).map_err(|_| GeminiError::InvalidApiKey)?;
        key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(GeminiClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                model: normalize_model(&config.model),
                system_instruction: None,
            }),
        })
    }

    /// Create a client and probe the primary model, falling back once.
    ///
    /// The fallback model is only tried when the primary probe fails; the
    /// probe itself is never repeated.
    ///
    /// # Errors
    ///
    /// Returns the primary probe error when no fallback is configured, or the
    /// fallback probe error when both fail.
    #[instrument(skip(api_key, config), fields(model = %config.model))]
    pub async fn connect(api_key: &str, config: &GeminiConfig) -> Result<Self, GeminiError> {
        let client = Self::new(api_key, config)?;

        match client.get_model(client.model()).await {
            Ok(model) => {
                info!(model = %model.name, "Connected to Gemini model");
                Ok(client)
            }
            Err(primary_err) => {
                let Some(fallback) = config.fallback_model.as_deref() else {
                    return Err(primary_err);
                };
                warn!(
                    error = %primary_err,
                    fallback = %fallback,
                    "Primary Gemini model unavailable, trying fallback"
                );

                let fallback_client = client.with_model(fallback);
                let model = fallback_client.get_model(fallback_client.model()).await?;
                info!(model = %model.name, "Connected to Gemini fallback model");
                Ok(fallback_client)
            }
        }
    }

    /// Same client bound to a different model.
    #[must_use]
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            inner: Arc::new(GeminiClientInner {
                client: self.inner.client.clone(),
                base_url: self.inner.base_url.clone(),
                model: normalize_model(model),
                system_instruction: self.inner.system_instruction.clone(),
            }),
        }
    }

    /// Same client sending `instruction` as system instruction.
    #[must_use]
    pub fn with_system_instruction(&self, instruction: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(GeminiClientInner {
                client: self.inner.client.clone(),
                base_url: self.inner.base_url.clone(),
                model: self.inner.model.clone(),
                system_instruction: Some(instruction.into()),
            }),
        }
    }

    /// Model this client is bound to (without the `models/` prefix).
    #[must_use]
    pub fn model(&self) -> &str {
        &self.inner.model
    }

    /// Send one user message and return the reply text.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API answers with an error
    /// status, or the response carries no text.
    #[instrument(skip(self, message), fields(model = %self.inner.model))]
    pub async fn generate(&self, message: &str) -> Result<String, GeminiError> {
        let request = GenerateContentRequest {
            system_instruction: self
                .inner
                .system_instruction
                .as_deref()
                .map(Content::system_text),
            contents: vec![Content::user_text(message)],
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.inner.base_url, self.inner.model
        );
        let response = self.inner.client.post(&url).json(&request).send().await?;
        let body: GenerateContentResponse = self.handle_response(response).await?;

        body.text()
            .ok_or_else(|| GeminiError::EmptyResponse(body.empty_reason()))
    }

    /// Fetch metadata for one model.
    ///
    /// # Errors
    ///
    /// Returns `GeminiError::ModelNotFound` if the model does not exist.
    pub async fn get_model(&self, model: &str) -> Result<ModelInfo, GeminiError> {
        let url = format!("{}/models/{}", self.inner.base_url, normalize_model(model));
        let response = self.inner.client.get(&url).send().await?;
        self.handle_response(response).await
    }

    /// List every model available to the key, following pagination.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    #[instrument(skip(self))]
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, GeminiError> {
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = Url::parse(&format!("{}/models", self.inner.base_url))
                .map_err(|e| GeminiError::Parse(format!("invalid base URL: {e}")))?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", LIST_PAGE_SIZE);
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let response = self.inner.client.get(url).send().await?;
            let page: ListModelsResponse = self.handle_response(response).await?;
            models.extend(page.models);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(models)
    }

    /// Decode a successful response or map the error status.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, GeminiError> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body)
                .map_err(|e| GeminiError::Parse(format!("Failed to parse response: {e}")))
        } else {
            Err(self.handle_error_status(status, response).await)
        }
    }

    /// Handle an error status code.
    async fn handle_error_status(&self, status: StatusCode, response: reqwest::Response) -> GeminiError {
        if status == StatusCode::TOO_MANY_REQUESTS {
            return GeminiError::RateLimited;
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return GeminiError::Http(e),
        };
        let message = serde_json::from_str::<ApiErrorResponse>(&body)
            .map_or(body, |api_error| api_error.error.message);

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GeminiError::Unauthorized(message),
            // Invalid keys come back as 400 INVALID_ARGUMENT
            StatusCode::BAD_REQUEST if message.contains("API key") => {
                GeminiError::Unauthorized(message)
            }
            StatusCode::NOT_FOUND => GeminiError::ModelNotFound(self.inner.model.clone()),
            _ => GeminiError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn generate(&self, message: &str) -> Result<String, GeminiError> {
        Self::generate(self, message).await
    }

    fn model_name(&self) -> &str {
        self.model()
    }
}

/// Strip the `models/` resource prefix if present.
fn normalize_model(model: &str) -> String {
    model.trim().trim_start_matches("models/").to_string()
}
