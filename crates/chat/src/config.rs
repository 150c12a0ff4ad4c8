//! Chat server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional. Without a database URL the server runs in
//! in-memory mode (sessions and the waiting queue are lost on restart);
//! without an API key the relay answers every chat request with the
//! "unavailable" error.
//!
//! - `CHAT_DATABASE_URL` / `DATABASE_URL` - `PostgreSQL` connection string
//! - `CHAT_HOST` - Bind address (default: 127.0.0.1)
//! - `CHAT_PORT` - Listen port (default: 8000)
//! - `CHAT_BASE_URL` - Public URL, decides secure cookies (default: <http://localhost:8000>)
//! - `API_KEY` / `GEMINI_API_KEY` - Gemini API key
//! - `GEMINI_MODEL` - Primary model (default: gemini-2.5-flash)
//! - `GEMINI_FALLBACK_MODEL` - Model used when the primary probe fails (default: gemini-1.5-flash)
//! - `GEMINI_BASE_URL` - API root (default: <https://generativelanguage.googleapis.com/v1beta>)
//! - `WEBHOOK_URL` - Sale automation webhook
//! - `WEBHOOK_ORIGIN` - Origin label sent with sales (default: "`TechStore` Chat")
//! - `STORE_NAME` - Store name used in prompts and replies (default: `TechStore`)
//! - `STORE_OPEN_HOUR` / `STORE_CLOSE_HOUR` - Opening window (default: 8 / 18)
//! - `STORE_UTC_OFFSET_HOURS` - Store timezone (default: -3)
//! - `STORE_FORCE_CLOSED` - Manual override, `true` keeps the store closed
//! - `SENTRY_DSN` / `SENTRY_ENVIRONMENT` - Sentry error tracking

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use techstore_core::{BusinessHours, HoursError};
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_GEMINI_FALLBACK_MODEL: &str = "gemini-1.5-flash";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "insert",
    "cola-a-tua",
    "sua-chave",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Chat server configuration.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// `PostgreSQL` connection URL; `None` selects in-memory mode
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the chat page
    pub base_url: String,
    /// Gemini API configuration
    pub gemini: GeminiConfig,
    /// Sale webhook configuration
    pub webhook: WebhookConfig,
    /// Store identity and opening hours
    pub store: StoreConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Gemini API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key; `None` leaves the relay unavailable
    pub api_key: Option<SecretString>,
    /// Model tried first at startup
    pub model: String,
    /// Model tried when the primary model probe fails
    pub fallback_model: Option<String>,
    /// API root URL
    pub base_url: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("fallback_model", &self.fallback_model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            fallback_model: Some(DEFAULT_GEMINI_FALLBACK_MODEL.to_string()),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }
}

/// Sale webhook configuration.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Automation endpoint receiving confirmed sales
    pub url: Option<Url>,
    /// Fixed origin label included in every payload
    pub origin: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            origin: "TechStore Chat".to_string(),
        }
    }
}

/// Store identity and gate settings.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Store name shown to customers and given to the model
    pub name: String,
    /// Daily opening window
    pub hours: BusinessHours,
    /// Manual override keeping the store closed
    pub force_closed: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "TechStore".to_string(),
            hours: BusinessHours::default(),
            force_closed: false,
        }
    }
}

impl Default for ChatConfig {
    /// Local development defaults: in-memory mode on 127.0.0.1:8000.
    fn default() -> Self {
        Self {
            database_url: None,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 8000,
            base_url: "http://localhost:8000".to_string(),
            gemini: GeminiConfig::default(),
            webhook: WebhookConfig::default(),
            store: StoreConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl ChatConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid, or if the
    /// API key looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`ChatConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env { lookup };
        let defaults = Self::default();

        let database_url = env
            .get("CHAT_DATABASE_URL")
            .or_else(|| env.get("DATABASE_URL"))
            .map(SecretString::from);
        let host = env.parse_or("CHAT_HOST", defaults.host)?;
        let port = env.parse_or("CHAT_PORT", defaults.port)?;
        let base_url = env.get("CHAT_BASE_URL").unwrap_or(defaults.base_url);

        let gemini = GeminiConfig::from_env(&env)?;
        let webhook = WebhookConfig::from_env(&env)?;
        let store = StoreConfig::from_env(&env)?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            gemini,
            webhook,
            store,
            sentry_dsn: env.get("SENTRY_DSN"),
            sentry_environment: env.get("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl GeminiConfig {
    fn from_env<F: Fn(&str) -> Option<String>>(env: &Env<F>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_key = match env
            .get("API_KEY")
            .map(|v| ("API_KEY", v))
            .or_else(|| env.get("GEMINI_API_KEY").map(|v| ("GEMINI_API_KEY", v)))
        {
            Some((key, value)) => {
                validate_secret_strength(&value, key)?;
                Some(SecretString::from(value))
            }
            None => None,
        };

        let fallback_model = match env.get("GEMINI_FALLBACK_MODEL") {
            Some(model) if model.eq_ignore_ascii_case("none") => None,
            Some(model) => Some(model),
            None => defaults.fallback_model,
        };

        Ok(Self {
            api_key,
            model: env.get("GEMINI_MODEL").unwrap_or(defaults.model),
            fallback_model,
            base_url: env
                .get("GEMINI_BASE_URL")
                .map_or(defaults.base_url, |url| url.trim_end_matches('/').to_string()),
        })
    }

    /// Returns the API key, if configured.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(ExposeSecret::expose_secret)
    }
}

impl WebhookConfig {
    fn from_env<F: Fn(&str) -> Option<String>>(env: &Env<F>) -> Result<Self, ConfigError> {
        let url = env
            .get("WEBHOOK_URL")
            .map(|raw| {
                Url::parse(&raw)
                    .map_err(|e| ConfigError::InvalidEnvVar("WEBHOOK_URL".to_string(), e.to_string()))
            })
            .transpose()?;

        Ok(Self {
            url,
            origin: env
                .get("WEBHOOK_ORIGIN")
                .unwrap_or_else(|| Self::default().origin),
        })
    }
}

impl StoreConfig {
    fn from_env<F: Fn(&str) -> Option<String>>(env: &Env<F>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let open_hour = env.parse_or("STORE_OPEN_HOUR", defaults.hours.open_hour())?;
        let close_hour = env.parse_or("STORE_CLOSE_HOUR", defaults.hours.close_hour())?;
        let offset_hours = env.parse_or(
            "STORE_UTC_OFFSET_HOURS",
            defaults.hours.offset().local_minus_utc() / 3600,
        )?;
        let hours = BusinessHours::new(open_hour, close_hour, offset_hours).map_err(|e| {
            let key = match e {
                HoursError::InvalidOffset(_) => "STORE_UTC_OFFSET_HOURS",
                HoursError::InvalidWindow { .. } => "STORE_OPEN_HOUR/STORE_CLOSE_HOUR",
            };
            ConfigError::InvalidEnvVar(key.to_string(), e.to_string())
        })?;

        Ok(Self {
            name: env.get("STORE_NAME").unwrap_or(defaults.name),
            hours,
            force_closed: env.parse_or("STORE_FORCE_CLOSED", defaults.force_closed)?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup with typed parsing helpers.
struct Env<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get a variable, treating empty values as unset.
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key).map_or(Ok(default), |raw| {
            raw.parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Reject API keys copied from documentation or `.env` templates.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}
