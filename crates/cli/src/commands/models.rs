//! Gemini model listing.
//!
//! Prints every model available to the configured key that can serve chat
//! requests, marking the configured primary and fallback models.
//!
//! # Environment Variables
//!
//! - `API_KEY` (or `GEMINI_API_KEY`) - Gemini API key
//! - `GEMINI_MODEL` / `GEMINI_FALLBACK_MODEL` - Models to mark

use techstore_chat::config::{ChatConfig, GeminiConfig};
use techstore_chat::gemini::{GeminiClient, ModelInfo};

use super::CommandError;

/// List models supporting `generateContent`.
///
/// # Errors
///
/// Returns error if the key is missing or the API call fails.
pub async fn list(all: bool) -> Result<(), CommandError> {
    let config = ChatConfig::from_env()?;
    let api_key = config
        .gemini
        .api_key()
        .ok_or(CommandError::MissingEnvVar("API_KEY"))?;

    let client = GeminiClient::new(api_key, &config.gemini)?;
    let models = client.list_models().await?;

    #[allow(clippy::print_stdout)]
    {
        for model in models.iter().filter(|m| all || m.supports_generate_content()) {
            println!("{}", format_model(model, &config.gemini));
        }
    }

    Ok(())
}

fn format_model(model: &ModelInfo, config: &GeminiConfig) -> String {
    let id = model.name.trim_start_matches("models/");
    let marker = if id == config.model {
        " (primary)"
    } else if config.fallback_model.as_deref() == Some(id) {
        " (fallback)"
    } else {
        ""
    };

    match &model.display_name {
        Some(display) => format!("{id}{marker} - {display}"),
        None => format!("{id}{marker}"),
    }
}
