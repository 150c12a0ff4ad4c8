//! Gemini API integration for the customer chat relay.
//!
//! Each customer message is sent as a single-turn `generateContent` request
//! carrying the store manual as system instruction. No conversation history
//! is kept on our side.
//!
//! # Endpoints used
//!
//! - `POST models/{model}:generateContent` - chat replies
//! - `GET models/{model}` - startup probe for model fallback
//! - `GET models` - model listing for the CLI

mod client;
mod error;
mod types;

pub use client::GeminiClient;
pub use error::GeminiError;
pub use types::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, ListModelsResponse,
    ModelInfo, Part, PromptFeedback,
};
