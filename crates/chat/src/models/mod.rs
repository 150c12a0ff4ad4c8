//! Domain models for the chat server.

pub mod queue;
pub mod session;

pub use queue::{QueueFilter, QueuedMessage};
