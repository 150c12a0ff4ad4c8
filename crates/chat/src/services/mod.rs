//! Business logic services for the chat server.
//!
//! # Services
//!
//! - `relay` - Business-hours gate, waiting queue flush, model relay and sale detection
//! - `clock` - Time source for the gate
//! - `prompt` - Store manual sent to the model as system instruction

pub mod clock;
pub mod prompt;
pub mod relay;

pub use clock::{Clock, SystemClock};
pub use prompt::render_store_manual;
pub use relay::{ChatModel, ChatRelay, ChatReply, RelayError, SaleNotifier};
