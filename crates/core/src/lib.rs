//! TechStore Core - Shared domain types.
//!
//! This crate provides the types shared by the chat server and the CLI:
//! - `chat` - HTTP server relaying customer messages to the language model
//! - `cli` - Command-line tools for migrations and the queue browser
//!
//! # Architecture
//!
//! The core crate contains only types and pure decision logic - no I/O, no
//! database access, no HTTP clients. The business-hours gate and the sale
//! marker detector live here so they can be tested without a runtime.
//!
//! # Modules
//!
//! - [`types`] - Queue IDs, customer messages, visitor tokens, the gate and the sale marker

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
