//! TechStore chat gate library.
//!
//! Business-hours gated customer chat: while the store is closed messages
//! join a waiting queue, while it is open they are relayed to a Gemini model
//! and sales confirmed by the model are forwarded to an automation webhook.
//!
//! The binary in `main.rs` wires these modules together; tests build the
//! router directly with fake collaborators.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod gemini;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod webhook;
