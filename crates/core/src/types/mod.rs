//! Core types for the TechStore chat gate.
//!
//! This module provides type-safe wrappers for the domain concepts shared
//! between the server and the CLI.

pub mod hours;
pub mod id;
pub mod message;
pub mod sale;
pub mod visitor;

pub use hours::{BusinessHours, GateStatus, HoursError};
pub use id::QueuedMessageId;
pub use message::{CustomerMessage, MessageError};
pub use sale::{SALE_MARKER, SaleDetection, detect_sale};
pub use visitor::VisitorToken;
