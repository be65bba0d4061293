//! # Command registry and command service.
//!
//! This module provides the command layer built on the event core:
//! - [`Command`] - an id, a handler and optional [`CommandMetadata`]
//! - [`CommandRegistry`] - stacked registrations per id, most recent wins
//! - [`CommandService`] - executes commands and announces each execution
//!
//! Arguments and results are [`serde_json::Value`]s.

mod command;
mod registry;
mod service;

pub use command::{Command, CommandArg, CommandEvent, CommandHandler, CommandMetadata};
pub use registry::CommandRegistry;
pub use service::CommandService;
