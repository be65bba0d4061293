//! # Command values.
//!
//! A [`Command`] pairs an id with a [`CommandHandler`]. Handlers take the
//! call arguments as JSON values and return a JSON value or an error.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::BoxError;

/// Shared command handler.
pub type CommandHandler = Arc<dyn Fn(&[Value]) -> Result<Value, BoxError> + Send + Sync>;

/// A registered command.
#[derive(Clone)]
pub struct Command {
    /// Unique id, e.g. `"window.reload"`.
    pub id: String,
    /// Called by [`CommandService::execute_command`](crate::CommandService::execute_command).
    pub handler: CommandHandler,
    /// Optional description for palettes and help output.
    pub metadata: Option<CommandMetadata>,
}

impl Command {
    /// Creates a command without metadata.
    pub fn new(
        id: impl Into<String>,
        handler: impl Fn(&[Value]) -> Result<Value, BoxError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            handler: Arc::new(handler),
            metadata: None,
        }
    }

    /// Attaches metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: CommandMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Human-readable description of a command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandMetadata {
    /// What the command does.
    pub description: String,
    /// Accepted arguments, in call order.
    pub args: Vec<CommandArg>,
    /// Description of the return value, if any.
    pub returns: Option<String>,
}

/// One documented command argument.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandArg {
    /// Argument name as shown to users.
    pub name: String,
    /// Whether callers may omit the argument.
    pub is_optional: bool,
    /// What the argument is for.
    pub description: Option<String>,
}

/// Payload of the will/did-execute events.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandEvent {
    /// Id the command was executed under (an alias keeps its own id).
    pub command_id: String,
    /// Arguments passed to the handler.
    pub args: Vec<Value>,
}
