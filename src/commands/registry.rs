//! # Command registrations.
//!
//! Registrations for the same id stack: the most recent one is what
//! [`CommandRegistry::get_command`] returns, and disposing it uncovers the
//! previous one.
//!
//! ```text
//! "app.quit" ─► [ handler C (newest) ] ─► [ handler B ] ─► [ handler A ]
//!                  ▲ get_command
//! ```
//!
//! ## Rules
//! - Disposing a registration removes exactly that handler, once.
//! - An id disappears when its last handler is removed.
//! - `on_did_register_command` fires the id after every registration.

use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;

use crate::collections::{LinkedList, NodeHandle};
use crate::commands::command::Command;
use crate::commands::service::CommandService;
use crate::error::{BoxError, CommandError};
use crate::events::{Emitter, Event};
use crate::lifecycle::{DisposableRef, to_disposable};

type CommandTable = Mutex<IndexMap<String, LinkedList<Command>>>;

/// Registry of command handlers keyed by id.
pub struct CommandRegistry {
    commands: Arc<CommandTable>,
    on_did_register_command: Emitter<String>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            commands: Arc::new(Mutex::new(IndexMap::new())),
            on_did_register_command: Emitter::new(),
        }
    }

    /// Fires the id of every newly registered command.
    pub fn on_did_register_command(&self) -> Event<String> {
        self.on_did_register_command.event()
    }

    /// Registers `handler` under `id`.
    pub fn register_command(
        &self,
        id: impl Into<String>,
        handler: impl Fn(&[Value]) -> Result<Value, BoxError> + Send + Sync + 'static,
    ) -> Result<DisposableRef, CommandError> {
        self.register(Command::new(id, handler))
    }

    /// Registers a prepared command; dispose the result to unregister it.
    pub fn register(&self, command: Command) -> Result<DisposableRef, CommandError> {
        if command.id.is_empty() {
            return Err(CommandError::InvalidId);
        }

        let id = command.id.clone();
        let handle = self
            .commands
            .lock()
            .entry(id.clone())
            .or_default()
            .unshift(command);

        let registration = {
            let commands = Arc::downgrade(&self.commands);
            let id = id.clone();
            to_disposable(move || unregister(&commands, &id, handle))
        };

        tracing::debug!(command = %id, "command registered");
        self.on_did_register_command.fire(&id);
        Ok(registration)
    }

    /// Registers `old_id` as a forwarder that executes `new_id` on `service`.
    ///
    /// The alias holds the service weakly; calling it after the service was
    /// dropped fails.
    pub fn register_command_alias(
        &self,
        old_id: impl Into<String>,
        new_id: impl Into<String>,
        service: &Arc<CommandService>,
    ) -> Result<DisposableRef, CommandError> {
        let service = Arc::downgrade(service);
        let new_id = new_id.into();
        self.register_command(old_id, move |args| {
            let service = service.upgrade().ok_or("command service is gone")?;
            Ok(service.execute_command(&new_id, args.to_vec())?)
        })
    }

    /// The most recently registered command for `id`.
    pub fn get_command(&self, id: &str) -> Option<Command> {
        self.commands.lock().get(id).and_then(|list| list.first().cloned())
    }

    /// The current command of every id, in first-registration order.
    pub fn get_commands(&self) -> IndexMap<String, Command> {
        self.commands
            .lock()
            .iter()
            .filter_map(|(id, list)| list.first().map(|command| (id.clone(), command.clone())))
            .collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn unregister(commands: &Weak<CommandTable>, id: &str, handle: NodeHandle) {
    let Some(commands) = commands.upgrade() else {
        return;
    };
    let removed = {
        let mut commands = commands.lock();
        let removed = commands.get_mut(id).and_then(|list| list.remove(handle));
        if commands.get(id).is_some_and(LinkedList::is_empty) {
            commands.shift_remove(id);
        }
        removed
    };
    drop(removed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Disposable;
    use serde_json::json;

    fn constant(value: Value) -> impl Fn(&[Value]) -> Result<Value, BoxError> + Send + Sync + 'static {
        move |_| Ok(value.clone())
    }

    fn call(registry: &CommandRegistry, id: &str) -> Option<Value> {
        registry
            .get_command(id)
            .and_then(|command| (command.handler)(&[]).ok())
    }

    #[test]
    fn test_latest_registration_wins_and_unstacks() {
        let registry = CommandRegistry::new();
        let first = registry.register_command("app.quit", constant(json!(1))).unwrap();
        let second = registry.register_command("app.quit", constant(json!(2))).unwrap();
        assert_eq!(call(&registry, "app.quit"), Some(json!(2)));

        second.dispose().unwrap();
        assert_eq!(call(&registry, "app.quit"), Some(json!(1)));

        first.dispose().unwrap();
        assert!(registry.get_command("app.quit").is_none());
        assert!(registry.get_commands().is_empty());
    }

    #[test]
    fn test_disposing_older_registration_keeps_newer() {
        let registry = CommandRegistry::new();
        let first = registry.register_command("a", constant(json!("old"))).unwrap();
        let _second = registry.register_command("a", constant(json!("new"))).unwrap();

        first.dispose().unwrap();
        first.dispose().unwrap();
        assert_eq!(call(&registry, "a"), Some(json!("new")));
    }

    #[test]
    fn test_empty_id_is_rejected() {
        let registry = CommandRegistry::new();
        let registered = registry.register_command("", constant(Value::Null));
        assert!(matches!(registered, Err(CommandError::InvalidId)));
        assert!(registry.get_commands().is_empty());
    }

    #[test]
    fn test_registration_is_announced() {
        let registry = CommandRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = registry
            .on_did_register_command()
            .subscribe(move |id| sink.lock().push(id.clone()));

        registry.register_command("a", constant(Value::Null)).unwrap();
        registry.register_command("b", constant(Value::Null)).unwrap();
        assert_eq!(*seen.lock(), vec!["a", "b"]);
    }

    #[test]
    fn test_get_commands_keeps_registration_order() {
        let registry = CommandRegistry::new();
        registry.register_command("z", constant(Value::Null)).unwrap();
        registry.register_command("a", constant(Value::Null)).unwrap();

        let ids: Vec<String> = registry.get_commands().into_keys().collect();
        assert_eq!(ids, vec!["z", "a"]);
    }
}
