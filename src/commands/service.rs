//! # Command execution.
//!
//! ```text
//! execute_command(id, args)
//!   ├─ lookup in registry ── missing? CommandError::NotFound
//!   ├─ fire on_will_execute_command
//!   ├─ run handler ───────── Err? CommandError::Handler (no did-execute)
//!   └─ fire on_did_execute_command ─► Ok(result)
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::commands::command::CommandEvent;
use crate::commands::registry::CommandRegistry;
use crate::error::{CommandError, DisposeError};
use crate::events::{Emitter, Event};
use crate::lifecycle::{Disposable, DisposableOwner, DisposableStore};

/// Executes registered commands and announces every execution.
pub struct CommandService {
    store: DisposableStore,
    registry: Arc<CommandRegistry>,
    on_will_execute_command: Arc<Emitter<CommandEvent>>,
    on_did_execute_command: Arc<Emitter<CommandEvent>>,
}

impl CommandService {
    /// Creates a service over `registry`.
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        let service = Self {
            store: DisposableStore::new(),
            registry,
            on_will_execute_command: Arc::new(Emitter::new()),
            on_did_execute_command: Arc::new(Emitter::new()),
        };
        service.store.track(service.on_will_execute_command.clone());
        service.store.track(service.on_did_execute_command.clone());
        service
    }

    /// The registry commands are looked up in.
    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Fires before a handler runs.
    pub fn on_will_execute_command(&self) -> Event<CommandEvent> {
        self.on_will_execute_command.event()
    }

    /// Fires after a handler returned successfully.
    pub fn on_did_execute_command(&self) -> Event<CommandEvent> {
        self.on_did_execute_command.event()
    }

    /// Runs the current handler of `id` with `args`.
    pub fn execute_command(&self, id: &str, args: Vec<Value>) -> Result<Value, CommandError> {
        let command = self
            .registry
            .get_command(id)
            .ok_or_else(|| CommandError::NotFound { id: id.to_string() })?;

        let event = CommandEvent {
            command_id: id.to_string(),
            args,
        };
        self.on_will_execute_command.fire(&event);

        let result = (command.handler)(&event.args).map_err(|source| {
            tracing::debug!(command = %id, error = %source, "command failed");
            CommandError::Handler {
                id: id.to_string(),
                source,
            }
        })?;

        self.on_did_execute_command.fire(&event);
        Ok(result)
    }
}

impl DisposableOwner for CommandService {
    fn store(&self) -> &DisposableStore {
        &self.store
    }
}

impl Disposable for CommandService {
    fn dispose(&self) -> Result<(), DisposeError> {
        self.store.dispose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    fn service() -> Arc<CommandService> {
        Arc::new(CommandService::new(Arc::new(CommandRegistry::new())))
    }

    #[test]
    fn test_execute_runs_handler_between_events() {
        let service = service();
        let log = Arc::new(Mutex::new(Vec::new()));

        {
            let log = Arc::clone(&log);
            service
                .registry()
                .register_command("sum", move |args| {
                    log.lock().push("handler".to_string());
                    let total: i64 = args.iter().filter_map(Value::as_i64).sum();
                    Ok(json!(total))
                })
                .unwrap();
        }
        {
            let log = Arc::clone(&log);
            service
                .on_will_execute_command()
                .subscribe(move |e| log.lock().push(format!("will {}", e.command_id)));
        }
        {
            let log = Arc::clone(&log);
            service
                .on_did_execute_command()
                .subscribe(move |e| log.lock().push(format!("did {}", e.args.len())));
        }

        let result = service.execute_command("sum", vec![json!(2), json!(3)]).unwrap();
        assert_eq!(result, json!(5));
        assert_eq!(*log.lock(), vec!["will sum", "handler", "did 2"]);
    }

    #[test]
    fn test_unknown_command_is_not_found() {
        let service = service();
        let err = service.execute_command("missing", Vec::new()).unwrap_err();
        assert_eq!(err.as_label(), "command_not_found");
    }

    #[test]
    fn test_handler_error_skips_did_execute() {
        let service = service();
        service
            .registry()
            .register_command("fail", |_| Err("nope".into()))
            .unwrap();
        let did = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&did);
        service
            .on_did_execute_command()
            .subscribe(move |_| *counter.lock() += 1);

        let err = service.execute_command("fail", Vec::new()).unwrap_err();
        assert!(matches!(err, CommandError::Handler { .. }));
        assert_eq!(*did.lock(), 0);
    }

    #[test]
    fn test_alias_forwards_to_target() {
        let service = service();
        let registry = Arc::clone(service.registry());
        registry
            .register_command("window.new", |args| Ok(json!({ "opened": args.len() })))
            .unwrap();
        registry
            .register_command_alias("newWindow", "window.new", &service)
            .unwrap();

        let result = service.execute_command("newWindow", vec![json!(1)]).unwrap();
        assert_eq!(result, json!({ "opened": 1 }));
    }

    #[test]
    fn test_dispose_releases_listeners() {
        let service = service();
        service.on_will_execute_command().subscribe(|_| {});
        assert!(service.on_will_execute_command.has_listeners());

        service.dispose().unwrap();
        assert!(!service.on_will_execute_command.has_listeners());
        assert!(service.store().is_disposed());
    }
}
