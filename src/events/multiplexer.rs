//! # Many sources, one event.
//!
//! [`EventMultiplexer`] forwards values from every added source event to its
//! own [`event`](EventMultiplexer::event).
//!
//! ```text
//! source A ──┐
//! source B ──┼──► multiplexer emitter ──► listeners
//! source C ──┘
//! ```
//!
//! ## Rules
//! - Sources are hooked only while the multiplexer has listeners; a source
//!   added meanwhile is hooked immediately.
//! - Disposing the handle returned by [`add`](EventMultiplexer::add) unhooks
//!   that source and forgets it.

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::error::DisposeError;
use crate::events::emitter::{Emitter, WeakEmitter};
use crate::events::event::Event;
use crate::events::options::EmitterOptions;
use crate::lifecycle::{Disposable, DisposableRef, dispose_logged, to_disposable};

struct Source<T> {
    id: u64,
    event: Event<T>,
    listener: Option<DisposableRef>,
}

struct MuxState<T> {
    has_listeners: bool,
    sources: Vec<Source<T>>,
    next_id: u64,
}

type SharedState<T> = Arc<Mutex<MuxState<T>>>;

/// Merges any number of events into one.
pub struct EventMultiplexer<T> {
    emitter: Emitter<T>,
    state: SharedState<T>,
}

impl<T: 'static> EventMultiplexer<T> {
    /// Creates a multiplexer with no sources.
    pub fn new() -> Self {
        let state: SharedState<T> = Arc::new(Mutex::new(MuxState {
            has_listeners: false,
            sources: Vec::new(),
            next_id: 0,
        }));
        let target: Arc<OnceLock<WeakEmitter<T>>> = Arc::new(OnceLock::new());

        let options = EmitterOptions::new()
            .with_first_listener_add({
                let state = Arc::clone(&state);
                let target = Arc::clone(&target);
                move || {
                    if let Some(target) = target.get() {
                        hook_all(&state, target);
                    }
                }
            })
            .with_last_listener_remove({
                let state = Arc::clone(&state);
                move || unhook_all(&state)
            });

        let emitter = Emitter::with_options(options);
        let _ = target.set(emitter.downgrade());
        Self { emitter, state }
    }

    /// The merged event.
    pub fn event(&self) -> Event<T> {
        self.emitter.event()
    }

    /// Adds a source; dispose the result to remove it again.
    pub fn add(&self, event: Event<T>) -> DisposableRef {
        let (id, listening) = {
            let mut state = self.state.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.sources.push(Source {
                id,
                event: event.clone(),
                listener: None,
            });
            (id, state.has_listeners)
        };

        if listening {
            hook(&self.state, &self.emitter.downgrade(), id, event);
        }

        let state = Arc::downgrade(&self.state);
        to_disposable(move || {
            let Some(state) = state.upgrade() else {
                return;
            };
            let removed = {
                let mut state = state.lock();
                state
                    .sources
                    .iter()
                    .position(|source| source.id == id)
                    .map(|idx| state.sources.remove(idx))
            };
            if let Some(listener) = removed.and_then(|source| source.listener) {
                dispose_logged(&listener, "multiplexer_remove");
            }
        })
    }

    /// Number of registered sources.
    pub fn source_count(&self) -> usize {
        self.state.lock().sources.len()
    }
}

impl<T: 'static> Default for EventMultiplexer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Disposable for EventMultiplexer<T> {
    /// Removes every listener and every source.
    fn dispose(&self) -> Result<(), DisposeError> {
        let result = self.emitter.dispose();
        unhook_all(&self.state);
        self.state.lock().sources.clear();
        result
    }
}

fn hook_all<T: 'static>(state: &Mutex<MuxState<T>>, target: &WeakEmitter<T>) {
    let unhooked: Vec<(u64, Event<T>)> = {
        let mut state = state.lock();
        state.has_listeners = true;
        state
            .sources
            .iter()
            .filter(|source| source.listener.is_none())
            .map(|source| (source.id, source.event.clone()))
            .collect()
    };
    for (id, event) in unhooked {
        hook(state, target, id, event);
    }
}

fn hook<T: 'static>(state: &Mutex<MuxState<T>>, target: &WeakEmitter<T>, id: u64, event: Event<T>) {
    let Some(target) = target.upgrade() else {
        return;
    };
    let subscription = event.subscribe(move |value| {
        target.fire(value);
    });

    let orphan = {
        let mut state = state.lock();
        let listening = state.has_listeners;
        match state.sources.iter_mut().find(|source| source.id == id) {
            Some(source) if listening && source.listener.is_none() => {
                source.listener = Some(subscription);
                None
            }
            _ => Some(subscription),
        }
    };
    if let Some(orphan) = orphan {
        dispose_logged(&orphan, "multiplexer_hook");
    }
}

fn unhook_all<T>(state: &Mutex<MuxState<T>>) {
    let listeners: Vec<DisposableRef> = {
        let mut state = state.lock();
        state.has_listeners = false;
        state
            .sources
            .iter_mut()
            .filter_map(|source| source.listener.take())
            .collect()
    };
    for listener in listeners {
        dispose_logged(&listener, "multiplexer_unhook");
    }
}
