//! # A stable event over a swappable input.
//!
//! Subscribers of [`Relay::event`] keep their subscription while the input is
//! replaced with [`Relay::set_input`]. The input is only subscribed to while
//! the relay itself has listeners.
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use eventide::{Emitter, Relay};
//!
//! let first = Emitter::<&'static str>::new();
//! let second = Emitter::<&'static str>::new();
//! let relay = Relay::<&'static str>::new();
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! let _sub = relay.event().subscribe(move |v| sink.lock().push(*v));
//!
//! relay.set_input(first.event());
//! first.fire(&"a");
//! relay.set_input(second.event());
//! first.fire(&"ignored");
//! second.fire(&"b");
//!
//! assert_eq!(*seen.lock(), vec!["a", "b"]);
//! ```

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::error::DisposeError;
use crate::events::emitter::{Emitter, WeakEmitter};
use crate::events::event::Event;
use crate::events::options::EmitterOptions;
use crate::lifecycle::{Disposable, DisposableRef, dispose_logged};

struct RelayState<T> {
    listening: bool,
    input: Event<T>,
    input_listener: Option<DisposableRef>,
}

/// Forwards whichever input event is current.
pub struct Relay<T> {
    emitter: Emitter<T>,
    state: Arc<Mutex<RelayState<T>>>,
    target: Arc<OnceLock<WeakEmitter<T>>>,
}

impl<T: 'static> Relay<T> {
    /// Creates a relay whose input never fires.
    pub fn new() -> Self {
        let state = Arc::new(Mutex::new(RelayState {
            listening: false,
            input: Event::none(),
            input_listener: None,
        }));
        let target: Arc<OnceLock<WeakEmitter<T>>> = Arc::new(OnceLock::new());

        let options = EmitterOptions::new()
            .with_first_listener_did_add({
                let state = Arc::clone(&state);
                let target = Arc::clone(&target);
                move || {
                    let input = {
                        let mut state = state.lock();
                        state.listening = true;
                        state.input.clone()
                    };
                    if let Some(target) = target.get() {
                        attach(&state, target, &input);
                    }
                }
            })
            .with_last_listener_remove({
                let state = Arc::clone(&state);
                move || {
                    let listener = {
                        let mut state = state.lock();
                        state.listening = false;
                        state.input_listener.take()
                    };
                    if let Some(listener) = listener {
                        dispose_logged(&listener, "relay_unhook");
                    }
                }
            });

        let emitter = Emitter::with_options(options);
        let _ = target.set(emitter.downgrade());
        Self {
            emitter,
            state,
            target,
        }
    }

    /// The stable output event.
    pub fn event(&self) -> Event<T> {
        self.emitter.event()
    }

    /// The current input event.
    pub fn input(&self) -> Event<T> {
        self.state.lock().input.clone()
    }

    /// Replaces the input; while listening, moves the subscription over.
    pub fn set_input(&self, input: Event<T>) {
        let (listening, previous) = {
            let mut state = self.state.lock();
            state.input = input.clone();
            (state.listening, state.input_listener.take())
        };
        if let Some(previous) = previous {
            dispose_logged(&previous, "relay_switch");
        }
        if listening {
            if let Some(target) = self.target.get() {
                attach(&self.state, target, &input);
            }
        }
    }
}

impl<T: 'static> Default for Relay<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Disposable for Relay<T> {
    fn dispose(&self) -> Result<(), DisposeError> {
        let listener = self.state.lock().input_listener.take();
        if let Some(listener) = listener {
            dispose_logged(&listener, "relay_dispose");
        }
        self.emitter.dispose()
    }
}

fn attach<T: 'static>(state: &Mutex<RelayState<T>>, target: &WeakEmitter<T>, input: &Event<T>) {
    let Some(target) = target.upgrade() else {
        return;
    };
    let subscription = input.subscribe(move |value| {
        target.fire(value);
    });

    let stale = {
        let mut state = state.lock();
        if state.listening {
            state.input_listener.replace(subscription)
        } else {
            Some(subscription)
        }
    };
    if let Some(stale) = stale {
        dispose_logged(&stale, "relay_hook");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_hooked_only_while_listening() {
        let source = Emitter::<u8>::new();
        let relay = Relay::new();
        relay.set_input(source.event());
        assert!(!source.has_listeners());

        let sub = relay.event().subscribe(|_| {});
        assert!(source.has_listeners());

        sub.dispose().unwrap();
        assert!(!source.has_listeners());
    }

    #[test]
    fn test_switching_input_keeps_subscribers() {
        let a = Emitter::<u8>::new();
        let b = Emitter::<u8>::new();
        let relay = Relay::new();
        relay.set_input(a.event());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = relay.event().subscribe(move |v| sink.lock().push(*v));

        a.fire(&1);
        relay.set_input(b.event());
        assert!(!a.has_listeners());
        a.fire(&2);
        b.fire(&3);
        assert_eq!(*seen.lock(), vec![1, 3]);
    }

    #[test]
    fn test_dispose_unhooks_input() {
        let source = Emitter::<u8>::new();
        let relay = Relay::new();
        relay.set_input(source.event());
        let _sub = relay.event().subscribe(|_| {});

        relay.dispose().unwrap();
        assert!(!source.has_listeners());
        assert!(!relay.emitter.has_listeners());
    }
}
