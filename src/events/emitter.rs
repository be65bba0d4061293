//! # The owner side of an event.
//!
//! An [`Emitter<T>`] keeps its listeners in a [`LinkedList`] (created lazily on
//! the first subscription) and exposes the subscribe side through
//! [`Emitter::event`]. Producers keep the emitter private and hand out the event.
//!
//! ## Architecture
//! ```text
//! fire(&value)
//!     │  snapshot listeners (lock held only while copying Arcs)
//!     ├──► listener 1 ──► panic? → ListenerError::Panicked → error handler
//!     ├──► listener 2
//!     └──► listener N
//! ```
//!
//! ## Rules
//! - **Snapshot delivery**: listeners added or removed during a `fire` only
//!   affect later fires; every listener present at call time is called once,
//!   in insertion order.
//! - **Isolation**: a panicking listener is reported and the remaining
//!   listeners still run; `fire` itself never panics because of a listener.
//! - **No lock across callbacks**: hooks and listeners run unlocked, so they may
//!   subscribe, unsubscribe or fire re-entrantly.
//! - **Exact unsubscription**: a subscription removes its own node only, once.
//!
//! **Warning**: `AssertUnwindSafe` is used around listener calls, which can leave
//! shared state inconsistent if a listener panics while mutating it.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;

use crate::collections::{LinkedList, NodeHandle};
use crate::error::{DisposeError, ListenerError};
use crate::events::event::{Event, Listener};
use crate::events::options::{EmitterOptions, run_hook};
use crate::events::report::report_listener_error;
use crate::lifecycle::{Disposable, DisposableRef};

/// Shared state of an emitter, reachable from its events and subscriptions.
pub(crate) struct EmitterInner<T> {
    options: EmitterOptions,
    listeners: Mutex<Option<LinkedList<Listener<T>>>>,
}

impl<T: 'static> EmitterInner<T> {
    fn subscribe(self: &Arc<Self>, listener: Listener<T>) -> DisposableRef {
        let first_listener = self
            .listeners
            .lock()
            .as_ref()
            .is_none_or(LinkedList::is_empty);

        if first_listener {
            run_hook(&self.options.on_first_listener_add);
        }

        let handle = self
            .listeners
            .lock()
            .get_or_insert_with(LinkedList::new)
            .push(listener);

        if first_listener {
            run_hook(&self.options.on_first_listener_did_add);
        }
        run_hook(&self.options.on_listener_did_add);

        Arc::new(Subscription {
            emitter: Arc::downgrade(self),
            handle,
            removed: AtomicBool::new(false),
        })
    }

    fn unsubscribe(&self, handle: NodeHandle) {
        let (removed, now_empty) = {
            let mut guard = self.listeners.lock();
            match guard.as_mut() {
                Some(list) => {
                    let removed = list.remove(handle);
                    let now_empty = removed.is_some() && list.is_empty();
                    (removed, now_empty)
                }
                None => (None, false),
            }
        };
        drop(removed);

        if now_empty {
            run_hook(&self.options.on_last_listener_remove);
        }
    }

    fn fire(&self, event: &T) {
        let snapshot: Vec<Listener<T>> = match self.listeners.lock().as_ref() {
            Some(list) => list.iter().cloned().collect(),
            None => return,
        };

        for listener in snapshot {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| listener(event))) {
                self.report(&ListenerError::from_panic(payload));
            }
        }
    }

    fn snapshot(&self) -> Option<Vec<Listener<T>>> {
        self.listeners
            .lock()
            .as_ref()
            .map(|list| list.iter().cloned().collect())
    }

    fn listener_count(&self) -> usize {
        self.listeners.lock().as_ref().map_or(0, LinkedList::len)
    }

    fn report(&self, err: &ListenerError) {
        match &self.options.on_listener_error {
            Some(handler) => handler(err),
            None => report_listener_error(err),
        }
    }

    fn clear(&self) {
        let drained: Vec<Listener<T>> = {
            let mut guard = self.listeners.lock();
            match guard.as_mut() {
                Some(list) if !list.is_empty() => std::iter::from_fn(|| list.shift()).collect(),
                _ => return,
            }
        };
        drop(drained);
        run_hook(&self.options.on_last_listener_remove);
    }
}

/// Handle returned by `subscribe`; removes its listener once.
struct Subscription<T> {
    emitter: Weak<EmitterInner<T>>,
    handle: NodeHandle,
    removed: AtomicBool,
}

impl<T: 'static> Disposable for Subscription<T> {
    fn dispose(&self) -> Result<(), DisposeError> {
        if self.removed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if let Some(emitter) = self.emitter.upgrade() {
            emitter.unsubscribe(self.handle);
        }
        Ok(())
    }
}

/// Source of events; fire it privately, expose [`event`](Emitter::event) publicly.
pub struct Emitter<T> {
    inner: Arc<EmitterInner<T>>,
    event: OnceLock<Event<T>>,
}

impl<T: 'static> Emitter<T> {
    /// Creates an emitter without hooks.
    pub fn new() -> Self {
        Self::with_options(EmitterOptions::default())
    }

    /// Creates an emitter with lifecycle hooks and/or an error handler.
    pub fn with_options(options: EmitterOptions) -> Self {
        Self {
            inner: Arc::new(EmitterInner {
                options,
                listeners: Mutex::new(None),
            }),
            event: OnceLock::new(),
        }
    }

    /// The public subscribe side. Built on first access, then shared.
    pub fn event(&self) -> Event<T> {
        self.event
            .get_or_init(|| {
                let inner = Arc::clone(&self.inner);
                Event::from_fn(move |listener| inner.subscribe(listener))
            })
            .clone()
    }

    /// Delivers `event` to every current listener.
    pub fn fire(&self, event: &T) {
        self.inner.fire(event);
    }

    /// Returns true if at least one listener is subscribed.
    pub fn has_listeners(&self) -> bool {
        self.inner.listener_count() > 0
    }

    /// Number of subscribed listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listener_count()
    }

    /// A handle that can fire without keeping the emitter alive.
    pub fn downgrade(&self) -> WeakEmitter<T> {
        WeakEmitter {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Current listeners, or `None` if nobody ever subscribed.
    pub(crate) fn snapshot(&self) -> Option<Vec<Listener<T>>> {
        self.inner.snapshot()
    }

    /// Hands `err` to this emitter's error handler.
    pub(crate) fn report(&self, err: &ListenerError) {
        self.inner.report(err);
    }
}

impl<T: 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Disposable for Emitter<T> {
    /// Removes every listener; fires `on_last_listener_remove` if there were any.
    fn dispose(&self) -> Result<(), DisposeError> {
        self.inner.clear();
        Ok(())
    }
}

/// Non-owning handle to an emitter, used by combinators and timers.
pub struct WeakEmitter<T> {
    inner: Weak<EmitterInner<T>>,
}

impl<T: 'static> WeakEmitter<T> {
    /// Fires if the emitter is still alive; returns whether it was.
    pub fn fire(&self, event: &T) -> bool {
        match self.inner.upgrade() {
            Some(inner) => {
                inner.fire(event);
                true
            }
            None => false,
        }
    }
}

impl<T> WeakEmitter<T> {
    /// An owning handle, if the emitter is still alive.
    pub(crate) fn upgrade(&self) -> Option<EmitterRef<T>> {
        self.inner.upgrade().map(|inner| EmitterRef { inner })
    }
}

impl<T> Clone for WeakEmitter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

/// Owning handle to an emitter's shared state.
///
/// Upstream listeners of derived events hold one, so a subscribed chain lives
/// until its last listener leaves even when every `Event` handle is dropped.
pub(crate) struct EmitterRef<T> {
    inner: Arc<EmitterInner<T>>,
}

impl<T: 'static> EmitterRef<T> {
    pub(crate) fn fire(&self, event: &T) {
        self.inner.fire(event);
    }

    pub(crate) fn downgrade(&self) -> WeakEmitter<T> {
        WeakEmitter {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl<T> Clone for EmitterRef<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
