//! # The subscribe-only face of an emitter.
//!
//! An [`Event<T>`] is what producers hand out: consumers can subscribe to it,
//! but only the owner of the [`Emitter`](crate::Emitter) can fire it.
//! Subscribing returns a [`DisposableRef`]; disposing it removes exactly that
//! listener, and disposing it again does nothing.
//!
//! Events are cheap to clone (one `Arc`) and may be built from any subscribe
//! function via [`Event::from_fn`], which is how the combinators chain.
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use eventide::{Disposable, DisposableStore, Emitter};
//!
//! let emitter = Emitter::<u32>::new();
//! let store = DisposableStore::new();
//! let total = Arc::new(AtomicUsize::new(0));
//!
//! let sink = Arc::clone(&total);
//! emitter.event().subscribe_in(move |n| {
//!     sink.fetch_add(*n as usize, Ordering::SeqCst);
//! }, &store);
//!
//! emitter.fire(&2);
//! store.dispose().unwrap();
//! emitter.fire(&40);
//! assert_eq!(total.load(Ordering::SeqCst), 2);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::lifecycle::{DisposableRef, DisposableStore, none};

/// Shared listener callback.
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

type SubscribeFn<T> = dyn Fn(Listener<T>) -> DisposableRef + Send + Sync;

/// An event that can be subscribed to.
pub struct Event<T> {
    subscribe: Arc<SubscribeFn<T>>,
}

impl<T: 'static> Event<T> {
    /// Builds an event from a subscribe function.
    pub fn from_fn(f: impl Fn(Listener<T>) -> DisposableRef + Send + Sync + 'static) -> Self {
        Self {
            subscribe: Arc::new(f),
        }
    }

    /// An event that never fires.
    pub fn none() -> Self {
        Self::from_fn(|_| none())
    }

    /// Adds `listener`; dispose the returned handle to remove it.
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> DisposableRef {
        self.subscribe_listener(Arc::new(listener))
    }

    /// Adds an already shared listener.
    pub fn subscribe_listener(&self, listener: Listener<T>) -> DisposableRef {
        (self.subscribe)(listener)
    }

    /// Subscribes and hands the subscription to `store`.
    pub fn subscribe_in(
        &self,
        listener: impl Fn(&T) + Send + Sync + 'static,
        store: &DisposableStore,
    ) -> DisposableRef {
        let subscription = self.subscribe(listener);
        store.track(subscription.clone());
        subscription
    }

    /// Subscribes and pushes the subscription onto `disposables`.
    pub fn subscribe_into(
        &self,
        listener: impl Fn(&T) + Send + Sync + 'static,
        disposables: &mut Vec<DisposableRef>,
    ) -> DisposableRef {
        let subscription = self.subscribe(listener);
        disposables.push(subscription.clone());
        subscription
    }
}

impl<T> Clone for Event<T> {
    fn clone(&self) -> Self {
        Self {
            subscribe: Arc::clone(&self.subscribe),
        }
    }
}

impl<T> fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{Disposable, to_disposable};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_none_never_fires() {
        let event = Event::<u8>::none();
        let d = event.subscribe(|_| panic!("must not fire"));
        assert!(d.dispose().is_ok());
    }

    #[test]
    fn test_from_fn_forwards_listener() {
        let calls = Arc::new(AtomicUsize::new(0));
        let event = Event::<u8>::from_fn(|listener| {
            listener(&7);
            to_disposable(|| {})
        });

        let c = Arc::clone(&calls);
        event.subscribe(move |v| {
            assert_eq!(*v, 7);
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscribe_into_tracks_handle() {
        let event = Event::<u8>::none();
        let mut handles = Vec::new();
        event.subscribe_into(|_| {}, &mut handles);
        event.subscribe_into(|_| {}, &mut handles);
        assert_eq!(handles.len(), 2);
    }
}
