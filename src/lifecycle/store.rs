//! # Collection owner for disposables.
//!
//! [`DisposableStore`] owns a set of disposables (keyed by identity, kept in
//! insertion order) and releases them all at once.
//!
//! ## Rules
//! - `add` of the store to itself fails with [`UsageError::SelfRegistration`].
//! - `dispose` releases every entry and marks the store terminally disposed.
//! - `clear` releases every entry but keeps the store usable.
//! - `add` on a disposed store disposes the incoming resource immediately and
//!   logs a leak warning; nothing live is ever silently dropped.
//! - A failing entry never prevents the others from being disposed; failures
//!   come back together (see [`DisposeError::collect`]).
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use eventide::{Disposable, DisposableStore, to_disposable};
//!
//! let runs = Arc::new(AtomicUsize::new(0));
//! let store = DisposableStore::new();
//! let counter = Arc::clone(&runs);
//! store.add_ref(to_disposable(move || {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! })).unwrap();
//!
//! store.dispose().unwrap();
//! store.dispose().unwrap();
//! assert_eq!(runs.load(Ordering::SeqCst), 1);
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::error::{DisposeError, UsageError};
use crate::lifecycle::disposable::{Disposable, DisposableRef, dispose_all, dispose_logged};

#[derive(Default)]
struct StoreState {
    to_dispose: IndexMap<usize, DisposableRef>,
    disposed: bool,
}

/// Manages a collection of disposable values.
#[derive(Default)]
pub struct DisposableStore {
    state: Mutex<StoreState>,
}

/// Identity key of a shared disposable (its allocation address).
#[inline]
fn identity(d: &DisposableRef) -> usize {
    Arc::as_ptr(d) as *const () as usize
}

impl DisposableStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once [`dispose`](Disposable::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    /// Number of owned entries.
    pub fn len(&self) -> usize {
        self.state.lock().to_dispose.len()
    }

    /// Returns true if the store owns nothing.
    pub fn is_empty(&self) -> bool {
        self.state.lock().to_dispose.is_empty()
    }

    /// Takes ownership of `d` and hands the typed handle back.
    pub fn add<D: Disposable + 'static>(&self, d: Arc<D>) -> Result<Arc<D>, UsageError> {
        let erased: DisposableRef = d.clone();
        self.add_ref(erased)?;
        Ok(d)
    }

    /// Takes ownership of an already type-erased disposable.
    pub fn add_ref(&self, d: DisposableRef) -> Result<DisposableRef, UsageError> {
        if identity(&d) == self as *const Self as usize {
            return Err(UsageError::SelfRegistration);
        }
        self.track(d.clone());
        Ok(d)
    }

    /// Adds an entry that is known not to be the store itself.
    pub(crate) fn track(&self, d: DisposableRef) {
        let rejected = {
            let mut state = self.state.lock();
            if state.disposed {
                Some(d)
            } else {
                state.to_dispose.insert(identity(&d), d);
                None
            }
        };

        if let Some(d) = rejected {
            tracing::warn!("adding disposable to already disposed store; leaking object");
            dispose_logged(&d, "disposed_store_add");
        }
    }

    /// Disposes every entry without marking the store disposed.
    pub fn clear(&self) -> Result<(), DisposeError> {
        let entries = std::mem::take(&mut self.state.lock().to_dispose);
        dispose_all(entries.into_values())
    }
}

impl Disposable for DisposableStore {
    fn dispose(&self) -> Result<(), DisposeError> {
        {
            let mut state = self.state.lock();
            if state.disposed {
                return Ok(());
            }
            state.disposed = true;
        }
        self.clear()
    }
}
