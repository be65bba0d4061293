//! # Owners of an internal store.
//!
//! The "disposable object" pattern: a type that acquires resources keeps one
//! [`DisposableStore`], registers each acquisition into it, and disposes the
//! store from its own `dispose`. One top-level dispose then cascades through
//! everything the object ever acquired.
//!
//! ```text
//! CommandService::dispose()
//!   └─► store.dispose()
//!         ├─► on_will_execute emitter
//!         ├─► on_did_execute emitter
//!         └─► ...subscriptions, timers
//! ```
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use eventide::{Disposable, DisposableOwner, DisposableStore, DisposeError, Emitter};
//!
//! struct Window {
//!     store: DisposableStore,
//!     on_close: Arc<Emitter<()>>,
//! }
//!
//! impl Window {
//!     fn new() -> Self {
//!         let store = DisposableStore::new();
//!         let on_close = store.add(Arc::new(Emitter::new())).unwrap();
//!         Self { store, on_close }
//!     }
//! }
//!
//! impl DisposableOwner for Window {
//!     fn store(&self) -> &DisposableStore {
//!         &self.store
//!     }
//! }
//!
//! impl Disposable for Window {
//!     fn dispose(&self) -> Result<(), DisposeError> {
//!         self.store.dispose()
//!     }
//! }
//!
//! let window = Window::new();
//! window.on_close.event().subscribe(|_| {});
//! window.dispose().unwrap();
//! assert!(!window.on_close.has_listeners());
//! ```

use std::sync::Arc;

use crate::error::UsageError;
use crate::lifecycle::disposable::{Disposable, DisposableRef};
use crate::lifecycle::store::DisposableStore;

/// A disposable object that owns an internal [`DisposableStore`].
///
/// Implementors forward their [`Disposable::dispose`] to the store and use
/// [`register`](Self::register) for every resource they acquire.
pub trait DisposableOwner: Disposable {
    /// The store released by this object's `dispose`.
    fn store(&self) -> &DisposableStore;

    /// Adds `d` to the owned store.
    ///
    /// Registering the owner on itself fails with [`UsageError::SelfRegistration`].
    fn register<D>(&self, d: Arc<D>) -> Result<Arc<D>, UsageError>
    where
        D: Disposable + 'static,
        Self: Sized,
    {
        if std::ptr::eq(Arc::as_ptr(&d) as *const (), self as *const Self as *const ()) {
            return Err(UsageError::SelfRegistration);
        }
        self.store().add(d)
    }

    /// Adds an already type-erased disposable to the owned store.
    fn register_ref(&self, d: DisposableRef) -> Result<DisposableRef, UsageError>
    where
        Self: Sized,
    {
        if std::ptr::eq(Arc::as_ptr(&d) as *const (), self as *const Self as *const ()) {
            return Err(UsageError::SelfRegistration);
        }
        self.store().add_ref(d)
    }
}
