//! Resource ownership and deterministic disposal.
//!
//! Every object that acquires a resource (subscription, timer, external
//! handle) either owns a [`DisposableStore`] (see [`DisposableOwner`]) or holds
//! one of the specialised owners below, so that a single top-level `dispose()`
//! cascades through everything.
//!
//! ## Contents
//! - [`Disposable`] the idempotent cleanup contract, [`to_disposable`] and friends
//! - [`DisposableStore`] owns a set of disposables
//! - [`DisposableOwner`] "disposable object" pattern over an internal store
//! - [`MutableDisposable`] one replaceable owned value
//! - [`RefCountedDisposable`] shared ownership released at count zero
//! - [`DisposableMap`] keyed owned values
//!
//! ## Ownership graph
//! ```text
//! Feature (DisposableOwner)
//!   └─► DisposableStore
//!         ├─► Subscription            (exclusive)
//!         ├─► MutableDisposable ──► current value
//!         ├─► DisposableMap     ──► value per key
//!         └─► RefCountedDisposable ─► shared resource (disposed at count 0)
//! ```

mod disposable;
mod map;
mod mutable;
mod owner;
mod ref_counted;
mod store;

pub(crate) use disposable::dispose_logged;
pub use disposable::{
    CallbackDisposable, Disposable, DisposableRef, NoopDisposable, combined_disposable,
    dispose_all, none, to_disposable, try_to_disposable,
};
pub use map::DisposableMap;
pub use mutable::MutableDisposable;
pub use owner::DisposableOwner;
pub use ref_counted::RefCountedDisposable;
pub use store::DisposableStore;
