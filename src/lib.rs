//! # eventide
//!
//! **Eventide** is a typed event and resource-lifecycle library for Rust.
//!
//! It provides a publish/subscribe primitive ([`Emitter`] / [`Event`]), lazy
//! event combinators, sequential async delivery with `wait_until`, and a
//! disposal system that makes teardown deterministic: every subscription,
//! timer or handle is owned by exactly one store, and one top-level
//! `dispose()` cascades through all of them.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐                     ┌──────────────────────────────┐
//!     │   producer   │ owns                │          consumer            │
//!     │  Emitter<T>  │──── event() ───────►│ event.subscribe(listener)    │
//!     └──────┬───────┘                     │   └─► DisposableRef          │
//!            │ fire(&value)                └──────────────┬───────────────┘
//!            ▼                                            │ registered in
//! ┌────────────────────────────────┐       ┌──────────────▼───────────────┐
//! │ LinkedList<Listener<T>>        │       │ DisposableStore              │
//! │ (snapshot, insertion order,    │       │  ├─ subscriptions            │
//! │  panics reported per listener) │       │  ├─ MutableDisposable        │
//! └────────────────────────────────┘       │  ├─ DisposableMap            │
//!                                          │  └─ RefCountedDisposable     │
//!                                          └──────────────┬───────────────┘
//!                                                         ▼
//!                                              owner.dispose() cascades
//! ```
//!
//! ### Derived events
//! ```text
//! source ──► map / filter / debounce / buffer ──► derived event
//!            (upstream hooked only while the derived event has listeners)
//!
//! source A ─┐
//! source B ─┼─► EventMultiplexer ──► one event
//!
//! input (swappable) ──► Relay ──► stable event
//! ```
//!
//! ## Features
//! | Area            | Description                                                   | Key types / functions                                  |
//! |-----------------|---------------------------------------------------------------|--------------------------------------------------------|
//! | **Events**      | Typed emitters, lifecycle hooks, isolated listener failures.  | [`Emitter`], [`Event`], [`EmitterOptions`]             |
//! | **Combinators** | Lazily hooked derived events.                                 | [`map`], [`filter`], [`debounce`], [`buffer`]          |
//! | **Async**       | FIFO async delivery with `wait_until` and cancellation.       | [`AsyncEmitter`], [`WaitUntilEvent`]                   |
//! | **Routing**     | Fan-in and swappable inputs.                                  | [`EventMultiplexer`], [`Relay`]                        |
//! | **Lifecycle**   | Idempotent disposal, stores, owners and shared ownership.     | [`Disposable`], [`DisposableStore`], [`DisposableOwner`] |
//! | **Errors**      | Typed errors for misuse, disposal and listener failures.      | [`UsageError`], [`DisposeError`], [`ListenerError`]    |
//! | **Configuration** | Debounce and buffer tunables.                               | [`DebounceConfig`], [`BufferConfig`]                   |
//!
//! ## Optional features
//! - `commands` (default): command registry and command service over JSON values.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use eventide::{Disposable, DisposableStore, Emitter, EmitterOptions};
//!
//! let emitter = Emitter::<String>::with_options(
//!     EmitterOptions::new().with_first_listener_add(|| tracing::debug!("now observed")),
//! );
//! let store = DisposableStore::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let sink = Arc::clone(&seen);
//! emitter
//!     .event()
//!     .map(|s: &String| s.len())
//!     .subscribe_in(move |len| sink.lock().push(*len), &store);
//!
//! emitter.fire(&"hello".to_string());
//! store.dispose().unwrap();
//! emitter.fire(&"ignored".to_string());
//!
//! assert_eq!(*seen.lock(), vec![5]);
//! assert!(!emitter.has_listeners());
//! ```
mod collections;
mod config;
mod error;
mod events;
mod lifecycle;

// ---- Public re-exports ----

pub use collections::{Iter, LinkedList, NodeHandle};
pub use config::{BufferConfig, DebounceConfig};
pub use error::{BoxError, DisposeError, ListenerError, UsageError};
pub use events::{
    AsyncEmitter, Emitter, EmitterOptions, ErrorHandler, Event, EventMultiplexer, Hook, Listener,
    PromiseJoin, Relay, WaitUntilEvent, WaitUntilFuture, WeakEmitter, buffer, debounce, filter,
    map, report_listener_error,
};
pub use lifecycle::{
    CallbackDisposable, Disposable, DisposableMap, DisposableOwner, DisposableRef, DisposableStore,
    MutableDisposable, NoopDisposable, RefCountedDisposable, combined_disposable, dispose_all, none,
    to_disposable, try_to_disposable,
};

// Optional: command registry and service.
// Enabled by default; disable with `default-features = false`.
#[cfg(feature = "commands")]
mod commands;
#[cfg(feature = "commands")]
pub use commands::{
    Command, CommandArg, CommandEvent, CommandHandler, CommandMetadata, CommandRegistry,
    CommandService,
};
#[cfg(feature = "commands")]
pub use error::CommandError;
