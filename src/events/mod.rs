//! Typed publish/subscribe.
//!
//! Producers own an [`Emitter`] and hand out its [`Event`]; consumers subscribe
//! and get back a [`DisposableRef`](crate::DisposableRef) that removes exactly
//! their listener.
//!
//! ## Contents
//! - [`Emitter`] / [`Event`] the core pair, configured with [`EmitterOptions`]
//! - [`map`], [`filter`], [`debounce`], [`buffer`] lazy combinators
//! - [`AsyncEmitter`] sequential async delivery with `wait_until`
//! - [`EventMultiplexer`] many sources into one event
//! - [`Relay`] one stable event over a swappable input
//!
//! ## Failure reporting
//! ```text
//! listener panic / async Err ──► ListenerError ──► EmitterOptions::with_error_handler
//!                                                  └─ default: report_listener_error (tracing)
//! ```

mod async_emitter;
mod combinators;
mod emitter;
mod event;
mod multiplexer;
mod options;
mod relay;
mod report;

pub use async_emitter::{AsyncEmitter, PromiseJoin, WaitUntilEvent, WaitUntilFuture};
pub use combinators::{buffer, debounce, filter, map};
pub use emitter::{Emitter, WeakEmitter};
pub use event::{Event, Listener};
pub use multiplexer::EventMultiplexer;
pub use options::{EmitterOptions, ErrorHandler, Hook};
pub use relay::Relay;
pub use report::report_listener_error;
