//! # Default reporting channel for listener failures.
//!
//! A failing listener never stops delivery: the emitter hands the failure to
//! its [`ErrorHandler`](crate::ErrorHandler) and moves on to the next listener.
//! Unless the emitter was built with
//! [`EmitterOptions::with_error_handler`](crate::EmitterOptions::with_error_handler),
//! failures end up here and are logged through `tracing`.
//!
//! ## Example output
//! ```text
//! ERROR eventide: listener failed label="listener_panicked" error=panic: boom
//! ERROR eventide: listener failed label="listener_async_failed" error=error: connection refused
//! ```

use crate::error::ListenerError;

/// Logs a listener failure at error level.
pub fn report_listener_error(err: &ListenerError) {
    tracing::error!(
        target: "eventide",
        label = err.as_label(),
        error = %err.as_message(),
        "listener failed"
    );
}
