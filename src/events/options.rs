//! # Construction-time configuration of an [`Emitter`](crate::Emitter).
//!
//! [`EmitterOptions`] carries the lifecycle hooks and the listener error handler.
//!
//! ## Hooks
//! ```text
//! subscribe()   count 0 → 1:  on_first_listener_add ─► insert ─► on_first_listener_did_add
//! subscribe()   always:       on_listener_did_add (after insertion)
//! unsubscribe() count 1 → 0:  remove ─► on_last_listener_remove
//! dispose()     count > 0:    clear  ─► on_last_listener_remove
//! ```
//! Hooks are zero-argument callbacks and run with no internal lock held, so a
//! hook may subscribe elsewhere or fire events.

use std::fmt;
use std::sync::Arc;

use crate::error::ListenerError;

/// Zero-argument lifecycle hook.
pub type Hook = Arc<dyn Fn() + Send + Sync>;

/// Receives failures raised by listeners.
pub type ErrorHandler = Arc<dyn Fn(&ListenerError) + Send + Sync>;

/// Options for configuring an emitter.
///
/// Every field is optional; unset hooks are skipped and an unset error handler
/// falls back to [`report_listener_error`](crate::report_listener_error).
#[derive(Clone, Default)]
pub struct EmitterOptions {
    pub(crate) on_first_listener_add: Option<Hook>,
    pub(crate) on_first_listener_did_add: Option<Hook>,
    pub(crate) on_listener_did_add: Option<Hook>,
    pub(crate) on_last_listener_remove: Option<Hook>,
    pub(crate) on_listener_error: Option<ErrorHandler>,
}

impl EmitterOptions {
    /// Options with no hook set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Called *before* the very first listener is added.
    #[must_use]
    pub fn with_first_listener_add(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_first_listener_add = Some(Arc::new(f));
        self
    }

    /// Called *after* the very first listener is added.
    #[must_use]
    pub fn with_first_listener_did_add(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_first_listener_did_add = Some(Arc::new(f));
        self
    }

    /// Called after any listener is added.
    #[must_use]
    pub fn with_listener_did_add(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_listener_did_add = Some(Arc::new(f));
        self
    }

    /// Called *after* the very last listener is removed.
    #[must_use]
    pub fn with_last_listener_remove(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_last_listener_remove = Some(Arc::new(f));
        self
    }

    /// Routes listener failures to `f` instead of the default reporter.
    #[must_use]
    pub fn with_error_handler(mut self, f: impl Fn(&ListenerError) + Send + Sync + 'static) -> Self {
        self.on_listener_error = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for EmitterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmitterOptions")
            .field("on_first_listener_add", &self.on_first_listener_add.is_some())
            .field("on_first_listener_did_add", &self.on_first_listener_did_add.is_some())
            .field("on_listener_did_add", &self.on_listener_did_add.is_some())
            .field("on_last_listener_remove", &self.on_last_listener_remove.is_some())
            .field("on_listener_error", &self.on_listener_error.is_some())
            .finish()
    }
}

/// Runs an optional hook.
#[inline]
pub(crate) fn run_hook(hook: &Option<Hook>) {
    if let Some(hook) = hook {
        hook();
    }
}
