//! Error types used by the event core and the disposal system.
//!
//! This module defines the error enums of the crate:
//!
//! - [`UsageError`] — programmer misuse, returned immediately to the caller.
//! - [`DisposeError`] — cleanup failures, aggregated over a bulk dispose.
//! - [`ListenerError`] — failures inside listeners; never returned from `fire`,
//!   only handed to the emitter's reporting channel.
//! - [`CommandError`] — command registry and service failures (`commands` feature).
//!
//! Every type provides helper methods (`as_label`, `as_message`) for logging.

use thiserror::Error;

/// Boxed error produced by user cleanup code and asynchronous listener work.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Errors raised on structural misuse.
///
/// These are fatal for the offending call and always reach the caller.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageError {
    /// A store or owner was asked to register itself.
    #[error("cannot register a disposable on itself")]
    SelfRegistration,

    /// `wait_until` was called after the listener's synchronous turn returned.
    #[error("wait_until can not be called asynchronously")]
    WaitUntilAfterDelivery,
}

impl UsageError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use eventide::UsageError;
    ///
    /// assert_eq!(UsageError::SelfRegistration.as_label(), "usage_self_registration");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            UsageError::SelfRegistration => "usage_self_registration",
            UsageError::WaitUntilAfterDelivery => "usage_wait_until_after_delivery",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

/// # Errors produced while disposing resources.
///
/// A bulk dispose never stops at the first failure: every owned resource gets
/// its chance to clean up, then the failures are returned together.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DisposeError {
    /// A single cleanup routine failed.
    #[error("cleanup failed: {0}")]
    Failed(#[source] BoxError),

    /// Several owned resources failed to dispose.
    #[error("encountered {} errors while disposing of store", .0.len())]
    Aggregate(Vec<DisposeError>),
}

impl DisposeError {
    /// Wraps any error as a single cleanup failure.
    pub fn failed(err: impl Into<BoxError>) -> Self {
        DisposeError::Failed(err.into())
    }

    /// Folds collected failures into one result.
    ///
    /// No failure is `Ok`, exactly one is returned as is, more become
    /// [`DisposeError::Aggregate`].
    pub fn collect(mut errors: Vec<DisposeError>) -> Result<(), DisposeError> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(DisposeError::Aggregate(errors)),
        }
    }

    /// Number of leaf failures carried by this error.
    pub fn count(&self) -> usize {
        match self {
            DisposeError::Failed(_) => 1,
            DisposeError::Aggregate(errors) => errors.iter().map(DisposeError::count).sum(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            DisposeError::Failed(_) => "dispose_failed",
            DisposeError::Aggregate(_) => "dispose_aggregate",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            DisposeError::Failed(err) => format!("cleanup failed: {err}"),
            DisposeError::Aggregate(errors) => {
                let parts: Vec<String> = errors.iter().map(DisposeError::as_message).collect();
                format!("{} failures: [{}]", errors.len(), parts.join("; "))
            }
        }
    }
}

/// # Failures raised by listeners.
///
/// Isolated per listener: the delivery loop reports them and moves on.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ListenerError {
    /// The listener panicked during synchronous delivery.
    #[error("listener panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },

    /// Work registered through `wait_until` resolved to an error.
    #[error("async listener work failed: {0}")]
    AsyncFailed(#[source] BoxError),

    /// Work registered through `wait_until` panicked while polled.
    #[error("async listener work panicked: {message}")]
    AsyncPanicked {
        /// Panic payload rendered as text.
        message: String,
    },
}

impl ListenerError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use eventide::ListenerError;
    ///
    /// let err = ListenerError::Panicked { message: "boom".into() };
    /// assert_eq!(err.as_label(), "listener_panicked");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ListenerError::Panicked { .. } => "listener_panicked",
            ListenerError::AsyncFailed(_) => "listener_async_failed",
            ListenerError::AsyncPanicked { .. } => "listener_async_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ListenerError::Panicked { message } => format!("panic: {message}"),
            ListenerError::AsyncFailed(err) => format!("error: {err}"),
            ListenerError::AsyncPanicked { message } => format!("async panic: {message}"),
        }
    }

    /// Builds a [`ListenerError::Panicked`] from a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        ListenerError::Panicked {
            message: panic_message(payload.as_ref()),
        }
    }
}

/// # Errors returned by the command registry and command service.
#[cfg(feature = "commands")]
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CommandError {
    /// No handler is registered under the id.
    #[error("command '{id}' not found")]
    NotFound {
        /// The requested command id.
        id: String,
    },

    /// A command was registered with an empty id.
    #[error("invalid command")]
    InvalidId,

    /// The handler ran and returned an error.
    #[error("command '{id}' failed: {source}")]
    Handler {
        /// The executed command id.
        id: String,
        /// The handler's error.
        #[source]
        source: BoxError,
    },
}

#[cfg(feature = "commands")]
impl CommandError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            CommandError::NotFound { .. } => "command_not_found",
            CommandError::InvalidId => "command_invalid_id",
            CommandError::Handler { .. } => "command_handler_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

/// Renders a panic payload the way `std` does for `&str` and `String` payloads.
pub(crate) fn panic_message(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
