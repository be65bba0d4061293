//! # Tunables for the timer-driven combinators.
//!
//! [`DebounceConfig`] controls [`debounce`](crate::debounce) and
//! [`BufferConfig`] controls [`buffer`](crate::buffer).
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use eventide::{BufferConfig, DebounceConfig};
//!
//! let mut cfg = DebounceConfig::default();
//! cfg.delay = Duration::from_millis(250);
//! cfg.leading = true;
//!
//! assert!(!BufferConfig::default().flush_after_timeout);
//! assert_eq!(cfg.delay, Duration::from_millis(250));
//! ```

use std::time::Duration;

/// Configuration for [`debounce`](crate::debounce).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebounceConfig {
    /// Quiet period after the last upstream value before the merged value is emitted.
    pub delay: Duration,
    /// Emit the first value of a quiet period immediately.
    pub leading: bool,
}

impl DebounceConfig {
    /// Config with the given delay and no leading emission.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Sets leading emission.
    #[must_use]
    pub fn leading(mut self, leading: bool) -> Self {
        self.leading = leading;
        self
    }
}

impl Default for DebounceConfig {
    /// Provides a default configuration:
    /// - `delay = 100ms`
    /// - `leading = false`
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(100),
            leading: false,
        }
    }
}

/// Configuration for [`buffer`](crate::buffer).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BufferConfig {
    /// Flush buffered values on the next scheduler tick instead of inside
    /// the first `subscribe` call. Defaults to `false`.
    pub flush_after_timeout: bool,
}
