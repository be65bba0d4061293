//! # Single replaceable owned resource.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::DisposeError;
use crate::lifecycle::disposable::{Disposable, dispose_logged};

struct Slot<T: ?Sized> {
    value: Option<Arc<T>>,
    disposed: bool,
}

/// Holds zero or one disposable and disposes it when it gets replaced.
///
/// ### Rules
/// - Setting a new value disposes the previous one first.
/// - Setting the value that is already held (same allocation) is a no-op.
/// - After [`dispose`](Disposable::dispose) reads report `None` and further
///   assignments dispose the offered value right away with a leak warning.
pub struct MutableDisposable<T: Disposable + ?Sized = dyn Disposable> {
    slot: Mutex<Slot<T>>,
}

impl<T: Disposable + ?Sized> MutableDisposable<T> {
    /// Creates an empty holder.
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                value: None,
                disposed: false,
            }),
        }
    }

    /// Current value, or `None` when empty or disposed.
    pub fn value(&self) -> Option<Arc<T>> {
        let slot = self.slot.lock();
        if slot.disposed {
            None
        } else {
            slot.value.clone()
        }
    }

    /// Replaces the held value, disposing the previous one.
    pub fn set(&self, value: Option<Arc<T>>) -> Result<(), DisposeError> {
        let previous = {
            let mut slot = self.slot.lock();
            if slot.disposed {
                drop(slot);
                if let Some(value) = value {
                    tracing::warn!("setting value on already disposed holder; leaking object");
                    dispose_logged(&value, "disposed_mutable_set");
                }
                return Ok(());
            }
            let same = match (&slot.value, &value) {
                (Some(current), Some(next)) => Arc::ptr_eq(current, next),
                (None, None) => true,
                _ => false,
            };
            if same {
                return Ok(());
            }
            std::mem::replace(&mut slot.value, value)
        };

        match previous {
            Some(previous) => previous.dispose(),
            None => Ok(()),
        }
    }

    /// Disposes and drops the held value; the holder stays usable.
    pub fn clear(&self) -> Result<(), DisposeError> {
        self.set(None)
    }

    /// Returns true once the holder has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.slot.lock().disposed
    }
}

impl<T: Disposable + ?Sized> Default for MutableDisposable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Disposable + ?Sized> Disposable for MutableDisposable<T> {
    fn dispose(&self) -> Result<(), DisposeError> {
        let value = {
            let mut slot = self.slot.lock();
            slot.disposed = true;
            slot.value.take()
        };
        match value {
            Some(value) => value.dispose(),
            None => Ok(()),
        }
    }
}
