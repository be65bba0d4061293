//! # Shared ownership with a reference count.
//!
//! [`RefCountedDisposable`] is the one exception to exclusive ownership: many
//! holders share one resource, which is disposed exactly when the last holder
//! releases it.
//!
//! ## Rules
//! - The count starts at 1 (the creator's reference).
//! - `release` at count 1 disposes the wrapped resource.
//! - Once the count has reached zero the holder is spent: further `acquire`
//!   and `release` calls are ignored and logged, the count stays clamped at 0.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::DisposeError;
use crate::lifecycle::disposable::Disposable;

/// A disposable that counts references to an underlying disposable.
pub struct RefCountedDisposable<T: Disposable + ?Sized = dyn Disposable> {
    disposable: Arc<T>,
    counter: Mutex<usize>,
}

impl<T: Disposable + ?Sized> RefCountedDisposable<T> {
    /// Wraps `disposable` with a count of 1.
    pub fn new(disposable: Arc<T>) -> Self {
        Self {
            disposable,
            counter: Mutex::new(1),
        }
    }

    /// Current reference count.
    pub fn count(&self) -> usize {
        *self.counter.lock()
    }

    /// Adds a reference.
    pub fn acquire(&self) -> &Self {
        let mut counter = self.counter.lock();
        if *counter == 0 {
            tracing::warn!("acquire on a released ref-counted disposable ignored");
        } else {
            *counter += 1;
        }
        self
    }

    /// Drops a reference, disposing the wrapped resource when none remain.
    pub fn release(&self) -> Result<(), DisposeError> {
        let last = {
            let mut counter = self.counter.lock();
            match *counter {
                0 => {
                    tracing::warn!("release on a released ref-counted disposable ignored");
                    return Ok(());
                }
                n => {
                    *counter = n - 1;
                    n == 1
                }
            }
        };

        if last {
            self.disposable.dispose()
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::to_disposable;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn shared() -> (Arc<AtomicUsize>, RefCountedDisposable) {
        let runs = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&runs);
        let d = to_disposable(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (runs, RefCountedDisposable::new(d))
    }

    #[test]
    fn test_disposes_when_count_reaches_zero() {
        let (runs, rc) = shared();
        rc.acquire().acquire();
        assert_eq!(rc.count(), 3);

        rc.release().unwrap();
        rc.release().unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        rc.release().unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(rc.count(), 0);
    }

    #[test]
    fn test_over_release_is_clamped() {
        let (runs, rc) = shared();
        rc.release().unwrap();
        rc.release().unwrap();
        rc.release().unwrap();

        assert_eq!(rc.count(), 0);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_acquire_after_release_is_ignored() {
        let (runs, rc) = shared();
        rc.release().unwrap();
        rc.acquire();
        assert_eq!(rc.count(), 0);

        rc.release().unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
