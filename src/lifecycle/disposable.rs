//! # The disposal contract.
//!
//! [`Disposable`] is implemented by everything that holds a resource: event
//! subscriptions, timers, stores, emitters. Disposing is the only mutation an
//! outside party may perform on such an object, so the contract is strict:
//!
//! - `dispose()` is **idempotent**: the second call observes the same end state
//!   and never re-runs cleanup.
//! - `dispose()` takes `&self`; disposables are shared through [`Arc`] and use
//!   interior mutability.
//! - Failures are returned as [`DisposeError`], never swallowed.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{BoxError, DisposeError};

/// An object that performs a cleanup operation when [`dispose`](Disposable::dispose) is called.
pub trait Disposable: Send + Sync {
    /// Releases the resource. Calling it again is a no-op.
    fn dispose(&self) -> Result<(), DisposeError>;
}

/// Type-erased shared disposable, the currency of stores and subscriptions.
pub type DisposableRef = Arc<dyn Disposable>;

impl<T: Disposable + ?Sized> Disposable for Arc<T> {
    fn dispose(&self) -> Result<(), DisposeError> {
        (**self).dispose()
    }
}

type Cleanup = Box<dyn FnOnce() -> Result<(), BoxError> + Send>;

/// Disposable backed by a cleanup closure that runs at most once.
pub struct CallbackDisposable {
    cleanup: Mutex<Option<Cleanup>>,
}

impl CallbackDisposable {
    fn new(cleanup: Cleanup) -> Self {
        Self {
            cleanup: Mutex::new(Some(cleanup)),
        }
    }

    /// Returns true once the cleanup closure has been taken.
    pub fn is_disposed(&self) -> bool {
        self.cleanup.lock().is_none()
    }
}

impl Disposable for CallbackDisposable {
    fn dispose(&self) -> Result<(), DisposeError> {
        let cleanup = self.cleanup.lock().take();
        match cleanup {
            Some(f) => f().map_err(DisposeError::Failed),
            None => Ok(()),
        }
    }
}

/// Turns a cleanup closure into a [`Disposable`] that runs it at most once.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use eventide::{Disposable, to_disposable};
///
/// let runs = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&runs);
/// let d = to_disposable(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// d.dispose().unwrap();
/// d.dispose().unwrap();
/// assert_eq!(runs.load(Ordering::SeqCst), 1);
/// ```
pub fn to_disposable(f: impl FnOnce() + Send + 'static) -> DisposableRef {
    Arc::new(CallbackDisposable::new(Box::new(move || {
        f();
        Ok(())
    })))
}

/// Like [`to_disposable`], for cleanup that can fail.
pub fn try_to_disposable(
    f: impl FnOnce() -> Result<(), BoxError> + Send + 'static,
) -> DisposableRef {
    Arc::new(CallbackDisposable::new(Box::new(f)))
}

/// Disposes every item, even when some of them fail.
///
/// One failure is returned as is; several are returned as
/// [`DisposeError::Aggregate`].
pub fn dispose_all<I, D>(disposables: I) -> Result<(), DisposeError>
where
    I: IntoIterator<Item = D>,
    D: Disposable,
{
    let errors: Vec<DisposeError> = disposables
        .into_iter()
        .filter_map(|d| d.dispose().err())
        .collect();
    DisposeError::collect(errors)
}

/// Several disposables released together, once.
struct CombinedDisposable {
    parts: Mutex<Option<Vec<DisposableRef>>>,
}

impl Disposable for CombinedDisposable {
    fn dispose(&self) -> Result<(), DisposeError> {
        let parts = self.parts.lock().take();
        match parts {
            Some(parts) => dispose_all(parts),
            None => Ok(()),
        }
    }
}

/// Combines multiple disposables into one.
pub fn combined_disposable(disposables: Vec<DisposableRef>) -> DisposableRef {
    Arc::new(CombinedDisposable {
        parts: Mutex::new(Some(disposables)),
    })
}

/// A disposable that does nothing when disposed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDisposable;

impl Disposable for NoopDisposable {
    fn dispose(&self) -> Result<(), DisposeError> {
        Ok(())
    }
}

/// Returns a shared [`NoopDisposable`].
pub fn none() -> DisposableRef {
    Arc::new(NoopDisposable)
}

/// Disposes `d` and logs the failure instead of returning it.
///
/// Used where no caller can receive the error: lifecycle hooks, timers, leak paths.
pub(crate) fn dispose_logged(d: &dyn Disposable, context: &'static str) {
    if let Err(err) = d.dispose() {
        tracing::error!(
            context,
            label = err.as_label(),
            error = %err.as_message(),
            "dispose failed"
        );
    }
}
