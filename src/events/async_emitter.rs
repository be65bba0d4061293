//! # Sequential async delivery with `wait_until`.
//!
//! [`AsyncEmitter::fire_async`] delivers one value to each listener in turn.
//! During its (synchronous) turn a listener may register async work through
//! [`WaitUntilEvent::wait_until`]; the loop awaits all of it before moving to
//! the next listener.
//!
//! ## Architecture
//! ```text
//! fire_async(data, token)
//!     │ enqueue (listener, data) for every current listener
//!     ▼
//! ┌── loop while !token.is_cancelled() ─────────────────────────────┐
//! │  shift next (listener, data)                                    │
//! │  listener(&event)          ── panic? report, skip its futures   │
//! │  freeze wait_until list    ── later wait_until → UsageError     │
//! │  await all registered work ── Err/panic? report, keep going     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//! - Listeners are delivered strictly FIFO; listener N+1 starts only after
//!   listener N's registered work completed.
//! - Cancellation is checked once per dequeue, never mid-turn.
//! - Failures of one listener never abort delivery to the next.

use std::future::Future;
use std::ops::Deref;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::collections::LinkedList;
use crate::error::{BoxError, DisposeError, ListenerError, UsageError, panic_message};
use crate::events::emitter::Emitter;
use crate::events::event::{Event, Listener};
use crate::events::options::EmitterOptions;
use crate::lifecycle::Disposable;

/// Async work registered by a listener.
pub type WaitUntilFuture = BoxFuture<'static, Result<(), BoxError>>;

/// Wraps each registered future; receives the listener that registered it.
pub type PromiseJoin<T> =
    Arc<dyn Fn(WaitUntilFuture, &Listener<WaitUntilEvent<T>>) -> WaitUntilFuture + Send + Sync>;

type Pending = Arc<Mutex<Option<Vec<WaitUntilFuture>>>>;

/// The value a listener receives from [`AsyncEmitter::fire_async`].
pub struct WaitUntilEvent<T> {
    data: Arc<T>,
    token: CancellationToken,
    pending: Pending,
    join: Option<(PromiseJoin<T>, Listener<WaitUntilEvent<T>>)>,
}

impl<T> WaitUntilEvent<T> {
    /// The fired value.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// The cancellation token passed to `fire_async`.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Registers work the delivery loop awaits before the next listener.
    ///
    /// Only valid during the listener's own synchronous turn; afterwards it
    /// fails with [`UsageError::WaitUntilAfterDelivery`].
    pub fn wait_until(
        &self,
        work: impl Future<Output = Result<(), BoxError>> + Send + 'static,
    ) -> Result<(), UsageError> {
        if self.pending.lock().is_none() {
            return Err(UsageError::WaitUntilAfterDelivery);
        }

        let mut work: WaitUntilFuture = Box::pin(work);
        if let Some((join, listener)) = &self.join {
            work = join(work, listener);
        }

        match self.pending.lock().as_mut() {
            Some(pending) => {
                pending.push(work);
                Ok(())
            }
            None => Err(UsageError::WaitUntilAfterDelivery),
        }
    }
}

impl<T> Deref for WaitUntilEvent<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T> Clone for WaitUntilEvent<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            token: self.token.clone(),
            pending: Arc::clone(&self.pending),
            join: self.join.clone(),
        }
    }
}

type Delivery<T> = (Listener<WaitUntilEvent<T>>, Arc<T>);

/// Emitter whose listeners may delay the next delivery with async work.
pub struct AsyncEmitter<T> {
    emitter: Emitter<WaitUntilEvent<T>>,
    queue: Mutex<LinkedList<Delivery<T>>>,
}

impl<T: Send + Sync + 'static> AsyncEmitter<T> {
    /// Creates an async emitter without hooks.
    pub fn new() -> Self {
        Self::with_options(EmitterOptions::default())
    }

    /// Creates an async emitter with lifecycle hooks and/or an error handler.
    pub fn with_options(options: EmitterOptions) -> Self {
        Self {
            emitter: Emitter::with_options(options),
            queue: Mutex::new(LinkedList::new()),
        }
    }

    /// The public subscribe side.
    pub fn event(&self) -> Event<WaitUntilEvent<T>> {
        self.emitter.event()
    }

    /// Returns true if at least one listener is subscribed.
    pub fn has_listeners(&self) -> bool {
        self.emitter.has_listeners()
    }

    /// Number of subscribed listeners.
    pub fn listener_count(&self) -> usize {
        self.emitter.listener_count()
    }

    /// Delivers `data` to each current listener in turn, awaiting the work
    /// each one registers before moving on.
    ///
    /// Stops dequeuing once `token` is cancelled. `promise_join`, if given,
    /// wraps every registered future.
    pub async fn fire_async(
        &self,
        data: T,
        token: &CancellationToken,
        promise_join: Option<PromiseJoin<T>>,
    ) {
        let Some(listeners) = self.emitter.snapshot() else {
            return;
        };

        let data = Arc::new(data);
        {
            let mut queue = self.queue.lock();
            for listener in listeners {
                queue.push((listener, Arc::clone(&data)));
            }
        }

        while !token.is_cancelled() {
            let next = self.queue.lock().shift();
            let Some((listener, data)) = next else {
                break;
            };

            let pending: Pending = Arc::new(Mutex::new(Some(Vec::new())));
            let event = WaitUntilEvent {
                data,
                token: token.clone(),
                pending: Arc::clone(&pending),
                join: promise_join.clone().map(|join| (join, Arc::clone(&listener))),
            };

            let outcome = catch_unwind(AssertUnwindSafe(|| listener(&event)));
            let registered = pending.lock().take().unwrap_or_default();
            if let Err(payload) = outcome {
                self.emitter.report(&ListenerError::from_panic(payload));
                continue;
            }
            if registered.is_empty() {
                continue;
            }

            let results = join_all(
                registered
                    .into_iter()
                    .map(|work| AssertUnwindSafe(work).catch_unwind()),
            )
            .await;

            for result in results {
                match result {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => self.emitter.report(&ListenerError::AsyncFailed(err)),
                    Err(payload) => self.emitter.report(&ListenerError::AsyncPanicked {
                        message: panic_message(payload.as_ref()),
                    }),
                }
            }
        }
    }
}

impl<T: Send + Sync + 'static> Default for AsyncEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> Disposable for AsyncEmitter<T> {
    /// Drops queued deliveries and removes every listener.
    fn dispose(&self) -> Result<(), DisposeError> {
        let queued = std::mem::take(&mut *self.queue.lock());
        drop(queued);
        self.emitter.dispose()
    }
}
