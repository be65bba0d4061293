//! # Event combinators.
//!
//! Each combinator owns an internal [`Emitter`] and returns its event. The
//! upstream subscription is installed lazily:
//!
//! ```text
//!            first listener                         last listener leaves
//! derived ──────────────► subscribe upstream ...... ──────────────► unsubscribe upstream
//!                         upstream value ─► transform ─► derived.fire
//! ```
//!
//! - [`map`] / [`filter`]: synchronous transforms.
//! - [`debounce`]: merges bursts and emits after a quiet period (tokio timer).
//! - [`buffer`]: queues values until the first listener arrives, then flushes.
//!
//! ## Rules
//! - No upstream subscription exists while the derived event has no listener
//!   (except for [`buffer`], which must observe values before anyone listens).
//! - The upstream listener owns the derived emitter: a chain such as
//!   `source.event().map(f).subscribe(l)` keeps delivering after the
//!   intermediate events are dropped, until `l`'s subscription is disposed.
//! - Passing a [`DisposableStore`] ties the derived emitter to that store.
//! - Pending debounce timers are cancelled when the last listener leaves.
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use eventide::{Disposable, Emitter};
//!
//! let source = Emitter::<u32>::new();
//! let evens = source.event().filter(|n| n % 2 == 0).map(|n| n * 10);
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! let sub = evens.subscribe(move |n| sink.lock().push(*n));
//!
//! for n in 1..=4 {
//!     source.fire(&n);
//! }
//! sub.dispose().unwrap();
//! assert_eq!(*seen.lock(), vec![20, 40]);
//! assert!(!source.has_listeners());
//! ```

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::{BufferConfig, DebounceConfig};
use crate::events::emitter::{Emitter, EmitterRef, WeakEmitter};
use crate::events::event::Event;
use crate::events::options::EmitterOptions;
use crate::lifecycle::{DisposableRef, DisposableStore, combined_disposable, dispose_logged, to_disposable};

/// Upstream subscription of a derived emitter.
///
/// Dropped together with the derived emitter's hooks; anything still hooked
/// at that point is disposed.
#[derive(Default)]
struct Upstream {
    subscription: Mutex<Option<DisposableRef>>,
}

impl Upstream {
    fn is_hooked(&self) -> bool {
        self.subscription.lock().is_some()
    }

    fn set(&self, subscription: DisposableRef) {
        let replaced = self.subscription.lock().replace(subscription);
        if let Some(replaced) = replaced {
            dispose_logged(&replaced, "upstream_rehook");
        }
    }

    fn release(&self, context: &'static str) {
        let subscription = self.subscription.lock().take();
        if let Some(subscription) = subscription {
            dispose_logged(&subscription, context);
        }
    }
}

impl Drop for Upstream {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.get_mut().take() {
            dispose_logged(&subscription, "upstream_drop");
        }
    }
}

/// Builds a derived event whose upstream is hooked only while it has listeners.
///
/// `hook` receives an owning handle to the derived emitter and returns the
/// upstream subscription; that subscription is disposed when the last
/// listener leaves. The upstream listener keeps the derived emitter alive, so
/// the returned event may be dropped once subscribed to.
pub(crate) fn snapshot<T: 'static>(
    hook: impl Fn(EmitterRef<T>) -> DisposableRef + Send + Sync + 'static,
    store: Option<&DisposableStore>,
) -> Event<T> {
    let target: Arc<OnceLock<WeakEmitter<T>>> = Arc::new(OnceLock::new());
    let upstream = Arc::new(Upstream::default());

    let options = EmitterOptions::new()
        .with_first_listener_add({
            let target = Arc::clone(&target);
            let upstream = Arc::clone(&upstream);
            move || {
                let Some(target) = target.get().and_then(WeakEmitter::upgrade) else {
                    return;
                };
                upstream.set(hook(target));
            }
        })
        .with_last_listener_remove(move || upstream.release("snapshot_unhook"));

    let emitter = Arc::new(Emitter::with_options(options));
    let _ = target.set(emitter.downgrade());
    let event = emitter.event();
    if let Some(store) = store {
        store.track(emitter);
    }
    event
}

/// Re-emits `f(value)` for every upstream value.
pub fn map<I, O>(
    event: &Event<I>,
    f: impl Fn(&I) -> O + Send + Sync + 'static,
    store: Option<&DisposableStore>,
) -> Event<O>
where
    I: 'static,
    O: 'static,
{
    let event = event.clone();
    let f = Arc::new(f);
    snapshot(
        move |target| {
            let f = Arc::clone(&f);
            event.subscribe(move |value| target.fire(&f(value)))
        },
        store,
    )
}

/// Re-emits the upstream values for which `predicate` holds.
pub fn filter<T: 'static>(
    event: &Event<T>,
    predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
    store: Option<&DisposableStore>,
) -> Event<T> {
    let event = event.clone();
    let predicate = Arc::new(predicate);
    snapshot(
        move |target| {
            let predicate = Arc::clone(&predicate);
            event.subscribe(move |value| {
                if predicate(value) {
                    target.fire(value);
                }
            })
        },
        store,
    )
}

/// Accumulator and timer bookkeeping of one debounce window.
struct DebounceWindow<O> {
    output: Option<O>,
    timer: Option<CancellationToken>,
    generation: u64,
    calls: usize,
}

impl<O> DebounceWindow<O> {
    fn new() -> Self {
        Self {
            output: None,
            timer: None,
            generation: 0,
            calls: 0,
        }
    }

    /// Records a merged value and arms a fresh timer.
    ///
    /// Returns the value to emit right away (leading edge of a quiet period)
    /// together with the new timer's generation and token.
    fn record(&mut self, merged: O, leading: bool) -> (Option<O>, u64, CancellationToken) {
        self.calls += 1;
        let immediate = if leading && self.timer.is_none() {
            Some(merged)
        } else {
            self.output = Some(merged);
            None
        };

        if let Some(previous) = self.timer.take() {
            previous.cancel();
        }
        self.generation += 1;
        let token = CancellationToken::new();
        self.timer = Some(token.clone());
        (immediate, self.generation, token)
    }

    /// Closes the window armed as `generation`.
    ///
    /// A stale generation means a newer value superseded this timer; the
    /// window stays open. A single leading value is never emitted twice.
    fn close(&mut self, generation: u64, leading: bool) -> Option<O> {
        if generation != self.generation {
            return None;
        }
        self.timer = None;
        let calls = std::mem::take(&mut self.calls);
        self.output.take().filter(|_| !leading || calls > 1)
    }

    fn reset(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        self.output = None;
        self.calls = 0;
        self.generation += 1;
    }
}

struct Debouncer<O> {
    window: Mutex<DebounceWindow<O>>,
    target: WeakEmitter<O>,
    config: DebounceConfig,
}

impl<O: Send + 'static> Debouncer<O> {
    fn on_timer(&self, generation: u64) {
        let output = self.window.lock().close(generation, self.config.leading);
        if let Some(output) = output {
            self.target.fire(&output);
        }
    }

    fn arm(self: &Arc<Self>, generation: u64, token: CancellationToken) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let this = Arc::clone(self);
                let delay = self.config.delay;
                handle.spawn(async move {
                    tokio::select! {
                        _ = token.cancelled() => {}
                        _ = tokio::time::sleep(delay) => this.on_timer(generation),
                    }
                });
            }
            Err(_) => {
                tracing::warn!("debounce without a tokio runtime; emitting immediately");
                self.on_timer(generation);
            }
        }
    }
}

/// Merges bursts of upstream values and emits once `config.delay` has passed
/// without a new value.
///
/// `merge` folds each value into the accumulator (`None` at the start of a
/// window). With `config.leading` the first value of a quiet period is
/// emitted immediately on its own, and the window only emits again if more
/// values arrived during it.
///
/// Timers are tokio tasks on the ambient runtime. Outside a runtime there is
/// nothing to wait on: every upstream value closes its window at once, so the
/// event degrades to emitting `merge(None, value)` per value and a warning is
/// logged each time.
pub fn debounce<I, O>(
    event: &Event<I>,
    merge: impl Fn(Option<O>, &I) -> O + Send + Sync + 'static,
    config: DebounceConfig,
    store: Option<&DisposableStore>,
) -> Event<O>
where
    I: 'static,
    O: Send + 'static,
{
    let event = event.clone();
    let merge = Arc::new(merge);
    snapshot(
        move |target| {
            let debouncer = Arc::new(Debouncer {
                window: Mutex::new(DebounceWindow::new()),
                target: target.downgrade(),
                config,
            });

            let merge = Arc::clone(&merge);
            let state = Arc::clone(&debouncer);
            let subscription = event.subscribe(move |value| {
                let previous = state.window.lock().output.take();
                let merged = merge(previous, value);
                let (immediate, generation, token) =
                    state.window.lock().record(merged, state.config.leading);

                if let Some(immediate) = immediate {
                    target.fire(&immediate);
                }
                state.arm(generation, token);
            });

            let cancel = to_disposable(move || debouncer.window.lock().reset());
            combined_disposable(vec![subscription, cancel])
        },
        store,
    )
}

/// Forwards upstream values, queueing them until the first listener arrives.
///
/// The queue starts as `initial`. On the first listener it is flushed in
/// order, synchronously or (with `config.flush_after_timeout`) from a task on
/// the next scheduler tick; afterwards values pass straight through.
///
/// The upstream is hooked right away. Dropping the returned event before
/// anyone subscribed (or disposing `store`) unhooks it again.
pub fn buffer<T>(
    event: &Event<T>,
    config: BufferConfig,
    initial: Vec<T>,
    store: Option<&DisposableStore>,
) -> Event<T>
where
    T: Clone + Send + 'static,
{
    let target: Arc<OnceLock<WeakEmitter<T>>> = Arc::new(OnceLock::new());
    let queue: Arc<Mutex<Option<Vec<T>>>> = Arc::new(Mutex::new(Some(initial)));
    // Owning handle to the buffer's emitter, held only while it has listeners.
    let pinned: Arc<Mutex<Option<EmitterRef<T>>>> = Arc::default();
    let upstream = Arc::new(Upstream::default());

    let hook: Arc<dyn Fn() -> DisposableRef + Send + Sync> = {
        let event = event.clone();
        let queue = Arc::clone(&queue);
        let pinned = Arc::clone(&pinned);
        Arc::new(move || {
            let queue = Arc::clone(&queue);
            let pinned = Arc::clone(&pinned);
            event.subscribe(move |value: &T| {
                {
                    let mut guard = queue.lock();
                    if let Some(pending) = guard.as_mut() {
                        pending.push(value.clone());
                        return;
                    }
                }
                let target = pinned.lock().clone();
                if let Some(target) = target {
                    target.fire(value);
                }
            })
        })
    };

    upstream.set(hook());

    let options = EmitterOptions::new()
        .with_first_listener_add({
            let target = Arc::clone(&target);
            let pinned = Arc::clone(&pinned);
            let upstream = Arc::clone(&upstream);
            move || {
                *pinned.lock() = target.get().and_then(WeakEmitter::upgrade);
                if !upstream.is_hooked() {
                    upstream.set(hook());
                }
            }
        })
        .with_first_listener_did_add({
            let target = Arc::clone(&target);
            let queue = Arc::clone(&queue);
            move || {
                if queue.lock().is_none() {
                    return;
                }
                let Some(target) = target.get().cloned() else {
                    return;
                };
                let queue = Arc::clone(&queue);
                if config.flush_after_timeout {
                    match tokio::runtime::Handle::try_current() {
                        Ok(handle) => {
                            handle.spawn(async move { flush(&queue, &target) });
                        }
                        Err(_) => {
                            tracing::warn!("buffer flush without a tokio runtime; flushing now");
                            flush(&queue, &target);
                        }
                    }
                } else {
                    flush(&queue, &target);
                }
            }
        })
        .with_last_listener_remove({
            let upstream = Arc::clone(&upstream);
            move || {
                upstream.release("buffer_unhook");
                let unpinned = pinned.lock().take();
                drop(unpinned);
            }
        });

    let emitter = Arc::new(Emitter::with_options(options));
    let _ = target.set(emitter.downgrade());
    let event = emitter.event();
    if let Some(store) = store {
        store.track(to_disposable(move || upstream.release("buffer_unhook")));
        store.track(emitter);
    }
    event
}

/// Drains `queue` into `target` in order, then switches to passthrough.
///
/// Values queued while a batch is being delivered are picked up by the next
/// round, so ordering holds even when listeners fire the source re-entrantly.
fn flush<T: 'static>(queue: &Mutex<Option<Vec<T>>>, target: &WeakEmitter<T>) {
    loop {
        let batch = {
            let mut guard = queue.lock();
            match guard.as_mut() {
                Some(pending) if !pending.is_empty() => std::mem::take(pending),
                _ => {
                    *guard = None;
                    return;
                }
            }
        };
        for value in &batch {
            target.fire(value);
        }
    }
}

impl<T: 'static> Event<T> {
    /// Shorthand for [`map`] without a store.
    pub fn map<O: 'static>(&self, f: impl Fn(&T) -> O + Send + Sync + 'static) -> Event<O> {
        map(self, f, None)
    }

    /// Shorthand for [`filter`] without a store.
    pub fn filter(&self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Event<T> {
        filter(self, predicate, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Disposable;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// An event over `emitter` that counts how often it is subscribed to.
    fn counted<T: 'static>(emitter: &Emitter<T>) -> (Event<T>, Arc<AtomicUsize>) {
        let subscribes = Arc::new(AtomicUsize::new(0));
        let inner = emitter.event();
        let count = Arc::clone(&subscribes);
        let event = Event::from_fn(move |listener| {
            count.fetch_add(1, Ordering::SeqCst);
            inner.subscribe_listener(listener)
        });
        (event, subscribes)
    }

    fn recorder<T: Clone + Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn(&T) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |v: &T| sink.lock().push(v.clone()))
    }

    fn concat(acc: Option<Vec<char>>, v: &char) -> Vec<char> {
        let mut acc = acc.unwrap_or_default();
        acc.push(*v);
        acc
    }

    #[test]
    fn test_map_and_filter_are_lazy() {
        let source = Emitter::<u32>::new();
        let (event, subscribes) = counted(&source);

        let mapped = map(&event, |n| n + 1, None);
        let filtered = filter(&event, |n| *n > 1, None);
        assert_eq!(subscribes.load(Ordering::SeqCst), 0);

        let (seen, listener) = recorder::<u32>();
        let a = mapped.subscribe(listener);
        let b = mapped.subscribe(|_| {});
        assert_eq!(subscribes.load(Ordering::SeqCst), 1);

        source.fire(&1);
        assert_eq!(*seen.lock(), vec![2]);

        a.dispose().unwrap();
        b.dispose().unwrap();
        assert!(!source.has_listeners());

        let (seen, listener) = recorder::<u32>();
        let c = filtered.subscribe(listener);
        source.fire(&1);
        source.fire(&5);
        assert_eq!(*seen.lock(), vec![5]);
        c.dispose().unwrap();
        assert_eq!(subscribes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_store_disposes_derived_emitter() {
        let source = Emitter::<u32>::new();
        let store = DisposableStore::new();
        let mapped = map(&source.event(), |n| *n, Some(&store));
        mapped.subscribe(|_| {});
        assert!(source.has_listeners());

        store.dispose().unwrap();
        assert!(!source.has_listeners());
    }

    #[test]
    fn test_chained_temporaries_keep_delivering() {
        let source = Emitter::<u32>::new();
        let (seen, listener) = recorder::<u32>();
        let sub = source
            .event()
            .filter(|n| n % 2 == 0)
            .map(|n| n * 10)
            .subscribe(listener);

        for n in 1..=4 {
            source.fire(&n);
        }
        assert_eq!(*seen.lock(), vec![20, 40]);

        sub.dispose().unwrap();
        assert!(!source.has_listeners());
        source.fire(&6);
        assert_eq!(seen.lock().len(), 2);
    }

    #[test]
    fn test_dropped_unsubscribed_map_leaves_source_alone() {
        let source = Emitter::<u32>::new();
        let (event, subscribes) = counted(&source);
        drop(map(&event, |n| n + 1, None));

        source.fire(&1);
        assert_eq!(subscribes.load(Ordering::SeqCst), 0);
        assert!(!source.has_listeners());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_merges_one_window() {
        let source = Emitter::<char>::new();
        let debounced = debounce(&source.event(), concat, DebounceConfig::default(), None);
        let (seen, listener) = recorder::<Vec<char>>();
        let _sub = debounced.subscribe(listener);

        source.fire(&'a');
        tokio::time::sleep(Duration::from_millis(50)).await;
        source.fire(&'b');
        source.fire(&'c');
        assert!(seen.lock().is_empty());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(*seen.lock(), vec![vec!['a', 'b', 'c']]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_leading_single_value_is_not_repeated() {
        let source = Emitter::<char>::new();
        let config = DebounceConfig::default().leading(true);
        let debounced = debounce(&source.event(), concat, config, None);
        let (seen, listener) = recorder::<Vec<char>>();
        let _sub = debounced.subscribe(listener);

        source.fire(&'a');
        assert_eq!(*seen.lock(), vec![vec!['a']]);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(seen.lock().len(), 1);

        source.fire(&'b');
        source.fire(&'c');
        source.fire(&'d');
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(
            *seen.lock(),
            vec![vec!['a'], vec!['b'], vec!['c', 'd']]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_cancels_timer_when_last_listener_leaves() {
        let source = Emitter::<char>::new();
        let (event, subscribes) = counted(&source);
        let debounced = debounce(&event, concat, DebounceConfig::default(), None);
        let (seen, listener) = recorder::<Vec<char>>();
        let sub = debounced.subscribe(listener);
        assert_eq!(subscribes.load(Ordering::SeqCst), 1);

        source.fire(&'a');
        sub.dispose().unwrap();
        assert!(!source.has_listeners());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_debounce_window_stale_generation_keeps_window_open() {
        let mut window = DebounceWindow::<u8>::new();
        let (immediate, first, _) = window.record(1, false);
        assert!(immediate.is_none());
        let (_, second, _) = window.record(2, false);

        // The first timer lost the race: the value is still pending.
        assert_eq!(window.close(first, false), None);
        assert_eq!(window.close(second, false), Some(2));
        assert_eq!(window.close(second, false), None);
    }

    #[test]
    fn test_debounce_without_runtime_emits_immediately() {
        let source = Emitter::<char>::new();
        let debounced = debounce(&source.event(), concat, DebounceConfig::default(), None);
        let (seen, listener) = recorder::<Vec<char>>();
        let _sub = debounced.subscribe(listener);

        source.fire(&'a');
        assert_eq!(*seen.lock(), vec![vec!['a']]);
    }

    #[test]
    fn test_buffer_flushes_in_order_on_first_listener() {
        let source = Emitter::<u8>::new();
        let buffered = buffer(&source.event(), BufferConfig::default(), vec![1], None);
        source.fire(&2);
        source.fire(&3);

        let (seen, listener) = recorder::<u8>();
        let _sub = buffered.subscribe(listener);
        assert_eq!(*seen.lock(), vec![1, 2, 3]);

        source.fire(&4);
        assert_eq!(*seen.lock(), vec![1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_buffer_flush_after_timeout_defers_delivery() {
        let source = Emitter::<u8>::new();
        let config = BufferConfig {
            flush_after_timeout: true,
        };
        let buffered = buffer(&source.event(), config, Vec::new(), None);
        source.fire(&1);

        let (seen, listener) = recorder::<u8>();
        let _sub = buffered.subscribe(listener);
        assert!(seen.lock().is_empty());

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(*seen.lock(), vec![1]);
    }

    #[test]
    fn test_buffer_rehooks_after_last_listener_leaves() {
        let source = Emitter::<u8>::new();
        let buffered = buffer(&source.event(), BufferConfig::default(), Vec::new(), None);

        let first = buffered.subscribe(|_| {});
        first.dispose().unwrap();
        assert!(!source.has_listeners());

        let (seen, listener) = recorder::<u8>();
        let _second = buffered.subscribe(listener);
        assert!(source.has_listeners());
        source.fire(&7);
        assert_eq!(*seen.lock(), vec![7]);
    }

    #[test]
    fn test_buffer_store_releases_upstream_without_listeners() {
        let source = Emitter::<u8>::new();
        let store = DisposableStore::new();
        let _buffered = buffer(&source.event(), BufferConfig::default(), Vec::new(), Some(&store));
        assert!(source.has_listeners());

        store.dispose().unwrap();
        assert!(!source.has_listeners());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_on_temporary_event_keeps_delivering() {
        let source = Emitter::<char>::new();
        let (seen, listener) = recorder::<Vec<char>>();
        let sub = debounce(&source.event(), concat, DebounceConfig::default(), None).subscribe(listener);

        source.fire(&'a');
        source.fire(&'b');
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(*seen.lock(), vec![vec!['a', 'b']]);

        sub.dispose().unwrap();
        assert!(!source.has_listeners());
    }

    #[test]
    fn test_buffer_on_temporary_event_keeps_delivering() {
        let source = Emitter::<u8>::new();
        let (seen, listener) = recorder::<u8>();
        let sub = buffer(&source.event(), BufferConfig::default(), vec![1], None).subscribe(listener);
        assert_eq!(*seen.lock(), vec![1]);

        source.fire(&2);
        assert_eq!(*seen.lock(), vec![1, 2]);

        sub.dispose().unwrap();
        assert!(!source.has_listeners());
    }

    #[test]
    fn test_dropping_unlistened_buffer_unhooks_upstream() {
        let source = Emitter::<u8>::new();
        let buffered = buffer(&source.event(), BufferConfig::default(), Vec::new(), None);
        assert!(source.has_listeners());

        drop(buffered);
        assert!(!source.has_listeners());
        source.fire(&1);
    }
}
