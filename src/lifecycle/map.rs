//! # Keyed collection of owned disposables.
//!
//! [`DisposableMap`] disposes its values when they are overwritten, deleted,
//! or when the map itself is disposed. Keys keep insertion order.

use std::hash::Hash;

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::error::DisposeError;
use crate::lifecycle::disposable::{Disposable, DisposableRef, dispose_all, dispose_logged};

struct MapState<K, V> {
    store: IndexMap<K, V>,
    disposed: bool,
}

/// A map that manages the lifecycle of the values it stores.
pub struct DisposableMap<K, V = DisposableRef> {
    state: Mutex<MapState<K, V>>,
}

impl<K, V> DisposableMap<K, V>
where
    K: Hash + Eq,
    V: Disposable,
{
    /// Creates an empty map.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MapState {
                store: IndexMap::new(),
                disposed: false,
            }),
        }
    }

    /// Returns true if a value is stored under `key`.
    pub fn has(&self, key: &K) -> bool {
        self.state.lock().store.contains_key(key)
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.state.lock().store.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.state.lock().store.is_empty()
    }

    /// Stores `value` under `key`.
    ///
    /// An existing value at `key` is disposed unless `skip_dispose_on_overwrite`
    /// is set, in which case the caller keeps responsibility for it. On a
    /// disposed map the value is disposed right away with a leak warning.
    pub fn set(&self, key: K, value: V, skip_dispose_on_overwrite: bool) -> Result<(), DisposeError> {
        let previous = {
            let mut state = self.state.lock();
            if state.disposed {
                drop(state);
                tracing::warn!("setting disposable on already disposed map; leaking object");
                dispose_logged(&value, "disposed_map_set");
                return Ok(());
            }
            state.store.insert(key, value)
        };

        match previous {
            Some(previous) if !skip_dispose_on_overwrite => previous.dispose(),
            _ => Ok(()),
        }
    }

    /// Removes the value at `key` and disposes it.
    pub fn delete_and_dispose(&self, key: &K) -> Result<(), DisposeError> {
        let removed = self.state.lock().store.shift_remove(key);
        match removed {
            Some(value) => value.dispose(),
            None => Ok(()),
        }
    }

    /// Removes the value at `key` without disposing it.
    pub fn delete_and_leak(&self, key: &K) -> Option<V> {
        self.state.lock().store.shift_remove(key)
    }

    /// Disposes every value and empties the map; the map stays usable.
    pub fn clear_and_dispose_all(&self) -> Result<(), DisposeError> {
        let values = std::mem::take(&mut self.state.lock().store);
        if values.is_empty() {
            return Ok(());
        }
        dispose_all(values.into_values())
    }

    /// Returns true once the map has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }
}

impl<K, V> DisposableMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Disposable + Clone,
{
    /// Value stored under `key`.
    pub fn get(&self, key: &K) -> Option<V> {
        self.state.lock().store.get(key).cloned()
    }

    /// Snapshot of the keys, in insertion order.
    pub fn keys(&self) -> Vec<K> {
        self.state.lock().store.keys().cloned().collect()
    }

    /// Snapshot of the values, in insertion order.
    pub fn values(&self) -> Vec<V> {
        self.state.lock().store.values().cloned().collect()
    }

    /// Snapshot of the entries, in insertion order.
    pub fn entries(&self) -> Vec<(K, V)> {
        self.state
            .lock()
            .store
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl<K, V> Default for DisposableMap<K, V>
where
    K: Hash + Eq,
    V: Disposable,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Disposable for DisposableMap<K, V>
where
    K: Hash + Eq + Send,
    V: Disposable,
{
    fn dispose(&self) -> Result<(), DisposeError> {
        self.state.lock().disposed = true;
        self.clear_and_dispose_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::to_disposable;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(runs: &Arc<AtomicUsize>) -> DisposableRef {
        let c = Arc::clone(runs);
        to_disposable(move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_overwrite_disposes_previous() {
        let runs = Arc::new(AtomicUsize::new(0));
        let map: DisposableMap<&str> = DisposableMap::new();
        map.set("a", counting(&runs), false).unwrap();
        map.set("a", counting(&runs), false).unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_overwrite_with_skip_keeps_previous_alive() {
        let runs = Arc::new(AtomicUsize::new(0));
        let map: DisposableMap<&str> = DisposableMap::new();
        let first = counting(&runs);
        map.set("a", first.clone(), false).unwrap();
        map.set("a", counting(&runs), true).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        first.dispose().unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delete_and_dispose() {
        let runs = Arc::new(AtomicUsize::new(0));
        let map: DisposableMap<u32> = DisposableMap::new();
        map.set(1, counting(&runs), false).unwrap();
        map.set(2, counting(&runs), false).unwrap();

        map.delete_and_dispose(&1).unwrap();
        map.delete_and_dispose(&1).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!map.has(&1));
        assert_eq!(map.keys(), vec![2]);
    }

    #[test]
    fn test_dispose_disposes_all_and_rejects_new() {
        let runs = Arc::new(AtomicUsize::new(0));
        let map: DisposableMap<u32> = DisposableMap::new();
        map.set(1, counting(&runs), false).unwrap();
        map.set(2, counting(&runs), false).unwrap();

        map.dispose().unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert!(map.is_empty());

        map.set(3, counting(&runs), false).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        assert!(map.is_empty());
    }

    #[test]
    fn test_clear_keeps_map_usable() {
        let runs = Arc::new(AtomicUsize::new(0));
        let map: DisposableMap<u32> = DisposableMap::new();
        map.set(1, counting(&runs), false).unwrap();
        map.clear_and_dispose_all().unwrap();
        map.set(2, counting(&runs), false).unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(map.len(), 1);
        assert!(map.get(&2).is_some());
        assert!(!map.is_disposed());
    }
}
