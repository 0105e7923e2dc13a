//! RcuMap: snapshot publication over `LinearTable`.
//!
//! Readers load the current table through `ArcSwap` and probe it without
//! taking any lock. Writers serialize on a mutex, build the successor table
//! from a copy, and publish it with a single atomic swap.

use crate::key::Key;
use crate::linear_table::LinearTable;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

pub struct RcuMap<V> {
    table: ArcSwap<LinearTable<V>>,
    writer: Mutex<()>, // held for the whole copy-update-publish of one write
}

/// A pinned version of the map.
///
/// Answers from the table that was current when it was taken, regardless of
/// later writes. The table stays alive as long as the snapshot does.
pub struct Snapshot<V> {
    table: Arc<LinearTable<V>>,
}

impl<V> RcuMap<V> {
    pub fn new() -> Self {
        Self::from_table(LinearTable::new())
    }

    /// Start from `capacity` slots (rounded up to a power of two) instead of
    /// `INITIAL_CAPACITY`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_table(LinearTable::with_capacity(capacity))
    }

    fn from_table(table: LinearTable<V>) -> Self {
        Self {
            table: ArcSwap::from_pointee(table),
            writer: Mutex::new(()),
        }
    }

    pub fn len(&self) -> usize {
        self.table.load().len()
    }
    pub fn is_empty(&self) -> bool {
        self.table.load().is_empty()
    }
    pub fn capacity(&self) -> usize {
        self.table.load().capacity()
    }

    pub fn contains_key(&self, key: Key) -> bool {
        self.table.load().contains_key(key)
    }

    pub fn snapshot(&self) -> Snapshot<V> {
        Snapshot {
            table: self.table.load_full(),
        }
    }

    /// Swap in `next` and hand back the table it replaced. The caller drops
    /// the old table after releasing the writer lock, so a `V::drop` that
    /// writes to this map again cannot deadlock.
    fn publish(&self, next: LinearTable<V>) -> Arc<LinearTable<V>> {
        log::trace!(
            "publishing snapshot with {} entries in {} slots (load {:.3})",
            next.len(),
            next.capacity(),
            next.load_factor()
        );
        self.table.swap(Arc::new(next))
    }
}

impl<V: Clone> RcuMap<V> {
    /// Lock-free lookup against the current snapshot.
    pub fn load(&self, key: Key) -> Option<V> {
        self.table.load().get(key).cloned()
    }

    /// Map `key` to `value`, returning the value it replaced.
    ///
    /// Copies the whole table, so this is O(capacity).
    pub fn store(&self, key: Key, value: V) -> Option<V> {
        let (prev, superseded) = {
            let _w = self.writer.lock();
            let current = self.table.load_full();
            let (next, prev) = current.add(key, value);
            (prev, self.publish(next))
        };
        drop(superseded);
        prev
    }

    /// Return the value already mapped to `key` (`loaded == true`), or insert
    /// `value` and return it (`loaded == false`).
    ///
    /// Present keys are answered without taking the writer lock. For an
    /// absent key the check is repeated under the lock, so concurrent callers
    /// agree on a single inserted value.
    pub fn load_or_store(&self, key: Key, value: V) -> (V, bool) {
        self.load_or_store_with(key, || value)
    }

    /// Like `load_or_store`, but only builds the value if the key is absent.
    ///
    /// `make` runs at most once, under the writer lock; it must not write to
    /// this map.
    pub fn load_or_store_with<F>(&self, key: Key, make: F) -> (V, bool)
    where
        F: FnOnce() -> V,
    {
        if let Some(v) = self.load(key) {
            return (v, true);
        }

        let (value, superseded) = {
            let _w = self.writer.lock();
            let current = self.table.load_full();
            // Another writer may have inserted `key` since the unlocked load.
            if let Some(v) = current.get(key) {
                return (v.clone(), true);
            }
            let value = make();
            let (next, _) = current.add(key, value.clone());
            (value, self.publish(next))
        };
        drop(superseded);
        (value, false)
    }
}

impl<V> Default for RcuMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for RcuMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table.load();
        f.debug_struct("RcuMap")
            .field("len", &table.len())
            .field("capacity", &table.capacity())
            .finish()
    }
}

impl<V> Snapshot<V> {
    pub fn get(&self, key: Key) -> Option<&V> {
        self.table.get(key)
    }
    pub fn contains_key(&self, key: Key) -> bool {
        self.table.contains_key(key)
    }
    pub fn len(&self) -> usize {
        self.table.len()
    }
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Whether both snapshots pin the same published version.
    pub fn same_version(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.table, &other.table)
    }
}

impl<V> Clone for Snapshot<V> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
        }
    }
}

impl<V> fmt::Debug for Snapshot<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("len", &self.table.len())
            .field("capacity", &self.table.capacity())
            .finish()
    }
}
