//! LinearTable: open-addressed, linear-probing table keyed by `Key`.
//!
//! A table is mutated only while it is private to one writer. Once it is
//! handed to `RcuMap` for publication it sits behind an `Arc` and is only
//! ever read; every change builds a new table from a copy.

use crate::key::Key;

/// Starting slot count of a fresh table. Must be a power of two.
pub const INITIAL_CAPACITY: usize = 4096;

/// Occupancy ratio above which an insertion first doubles the table.
pub const LOAD_FACTOR: f64 = 0.5;

#[derive(Clone, Debug)]
struct Entry<V> {
    key: Key,
    value: V,
}

#[derive(Clone, Debug)]
pub struct LinearTable<V> {
    count: usize,
    mask: usize,
    slots: Box<[Option<Entry<V>>]>, // `None` is the empty-slot sentinel
}

impl<V> LinearTable<V> {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    /// Capacity is rounded up to a power of two (at least 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        let slots = (0..capacity).map(|_| None).collect::<Vec<_>>();
        Self {
            count: 0,
            mask: capacity - 1,
            slots: slots.into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }
    pub fn load_factor(&self) -> f64 {
        self.count as f64 / self.capacity() as f64
    }

    #[inline]
    fn ideal_slot(&self, key: Key) -> usize {
        key.get() & self.mask
    }

    /// Index of `key`'s slot, probing at most `capacity` slots and stopping
    /// at the first empty one. Keys are never removed, so a probe run from
    /// the ideal slot has no holes.
    fn position(&self, key: Key) -> Option<usize> {
        let mut p = self.ideal_slot(key);
        for _ in 0..self.capacity() {
            match &self.slots[p] {
                Some(e) if e.key == key => return Some(p),
                Some(_) => p = (p + 1) & self.mask,
                None => return None,
            }
        }
        None
    }

    pub fn get(&self, key: Key) -> Option<&V> {
        self.position(key)
            .and_then(|p| self.slots[p].as_ref())
            .map(|e| &e.value)
    }

    pub fn contains_key(&self, key: Key) -> bool {
        self.position(key).is_some()
    }

    /// Place an entry in the first empty slot of its probe run.
    ///
    /// Does not look for an existing entry with the same key. Panics if
    /// every slot is occupied; callers keep load-factor headroom, so a full
    /// table means the growth bookkeeping is broken.
    pub fn insert(&mut self, key: Key, value: V) {
        let mut p = self.ideal_slot(key);
        for _ in 0..self.capacity() {
            let slot = &mut self.slots[p];
            if slot.is_none() {
                *slot = Some(Entry { key, value });
                self.count += 1;
                return;
            }
            p = (p + 1) & self.mask;
        }
        panic!("no available slots");
    }

    fn would_exceed_load_factor(&self, count: usize) -> bool {
        count as f64 / self.capacity() as f64 > LOAD_FACTOR
    }
}

impl<V: Clone> LinearTable<V> {
    /// A table of twice the capacity holding every entry of `self`.
    /// `self` is left untouched.
    pub fn rehash(&self) -> Self {
        let mut grown = Self::with_capacity(self.capacity() << 1);
        for e in self.slots.iter().flatten() {
            grown.insert(e.key, e.value.clone());
        }
        log::debug!(
            "rehashed {} entries from {} to {} slots",
            self.count,
            self.capacity(),
            grown.capacity()
        );
        grown
    }

    /// Build the successor of `self` with `key` mapped to `value`.
    ///
    /// An existing entry for `key` is overwritten in the copy and its old
    /// value returned. Otherwise the copy is grown first if one more entry
    /// would push it past `LOAD_FACTOR`. The result is unpublished.
    pub fn add(&self, key: Key, value: V) -> (Self, Option<V>) {
        if let Some(p) = self.position(key) {
            let mut next = self.clone();
            let prev = next.slots[p]
                .as_mut()
                .map(|e| core::mem::replace(&mut e.value, value));
            return (next, prev);
        }

        let mut next = if self.would_exceed_load_factor(self.count + 1) {
            self.rehash()
        } else {
            self.clone()
        };
        next.insert(key, value);
        (next, None)
    }
}

impl<V> Default for LinearTable<V> {
    fn default() -> Self {
        Self::new()
    }
}
