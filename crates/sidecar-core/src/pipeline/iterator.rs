//! Keyed iterator over a concurrent map

use std::hash::Hash;

use dashmap::DashMap;

/// Iterates a concurrent map in the order of a previously captured key set.
///
/// Keys deleted between the snapshot and the iteration are skipped by the
/// caller; `next` reports them as `None` values.
pub struct MapIterator<'a, K, V> {
    data: &'a DashMap<K, V>,
    keys: Vec<K>,
    index: usize,
}

impl<'a, K, V> MapIterator<'a, K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(data: &'a DashMap<K, V>, keys: Vec<K>) -> Self {
        Self {
            data,
            keys,
            index: 0,
        }
    }

    /// Retrieves the value for the next key, advancing the position.
    /// Returns `None` once the key set is exhausted or when the key has been
    /// removed from the underlying map since the snapshot.
    pub fn next(&mut self) -> Option<V> {
        if !self.has_next() {
            return None;
        }

        let key = &self.keys[self.index];
        self.index += 1;
        self.data.get(key).map(|entry| entry.value().clone())
    }

    /// Whether more keys remain.
    pub fn has_next(&self) -> bool {
        self.index < self.keys.len()
    }

    /// Positions the iterator at `offset`, clamped to the key-set bounds.
    pub fn set_offset(&mut self, offset: usize) {
        self.index = offset.min(self.keys.len());
    }

    /// Resets the iterator to the start.
    pub fn reset(&mut self) {
        self.index = 0;
    }
}
