//! Filter/sort transformer over a concurrent map

use std::cmp::Ordering;
use std::hash::Hash;

use dashmap::DashMap;

/// Captures a key snapshot of a concurrent map and narrows or reorders it.
///
/// Values are looked up on demand, so a filter chain touches each value at
/// most once per stage and never copies the map itself. The snapshot is
/// unordered; apply a sort for deterministic output.
pub struct MapTransformer<'a, K, V> {
    data: &'a DashMap<K, V>,
    keys: Vec<K>,
}

impl<'a, K, V> MapTransformer<'a, K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Snapshots the current key set of the map.
    pub fn new(data: &'a DashMap<K, V>) -> Self {
        let keys = data.iter().map(|entry| entry.key().clone()).collect();
        Self { data, keys }
    }

    /// Number of keys surviving the transformations so far.
    pub fn count(&self) -> u64 {
        self.keys.len() as u64
    }

    /// Calls `f` for each surviving key/value pair; stops when `f` returns
    /// false. Keys removed from the map since the snapshot are skipped.
    pub fn range(&self, mut f: impl FnMut(&K, &V) -> bool) {
        for key in &self.keys {
            let Some(entry) = self.data.get(key) else {
                continue;
            };
            if !f(key, entry.value()) {
                break;
            }
        }
    }

    /// Drops every key whose value does not satisfy the predicate.
    pub fn filter(&mut self, predicate: impl Fn(&V) -> bool) -> &mut Self {
        let mut filtered = Vec::with_capacity(self.keys.len());
        for key in self.keys.drain(..) {
            let keep = match self.data.get(&key) {
                Some(entry) => predicate(entry.value()),
                None => false,
            };
            if keep {
                filtered.push(key);
            }
        }
        self.keys = filtered;
        self
    }

    /// Sorts the key set lexicographically over the given comparators:
    /// later comparators only break ties left by earlier ones.
    pub fn sort(&mut self, comparators: &[Box<dyn Fn(&V, &V) -> Ordering>]) -> &mut Self {
        if comparators.is_empty() {
            return self; // no sorting required
        }

        self.keys.sort_by(|a, b| {
            let (Some(va), Some(vb)) = (self.data.get(a), self.data.get(b)) else {
                return Ordering::Equal;
            };
            for comparator in comparators {
                match comparator(va.value(), vb.value()) {
                    Ordering::Equal => continue,
                    decided => return decided,
                }
            }
            Ordering::Equal
        });
        self
    }

    /// The surviving key set, in current order.
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    /// Materializes the surviving values, in current order.
    pub fn data(&self) -> Vec<V> {
        self.keys
            .iter()
            .filter_map(|key| self.data.get(key).map(|entry| entry.value().clone()))
            .collect()
    }

    /// A new transformer over the same map with the current key set copied.
    pub fn clone_state(&self) -> MapTransformer<'a, K, V> {
        MapTransformer {
            data: self.data,
            keys: self.keys.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_of(values: &[u64]) -> DashMap<u64, u64> {
        let map = DashMap::new();
        for value in values {
            map.insert(*value, *value * 10);
        }
        map
    }

    fn ascending() -> Box<dyn Fn(&u64, &u64) -> Ordering> {
        Box::new(|a, b| a.cmp(b))
    }

    #[test]
    fn test_filter_narrows_keys() {
        let map = map_of(&[1, 2, 3, 4]);
        let mut transformer = MapTransformer::new(&map);

        transformer.filter(|value| *value >= 30);
        assert_eq!(transformer.count(), 2);

        let mut data = transformer.data();
        data.sort();
        assert_eq!(data, vec![30, 40]);
    }

    #[test]
    fn test_sort_orders_values() {
        let map = map_of(&[3, 1, 2]);
        let mut transformer = MapTransformer::new(&map);

        transformer.sort(&[ascending()]);
        assert_eq!(transformer.data(), vec![10, 20, 30]);
    }

    #[test]
    fn test_multi_field_sort_is_lexicographic() {
        let map: DashMap<u64, (u64, u64)> = DashMap::new();
        map.insert(1, (1, 3));
        map.insert(2, (1, 1));
        map.insert(3, (0, 2));

        let mut transformer = MapTransformer::new(&map);
        let by_first: Box<dyn Fn(&(u64, u64), &(u64, u64)) -> Ordering> =
            Box::new(|a, b| a.0.cmp(&b.0));
        let by_second: Box<dyn Fn(&(u64, u64), &(u64, u64)) -> Ordering> =
            Box::new(|a, b| a.1.cmp(&b.1));

        transformer.sort(&[by_first, by_second]);
        assert_eq!(transformer.data(), vec![(0, 2), (1, 1), (1, 3)]);
    }

    #[test]
    fn test_clone_state_is_independent() {
        let map = map_of(&[1, 2, 3]);
        let mut transformer = MapTransformer::new(&map);

        let mut clone = transformer.clone_state();
        clone.filter(|value| *value == 10);

        assert_eq!(clone.count(), 1);
        assert_eq!(transformer.count(), 3);

        // The original can still be filtered independently.
        transformer.filter(|value| *value >= 20);
        assert_eq!(transformer.count(), 2);
    }

    #[test]
    fn test_range_stops_on_false() {
        let map = map_of(&[1, 2, 3]);
        let mut transformer = MapTransformer::new(&map);
        transformer.sort(&[ascending()]);

        let mut seen = 0;
        transformer.range(|_, _| {
            seen += 1;
            seen < 2
        });
        assert_eq!(seen, 2);
    }
}
