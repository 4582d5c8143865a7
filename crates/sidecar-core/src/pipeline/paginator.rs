//! Paginator over a keyed iterator

use std::hash::Hash;

use crate::pagination::{PaginationRequest, PaginationStrategy};
use crate::pipeline::MapIterator;

/// Slices a keyed iterator into a page according to the request strategy.
pub struct Paginator<'a, K, V> {
    iterator: MapIterator<'a, K, V>,
    pagination: PaginationRequest,
}

impl<'a, K, V> Paginator<'a, K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(iterator: MapIterator<'a, K, V>, pagination: PaginationRequest) -> Self {
        Self {
            iterator,
            pagination,
        }
    }

    /// Retrieves the elements of the requested page.
    pub fn get_page(&mut self) -> Vec<V> {
        let offset = match self.pagination.strategy {
            PaginationStrategy::Page => self.pagination.page * self.pagination.limit,
            _ => self.pagination.cursor,
        };

        self.iterator.reset();
        self.iterator.set_offset(offset as usize);

        let mut items = Vec::with_capacity(self.pagination.limit as usize);
        for _ in 0..self.pagination.limit {
            if !self.iterator.has_next() {
                break;
            }
            if let Some(item) = self.iterator.next() {
                items.push(item);
            }
        }

        items
    }
}

#[cfg(test)]
mod tests {
    use dashmap::DashMap;

    use super::*;

    fn fixture() -> DashMap<u64, u64> {
        let map = DashMap::new();
        for i in 1..=5u64 {
            map.insert(i, i);
        }
        map
    }

    fn request(strategy: PaginationStrategy, page: u64, cursor: u64, limit: u64) -> PaginationRequest {
        PaginationRequest {
            strategy,
            page,
            cursor,
            limit,
        }
    }

    #[test]
    fn test_page_strategy_offsets_by_page_times_limit() {
        let map = fixture();
        let iterator = MapIterator::new(&map, vec![1, 2, 3, 4, 5]);
        let mut paginator =
            Paginator::new(iterator, request(PaginationStrategy::Page, 1, 0, 2));

        assert_eq!(paginator.get_page(), vec![3, 4]);
    }

    #[test]
    fn test_cursor_strategy_offsets_by_cursor() {
        let map = fixture();
        let iterator = MapIterator::new(&map, vec![1, 2, 3, 4, 5]);
        let mut paginator =
            Paginator::new(iterator, request(PaginationStrategy::Cursor, 0, 3, 2));

        assert_eq!(paginator.get_page(), vec![4, 5]);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let map = fixture();
        let iterator = MapIterator::new(&map, vec![1, 2, 3, 4, 5]);
        let mut paginator =
            Paginator::new(iterator, request(PaginationStrategy::Page, 10, 0, 2));

        assert!(paginator.get_page().is_empty());
    }
}
