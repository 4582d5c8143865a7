//! Tick repository
//!
//! Per-pool tick state keyed by tick id, replaced wholesale on each ingest
//! pass.

use std::collections::HashMap;

use dashmap::DashMap;

use sidecar_core::orderbook::OrderbookTick;

/// Concurrent store of hydrated ticks per orderbook pool.
#[derive(Default)]
pub struct OrderbookRepository {
    ticks_by_pool: DashMap<u64, HashMap<i64, OrderbookTick>>,
}

impl OrderbookRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all ticks of the pool.
    pub fn store_ticks(&self, pool_id: u64, ticks: HashMap<i64, OrderbookTick>) {
        self.ticks_by_pool.insert(pool_id, ticks);
    }

    /// All ticks of the pool, if it has been ingested.
    pub fn all_ticks(&self, pool_id: u64) -> Option<HashMap<i64, OrderbookTick>> {
        self.ticks_by_pool
            .get(&pool_id)
            .map(|entry| entry.value().clone())
    }

    /// One tick of the pool by tick id.
    pub fn tick_by_id(&self, pool_id: u64, tick_id: i64) -> Option<OrderbookTick> {
        self.ticks_by_pool
            .get(&pool_id)
            .and_then(|entry| entry.value().get(&tick_id).cloned())
    }
}
