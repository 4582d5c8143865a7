//! Orderbook telemetry counters
//!
//! Plain atomics surfaced through logs; order-level failures increment a
//! counter instead of failing their batch.

use std::sync::atomic::{AtomicU64, Ordering};

pub static PROCESSING_ORDERBOOK_ACTIVE_ORDERS_ERRORS: AtomicU64 = AtomicU64::new(0);
pub static CREATE_LIMIT_ORDER_ERRORS: AtomicU64 = AtomicU64::new(0);
pub static TICK_BY_ID_NOT_FOUND: AtomicU64 = AtomicU64::new(0);

pub fn inc(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

pub fn get(counter: &AtomicU64) -> u64 {
    counter.load(Ordering::Relaxed)
}
