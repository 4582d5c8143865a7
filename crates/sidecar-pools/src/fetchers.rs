//! Map fetchers for market data
//!
//! APR and fee aggregates come from external passthrough sources refreshed on
//! an interval. A fetcher exposes the last known value together with a
//! staleness flag so listings can degrade gracefully instead of failing.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("no value fetched for key {key}")]
    NotFound { key: String },

    #[error("fetcher is not configured")]
    NotConfigured,
}

/// Last known value for a key, with freshness metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<V> {
    pub value: V,
    /// Set when the refresh interval elapsed without a successful update.
    pub is_stale: bool,
}

/// Keyed read access to a periodically refreshed map of values.
pub trait MapFetcher<K, V>: Send + Sync {
    fn get_by_key(&self, key: &K) -> Result<Fetched<V>, FetchError>;
}
