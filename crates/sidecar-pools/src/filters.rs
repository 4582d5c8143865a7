//! Listing options for the pool registry

use sidecar_core::pagination::PaginationRequest;
use sidecar_core::sort::SortRequest;

use crate::model::IncentiveType;

/// Filter set accepted by [`crate::registry::PoolRegistry::pools`].
///
/// `pool_id: Some(vec![])` is meaningful: the id filter is present but
/// matches nothing, so the listing short-circuits to empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetPoolsFilter {
    pub pool_id: Option<Vec<u64>>,
    pub pool_id_not_in: Vec<u64>,
    /// Numeric chain pool types (see `ChainPoolType::as_u64`).
    pub pool_type: Vec<u64>,
    pub min_liquidity_cap: u64,
    pub with_market_incentives: bool,
    pub incentive: Vec<IncentiveType>,
    pub search: Option<String>,
}

/// Options bundle for a pool listing.
#[derive(Debug, Clone, Default)]
pub struct PoolsOptions {
    pub filter: Option<GetPoolsFilter>,
    pub sort: Option<SortRequest>,
    pub pagination: Option<PaginationRequest>,
}

impl PoolsOptions {
    /// Options selecting pools with at least the given liquidity cap.
    pub fn with_min_liquidity_cap(min_liquidity_cap: u64) -> Self {
        Self {
            filter: Some(GetPoolsFilter {
                min_liquidity_cap,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Options selecting the given pool ids.
    pub fn with_pool_ids(pool_ids: Vec<u64>) -> Self {
        Self {
            filter: Some(GetPoolsFilter {
                pool_id: Some(pool_ids),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}
