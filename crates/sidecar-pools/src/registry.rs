//! Concurrent pool registry
//!
//! Stores every ingested pool behind a concurrent map, serves filtered and
//! paginated listings, and tracks the canonical orderbook pool for each
//! `(base, quote)` pair. Orderbook bookkeeping failures are logged and
//! skipped; a store never aborts.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use cosmwasm_std::Uint128;
use tracing::error;

use sidecar_core::pipeline::{MapIterator, MapTransformer, Paginator};
use sidecar_core::sort::{SortDirection, SortRequest};
use sidecar_core::types::CanonicalOrderbookResult;

use crate::fetchers::MapFetcher;
use crate::filters::{GetPoolsFilter, PoolsOptions};
use crate::model::{Pool, PoolApr, PoolAprData, PoolError, PoolFee, PoolFeesData, TickModel};
use crate::tokens::TokenMetadataProvider;

/// Separator joining base and quote denom into a canonical orderbook key.
const BASE_QUOTE_KEY_SEPARATOR: &str = "~";

/// Maximum accepted search string length.
pub const MAX_SEARCH_QUERY_LENGTH: usize = 50;

/// Canonical orderbook bookkeeping entry.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OrderbookEntry {
    pool_id: u64,
    liquidity_cap: Uint128,
    contract_address: String,
}

type AprFetcher = Arc<dyn MapFetcher<u64, PoolApr>>;
type FeesFetcher = Arc<dyn MapFetcher<u64, PoolFee>>;

/// Concurrent pool store with canonical orderbook tracking.
pub struct PoolRegistry {
    pools: DashMap<u64, Pool>,

    canonical_orderbook_for_base_quote: DashMap<String, OrderbookEntry>,
    canonical_orderbook_pool_ids: DashMap<u64, ()>,

    token_metadata: Arc<dyn TokenMetadataProvider>,

    apr_fetcher: RwLock<Option<AprFetcher>>,
    pool_fees_fetcher: RwLock<Option<FeesFetcher>>,
}

impl PoolRegistry {
    pub fn new(token_metadata: Arc<dyn TokenMetadataProvider>) -> Self {
        Self {
            pools: DashMap::new(),
            canonical_orderbook_for_base_quote: DashMap::new(),
            canonical_orderbook_pool_ids: DashMap::new(),
            token_metadata,
            apr_fetcher: RwLock::new(None),
            pool_fees_fetcher: RwLock::new(None),
        }
    }

    /// Registers the APR fetcher used by `with_market_incentives` listings.
    pub fn register_apr_fetcher(&self, fetcher: AprFetcher) {
        *self.apr_fetcher.write().unwrap_or_else(|e| e.into_inner()) = Some(fetcher);
    }

    /// Registers the pool fees fetcher used by `with_market_incentives`
    /// listings.
    pub fn register_pool_fees_fetcher(&self, fetcher: FeesFetcher) {
        *self
            .pool_fees_fetcher
            .write()
            .unwrap_or_else(|e| e.into_inner()) = Some(fetcher);
    }

    /// Bulk upsert by pool id. For orderbook pools the canonical bookkeeping
    /// is re-evaluated; bookkeeping errors are logged and never fail the
    /// store.
    pub fn store_pools(&self, pools: Vec<Pool>) {
        for pool in pools {
            let pool_id = pool.id();

            let orderbook = pool.orderbook_data().map(|data| {
                (
                    data.base_denom.clone(),
                    data.quote_denom.clone(),
                    pool.liquidity_cap(),
                    pool.contract_address().map(str::to_string),
                )
            });

            self.pools.insert(pool_id, pool);

            if let Some((base, quote, liquidity_cap, contract_address)) = orderbook {
                let Some(contract_address) = contract_address else {
                    error!(pool_id, "orderbook pool is missing a contract address");
                    continue;
                };

                if let Err(err) = self.process_orderbook_pool(
                    &base,
                    &quote,
                    pool_id,
                    liquidity_cap,
                    contract_address,
                ) {
                    error!(pool_id, %err, "failed to process orderbook pool");
                }
            }
        }
    }

    /// Returns the pool with the given id.
    pub fn pool(&self, pool_id: u64) -> Result<Pool, PoolError> {
        self.pools
            .get(&pool_id)
            .map(|entry| entry.value().clone())
            .ok_or(PoolError::NotFound { pool_id })
    }

    /// Snapshot of all pools.
    pub fn all_pools(&self) -> Vec<Pool> {
        self.pools
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Tick models for the given concentrated pools. Fails if any id does not
    /// name a concentrated pool or its tick model has not been ingested.
    pub fn tick_model_map(&self, pool_ids: &[u64]) -> Result<HashMap<u64, TickModel>, PoolError> {
        let mut tick_models = HashMap::with_capacity(pool_ids.len());
        for &pool_id in pool_ids {
            let pool = self.pool(pool_id)?;

            if pool.pool_type() != crate::model::ChainPoolType::Concentrated {
                return Err(PoolError::NotConcentrated { pool_id });
            }

            let tick_model = pool
                .tick_model
                .ok_or(PoolError::TickModelNotSet { pool_id })?;
            tick_models.insert(pool_id, tick_model);
        }
        Ok(tick_models)
    }

    /// Filtered, sorted, paginated listing. Returns the page and the total
    /// count after filtering but before pagination.
    pub fn pools(&self, options: PoolsOptions) -> (Vec<Pool>, u64) {
        // An explicitly empty id filter matches nothing.
        if let Some(filter) = &options.filter {
            if filter.pool_id.as_ref().is_some_and(Vec::is_empty) {
                return (Vec::new(), 0);
            }
        }

        let mut transformer = MapTransformer::new(&self.pools);

        if let Some(filter) = &options.filter {
            if let Some(pool_ids) = &filter.pool_id {
                if !pool_ids.is_empty() {
                    transformer.filter(|pool: &Pool| pool_ids.contains(&pool.id()));
                }
            }

            if !filter.pool_id_not_in.is_empty() {
                transformer.filter(|pool: &Pool| !filter.pool_id_not_in.contains(&pool.id()));
            }

            if !filter.pool_type.is_empty() {
                transformer.filter(|pool: &Pool| {
                    filter.pool_type.contains(&pool.pool_type().as_u64())
                });
            }

            if filter.min_liquidity_cap > 0 {
                let min_cap = Uint128::new(filter.min_liquidity_cap as u128);
                transformer.filter(|pool: &Pool| pool.liquidity_cap() >= min_cap);
            }

            if filter.with_market_incentives {
                // Mutates the stored pools so the data survives for sorting.
                for key in transformer.keys().to_vec() {
                    self.set_pool_apr_and_fee_data(key);
                }
            }

            // Placed after market data attachment: the incentive category is
            // derived from the freshly populated APR breakdown.
            if !filter.incentive.is_empty() {
                transformer.filter(|pool: &Pool| filter.incentive.contains(&pool.incentive()));
            }

            if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
                let mut exact = transformer.clone_state();
                exact.filter(self.filter_exact_match_search(search));
                if exact.count() > 0 {
                    transformer = exact; // exact search found
                } else {
                    transformer.filter(self.filter_partial_match_search(search));
                }
            }
        }

        if let Some(sort) = &options.sort {
            transformer.sort(&sort_comparators(sort));
        }

        let total = transformer.count();

        let page = match &options.pagination {
            None => transformer.data(),
            Some(pagination) => {
                let iterator = MapIterator::new(&self.pools, transformer.keys().to_vec());
                Paginator::new(iterator, pagination.clone()).get_page()
            }
        };

        (page, total)
    }

    /// Exact match: numeric input is matched against the pool id, textual
    /// input against any human or chain denom of the pool's tokens.
    fn filter_exact_match_search(&self, search: &str) -> impl Fn(&Pool) -> bool + '_ {
        let search = search.to_string();
        move |pool: &Pool| {
            if let Ok(id) = search.parse::<u64>() {
                return pool.id() == id;
            }

            pool.pool_denoms().iter().any(|denom| {
                let Ok(token) = self.token_metadata.metadata_by_chain_denom(denom) else {
                    return false;
                };
                token.human_denom == search || token.chain_denom == search
            })
        }
    }

    /// Partial match: case-insensitive substring over the pool name formed by
    /// joining human denoms with '/', or over any token display name.
    fn filter_partial_match_search(&self, search: &str) -> impl Fn(&Pool) -> bool + '_ {
        let search = search.to_lowercase();
        move |pool: &Pool| {
            let mut human_denoms = Vec::new();
            let mut names = Vec::new();

            for denom in pool.pool_denoms() {
                let Ok(token) = self.token_metadata.metadata_by_chain_denom(denom) else {
                    continue;
                };
                human_denoms.push(token.human_denom);
                names.push(token.name);
            }

            let pool_name = human_denoms.join("/").to_lowercase();
            if pool_name.contains(&search) {
                return true;
            }

            names
                .iter()
                .any(|name| name.to_lowercase().contains(&search))
        }
    }

    fn set_pool_apr_and_fee_data(&self, pool_id: u64) {
        let apr_fetcher = self
            .apr_fetcher
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        let fees_fetcher = self
            .pool_fees_fetcher
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        let Some(apr_fetcher) = apr_fetcher else {
            error!(pool_id, "failed to get APR data: apr fetcher not set");
            return;
        };

        let apr_data = match apr_fetcher.get_by_key(&pool_id) {
            Ok(fetched) => PoolAprData {
                apr: fetched.value,
                is_stale: fetched.is_stale,
                is_error: false,
            },
            Err(err) => {
                error!(pool_id, %err, "failed to get APR data");
                PoolAprData {
                    is_error: true,
                    ..Default::default()
                }
            }
        };

        let fees_data = match fees_fetcher.as_ref().map(|f| f.get_by_key(&pool_id)) {
            Some(Ok(fetched)) => PoolFeesData {
                fees: fetched.value,
                is_stale: fetched.is_stale,
                is_error: false,
            },
            Some(Err(err)) => {
                error!(pool_id, %err, "failed to get pool fee data");
                PoolFeesData {
                    is_error: true,
                    ..Default::default()
                }
            }
            None => PoolFeesData {
                is_error: true,
                ..Default::default()
            },
        };

        if let Some(mut pool) = self.pools.get_mut(&pool_id) {
            pool.set_apr_data(apr_data);
            pool.set_fees_data(fees_data);
        }
    }

    /// Re-evaluates the canonical orderbook entry for the pair. Returns
    /// whether the entry was updated.
    ///
    /// CONTRACT: the given pool id names an orderbook pool.
    pub fn process_orderbook_pool(
        &self,
        base_denom: &str,
        quote_denom: &str,
        pool_id: u64,
        liquidity_cap: Uint128,
        contract_address: String,
    ) -> Result<bool, PoolError> {
        let key = format_base_quote_key(base_denom, quote_denom);

        if let Some(current) = self.canonical_orderbook_for_base_quote.get(&key) {
            // Lower or equal liquidity never displaces the current canonical
            // pool.
            if liquidity_cap <= current.liquidity_cap {
                return Ok(false);
            }

            let previous_pool_id = current.pool_id;
            drop(current);
            self.canonical_orderbook_pool_ids.remove(&previous_pool_id);
        }

        self.canonical_orderbook_for_base_quote.insert(
            key,
            OrderbookEntry {
                pool_id,
                liquidity_cap,
                contract_address,
            },
        );
        self.canonical_orderbook_pool_ids.insert(pool_id, ());

        Ok(true)
    }

    /// The canonical orderbook pool for a pair: `(pool_id, contract_address)`.
    pub fn canonical_orderbook(
        &self,
        base_denom: &str,
        quote_denom: &str,
    ) -> Result<(u64, String), PoolError> {
        let key = format_base_quote_key(base_denom, quote_denom);
        self.canonical_orderbook_for_base_quote
            .get(&key)
            .map(|entry| (entry.pool_id, entry.contract_address.clone()))
            .ok_or_else(|| PoolError::CanonicalOrderbookNotFound {
                base: base_denom.to_string(),
                quote: quote_denom.to_string(),
            })
    }

    /// All canonical orderbooks, sorted by pool id for deterministic output.
    pub fn all_canonical_orderbooks(&self) -> Result<Vec<CanonicalOrderbookResult>, PoolError> {
        let mut results = Vec::new();

        for entry in self.canonical_orderbook_for_base_quote.iter() {
            let key = entry.key();
            let Some((base, quote)) = key.split_once(BASE_QUOTE_KEY_SEPARATOR) else {
                return Err(PoolError::FailSplitCanonicalOrderbookKey { key: key.clone() });
            };

            results.push(CanonicalOrderbookResult {
                base: base.to_string(),
                quote: quote.to_string(),
                pool_id: entry.pool_id,
                contract_address: entry.contract_address.clone(),
            });
        }

        results.sort_by_key(|result| result.pool_id);

        Ok(results)
    }

    /// Whether the pool id currently holds canonical status for any pair.
    pub fn is_canonical_orderbook_pool(&self, pool_id: u64) -> bool {
        self.canonical_orderbook_pool_ids.contains_key(&pool_id)
    }
}

fn format_base_quote_key(base_denom: &str, quote_denom: &str) -> String {
    format!("{base_denom}{BASE_QUOTE_KEY_SEPARATOR}{quote_denom}")
}

/// Builds the comparator chain for the recognized sort fields; unknown
/// fields are ignored.
fn sort_comparators(sort: &SortRequest) -> Vec<Box<dyn Fn(&Pool, &Pool) -> Ordering>> {
    let mut comparators: Vec<Box<dyn Fn(&Pool, &Pool) -> Ordering>> = Vec::new();

    for field in &sort.fields {
        let comparator: Option<Box<dyn Fn(&Pool, &Pool) -> Ordering>> = match field.field.as_str()
        {
            "id" => Some(Box::new(|a: &Pool, b: &Pool| a.id().cmp(&b.id()))),
            "totalFiatValueLocked" => Some(Box::new(|a: &Pool, b: &Pool| {
                a.liquidity_cap().cmp(&b.liquidity_cap())
            })),
            "market.feesSpent7dUsd" => Some(Box::new(|a: &Pool, b: &Pool| {
                compare_f64(fees_of(a).fees_spent_7d, fees_of(b).fees_spent_7d)
            })),
            "market.feesSpent24hUsd" => Some(Box::new(|a: &Pool, b: &Pool| {
                compare_f64(fees_of(a).fees_spent_24h, fees_of(b).fees_spent_24h)
            })),
            "market.volume7dUsd" => Some(Box::new(|a: &Pool, b: &Pool| {
                compare_f64(fees_of(a).volume_7d, fees_of(b).volume_7d)
            })),
            "market.volume24hUsd" => Some(Box::new(|a: &Pool, b: &Pool| {
                compare_f64(fees_of(a).volume_24h, fees_of(b).volume_24h)
            })),
            "incentives.aprBreakdown.total.upper" => Some(Box::new(|a: &Pool, b: &Pool| {
                compare_f64(total_apr_upper(a), total_apr_upper(b))
            })),
            _ => None,
        };

        if let Some(comparator) = comparator {
            match field.direction {
                SortDirection::Ascending => comparators.push(comparator),
                SortDirection::Descending => {
                    comparators.push(Box::new(move |a, b| comparator(b, a)))
                }
            }
        }
    }

    comparators
}

fn fees_of(pool: &Pool) -> PoolFee {
    pool.fees_data
        .as_ref()
        .map(|data| data.fees.clone())
        .unwrap_or_default()
}

fn total_apr_upper(pool: &Pool) -> f64 {
    pool.apr_data
        .as_ref()
        .map(|data| data.apr.total_apr.upper)
        .unwrap_or_default()
}

fn compare_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use cosmwasm_std::{Coin, Decimal};

    use sidecar_core::pagination::{PaginationRequest, PaginationStrategy};
    use sidecar_core::sort::SortRequest;
    use sidecar_core::types::Token;

    use super::*;
    use crate::fetchers::testing::StaticMapFetcher;
    use crate::model::{
        BalancerPoolData, ChainPoolModel, ContractInfo, CosmWasmChainPool, CosmWasmPoolData,
        CosmWasmPoolModel, OrderbookData, SqsModel, WeightedPoolAsset, ORDERBOOK_CONTRACT_NAME,
    };
    use crate::tokens::TokenRegistry;

    fn test_metadata() -> Arc<TokenRegistry> {
        let registry = TokenRegistry::new();
        registry.store_all([
            Token {
                chain_denom: "uosmo".to_string(),
                human_denom: "osmo".to_string(),
                name: "Osmosis".to_string(),
                precision: 6,
                total_liquidity_cap: Uint128::zero(),
            },
            Token {
                chain_denom: "uatom".to_string(),
                human_denom: "atom".to_string(),
                name: "Cosmos Hub".to_string(),
                precision: 6,
                total_liquidity_cap: Uint128::zero(),
            },
        ]);
        Arc::new(registry)
    }

    fn registry() -> PoolRegistry {
        PoolRegistry::new(test_metadata())
    }

    fn balancer_pool(id: u64, denoms: &[&str], liquidity_cap: u128) -> Pool {
        let balances: Vec<Coin> = denoms
            .iter()
            .map(|denom| Coin::new(1_000_000u128, *denom))
            .collect();
        Pool {
            id,
            chain_model: ChainPoolModel::Balancer(BalancerPoolData {
                assets: balances
                    .iter()
                    .map(|token| WeightedPoolAsset {
                        token: token.clone(),
                        weight: Uint128::new(1),
                    })
                    .collect(),
                total_weight: Uint128::new(denoms.len() as u128),
            }),
            sqs_model: SqsModel {
                balances,
                pool_denoms: denoms.iter().map(|d| d.to_string()).collect(),
                spread_factor: Decimal::permille(2),
                liquidity_cap: Uint128::new(liquidity_cap),
                liquidity_cap_error: String::new(),
                cosmwasm_pool_model: None,
            },
            tick_model: None,
            apr_data: None,
            fees_data: None,
        }
    }

    fn orderbook_pool(id: u64, base: &str, quote: &str, liquidity_cap: u128) -> Pool {
        let mut pool = balancer_pool(id, &[base, quote], liquidity_cap);
        pool.chain_model = ChainPoolModel::CosmWasm(CosmWasmChainPool {
            contract_address: format!("osmo1contract{id}"),
            code_id: 100,
        });
        pool.sqs_model.cosmwasm_pool_model = Some(CosmWasmPoolModel {
            contract_info: ContractInfo {
                contract: ORDERBOOK_CONTRACT_NAME.to_string(),
                version: "0.1.0".to_string(),
            },
            data: CosmWasmPoolData {
                orderbook: Some(OrderbookData {
                    base_denom: base.to_string(),
                    quote_denom: quote.to_string(),
                    next_bid_tick_index: None,
                    next_ask_tick_index: None,
                    ticks: Vec::new(),
                }),
                alloy_transmuter: None,
            },
        });
        pool
    }

    #[test]
    fn test_store_and_get() {
        let registry = registry();
        registry.store_pools(vec![balancer_pool(1, &["uosmo", "uatom"], 100)]);

        let pool = registry.pool(1).unwrap();
        assert_eq!(pool.id(), 1);

        assert_eq!(registry.pool(2), Err(PoolError::NotFound { pool_id: 2 }));
    }

    #[test]
    fn test_store_is_idempotent() {
        let registry = registry();
        let pools = vec![
            balancer_pool(1, &["uosmo", "uatom"], 100),
            orderbook_pool(2, "uatom", "uosmo", 50),
        ];

        registry.store_pools(pools.clone());
        registry.store_pools(pools);

        assert_eq!(registry.all_pools().len(), 2);
        assert!(registry.is_canonical_orderbook_pool(2));
        assert_eq!(registry.all_canonical_orderbooks().unwrap().len(), 1);
    }

    #[test]
    fn test_canonical_orderbook_highest_cap_wins() {
        let registry = registry();

        registry.store_pools(vec![orderbook_pool(1, "uatom", "uosmo", 100)]);
        registry.store_pools(vec![orderbook_pool(2, "uatom", "uosmo", 99)]);
        registry.store_pools(vec![orderbook_pool(3, "uatom", "uosmo", 101)]);

        let (pool_id, contract_address) = registry.canonical_orderbook("uatom", "uosmo").unwrap();
        assert_eq!(pool_id, 3);
        assert_eq!(contract_address, "osmo1contract3");

        assert!(!registry.is_canonical_orderbook_pool(1));
        assert!(!registry.is_canonical_orderbook_pool(2));
        assert!(registry.is_canonical_orderbook_pool(3));
    }

    #[test]
    fn test_canonical_id_set_matches_entries() {
        let registry = registry();
        registry.store_pools(vec![
            orderbook_pool(1, "uatom", "uosmo", 100),
            orderbook_pool(2, "uosmo", "uion", 10),
        ]);
        registry.store_pools(vec![orderbook_pool(3, "uatom", "uosmo", 200)]);

        let canonical = registry.all_canonical_orderbooks().unwrap();
        assert_eq!(canonical.len(), 2);
        // Sorted by pool id.
        assert_eq!(canonical[0].pool_id, 2);
        assert_eq!(canonical[1].pool_id, 3);

        for result in &canonical {
            assert!(registry.is_canonical_orderbook_pool(result.pool_id));
        }
    }

    #[test]
    fn test_pools_empty_id_filter_short_circuits() {
        let registry = registry();
        registry.store_pools(vec![balancer_pool(1, &["uosmo", "uatom"], 100)]);

        let (pools, total) = registry.pools(PoolsOptions::with_pool_ids(Vec::new()));
        assert!(pools.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn test_pools_filters() {
        let registry = registry();
        registry.store_pools(vec![
            balancer_pool(1, &["uosmo", "uatom"], 10),
            balancer_pool(2, &["uosmo", "uatom"], 100),
            balancer_pool(3, &["uosmo", "uatom"], 1_000),
        ]);

        let (pools, total) = registry.pools(PoolsOptions::with_min_liquidity_cap(100));
        assert_eq!(total, 2);
        assert_eq!(pools.len(), 2);

        let (pools, total) = registry.pools(PoolsOptions {
            filter: Some(GetPoolsFilter {
                pool_id: Some(vec![1, 3]),
                pool_id_not_in: vec![3],
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(total, 1);
        assert_eq!(pools[0].id(), 1);
    }

    #[test]
    fn test_pools_sort_and_paginate() {
        let registry = registry();
        registry.store_pools(vec![
            balancer_pool(1, &["uosmo", "uatom"], 10),
            balancer_pool(2, &["uosmo", "uatom"], 30),
            balancer_pool(3, &["uosmo", "uatom"], 20),
            balancer_pool(4, &["uosmo", "uatom"], 40),
            balancer_pool(5, &["uosmo", "uatom"], 50),
        ]);

        let (page, total) = registry.pools(PoolsOptions {
            filter: None,
            sort: Some(SortRequest::parse("id").unwrap()),
            pagination: Some(PaginationRequest {
                strategy: PaginationStrategy::Cursor,
                page: 0,
                cursor: 3,
                limit: 2,
            }),
        });

        assert_eq!(total, 5);
        let ids: Vec<u64> = page.iter().map(Pool::id).collect();
        assert_eq!(ids, vec![4, 5]);
    }

    #[test]
    fn test_pools_sort_descending_by_liquidity() {
        let registry = registry();
        registry.store_pools(vec![
            balancer_pool(1, &["uosmo", "uatom"], 10),
            balancer_pool(2, &["uosmo", "uatom"], 30),
            balancer_pool(3, &["uosmo", "uatom"], 20),
        ]);

        let (pools, _) = registry.pools(PoolsOptions {
            filter: None,
            sort: Some(SortRequest::parse("-totalFiatValueLocked").unwrap()),
            pagination: None,
        });

        let ids: Vec<u64> = pools.iter().map(Pool::id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_search_exact_by_id_then_partial() {
        let registry = registry();
        registry.store_pools(vec![
            balancer_pool(1, &["uosmo", "uatom"], 10),
            balancer_pool(2, &["uosmo", "uatom"], 20),
        ]);

        // Numeric search hits the pool id exactly.
        let (pools, _) = registry.pools(PoolsOptions {
            filter: Some(GetPoolsFilter {
                search: Some("2".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].id(), 2);

        // No exact denom matches "cosmos"; the partial pass matches the
        // token display name.
        let (pools, _) = registry.pools(PoolsOptions {
            filter: Some(GetPoolsFilter {
                search: Some("cosmos".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(pools.len(), 2);
    }

    #[test]
    fn test_search_exact_by_human_denom() {
        let registry = registry();
        registry.store_pools(vec![balancer_pool(1, &["uosmo", "uatom"], 10)]);

        let (pools, _) = registry.pools(PoolsOptions {
            filter: Some(GetPoolsFilter {
                search: Some("atom".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(pools.len(), 1);
    }

    #[test]
    fn test_with_market_incentives_attaches_data() {
        let registry = registry();
        registry.store_pools(vec![balancer_pool(1, &["uosmo", "uatom"], 10)]);

        registry.register_apr_fetcher(Arc::new(StaticMapFetcher {
            values: HashMap::from([(
                1u64,
                PoolApr {
                    total_apr: crate::model::AprRange {
                        lower: 0.0,
                        upper: 0.25,
                    },
                    ..Default::default()
                },
            )]),
            is_stale: true,
        }));
        registry.register_pool_fees_fetcher(Arc::new(StaticMapFetcher {
            values: HashMap::new(),
            is_stale: false,
        }));

        let (pools, _) = registry.pools(PoolsOptions {
            filter: Some(GetPoolsFilter {
                with_market_incentives: true,
                ..Default::default()
            }),
            ..Default::default()
        });

        let apr_data = pools[0].apr_data.as_ref().unwrap();
        assert!(apr_data.is_stale);
        assert!(!apr_data.is_error);
        assert_eq!(apr_data.apr.total_apr.upper, 0.25);

        // The fee fetch failed for this pool; the error is recorded, not
        // raised.
        let fees_data = pools[0].fees_data.as_ref().unwrap();
        assert!(fees_data.is_error);
    }

    #[test]
    fn test_tick_model_map_requires_concentrated() {
        let registry = registry();
        registry.store_pools(vec![balancer_pool(1, &["uosmo", "uatom"], 10)]);

        assert_eq!(
            registry.tick_model_map(&[1]),
            Err(PoolError::NotConcentrated { pool_id: 1 })
        );
    }
}
