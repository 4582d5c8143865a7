//! Router usecase
//!
//! Orchestrates candidate route discovery, materialization, ranking,
//! duplicate filtering and split-quote optimization behind two cache tiers:
//! a candidate-route cache keyed by the denom pair and a ranked-route cache
//! additionally keyed by the input's order of magnitude.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use cosmwasm_std::{Coin, Decimal256, Uint128};
use tracing::{debug, warn};

use sidecar_core::config::{RouterConfig, DISABLE_SPLIT_ROUTES};
use sidecar_pools::registry::PoolRegistry;
use sidecar_pools::tokens::TokenMetadataProvider;

use crate::cache::TtlCache;
use crate::candidate_routes::{find_candidate_routes, CandidateRouteSearchOptions};
use crate::errors::RouterError;
use crate::repository::{default_taker_fee, RouterRepository};
use crate::routable::{new_routable_pool, CosmWasmPoolsParams, PoolVariant, RoutablePool};
use crate::route::{CandidateRoutes, Quote, Route, SplitRoute};

/// Per-request overrides.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuoteOptions {
    /// Skips both cache reads and writes for this request.
    pub disable_cache: bool,
    /// Restricts the answer to the single best route (no splits).
    pub single_route: bool,
}

/// The router: candidate search, ranking, splits, and caches.
pub struct RouterUsecase {
    config: RouterConfig,
    repository: Arc<RouterRepository>,
    registry: Arc<PoolRegistry>,
    token_metadata: Arc<dyn TokenMetadataProvider>,
    cosmwasm_params: CosmWasmPoolsParams,

    candidate_route_cache: TtlCache<String, CandidateRoutes>,
    ranked_route_cache: TtlCache<String, CandidateRoutes>,
}

impl RouterUsecase {
    pub fn new(
        config: RouterConfig,
        repository: Arc<RouterRepository>,
        registry: Arc<PoolRegistry>,
        token_metadata: Arc<dyn TokenMetadataProvider>,
        cosmwasm_params: CosmWasmPoolsParams,
    ) -> Self {
        Self {
            config,
            repository,
            registry,
            token_metadata,
            cosmwasm_params,
            candidate_route_cache: TtlCache::new(),
            ranked_route_cache: TtlCache::new(),
        }
    }

    /// Computes the optimal quote for swapping the exact `token_in` into
    /// `token_out_denom`.
    pub async fn get_optimal_quote(
        &self,
        token_in: Coin,
        token_out_denom: &str,
        options: QuoteOptions,
    ) -> Result<Quote, RouterError> {
        let caches_enabled = self.config.route_cache_enabled && !options.disable_cache;

        let candidate_key = candidate_route_key(&token_in.denom, token_out_denom);
        let ranked_key = ranked_route_key(
            &token_in.denom,
            token_out_denom,
            order_of_magnitude(token_in.amount),
        );

        let candidate_routes = if caches_enabled {
            self.ranked_route_cache
                .get(&ranked_key)
                .or_else(|| self.candidate_route_cache.get(&candidate_key))
        } else {
            None
        };

        let candidate_routes = match candidate_routes {
            Some(cached) => cached,
            None => {
                let found = self.search_candidate_routes(&token_in, token_out_denom);
                if caches_enabled {
                    self.candidate_route_cache.insert(
                        candidate_key,
                        found.clone(),
                        Duration::from_secs(self.config.candidate_route_cache_expiry_seconds),
                    );
                }
                found
            }
        };

        let mut quote = self
            .quote_from_candidates(&candidate_routes, &token_in, token_out_denom, options)
            .await?;

        if caches_enabled {
            let chosen = CandidateRoutes::from_routes(
                quote
                    .routes
                    .iter()
                    .map(|split| split.route.to_candidate_route())
                    .collect(),
            );
            self.ranked_route_cache.insert(
                ranked_key,
                chosen,
                Duration::from_secs(self.config.ranked_route_cache_expiry_seconds),
            );
        }

        quote.prepare_result().await?;
        Ok(quote)
    }

    /// Exact-out mirror of [`Self::get_optimal_quote`]: routes are discovered
    /// from the token out backwards and the resulting amounts swapped.
    pub async fn get_optimal_quote_exact_out(
        &self,
        token_out: Coin,
        token_in_denom: &str,
        options: QuoteOptions,
    ) -> Result<Quote, RouterError> {
        let amount_out = token_out.amount;
        let quote = self
            .get_optimal_quote(token_out, token_in_denom, options)
            .await?;

        Ok(Quote {
            amount_in: Coin {
                denom: token_in_denom.to_string(),
                amount: quote.amount_out,
            },
            amount_out,
            ..quote
        })
    }

    /// Quote through exactly the given pool, bypassing discovery, caches and
    /// splits.
    pub async fn get_custom_direct_quote(
        &self,
        token_in: Coin,
        token_out_denom: &str,
        pool_id: u64,
    ) -> Result<Quote, RouterError> {
        let token_out_denoms = [token_out_denom.to_string()];
        self.get_custom_direct_quote_multi_pool(token_in, &token_out_denoms, &[pool_id])
            .await
    }

    /// Quote through the given pool chain: hop `i` swaps into
    /// `token_out_denoms[i]` via `pool_ids[i]`.
    pub async fn get_custom_direct_quote_multi_pool(
        &self,
        token_in: Coin,
        token_out_denoms: &[String],
        pool_ids: &[u64],
    ) -> Result<Quote, RouterError> {
        if pool_ids.is_empty() || pool_ids.len() != token_out_denoms.len() {
            return Err(RouterError::ValidationFailed {
                reason: format!(
                    "pool and denom counts must match and be non-empty, got {} pools and {} denoms",
                    pool_ids.len(),
                    token_out_denoms.len()
                ),
            });
        }

        let mut pools = Vec::with_capacity(pool_ids.len());
        let mut previous_denom = token_in.denom.clone();

        for (&pool_id, token_out_denom) in pool_ids.iter().zip(token_out_denoms) {
            let pool = self.registry.pool(pool_id)?;

            let denoms = pool.pool_denoms();
            if !denoms.iter().any(|denom| denom == &previous_denom) {
                return Err(RouterError::TokenInDenomPoolNotFound {
                    denom: previous_denom,
                    pool_id,
                });
            }
            if !denoms.iter().any(|denom| denom == token_out_denom) {
                return Err(RouterError::TokenOutDenomPoolNotFound {
                    denom: token_out_denom.clone(),
                    pool_id,
                });
            }

            let taker_fee = self
                .repository
                .taker_fee(&previous_denom, token_out_denom)
                .unwrap_or_else(default_taker_fee);

            let mut routable = new_routable_pool(
                &pool,
                token_out_denom.clone(),
                taker_fee,
                &self.cosmwasm_params,
            )?;
            routable.set_token_in_denom(previous_denom.clone());

            pools.push(routable);
            previous_denom = token_out_denom.clone();
        }

        let route = Route {
            has_generalized_cosmwasm_pool: pools
                .iter()
                .any(|pool| pool.variant() == PoolVariant::GeneralizedCosmWasm),
            has_canonical_orderbook_pool: pools
                .iter()
                .any(|pool| self.registry.is_canonical_orderbook_pool(pool.id())),
            pools,
        };

        let amount_out = route.calculate_token_out(token_in.clone()).await?.amount;

        let mut quote = Quote::new(
            token_in.clone(),
            amount_out,
            vec![SplitRoute {
                route,
                in_amount: token_in.amount,
                out_amount: amount_out,
            }],
        );
        quote.prepare_result().await?;
        Ok(quote)
    }

    /// Exact-out mirror of [`Self::get_custom_direct_quote_multi_pool`].
    pub async fn get_custom_direct_quote_multi_pool_exact_out(
        &self,
        token_out: Coin,
        token_in_denoms: &[String],
        pool_ids: &[u64],
    ) -> Result<Quote, RouterError> {
        let amount_out = token_out.amount;
        let token_in_denom = token_in_denoms
            .last()
            .cloned()
            .ok_or_else(|| RouterError::ValidationFailed {
                reason: "token in denoms must be non-empty".to_string(),
            })?;

        let quote = self
            .get_custom_direct_quote_multi_pool(token_out, token_in_denoms, pool_ids)
            .await?;

        Ok(Quote {
            amount_in: Coin {
                denom: token_in_denom,
                amount: quote.amount_out,
            },
            amount_out,
            ..quote
        })
    }

    /// Spot price of `base_denom` quoted in `quote_denom` through the given
    /// pool.
    pub async fn pool_spot_price(
        &self,
        pool_id: u64,
        base_denom: &str,
        quote_denom: &str,
    ) -> Result<Decimal256, RouterError> {
        let pool = self.registry.pool(pool_id)?;

        let taker_fee = self
            .repository
            .taker_fee(base_denom, quote_denom)
            .unwrap_or_else(default_taker_fee);

        // Token out denom is irrelevant for spot pricing; it only matters
        // for routing.
        let routable =
            new_routable_pool(&pool, String::new(), taker_fee, &self.cosmwasm_params)?;
        routable.calc_spot_price(base_denom, quote_denom).await
    }

    /// Resolves the min-pool-liquidity-cap filter for the pair from token
    /// metadata, falling back to the universal default.
    pub fn min_pool_liquidity_cap_filter(
        &self,
        token_in_denom: &str,
        token_out_denom: &str,
    ) -> u64 {
        let default_filter = self.config.min_pool_liquidity_cap;

        let (Ok(token_in), Ok(token_out)) = (
            self.token_metadata.metadata_by_chain_denom(token_in_denom),
            self.token_metadata.metadata_by_chain_denom(token_out_denom),
        ) else {
            return default_filter;
        };

        let min_tokens_cap = token_in
            .total_liquidity_cap
            .min(token_out.total_liquidity_cap);
        let min_tokens_cap = u64::try_from(min_tokens_cap.u128()).unwrap_or(u64::MAX);

        for entry in &self.config.dynamic_min_liquidity_cap_filters_desc {
            if entry.min_tokens_cap <= min_tokens_cap {
                return entry.filter_value;
            }
        }

        default_filter
    }

    fn search_candidate_routes(&self, token_in: &Coin, token_out_denom: &str) -> CandidateRoutes {
        let min_pool_liquidity_cap =
            self.min_pool_liquidity_cap_filter(&token_in.denom, token_out_denom);

        find_candidate_routes(
            &self.repository,
            &self.registry,
            token_in,
            token_out_denom,
            &CandidateRouteSearchOptions {
                max_routes: self.config.max_routes,
                max_pools_per_route: self.config.max_pools_per_route,
                min_pool_liquidity_cap: Uint128::new(min_pool_liquidity_cap as u128),
            },
        )
    }

    async fn quote_from_candidates(
        &self,
        candidate_routes: &CandidateRoutes,
        token_in: &Coin,
        token_out_denom: &str,
        options: QuoteOptions,
    ) -> Result<Quote, RouterError> {
        let routes = self.materialize_routes(candidate_routes, &token_in.denom);

        let ranked = self.rank_routes(routes, token_in).await;
        let mut ranked = filter_duplicate_pool_id_routes(ranked);
        ranked.truncate(self.config.max_routes);

        if ranked.is_empty() {
            return Err(RouterError::NoRoutes {
                token_in_denom: token_in.denom.clone(),
                token_out_denom: token_out_denom.to_string(),
            });
        }

        let max_split_routes = if options.single_route {
            1
        } else {
            self.config.max_split_routes
        };

        let split_candidates = cut_routes_for_splits(max_split_routes, ranked);

        let (best_route, best_out) = (
            split_candidates[0].0.clone(),
            split_candidates[0].1,
        );

        let split_outcome = self
            .split_quote(&split_candidates, token_in, max_split_routes)
            .await;

        let quote = match split_outcome {
            Some((split_routes, split_out)) if split_out > best_out => {
                Quote::new(token_in.clone(), split_out, split_routes)
            }
            _ => Quote::new(
                token_in.clone(),
                best_out,
                vec![SplitRoute {
                    route: best_route,
                    in_amount: token_in.amount,
                    out_amount: best_out,
                }],
            ),
        };

        Ok(quote)
    }

    /// Materializes candidate routes into routable pools. A pool that fails
    /// to materialize drops its route, never the request.
    fn materialize_routes(
        &self,
        candidate_routes: &CandidateRoutes,
        token_in_denom: &str,
    ) -> Vec<Route> {
        let mut routes = Vec::with_capacity(candidate_routes.routes.len());

        'routes: for candidate_route in &candidate_routes.routes {
            let mut pools = Vec::with_capacity(candidate_route.pools.len());
            let mut previous_denom = token_in_denom.to_string();
            let mut has_generalized = false;

            for candidate_pool in &candidate_route.pools {
                let pool = match self.registry.pool(candidate_pool.pool_id) {
                    Ok(pool) => pool,
                    Err(err) => {
                        debug!(pool_id = candidate_pool.pool_id, %err, "skipping route");
                        continue 'routes;
                    }
                };

                let taker_fee = self
                    .repository
                    .taker_fee(&previous_denom, &candidate_pool.token_out_denom)
                    .unwrap_or_else(default_taker_fee);

                let mut routable = match new_routable_pool(
                    &pool,
                    candidate_pool.token_out_denom.clone(),
                    taker_fee,
                    &self.cosmwasm_params,
                ) {
                    Ok(routable) => routable,
                    Err(err) => {
                        debug!(pool_id = candidate_pool.pool_id, %err, "skipping route");
                        continue 'routes;
                    }
                };
                routable.set_token_in_denom(previous_denom.clone());

                has_generalized |= routable.variant() == PoolVariant::GeneralizedCosmWasm;
                previous_denom = candidate_pool.token_out_denom.clone();
                pools.push(routable);
            }

            routes.push(Route {
                pools,
                has_generalized_cosmwasm_pool: has_generalized,
                has_canonical_orderbook_pool: candidate_route.is_canonical_orderbook_route,
            });
        }

        routes
    }

    /// Estimates the out amount of each route for the full input and sorts
    /// the survivors best first. Routes failing estimation are dropped.
    async fn rank_routes(&self, routes: Vec<Route>, token_in: &Coin) -> Vec<(Route, Uint128)> {
        let mut ranked = Vec::with_capacity(routes.len());

        for route in routes {
            match route.calculate_token_out(token_in.clone()).await {
                Ok(token_out) if !token_out.amount.is_zero() => {
                    ranked.push((route, token_out.amount));
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(pool_ids = ?route.pool_ids(), %err, "dropping route failing estimation");
                }
            }
        }

        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    /// Evaluates integer split partitions across the routes and returns the
    /// best split outcome, if any beats evaluating them individually.
    async fn split_quote(
        &self,
        ranked: &[(Route, Uint128)],
        token_in: &Coin,
        max_split_routes: i64,
    ) -> Option<(Vec<SplitRoute>, Uint128)> {
        if max_split_routes == DISABLE_SPLIT_ROUTES || max_split_routes <= 1 {
            return None;
        }

        // Contract-backed pools are excluded from split evaluation to avoid
        // a contract query per partition.
        let splittable: Vec<&(Route, Uint128)> = ranked
            .iter()
            .filter(|(route, _)| !route.has_generalized_cosmwasm_pool)
            .collect();
        if splittable.len() < 2 {
            return None;
        }

        let iterations = self.config.max_split_iterations.max(1) as u64;
        let route_count = splittable.len();

        let mut compositions = Vec::new();
        enumerate_compositions(
            route_count,
            iterations,
            &mut Vec::with_capacity(route_count),
            &mut compositions,
        );

        let mut best: Option<(Vec<u64>, Uint128)> = None;

        for weights in &compositions {
            let mut total_out = Uint128::zero();
            let mut feasible = true;

            for (index, &weight) in weights.iter().enumerate() {
                if weight == 0 {
                    continue;
                }
                let in_amount = token_in.amount.multiply_ratio(weight, iterations);
                if in_amount.is_zero() {
                    continue;
                }
                let token_in_part = Coin {
                    denom: token_in.denom.clone(),
                    amount: in_amount,
                };
                match splittable[index].0.calculate_token_out(token_in_part).await {
                    Ok(out) => total_out += out.amount,
                    Err(_) => {
                        feasible = false;
                        break;
                    }
                }
            }

            if feasible {
                match &best {
                    Some((_, best_out)) if total_out <= *best_out => {}
                    _ => best = Some((weights.clone(), total_out)),
                }
            }
        }

        let (weights, _) = best?;

        // Materialize the winning split with exact input shares: the last
        // nonzero share absorbs the flooring remainder so the shares sum to
        // the full input.
        let mut split_routes = Vec::new();
        let mut assigned = Uint128::zero();
        let nonzero_count = weights.iter().filter(|&&w| w > 0).count();
        let mut seen_nonzero = 0usize;

        for (index, &weight) in weights.iter().enumerate() {
            if weight == 0 {
                continue;
            }
            seen_nonzero += 1;

            let in_amount = if seen_nonzero == nonzero_count {
                token_in.amount - assigned
            } else {
                token_in.amount.multiply_ratio(weight, iterations)
            };
            assigned += in_amount;

            if in_amount.is_zero() {
                continue;
            }

            let route = splittable[index].0.clone();
            let out_amount = route
                .calculate_token_out(Coin {
                    denom: token_in.denom.clone(),
                    amount: in_amount,
                })
                .await
                .ok()?
                .amount;

            split_routes.push(SplitRoute {
                route,
                in_amount,
                out_amount,
            });
        }

        if split_routes.len() < 2 {
            return None;
        }

        let total_out = split_routes
            .iter()
            .fold(Uint128::zero(), |acc, split| acc + split.out_amount);

        Some((split_routes, total_out))
    }

    #[cfg(test)]
    fn cached_candidate_routes(&self, key: &str) -> Option<CandidateRoutes> {
        self.candidate_route_cache.get(&key.to_string())
    }

    #[cfg(test)]
    fn cached_ranked_routes(&self, key: &str) -> Option<CandidateRoutes> {
        self.ranked_route_cache.get(&key.to_string())
    }

    #[cfg(test)]
    fn preload_candidate_cache(&self, key: &str, routes: CandidateRoutes) {
        self.candidate_route_cache
            .insert(key.to_string(), routes, Duration::from_secs(600));
    }

    #[cfg(test)]
    fn preload_ranked_cache(&self, key: &str, routes: CandidateRoutes) {
        self.ranked_route_cache
            .insert(key.to_string(), routes, Duration::from_secs(600));
    }
}

/// Shared order-of-magnitude key: `floor(log10(amount))`, with zero mapping
/// to zero.
pub fn order_of_magnitude(amount: Uint128) -> u32 {
    if amount.is_zero() {
        return 0;
    }
    amount.to_string().len() as u32 - 1
}

fn candidate_route_key(token_in_denom: &str, token_out_denom: &str) -> String {
    format!("{token_in_denom}|{token_out_denom}")
}

fn ranked_route_key(token_in_denom: &str, token_out_denom: &str, magnitude: u32) -> String {
    format!("{token_in_denom}|{token_out_denom}|{magnitude}")
}

/// Drops lower-ranked routes sharing a pool with a higher-ranked one.
/// Transmuter-variant pools are exempt from the shared-pool rule, but a
/// route identical to an earlier one is always dropped.
fn filter_duplicate_pool_id_routes(ranked: Vec<(Route, Uint128)>) -> Vec<(Route, Uint128)> {
    let mut seen_pool_ids: HashSet<u64> = HashSet::new();
    let mut seen_signatures: HashSet<Vec<u64>> = HashSet::new();
    let mut filtered = Vec::with_capacity(ranked.len());

    for (route, amount_out) in ranked {
        let signature = route.pool_ids();
        if seen_signatures.contains(&signature) {
            continue;
        }

        let has_seen_pool = route
            .pools
            .iter()
            .any(|pool| !pool.variant().is_transmuter() && seen_pool_ids.contains(&pool.id()));
        if has_seen_pool {
            continue;
        }

        for pool in &route.pools {
            if !pool.variant().is_transmuter() {
                seen_pool_ids.insert(pool.id());
            }
        }
        seen_signatures.insert(signature);
        filtered.push((route, amount_out));
    }

    filtered
}

/// Truncates the ranked route list for split evaluation: one route when
/// splits are disabled, at most `max_split_routes` otherwise.
fn cut_routes_for_splits(
    max_split_routes: i64,
    mut routes: Vec<(Route, Uint128)>,
) -> Vec<(Route, Uint128)> {
    if max_split_routes == DISABLE_SPLIT_ROUTES || max_split_routes <= 1 {
        routes.truncate(1);
    } else {
        routes.truncate(max_split_routes as usize);
    }
    routes
}

/// All `count`-tuples of non-negative integers summing to `total`.
fn enumerate_compositions(
    count: usize,
    total: u64,
    current: &mut Vec<u64>,
    out: &mut Vec<Vec<u64>>,
) {
    if count == 1 {
        current.push(total);
        out.push(current.clone());
        current.pop();
        return;
    }

    for weight in 0..=total {
        current.push(weight);
        enumerate_compositions(count - 1, total - weight, current, out);
        current.pop();
    }
}
