//! Candidate route search
//!
//! Bounded depth-first expansion over the denom-indexed pool graph
//! maintained by the ingester. Deterministic for a fixed index snapshot.

use std::collections::HashSet;

use cosmwasm_std::{Coin, Uint128};

use sidecar_pools::registry::PoolRegistry;

use crate::repository::RouterRepository;
use crate::route::{CandidatePool, CandidateRoute, CandidateRoutes};

/// Caps applied to the route search.
#[derive(Debug, Clone)]
pub struct CandidateRouteSearchOptions {
    pub max_routes: usize,
    pub max_pools_per_route: usize,
    pub min_pool_liquidity_cap: Uint128,
}

/// Finds up to `max_routes` routes from the token in denom to the token out
/// denom, each at most `max_pools_per_route` hops long, over pools meeting
/// the liquidity cap floor.
pub fn find_candidate_routes(
    repository: &RouterRepository,
    registry: &PoolRegistry,
    token_in: &Coin,
    token_out_denom: &str,
    options: &CandidateRouteSearchOptions,
) -> CandidateRoutes {
    // Canonical orderbook pool for the requested pair, if one exists; routes
    // containing it are tagged.
    let canonical_orderbook_pool_id = registry
        .canonical_orderbook(&token_in.denom, token_out_denom)
        .map(|(pool_id, _)| pool_id)
        .ok();

    struct Frontier {
        denom: String,
        route: Vec<CandidatePool>,
        visited_denoms: HashSet<String>,
        used_pool_ids: HashSet<u64>,
    }

    let mut routes: Vec<CandidateRoute> = Vec::new();
    let mut stack = vec![Frontier {
        denom: token_in.denom.clone(),
        route: Vec::new(),
        visited_denoms: HashSet::from([token_in.denom.clone()]),
        used_pool_ids: HashSet::new(),
    }];

    'search: while let Some(frontier) = stack.pop() {
        let denom_data = repository.denom_data(&frontier.denom);

        let mut extensions = Vec::new();

        for pool in &denom_data.sorted_pools {
            if pool.liquidity_cap < options.min_pool_liquidity_cap {
                continue;
            }
            if frontier.used_pool_ids.contains(&pool.id) {
                continue;
            }

            for next_denom in &pool.pool_denoms {
                if next_denom == &frontier.denom || frontier.visited_denoms.contains(next_denom)
                {
                    continue;
                }

                let mut route = frontier.route.clone();
                route.push(CandidatePool {
                    pool_id: pool.id,
                    token_out_denom: next_denom.clone(),
                });

                if next_denom == token_out_denom {
                    let is_canonical_orderbook_route = canonical_orderbook_pool_id
                        .is_some_and(|canonical_id| {
                            route.iter().any(|hop| hop.pool_id == canonical_id)
                        });
                    routes.push(CandidateRoute {
                        pools: route,
                        is_canonical_orderbook_route,
                    });

                    if routes.len() >= options.max_routes {
                        break 'search;
                    }
                    continue;
                }

                if route.len() >= options.max_pools_per_route {
                    continue; // prune: the route can no longer reach the target
                }

                let mut visited_denoms = frontier.visited_denoms.clone();
                visited_denoms.insert(next_denom.clone());
                let mut used_pool_ids = frontier.used_pool_ids.clone();
                used_pool_ids.insert(pool.id);

                extensions.push(Frontier {
                    denom: next_denom.clone(),
                    route,
                    visited_denoms,
                    used_pool_ids,
                });
            }
        }

        // Depth first: the first-ranked extension goes on top of the stack
        // so its branch is fully explored before any sibling.
        for extension in extensions.into_iter().rev() {
            stack.push(extension);
        }
    }

    CandidateRoutes::from_routes(routes)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::*;
    use crate::repository::{CandidateRouteDenomData, CandidateRoutePoolData};
    use sidecar_pools::tokens::TokenRegistry;

    fn pool_data(id: u64, denoms: &[&str], cap: u128) -> CandidateRoutePoolData {
        CandidateRoutePoolData {
            id,
            pool_denoms: denoms.iter().map(|d| d.to_string()).collect(),
            liquidity_cap: Uint128::new(cap),
        }
    }

    fn index(repository: &RouterRepository, entries: &[(&str, Vec<CandidateRoutePoolData>)]) {
        let data: HashMap<String, CandidateRouteDenomData> = entries
            .iter()
            .map(|(denom, pools)| {
                (
                    denom.to_string(),
                    CandidateRouteDenomData {
                        sorted_pools: pools.clone(),
                    },
                )
            })
            .collect();
        repository.set_candidate_route_search_data(data);
    }

    fn options(max_routes: usize, max_pools: usize, min_cap: u128) -> CandidateRouteSearchOptions {
        CandidateRouteSearchOptions {
            max_routes,
            max_pools_per_route: max_pools,
            min_pool_liquidity_cap: Uint128::new(min_cap),
        }
    }

    fn registry() -> PoolRegistry {
        PoolRegistry::new(Arc::new(TokenRegistry::new()))
    }

    #[test]
    fn test_direct_route() {
        let repository = RouterRepository::new();
        index(
            &repository,
            &[("uosmo", vec![pool_data(1, &["uosmo", "uatom"], 100)])],
        );

        let routes = find_candidate_routes(
            &repository,
            &registry(),
            &Coin::new(1_000u128, "uosmo"),
            "uatom",
            &options(5, 3, 0),
        );

        assert_eq!(routes.routes.len(), 1);
        assert_eq!(routes.routes[0].pools.len(), 1);
        assert_eq!(routes.routes[0].pools[0].pool_id, 1);
        assert!(routes.unique_pool_ids.contains(&1));
    }

    #[test]
    fn test_multi_hop_route() {
        let repository = RouterRepository::new();
        index(
            &repository,
            &[
                ("uosmo", vec![pool_data(1, &["uosmo", "uion"], 100)]),
                ("uion", vec![pool_data(2, &["uion", "uatom"], 100)]),
            ],
        );

        let routes = find_candidate_routes(
            &repository,
            &registry(),
            &Coin::new(1_000u128, "uosmo"),
            "uatom",
            &options(5, 3, 0),
        );

        assert_eq!(routes.routes.len(), 1);
        let hops: Vec<u64> = routes.routes[0]
            .pools
            .iter()
            .map(|p| p.pool_id)
            .collect();
        assert_eq!(hops, vec![1, 2]);
    }

    #[test]
    fn test_max_pools_per_route_prunes() {
        let repository = RouterRepository::new();
        index(
            &repository,
            &[
                ("uosmo", vec![pool_data(1, &["uosmo", "a"], 100)]),
                ("a", vec![pool_data(2, &["a", "b"], 100)]),
                ("b", vec![pool_data(3, &["b", "uatom"], 100)]),
            ],
        );

        let short = find_candidate_routes(
            &repository,
            &registry(),
            &Coin::new(1_000u128, "uosmo"),
            "uatom",
            &options(5, 2, 0),
        );
        assert!(short.routes.is_empty());

        let long = find_candidate_routes(
            &repository,
            &registry(),
            &Coin::new(1_000u128, "uosmo"),
            "uatom",
            &options(5, 3, 0),
        );
        assert_eq!(long.routes.len(), 1);
        assert_eq!(long.routes[0].pools.len(), 3);
    }

    #[test]
    fn test_min_liquidity_cap_excludes_pools() {
        let repository = RouterRepository::new();
        index(
            &repository,
            &[(
                "uosmo",
                vec![
                    pool_data(1, &["uosmo", "uatom"], 10),
                    pool_data(2, &["uosmo", "uatom"], 1_000),
                ],
            )],
        );

        let routes = find_candidate_routes(
            &repository,
            &registry(),
            &Coin::new(1_000u128, "uosmo"),
            "uatom",
            &options(5, 3, 100),
        );

        assert_eq!(routes.routes.len(), 1);
        assert_eq!(routes.routes[0].pools[0].pool_id, 2);
    }

    #[test]
    fn test_max_routes_stops_search() {
        let repository = RouterRepository::new();
        index(
            &repository,
            &[(
                "uosmo",
                vec![
                    pool_data(1, &["uosmo", "uatom"], 100),
                    pool_data(2, &["uosmo", "uatom"], 100),
                    pool_data(3, &["uosmo", "uatom"], 100),
                ],
            )],
        );

        let routes = find_candidate_routes(
            &repository,
            &registry(),
            &Coin::new(1_000u128, "uosmo"),
            "uatom",
            &options(2, 3, 0),
        );

        assert_eq!(routes.routes.len(), 2);
    }

    #[test]
    fn test_depth_first_descends_branch_before_siblings() {
        let repository = RouterRepository::new();
        // uosmo branches into "a" and "b" before the target is reachable.
        // The a-branch needs two more hops, the b-branch one. Depth-first
        // search descends the a-branch fully before expanding the b
        // frontier, so with max_routes = 1 the deeper route is the one
        // accepted. A breadth-first pass would return [2, 4] instead.
        index(
            &repository,
            &[
                (
                    "uosmo",
                    vec![
                        pool_data(1, &["uosmo", "a"], 100),
                        pool_data(2, &["uosmo", "b"], 100),
                    ],
                ),
                ("a", vec![pool_data(3, &["a", "c"], 100)]),
                ("c", vec![pool_data(5, &["c", "uatom"], 100)]),
                ("b", vec![pool_data(4, &["b", "uatom"], 100)]),
            ],
        );

        let routes = find_candidate_routes(
            &repository,
            &registry(),
            &Coin::new(1_000u128, "uosmo"),
            "uatom",
            &options(1, 3, 0),
        );

        assert_eq!(routes.routes.len(), 1);
        let hops: Vec<u64> = routes.routes[0]
            .pools
            .iter()
            .map(|p| p.pool_id)
            .collect();
        assert_eq!(hops, vec![1, 3, 5]);

        // With the cap lifted both branches are found.
        let routes = find_candidate_routes(
            &repository,
            &registry(),
            &Coin::new(1_000u128, "uosmo"),
            "uatom",
            &options(10, 3, 0),
        );
        assert_eq!(routes.routes.len(), 2);
    }

    #[test]
    fn test_no_revisiting_denoms() {
        let repository = RouterRepository::new();
        // A cycle uosmo -> a -> uosmo must not produce routes through it.
        index(
            &repository,
            &[
                (
                    "uosmo",
                    vec![
                        pool_data(1, &["uosmo", "a"], 100),
                        pool_data(2, &["uosmo", "uatom"], 100),
                    ],
                ),
                ("a", vec![pool_data(3, &["a", "uosmo"], 100)]),
            ],
        );

        let routes = find_candidate_routes(
            &repository,
            &registry(),
            &Coin::new(1_000u128, "uosmo"),
            "uatom",
            &options(10, 4, 0),
        );

        assert_eq!(routes.routes.len(), 1);
        assert_eq!(routes.routes[0].pools[0].pool_id, 2);
    }
}
