//! Route and quote types

use std::collections::HashSet;

use cosmwasm_std::{Coin, Decimal, Decimal256, Uint128};
use serde::{Deserialize, Serialize};

use sidecar_core::types::TxFeeInfo;

use crate::errors::RouterError;
use crate::routable::RoutablePool;

/// One hop of a candidate route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatePool {
    pub pool_id: u64,
    pub token_out_denom: String,
}

/// An ordered list of hops from the token in to the token out denom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRoute {
    pub pools: Vec<CandidatePool>,
    pub is_canonical_orderbook_route: bool,
}

/// Candidate routes together with membership metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRoutes {
    pub routes: Vec<CandidateRoute>,
    pub unique_pool_ids: HashSet<u64>,
    pub contains_canonical_orderbook: bool,
}

impl CandidateRoutes {
    pub fn from_routes(routes: Vec<CandidateRoute>) -> Self {
        let mut unique_pool_ids = HashSet::new();
        let mut contains_canonical_orderbook = false;
        for route in &routes {
            contains_canonical_orderbook |= route.is_canonical_orderbook_route;
            for pool in &route.pools {
                unique_pool_ids.insert(pool.pool_id);
            }
        }
        Self {
            routes,
            unique_pool_ids,
            contains_canonical_orderbook,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// A candidate route materialized with routable pools.
#[derive(Debug, Clone)]
pub struct Route {
    pub pools: Vec<RoutablePool>,
    /// Set when any hop requires a contract query for pricing; such routes
    /// are excluded from split evaluation to bound network round-trips.
    pub has_generalized_cosmwasm_pool: bool,
    pub has_canonical_orderbook_pool: bool,
}

impl Route {
    /// Prices the route hop by hop: each hop charges its taker fee on the
    /// input, then swaps the remainder.
    pub async fn calculate_token_out(&self, token_in: Coin) -> Result<Coin, RouterError> {
        let mut current = token_in;
        for pool in &self.pools {
            let after_fee = pool.charge_taker_fee_exact_in(&current);
            current = pool.calculate_token_out_given_in(&after_fee).await?;
        }
        Ok(current)
    }

    /// Final out denom of the route.
    pub fn token_out_denom(&self) -> &str {
        self.pools
            .last()
            .map(|pool| pool.token_out_denom())
            .unwrap_or_default()
    }

    /// Total proportional fee of the route:
    /// `1 - Π (1 - (taker_fee + spread_factor))`.
    pub fn fee(&self) -> Decimal {
        let mut kept = Decimal::one();
        for pool in &self.pools {
            let hop_fee = pool.taker_fee() + pool.spread_factor();
            let hop_kept = if hop_fee < Decimal::one() {
                Decimal::one() - hop_fee
            } else {
                Decimal::zero()
            };
            kept *= hop_kept;
        }
        Decimal::one() - kept
    }

    /// Spot price of the route's token in quoted in its token out, as the
    /// product of per-hop spot prices.
    pub async fn spot_price(&self, token_in_denom: &str) -> Result<Decimal256, RouterError> {
        let mut price = Decimal256::one();
        let mut current_denom = token_in_denom.to_string();
        for pool in &self.pools {
            let hop_price = pool
                .calc_spot_price(&current_denom, pool.token_out_denom())
                .await?;
            price = price
                .checked_mul(hop_price)
                .map_err(|_| RouterError::MathOverflow { pool_id: pool.id() })?;
            current_denom = pool.token_out_denom().to_string();
        }
        Ok(price)
    }

    /// Pool ids along the route, in order.
    pub fn pool_ids(&self) -> Vec<u64> {
        self.pools.iter().map(RoutablePool::id).collect()
    }

    /// The candidate-route shape of this route, for cache storage.
    pub fn to_candidate_route(&self) -> CandidateRoute {
        CandidateRoute {
            pools: self
                .pools
                .iter()
                .map(|pool| CandidatePool {
                    pool_id: pool.id(),
                    token_out_denom: pool.token_out_denom().to_string(),
                })
                .collect(),
            is_canonical_orderbook_route: self.has_canonical_orderbook_pool,
        }
    }
}

/// A route with the share of the input amount assigned to it.
#[derive(Debug, Clone)]
pub struct SplitRoute {
    pub route: Route,
    pub in_amount: Uint128,
    pub out_amount: Uint128,
}

/// A priced swap: the optimal route set with aggregate metrics.
#[derive(Debug, Clone)]
pub struct Quote {
    pub amount_in: Coin,
    pub amount_out: Uint128,
    pub routes: Vec<SplitRoute>,
    pub effective_fee: Decimal,
    pub price_impact: Decimal,
    pub in_base_out_quote_spot_price: Decimal,
    pub price_info: Option<TxFeeInfo>,
}

impl Quote {
    pub fn new(amount_in: Coin, amount_out: Uint128, routes: Vec<SplitRoute>) -> Self {
        Self {
            amount_in,
            amount_out,
            routes,
            effective_fee: Decimal::zero(),
            price_impact: Decimal::zero(),
            in_base_out_quote_spot_price: Decimal::zero(),
            price_info: None,
        }
    }

    /// Computes the aggregate fee, spot price and price impact across the
    /// split routes, weighted by each route's input share.
    pub async fn prepare_result(&mut self) -> Result<(), RouterError> {
        let total_in = self.amount_in.amount;
        if total_in.is_zero() || self.routes.is_empty() {
            return Ok(());
        }

        let mut effective_fee = Decimal::zero();
        let mut spot_price = Decimal256::zero();

        for split in &self.routes {
            let weight = Decimal::from_ratio(split.in_amount, total_in);
            effective_fee += weight * split.route.fee();

            let route_spot = split.route.spot_price(&self.amount_in.denom).await?;
            spot_price = spot_price
                .checked_add(route_spot * Decimal256::from(weight))
                .map_err(|_| RouterError::MathOverflow {
                    pool_id: split.route.pool_ids().first().copied().unwrap_or_default(),
                })?;
        }

        self.effective_fee = effective_fee;
        self.in_base_out_quote_spot_price =
            Decimal::try_from(spot_price).unwrap_or(Decimal::MAX);

        let execution_price = Decimal256::from_ratio(self.amount_out, total_in);
        self.price_impact = if spot_price > execution_price && !spot_price.is_zero() {
            let impact = (spot_price - execution_price)
                .checked_div(spot_price)
                .unwrap_or_default();
            Decimal::try_from(impact).unwrap_or(Decimal::MAX)
        } else {
            Decimal::zero()
        };

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_routes_membership() {
        let routes = vec![
            CandidateRoute {
                pools: vec![
                    CandidatePool {
                        pool_id: 1,
                        token_out_denom: "uion".to_string(),
                    },
                    CandidatePool {
                        pool_id: 2,
                        token_out_denom: "uatom".to_string(),
                    },
                ],
                is_canonical_orderbook_route: false,
            },
            CandidateRoute {
                pools: vec![CandidatePool {
                    pool_id: 3,
                    token_out_denom: "uatom".to_string(),
                }],
                is_canonical_orderbook_route: true,
            },
        ];

        let candidate_routes = CandidateRoutes::from_routes(routes);
        assert_eq!(
            candidate_routes.unique_pool_ids,
            HashSet::from([1, 2, 3])
        );
        assert!(candidate_routes.contains_canonical_orderbook);
    }
}
