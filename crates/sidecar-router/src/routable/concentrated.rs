//! Concentrated-liquidity pool pricing
//!
//! Walks liquidity buckets from the current tick outward, swapping within
//! each bucket until the input is exhausted. Sqrt prices per tick are
//! memoized globally; the memo is a pure function cache, so a size cap is
//! the only eviction policy it needs.

use std::sync::LazyLock;

use cosmwasm_std::{Coin, Decimal, Decimal256};
use dashmap::DashMap;

use sidecar_pools::model::{ConcentratedPoolData, TickModel};
use sidecar_pools::tick_math::{self, TickMathError};

use crate::errors::RouterError;
use crate::routable::balancer::truncate_to_uint128;

static TICK_SQRT_PRICE_CACHE: LazyLock<DashMap<i64, Decimal256>> = LazyLock::new(DashMap::new);

/// At 100k entries the memo sits around 30MB; one million bounds the worst
/// case while covering every tick a production pool set can reference.
const TICK_SQRT_PRICE_CACHE_CAP: usize = 1_000_000;

fn tick_to_sqrt_price_cached(tick: i64) -> Result<Decimal256, TickMathError> {
    if let Some(cached) = TICK_SQRT_PRICE_CACHE.get(&tick) {
        return Ok(*cached);
    }

    let sqrt_price = tick_math::tick_to_sqrt_price(tick)?;
    if TICK_SQRT_PRICE_CACHE.len() < TICK_SQRT_PRICE_CACHE_CAP {
        TICK_SQRT_PRICE_CACHE.insert(tick, sqrt_price);
    }
    Ok(sqrt_price)
}

/// Routable wrapper over a concentrated-liquidity pool.
#[derive(Debug, Clone)]
pub struct RoutableConcentratedPool {
    pub pool_id: u64,
    pub data: ConcentratedPoolData,
    pub tick_model: Option<TickModel>,
    pub spread_factor: Decimal,
    pub token_in_denom: String,
    pub token_out_denom: String,
    pub taker_fee: Decimal,
}

impl RoutableConcentratedPool {
    /// Computes the out amount by swapping bucket to bucket.
    ///
    /// Fails fast when the tick model is absent, the pool has no liquidity,
    /// the current bucket index is out of range, the chain-reported current
    /// tick disagrees with the bucket, or the current sqrt price is zero.
    /// Running out of buckets mid-swap is `NotEnoughLiquidityToCompleteSwap`.
    pub fn calculate_token_out_given_in(&self, token_in: &Coin) -> Result<Coin, RouterError> {
        let pool_id = self.pool_id;
        let tick_model = self
            .tick_model
            .as_ref()
            .ok_or(RouterError::ConcentratedTickModelNotSet { pool_id })?;

        if tick_model.has_no_liquidity {
            return Err(RouterError::ConcentratedNoLiquidity { pool_id });
        }

        let total_buckets = tick_model.ticks.len() as i64;
        let mut current_bucket_index = tick_model.current_tick_index;
        if current_bucket_index < 0 || current_bucket_index >= total_buckets {
            return Err(RouterError::ConcentratedCurrentTickNotWithinBucket {
                pool_id,
                current_bucket_index,
                total_buckets,
            });
        }

        let current_bucket = &tick_model.ticks[current_bucket_index as usize];
        if !self
            .data
            .is_current_tick_in_range(current_bucket.lower_tick, current_bucket.upper_tick)
        {
            return Err(RouterError::ConcentratedCurrentTickAndBucketMismatch {
                pool_id,
                current_tick: self.data.current_tick,
                lower_tick: current_bucket.lower_tick,
                upper_tick: current_bucket.upper_tick,
            });
        }

        if token_in.denom != self.data.token0 && token_in.denom != self.data.token1 {
            return Err(RouterError::TokenInDenomPoolNotFound {
                denom: token_in.denom.clone(),
                pool_id,
            });
        }

        // Zero for one swaps toward lower ticks, one for zero toward upper.
        let is_zero_for_one = token_in.denom == self.data.token0;
        let token_out_denom = if is_zero_for_one {
            self.data.token1.clone()
        } else {
            self.data.token0.clone()
        };

        let mut current_sqrt_price = self.data.current_sqrt_price;
        if current_sqrt_price.is_zero() {
            return Err(RouterError::ConcentratedZeroCurrentSqrtPrice { pool_id });
        }

        let overflow = || RouterError::MathOverflow { pool_id };

        // The pool spread factor is charged on the input side.
        let amount_in_after_spread =
            token_in.amount.mul_floor(Decimal::one() - self.spread_factor);
        let mut amount_remaining_in = Decimal256::from_ratio(amount_in_after_spread, 1u128);
        let mut amount_out_total = Decimal256::zero();

        while !amount_remaining_in.is_zero() {
            if current_bucket_index < 0 || current_bucket_index >= total_buckets {
                // The input outlasted the initialized liquidity.
                return Err(RouterError::NotEnoughLiquidityToCompleteSwap { pool_id });
            }

            let bucket = &tick_model.ticks[current_bucket_index as usize];

            let next_initialized_tick = if is_zero_for_one {
                current_bucket_index -= 1;
                bucket.lower_tick
            } else {
                current_bucket_index += 1;
                bucket.upper_tick
            };

            let sqrt_price_target = tick_to_sqrt_price_cached(next_initialized_tick)?;
            let liquidity = Decimal256::from(bucket.liquidity_amount);

            let (amount_in_consumed, amount_out_computed, sqrt_price_next) = if is_zero_for_one {
                compute_swap_zero_for_one(
                    current_sqrt_price,
                    sqrt_price_target,
                    liquidity,
                    amount_remaining_in,
                )
            } else {
                compute_swap_one_for_zero(
                    current_sqrt_price,
                    sqrt_price_target,
                    liquidity,
                    amount_remaining_in,
                )
            }
            .ok_or_else(overflow)?;

            amount_remaining_in = amount_remaining_in
                .checked_sub(amount_in_consumed)
                .map_err(|_| overflow())?;
            amount_out_total = amount_out_total
                .checked_add(amount_out_computed)
                .map_err(|_| overflow())?;
            current_sqrt_price = sqrt_price_next;
        }

        Ok(Coin {
            denom: token_out_denom,
            amount: truncate_to_uint128(amount_out_total, pool_id)?,
        })
    }

    /// Spot price from the current sqrt price: `sqrt^2` prices token0 in
    /// token1.
    pub fn calc_spot_price(
        &self,
        base_denom: &str,
        quote_denom: &str,
    ) -> Result<Decimal256, RouterError> {
        let price_token0_in_token1 = self
            .data
            .current_sqrt_price
            .checked_mul(self.data.current_sqrt_price)
            .map_err(|_| RouterError::MathOverflow {
                pool_id: self.pool_id,
            })?;

        if base_denom == self.data.token0 && quote_denom == self.data.token1 {
            return Ok(price_token0_in_token1);
        }

        if base_denom == self.data.token1 && quote_denom == self.data.token0 {
            return Decimal256::one()
                .checked_div(price_token0_in_token1)
                .map_err(|_| RouterError::ConcentratedZeroCurrentSqrtPrice {
                    pool_id: self.pool_id,
                });
        }

        Err(RouterError::SpotPriceUnsupported {
            base: base_denom.to_string(),
            quote: quote_denom.to_string(),
            pool_id: self.pool_id,
        })
    }
}

/// Swap within one bucket toward a lower sqrt price. Returns
/// `(amount_in_consumed, amount_out, sqrt_price_next)`.
fn compute_swap_zero_for_one(
    sqrt_price_current: Decimal256,
    sqrt_price_target: Decimal256,
    liquidity: Decimal256,
    amount_remaining_in: Decimal256,
) -> Option<(Decimal256, Decimal256, Decimal256)> {
    if liquidity.is_zero() || sqrt_price_current <= sqrt_price_target {
        return Some((Decimal256::zero(), Decimal256::zero(), sqrt_price_target));
    }

    let price_range = sqrt_price_current - sqrt_price_target;
    let price_product = sqrt_price_current.checked_mul(sqrt_price_target).ok()?;
    if price_product.is_zero() {
        return None;
    }

    // token0 required to push the price down to the target.
    let amount_in_to_target = liquidity
        .checked_mul(price_range)
        .ok()?
        .checked_div(price_product)
        .ok()?;

    if amount_remaining_in >= amount_in_to_target {
        let amount_out = liquidity.checked_mul(price_range).ok()?;
        return Some((amount_in_to_target, amount_out, sqrt_price_target));
    }

    // Partial consumption within the bucket:
    // sqrt_next = L * sqrt / (L + in * sqrt)
    let denominator = liquidity.checked_add(
        amount_remaining_in
            .checked_mul(sqrt_price_current)
            .ok()?,
    )
    .ok()?;
    let sqrt_price_next = liquidity
        .checked_mul(sqrt_price_current)
        .ok()?
        .checked_div(denominator)
        .ok()?;
    let amount_out = liquidity
        .checked_mul(sqrt_price_current - sqrt_price_next)
        .ok()?;

    Some((amount_remaining_in, amount_out, sqrt_price_next))
}

/// Swap within one bucket toward a higher sqrt price. Returns
/// `(amount_in_consumed, amount_out, sqrt_price_next)`.
fn compute_swap_one_for_zero(
    sqrt_price_current: Decimal256,
    sqrt_price_target: Decimal256,
    liquidity: Decimal256,
    amount_remaining_in: Decimal256,
) -> Option<(Decimal256, Decimal256, Decimal256)> {
    if liquidity.is_zero() || sqrt_price_target <= sqrt_price_current {
        return Some((Decimal256::zero(), Decimal256::zero(), sqrt_price_target));
    }

    let price_range = sqrt_price_target - sqrt_price_current;

    // token1 required to push the price up to the target.
    let amount_in_to_target = liquidity.checked_mul(price_range).ok()?;

    if amount_remaining_in >= amount_in_to_target {
        let price_product = sqrt_price_target.checked_mul(sqrt_price_current).ok()?;
        if price_product.is_zero() {
            return None;
        }
        let amount_out = liquidity
            .checked_mul(price_range)
            .ok()?
            .checked_div(price_product)
            .ok()?;
        return Some((amount_in_to_target, amount_out, sqrt_price_target));
    }

    // Partial consumption: sqrt_next = sqrt + in / L
    let sqrt_price_next = sqrt_price_current.checked_add(
        amount_remaining_in.checked_div(liquidity).ok()?,
    )
    .ok()?;
    let price_product = sqrt_price_next.checked_mul(sqrt_price_current).ok()?;
    if price_product.is_zero() {
        return None;
    }
    let amount_out = liquidity
        .checked_mul(sqrt_price_next - sqrt_price_current)
        .ok()?
        .checked_div(price_product)
        .ok()?;

    Some((amount_remaining_in, amount_out, sqrt_price_next))
}

#[cfg(test)]
mod tests {
    use cosmwasm_std::Uint128;
    use std::str::FromStr;

    use sidecar_pools::model::LiquidityDepthsWithRange;

    use super::*;

    fn pool(tick_model: Option<TickModel>) -> RoutableConcentratedPool {
        RoutableConcentratedPool {
            pool_id: 7,
            data: ConcentratedPoolData {
                token0: "uosmo".to_string(),
                token1: "uatom".to_string(),
                current_tick: 0,
                current_sqrt_price: Decimal256::one(),
                tick_spacing: 100,
            },
            tick_model,
            spread_factor: Decimal::zero(),
            token_in_denom: String::new(),
            token_out_denom: "uatom".to_string(),
            taker_fee: Decimal::zero(),
        }
    }

    fn single_bucket_model(liquidity: &str) -> TickModel {
        TickModel {
            ticks: vec![LiquidityDepthsWithRange {
                lower_tick: -1_000,
                upper_tick: 1_000,
                liquidity_amount: Decimal::from_str(liquidity).unwrap(),
            }],
            current_tick_index: 0,
            has_no_liquidity: false,
        }
    }

    #[test]
    fn test_requires_tick_model() {
        let pool = pool(None);
        let result = pool.calculate_token_out_given_in(&Coin::new(100u128, "uosmo"));
        assert!(matches!(
            result,
            Err(RouterError::ConcentratedTickModelNotSet { pool_id: 7 })
        ));
    }

    #[test]
    fn test_requires_liquidity() {
        let mut model = single_bucket_model("1000000");
        model.has_no_liquidity = true;
        let pool = pool(Some(model));
        let result = pool.calculate_token_out_given_in(&Coin::new(100u128, "uosmo"));
        assert!(matches!(
            result,
            Err(RouterError::ConcentratedNoLiquidity { .. })
        ));
    }

    #[test]
    fn test_bucket_index_out_of_range() {
        let mut model = single_bucket_model("1000000");
        model.current_tick_index = 5;
        let pool = pool(Some(model));
        let result = pool.calculate_token_out_given_in(&Coin::new(100u128, "uosmo"));
        assert!(matches!(
            result,
            Err(RouterError::ConcentratedCurrentTickNotWithinBucket { .. })
        ));
    }

    #[test]
    fn test_current_tick_bucket_mismatch() {
        let model = TickModel {
            ticks: vec![LiquidityDepthsWithRange {
                lower_tick: 500,
                upper_tick: 1_000,
                liquidity_amount: Decimal::from_str("1000000").unwrap(),
            }],
            current_tick_index: 0,
            has_no_liquidity: false,
        };
        // Current tick 0 is outside [500, 1000].
        let pool = pool(Some(model));
        let result = pool.calculate_token_out_given_in(&Coin::new(100u128, "uosmo"));
        assert!(matches!(
            result,
            Err(RouterError::ConcentratedCurrentTickAndBucketMismatch { .. })
        ));
    }

    #[test]
    fn test_zero_sqrt_price() {
        let mut pool = pool(Some(single_bucket_model("1000000")));
        pool.data.current_sqrt_price = Decimal256::zero();
        let result = pool.calculate_token_out_given_in(&Coin::new(100u128, "uosmo"));
        assert!(matches!(
            result,
            Err(RouterError::ConcentratedZeroCurrentSqrtPrice { .. })
        ));
    }

    #[test]
    fn test_small_swap_near_price_one() {
        let pool = pool(Some(single_bucket_model("100000000")));
        let out = pool
            .calculate_token_out_given_in(&Coin::new(10_000u128, "uosmo"))
            .unwrap();

        assert_eq!(out.denom, "uatom");
        // At price ~1 with deep liquidity the output tracks the input
        // closely from below.
        assert!(out.amount > Uint128::new(9_900), "got {}", out.amount);
        assert!(out.amount <= Uint128::new(10_000));
    }

    #[test]
    fn test_swap_direction_one_for_zero() {
        let pool = pool(Some(single_bucket_model("100000000")));
        let out = pool
            .calculate_token_out_given_in(&Coin::new(10_000u128, "uatom"))
            .unwrap();
        assert_eq!(out.denom, "uosmo");
        assert!(out.amount > Uint128::new(9_900));
    }

    #[test]
    fn test_not_enough_liquidity() {
        let pool = pool(Some(single_bucket_model("1000")));
        let result =
            pool.calculate_token_out_given_in(&Coin::new(1_000_000_000_000u128, "uosmo"));
        assert!(matches!(
            result,
            Err(RouterError::NotEnoughLiquidityToCompleteSwap { pool_id: 7 })
        ));
    }

    #[test]
    fn test_spot_price_directions() {
        let mut pool = pool(Some(single_bucket_model("1000000")));
        pool.data.current_sqrt_price = Decimal256::from_str("2").unwrap();

        // price of token0 in token1 = 4
        let price = pool.calc_spot_price("uosmo", "uatom").unwrap();
        assert_eq!(price, Decimal256::from_str("4").unwrap());

        let inverse = pool.calc_spot_price("uatom", "uosmo").unwrap();
        assert_eq!(inverse, Decimal256::from_str("0.25").unwrap());
    }
}
