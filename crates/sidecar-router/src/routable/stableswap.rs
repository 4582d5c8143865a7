//! StableSwap pool pricing
//!
//! Solidly-style constant: `k = x*y*(x^2 + y^2)` over scaled reserves. The
//! out amount is solved by bisection on the invariant, which converges well
//! within 256-bit decimal precision in under 100 iterations.

use cosmwasm_std::{Coin, Decimal, Decimal256};

use sidecar_pools::model::StableSwapPoolData;

use crate::errors::RouterError;
use crate::routable::balancer::truncate_to_uint128;

const BISECTION_ITERATIONS: usize = 96;

/// Routable wrapper over a stableswap pool.
#[derive(Debug, Clone)]
pub struct RoutableStableSwapPool {
    pub pool_id: u64,
    pub data: StableSwapPoolData,
    pub spread_factor: Decimal,
    pub pool_denoms: Vec<String>,
    pub token_in_denom: String,
    pub token_out_denom: String,
    pub taker_fee: Decimal,
}

impl RoutableStableSwapPool {
    pub fn calculate_token_out_given_in(&self, token_in: &Coin) -> Result<Coin, RouterError> {
        let (balance_in, scale_in) = self.reserve(&token_in.denom).ok_or_else(|| {
            RouterError::TokenInDenomPoolNotFound {
                denom: token_in.denom.clone(),
                pool_id: self.pool_id,
            }
        })?;
        let (balance_out, scale_out) = self.reserve(&self.token_out_denom).ok_or_else(|| {
            RouterError::TokenOutDenomPoolNotFound {
                denom: self.token_out_denom.clone(),
                pool_id: self.pool_id,
            }
        })?;

        let amount_in_after_spread =
            token_in.amount.mul_floor(Decimal::one() - self.spread_factor);
        if amount_in_after_spread.is_zero() {
            return Ok(Coin::new(0u128, self.token_out_denom.clone()));
        }

        // Scale reserves and input to common precision.
        let x = Decimal256::from_ratio(balance_in, scale_in);
        let y = Decimal256::from_ratio(balance_out, scale_out);
        let a = Decimal256::from_ratio(amount_in_after_spread, scale_in);

        if x.is_zero() || y.is_zero() {
            return Err(RouterError::NotEnoughLiquidityToCompleteSwap {
                pool_id: self.pool_id,
            });
        }

        let k = cfmm_constant(x, y).ok_or(RouterError::MathOverflow {
            pool_id: self.pool_id,
        })?;
        let x_next = x + a;

        // Bisect b in [0, y): k(x + a, y - b) decreases in b, so find the
        // largest b keeping the invariant at least k.
        let mut lo = Decimal256::zero();
        let mut hi = y;
        let two = Decimal256::from_ratio(2u128, 1u128);
        for _ in 0..BISECTION_ITERATIONS {
            let mid = (lo + hi) / two;
            let k_mid = cfmm_constant(x_next, y - mid).ok_or(RouterError::MathOverflow {
                pool_id: self.pool_id,
            })?;
            if k_mid >= k {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        let amount_out_scaled = lo;
        let amount_out = amount_out_scaled
            .checked_mul(Decimal256::from_ratio(scale_out, 1u64))
            .map_err(|_| RouterError::MathOverflow {
                pool_id: self.pool_id,
            })?;

        Ok(Coin {
            denom: self.token_out_denom.clone(),
            amount: truncate_to_uint128(amount_out, self.pool_id)?,
        })
    }

    /// Spot price from the invariant gradient:
    /// `p = (3x^2*y + y^3) / (x^3 + 3x*y^2)` with `x` the base reserve.
    pub fn calc_spot_price(
        &self,
        base_denom: &str,
        quote_denom: &str,
    ) -> Result<Decimal256, RouterError> {
        let unsupported = || RouterError::SpotPriceUnsupported {
            base: base_denom.to_string(),
            quote: quote_denom.to_string(),
            pool_id: self.pool_id,
        };

        let (base_balance, base_scale) = self.reserve(base_denom).ok_or_else(unsupported)?;
        let (quote_balance, quote_scale) = self.reserve(quote_denom).ok_or_else(unsupported)?;

        let x = Decimal256::from_ratio(base_balance, base_scale);
        let y = Decimal256::from_ratio(quote_balance, quote_scale);
        if x.is_zero() || y.is_zero() {
            return Err(unsupported());
        }

        let three = Decimal256::from_ratio(3u128, 1u128);
        let numerator = three * x * x * y + y * y * y;
        let denominator = x * x * x + three * x * y * y;

        numerator
            .checked_div(denominator)
            .map_err(|_| RouterError::MathOverflow {
                pool_id: self.pool_id,
            })
    }

    fn reserve(&self, denom: &str) -> Option<(cosmwasm_std::Uint128, u64)> {
        let index = self
            .data
            .liquidity
            .iter()
            .position(|coin| coin.denom == denom)?;
        let scaling_factor = self.data.scaling_factors.get(index).copied().unwrap_or(1);
        Some((
            self.data.liquidity[index].amount,
            scaling_factor.max(1),
        ))
    }
}

fn cfmm_constant(x: Decimal256, y: Decimal256) -> Option<Decimal256> {
    let xy = x.checked_mul(y).ok()?;
    let x2 = x.checked_mul(x).ok()?;
    let y2 = y.checked_mul(y).ok()?;
    xy.checked_mul(x2.checked_add(y2).ok()?).ok()
}
