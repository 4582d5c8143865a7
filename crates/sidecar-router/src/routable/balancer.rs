//! Balancer (weighted) pool pricing

use cosmwasm_std::{Coin, Decimal, Decimal256, Uint128, Uint256};

use sidecar_pools::model::{BalancerPoolData, WeightedPoolAsset};

use crate::errors::RouterError;

/// Routable wrapper over a weighted pool.
#[derive(Debug, Clone)]
pub struct RoutableBalancerPool {
    pub pool_id: u64,
    pub data: BalancerPoolData,
    pub spread_factor: Decimal,
    pub pool_denoms: Vec<String>,
    pub token_in_denom: String,
    pub token_out_denom: String,
    pub taker_fee: Decimal,
}

impl RoutableBalancerPool {
    /// Weighted constant-product swap:
    /// `out = b_out * (1 - (b_in / (b_in + in_after_spread))^(w_in / w_out))`.
    pub fn calculate_token_out_given_in(&self, token_in: &Coin) -> Result<Coin, RouterError> {
        let asset_in = self.asset(&token_in.denom).ok_or_else(|| {
            RouterError::TokenInDenomPoolNotFound {
                denom: token_in.denom.clone(),
                pool_id: self.pool_id,
            }
        })?;
        let asset_out = self.asset(&self.token_out_denom).ok_or_else(|| {
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

        let balance_in = Decimal256::from_ratio(asset_in.token.amount, 1u128);
        let balance_out = Decimal256::from_ratio(asset_out.token.amount, 1u128);
        let amount_in = Decimal256::from_ratio(amount_in_after_spread, 1u128);

        let ratio = balance_in
            .checked_div(balance_in + amount_in)
            .map_err(|_| RouterError::MathOverflow {
                pool_id: self.pool_id,
            })?;
        let exponent = Decimal256::from_ratio(asset_in.weight, asset_out.weight);

        let pow = pow_dec(ratio, exponent).ok_or(RouterError::MathOverflow {
            pool_id: self.pool_id,
        })?;
        let amount_out = balance_out * (Decimal256::one() - pow);

        Ok(Coin {
            denom: self.token_out_denom.clone(),
            amount: truncate_to_uint128(amount_out, self.pool_id)?,
        })
    }

    /// Spot price of `base` in `quote`:
    /// `(b_quote / w_quote) / (b_base / w_base)`, before fees.
    pub fn calc_spot_price(
        &self,
        base_denom: &str,
        quote_denom: &str,
    ) -> Result<Decimal256, RouterError> {
        let (base, quote) = match (self.asset(base_denom), self.asset(quote_denom)) {
            (Some(base), Some(quote)) => (base, quote),
            _ => {
                return Err(RouterError::SpotPriceUnsupported {
                    base: base_denom.to_string(),
                    quote: quote_denom.to_string(),
                    pool_id: self.pool_id,
                })
            }
        };

        let quote_per_weight =
            Decimal256::from_ratio(quote.token.amount, quote.weight.max(Uint128::one()));
        let base_per_weight =
            Decimal256::from_ratio(base.token.amount, base.weight.max(Uint128::one()));

        quote_per_weight
            .checked_div(base_per_weight)
            .map_err(|_| RouterError::MathOverflow {
                pool_id: self.pool_id,
            })
    }

    fn asset(&self, denom: &str) -> Option<&WeightedPoolAsset> {
        self.data.assets.iter().find(|asset| asset.token.denom == denom)
    }
}

pub(crate) fn truncate_to_uint128(value: Decimal256, pool_id: u64) -> Result<Uint128, RouterError> {
    let floored: Uint256 = value.to_uint_floor();
    Uint128::try_from(floored).map_err(|_| RouterError::MathOverflow { pool_id })
}

/// `base^exponent` for a non-negative decimal exponent. The fractional part
/// is evaluated through binary expansion over successive square roots, which
/// converges within 256-bit decimal precision in at most 64 steps.
pub(crate) fn pow_dec(base: Decimal256, exponent: Decimal256) -> Option<Decimal256> {
    if base.is_zero() {
        return Some(if exponent.is_zero() {
            Decimal256::one()
        } else {
            Decimal256::zero()
        });
    }

    let integer = exponent.to_uint_floor();
    let fractional = exponent - Decimal256::from_ratio(integer, 1u128);

    let integer: u32 = u32::try_from(Uint128::try_from(integer).ok()?.u128()).ok()?;
    let mut result = base.checked_pow(integer).ok()?;

    if fractional.is_zero() {
        return Some(result);
    }

    let mut term = base;
    let mut frac = fractional;
    let two = Decimal256::from_ratio(2u128, 1u128);
    for _ in 0..64 {
        if frac.is_zero() {
            break;
        }
        term = term.sqrt();
        frac = frac.checked_mul(two).ok()?;
        if frac >= Decimal256::one() {
            result = result.checked_mul(term).ok()?;
            frac = frac - Decimal256::one();
        }
    }

    Some(result)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use cosmwasm_std::Uint128;

    use super::*;

    fn pool(balance_in: u128, weight_in: u128, balance_out: u128, weight_out: u128) -> RoutableBalancerPool {
        RoutableBalancerPool {
            pool_id: 1,
            data: BalancerPoolData {
                assets: vec![
                    WeightedPoolAsset {
                        token: Coin::new(balance_in, "uosmo"),
                        weight: Uint128::new(weight_in),
                    },
                    WeightedPoolAsset {
                        token: Coin::new(balance_out, "uatom"),
                        weight: Uint128::new(weight_out),
                    },
                ],
                total_weight: Uint128::new(weight_in + weight_out),
            },
            spread_factor: Decimal::zero(),
            pool_denoms: vec!["uosmo".to_string(), "uatom".to_string()],
            token_in_denom: "uosmo".to_string(),
            token_out_denom: "uatom".to_string(),
            taker_fee: Decimal::zero(),
        }
    }

    #[test]
    fn test_equal_weight_swap_matches_constant_product() {
        let pool = pool(1_000_000, 1, 1_000_000, 1);
        let out = pool
            .calculate_token_out_given_in(&Coin::new(1_000u128, "uosmo"))
            .unwrap();

        // Constant product: 1_000_000 * 1_000 / 1_001_000 = 999.0...
        assert_eq!(out.denom, "uatom");
        assert_eq!(out.amount, Uint128::new(999));
    }

    #[test]
    fn test_spread_factor_reduces_output() {
        let mut with_fee = pool(1_000_000, 1, 1_000_000, 1);
        with_fee.spread_factor = Decimal::percent(1);

        let no_fee = pool(1_000_000, 1, 1_000_000, 1);

        let input = Coin::new(10_000u128, "uosmo");
        let out_with_fee = with_fee.calculate_token_out_given_in(&input).unwrap();
        let out_no_fee = no_fee.calculate_token_out_given_in(&input).unwrap();

        assert!(out_with_fee.amount < out_no_fee.amount);
    }

    #[test]
    fn test_unknown_denom_is_error() {
        let pool = pool(1_000_000, 1, 1_000_000, 1);
        let result = pool.calculate_token_out_given_in(&Coin::new(1_000u128, "ujunk"));
        assert!(matches!(
            result,
            Err(RouterError::TokenInDenomPoolNotFound { .. })
        ));
    }

    #[test]
    fn test_spot_price_weighted() {
        // 2:1 balances with equal weights: 1 uosmo = 2 uatom.
        let pool = pool(1_000_000, 1, 2_000_000, 1);
        let price = pool.calc_spot_price("uosmo", "uatom").unwrap();
        assert_eq!(price, Decimal256::from_str("2").unwrap());
    }

    #[test]
    fn test_pow_dec_integer_and_fractional() {
        let four = Decimal256::from_str("4").unwrap();
        let half = Decimal256::from_str("0.5").unwrap();

        // 4^0.5 = 2
        let result = pow_dec(four, half).unwrap();
        let expected = Decimal256::from_str("2").unwrap();
        let diff = if result > expected {
            result - expected
        } else {
            expected - result
        };
        assert!(diff < Decimal256::from_str("0.000001").unwrap());

        // 4^2 = 16
        let result = pow_dec(four, Decimal256::from_str("2").unwrap()).unwrap();
        assert_eq!(result, Decimal256::from_str("16").unwrap());
    }
}
