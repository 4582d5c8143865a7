//! CosmWasm pool pricing: transmuter family, orderbook, and generalized
//! contract-backed pools.

use std::fmt;
use std::sync::Arc;

use cosmwasm_std::{Coin, Decimal256, Uint128};

use sidecar_chain::WasmQueryClient;
use sidecar_pools::model::{AlloyTransmuterData, OrderbookData};
use sidecar_pools::tick_math;

use crate::errors::RouterError;
use crate::routable::balancer::truncate_to_uint128;

/// Transmuter v1: 1:1 conversion bounded by the pool's balance of the out
/// denom.
#[derive(Debug, Clone)]
pub struct RoutableTransmuterPool {
    pub pool_id: u64,
    pub code_id: u64,
    pub balances: Vec<Coin>,
    pub pool_denoms: Vec<String>,
    pub token_in_denom: String,
    pub token_out_denom: String,
    pub taker_fee: cosmwasm_std::Decimal,
}

impl RoutableTransmuterPool {
    pub fn calculate_token_out_given_in(&self, token_in: &Coin) -> Result<Coin, RouterError> {
        if !self.pool_denoms.iter().any(|denom| denom == &token_in.denom) {
            return Err(RouterError::TokenInDenomPoolNotFound {
                denom: token_in.denom.clone(),
                pool_id: self.pool_id,
            });
        }

        let out_balance = balance_of(&self.balances, &self.token_out_denom);
        if token_in.amount > out_balance {
            return Err(RouterError::NotEnoughLiquidityToCompleteSwap {
                pool_id: self.pool_id,
            });
        }

        Ok(Coin {
            denom: self.token_out_denom.clone(),
            amount: token_in.amount,
        })
    }

    pub fn calc_spot_price(
        &self,
        _base_denom: &str,
        _quote_denom: &str,
    ) -> Result<Decimal256, RouterError> {
        Ok(Decimal256::one())
    }
}

/// Alloyed transmuter: conversion through per-asset normalization factors.
#[derive(Debug, Clone)]
pub struct RoutableAlloyedPool {
    pub pool_id: u64,
    pub code_id: u64,
    pub alloy: AlloyTransmuterData,
    pub balances: Vec<Coin>,
    pub pool_denoms: Vec<String>,
    pub token_in_denom: String,
    pub token_out_denom: String,
    pub taker_fee: cosmwasm_std::Decimal,
}

impl RoutableAlloyedPool {
    pub fn calculate_token_out_given_in(&self, token_in: &Coin) -> Result<Coin, RouterError> {
        let factor_in = self.normalization_factor(&token_in.denom)?;
        let factor_out = self.normalization_factor(&self.token_out_denom)?;

        // amount_out = amount_in * factor_out / factor_in, floored.
        let amount_out = token_in.amount.multiply_ratio(factor_out, factor_in);

        // Minting the alloyed denom is unbounded; redeeming an underlying
        // asset is limited by the pool's balance of it.
        if self.token_out_denom != self.alloy.alloyed_denom {
            let out_balance = balance_of(&self.balances, &self.token_out_denom);
            if amount_out > out_balance {
                return Err(RouterError::NotEnoughLiquidityToCompleteSwap {
                    pool_id: self.pool_id,
                });
            }
        }

        Ok(Coin {
            denom: self.token_out_denom.clone(),
            amount: amount_out,
        })
    }

    pub fn calc_spot_price(
        &self,
        base_denom: &str,
        quote_denom: &str,
    ) -> Result<Decimal256, RouterError> {
        let factor_base = self.normalization_factor(base_denom)?;
        let factor_quote = self.normalization_factor(quote_denom)?;
        Ok(Decimal256::from_ratio(factor_base, factor_quote))
    }

    fn normalization_factor(&self, denom: &str) -> Result<Uint128, RouterError> {
        if let Some(config) = self
            .alloy
            .asset_configs
            .iter()
            .find(|config| config.denom == denom)
        {
            return Ok(config.normalization_factor);
        }

        // The alloyed denom itself is normalized to the standard factor.
        if denom == self.alloy.alloyed_denom {
            return Ok(Uint128::one());
        }

        Err(RouterError::MissingNormalizationFactor {
            denom: denom.to_string(),
            pool_id: self.pool_id,
        })
    }
}

/// Orderbook pool: fills against resting tick liquidity at tick prices.
#[derive(Debug, Clone)]
pub struct RoutableOrderbookPool {
    pub pool_id: u64,
    pub code_id: u64,
    pub orderbook: OrderbookData,
    pub token_in_denom: String,
    pub token_out_denom: String,
    pub taker_fee: cosmwasm_std::Decimal,
}

impl RoutableOrderbookPool {
    /// Walks the book from the best tick outward. Selling the base consumes
    /// bid liquidity downward; selling the quote consumes ask liquidity
    /// upward. An exhausted side is `NotEnoughLiquidityToCompleteSwap`.
    pub fn calculate_token_out_given_in(&self, token_in: &Coin) -> Result<Coin, RouterError> {
        let pool_id = self.pool_id;
        let not_enough = || RouterError::NotEnoughLiquidityToCompleteSwap { pool_id };
        let overflow = || RouterError::MathOverflow { pool_id };

        let is_selling_base = if token_in.denom == self.orderbook.base_denom {
            true
        } else if token_in.denom == self.orderbook.quote_denom {
            false
        } else {
            return Err(RouterError::TokenInDenomPoolNotFound {
                denom: token_in.denom.clone(),
                pool_id,
            });
        };

        let mut amount_remaining = Decimal256::from_ratio(token_in.amount, 1u128);
        let mut amount_out = Decimal256::zero();

        if is_selling_base {
            // Consume bids, best (highest tick) first.
            let mut index = self.orderbook.next_bid_tick_index.ok_or_else(not_enough)? as i64;
            while !amount_remaining.is_zero() {
                if index < 0 {
                    return Err(not_enough());
                }
                let tick = &self.orderbook.ticks[index as usize];
                let price = tick_math::tick_to_price(tick.tick_id)?;
                if price.is_zero() {
                    return Err(overflow());
                }

                // Bid liquidity is quote-denominated.
                let base_fillable = tick
                    .bid_liquidity
                    .checked_div(price)
                    .map_err(|_| overflow())?;

                if amount_remaining <= base_fillable {
                    amount_out = amount_out
                        .checked_add(
                            amount_remaining.checked_mul(price).map_err(|_| overflow())?,
                        )
                        .map_err(|_| overflow())?;
                    amount_remaining = Decimal256::zero();
                } else {
                    amount_out = amount_out
                        .checked_add(tick.bid_liquidity)
                        .map_err(|_| overflow())?;
                    amount_remaining = amount_remaining
                        .checked_sub(base_fillable)
                        .map_err(|_| overflow())?;
                    index -= 1;
                }
            }
        } else {
            // Consume asks, best (lowest tick) first.
            let mut index = self.orderbook.next_ask_tick_index.ok_or_else(not_enough)?;
            while !amount_remaining.is_zero() {
                if index >= self.orderbook.ticks.len() {
                    return Err(not_enough());
                }
                let tick = &self.orderbook.ticks[index];
                let price = tick_math::tick_to_price(tick.tick_id)?;
                if price.is_zero() {
                    return Err(overflow());
                }

                // Ask liquidity is base-denominated.
                let quote_needed = tick
                    .ask_liquidity
                    .checked_mul(price)
                    .map_err(|_| overflow())?;

                if amount_remaining <= quote_needed {
                    amount_out = amount_out
                        .checked_add(
                            amount_remaining.checked_div(price).map_err(|_| overflow())?,
                        )
                        .map_err(|_| overflow())?;
                    amount_remaining = Decimal256::zero();
                } else {
                    amount_out = amount_out
                        .checked_add(tick.ask_liquidity)
                        .map_err(|_| overflow())?;
                    amount_remaining = amount_remaining
                        .checked_sub(quote_needed)
                        .map_err(|_| overflow())?;
                    index += 1;
                }
            }
        }

        Ok(Coin {
            denom: self.token_out_denom.clone(),
            amount: truncate_to_uint128(amount_out, pool_id)?,
        })
    }

    /// Spot price taken at the best tick of the side facing the pair
    /// orientation.
    pub fn calc_spot_price(
        &self,
        base_denom: &str,
        quote_denom: &str,
    ) -> Result<Decimal256, RouterError> {
        let best_tick_id = self
            .orderbook
            .next_ask_tick_index
            .or(self.orderbook.next_bid_tick_index)
            .and_then(|index| self.orderbook.ticks.get(index))
            .map(|tick| tick.tick_id)
            .ok_or(RouterError::NotEnoughLiquidityToCompleteSwap {
                pool_id: self.pool_id,
            })?;

        let price = tick_math::tick_to_price(best_tick_id)?;

        if base_denom == self.orderbook.base_denom && quote_denom == self.orderbook.quote_denom {
            return Ok(price);
        }

        if base_denom == self.orderbook.quote_denom && quote_denom == self.orderbook.base_denom {
            return Decimal256::one().checked_div(price).map_err(|_| {
                RouterError::MathOverflow {
                    pool_id: self.pool_id,
                }
            });
        }

        Err(RouterError::SpotPriceUnsupported {
            base: base_denom.to_string(),
            quote: quote_denom.to_string(),
            pool_id: self.pool_id,
        })
    }
}

/// Generalized cosmwasm pool: pricing is delegated to the pool contract.
#[derive(Clone)]
pub struct RoutableGeneralizedPool {
    pub pool_id: u64,
    pub code_id: u64,
    pub contract_address: String,
    pub pool_denoms: Vec<String>,
    pub token_in_denom: String,
    pub token_out_denom: String,
    pub taker_fee: cosmwasm_std::Decimal,
    pub wasm_client: Arc<dyn WasmQueryClient>,
}

impl fmt::Debug for RoutableGeneralizedPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutableGeneralizedPool")
            .field("pool_id", &self.pool_id)
            .field("code_id", &self.code_id)
            .field("contract_address", &self.contract_address)
            .field("token_out_denom", &self.token_out_denom)
            .finish_non_exhaustive()
    }
}

impl RoutableGeneralizedPool {
    pub async fn calculate_token_out_given_in(
        &self,
        token_in: &Coin,
    ) -> Result<Coin, RouterError> {
        let token_out = self
            .wasm_client
            .calc_out_amount_given_in(&self.contract_address, token_in, &self.token_out_denom)
            .await?;
        Ok(token_out)
    }

    pub async fn calc_spot_price(
        &self,
        base_denom: &str,
        quote_denom: &str,
    ) -> Result<Decimal256, RouterError> {
        let spot_price = self
            .wasm_client
            .spot_price(&self.contract_address, base_denom, quote_denom)
            .await?;
        Ok(Decimal256::from(spot_price))
    }
}

fn balance_of(balances: &[Coin], denom: &str) -> Uint128 {
    balances
        .iter()
        .find(|coin| coin.denom == denom)
        .map(|coin| coin.amount)
        .unwrap_or_default()
}
