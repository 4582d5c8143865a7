//! Routable pool wrappers
//!
//! A routable pool decorates an ingested pool with a swap direction and a
//! taker fee, and prices swaps through it. Each variant carries exactly the
//! state its math needs.

pub mod balancer;
pub mod concentrated;
pub mod cosmwasm;
pub mod stableswap;

use std::collections::HashSet;
use std::sync::Arc;

use cosmwasm_std::{Coin, Decimal, Decimal256};
use serde::{Deserialize, Serialize};

use sidecar_chain::WasmQueryClient;
use sidecar_core::config::PoolsConfig;
use sidecar_pools::model::{ChainPoolModel, ChainPoolType, Pool};

use crate::errors::RouterError;

pub use balancer::RoutableBalancerPool;
pub use concentrated::RoutableConcentratedPool;
pub use cosmwasm::{
    RoutableAlloyedPool, RoutableGeneralizedPool, RoutableOrderbookPool, RoutableTransmuterPool,
};
pub use stableswap::RoutableStableSwapPool;

/// Code id of non-cosmwasm pools.
pub const NOT_COSMWASM_POOL_CODE_ID: u64 = 0;

/// Routable classification of a pool. Each variant has its own pricing
/// implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolVariant {
    Balancer,
    StableSwap,
    Concentrated,
    TransmuterV1,
    GeneralizedCosmWasm,
    AlloyedTransmuter,
    Orderbook,
}

impl PoolVariant {
    /// Transmuter variants are exempt from the duplicate-pool route filter.
    pub fn is_transmuter(&self) -> bool {
        matches!(
            self,
            PoolVariant::TransmuterV1 | PoolVariant::AlloyedTransmuter
        )
    }
}

/// Code id sets classifying cosmwasm pool contracts into routable variants.
#[derive(Debug, Clone, Default)]
pub struct CosmWasmPoolRouterConfig {
    pub transmuter_code_ids: HashSet<u64>,
    pub alloyed_transmuter_code_ids: HashSet<u64>,
    pub orderbook_code_ids: HashSet<u64>,
    pub general_cosmwasm_code_ids: HashSet<u64>,
}

impl From<&PoolsConfig> for CosmWasmPoolRouterConfig {
    fn from(config: &PoolsConfig) -> Self {
        Self {
            transmuter_code_ids: config.transmuter_code_ids.iter().copied().collect(),
            alloyed_transmuter_code_ids: config
                .alloyed_transmuter_code_ids
                .iter()
                .copied()
                .collect(),
            orderbook_code_ids: config.orderbook_code_ids.iter().copied().collect(),
            general_cosmwasm_code_ids: config
                .general_cosmwasm_code_ids
                .iter()
                .copied()
                .collect(),
        }
    }
}

/// Shared parameters for constructing cosmwasm routable pools.
#[derive(Clone, Default)]
pub struct CosmWasmPoolsParams {
    pub config: CosmWasmPoolRouterConfig,
    pub wasm_client: Option<Arc<dyn WasmQueryClient>>,
}

/// A pool decorated with a swap direction and taker fee.
#[derive(Debug, Clone)]
pub enum RoutablePool {
    Balancer(RoutableBalancerPool),
    StableSwap(RoutableStableSwapPool),
    Concentrated(RoutableConcentratedPool),
    TransmuterV1(RoutableTransmuterPool),
    AlloyedTransmuter(RoutableAlloyedPool),
    Orderbook(RoutableOrderbookPool),
    GeneralizedCosmWasm(RoutableGeneralizedPool),
}

/// Builds a routable pool from an ingested pool and the requested direction.
/// CosmWasm pools are classified by code id; an unknown code id is an error,
/// which drops the route rather than the request.
pub fn new_routable_pool(
    pool: &Pool,
    token_out_denom: String,
    taker_fee: Decimal,
    params: &CosmWasmPoolsParams,
) -> Result<RoutablePool, RouterError> {
    let pool_id = pool.id();
    let spread_factor = pool.spread_factor();
    let pool_denoms = pool.pool_denoms().to_vec();

    match &pool.chain_model {
        ChainPoolModel::Balancer(data) => Ok(RoutablePool::Balancer(RoutableBalancerPool {
            pool_id,
            data: data.clone(),
            spread_factor,
            pool_denoms,
            token_in_denom: String::new(),
            token_out_denom,
            taker_fee,
        })),
        ChainPoolModel::StableSwap(data) => Ok(RoutablePool::StableSwap(RoutableStableSwapPool {
            pool_id,
            data: data.clone(),
            spread_factor,
            pool_denoms,
            token_in_denom: String::new(),
            token_out_denom,
            taker_fee,
        })),
        ChainPoolModel::Concentrated(data) => {
            Ok(RoutablePool::Concentrated(RoutableConcentratedPool {
                pool_id,
                data: data.clone(),
                tick_model: pool.tick_model.clone(),
                spread_factor,
                token_in_denom: String::new(),
                token_out_denom,
                taker_fee,
            }))
        }
        ChainPoolModel::CosmWasm(chain_pool) => {
            let code_id = chain_pool.code_id;
            let model = pool
                .sqs_model
                .cosmwasm_pool_model
                .as_ref()
                .ok_or(RouterError::MissingCosmWasmData { pool_id })?;

            if params.config.transmuter_code_ids.contains(&code_id) {
                return Ok(RoutablePool::TransmuterV1(RoutableTransmuterPool {
                    pool_id,
                    code_id,
                    balances: pool.sqs_model.balances.clone(),
                    pool_denoms,
                    token_in_denom: String::new(),
                    token_out_denom,
                    taker_fee,
                }));
            }

            if params.config.alloyed_transmuter_code_ids.contains(&code_id) {
                let alloy = model
                    .data
                    .alloy_transmuter
                    .clone()
                    .ok_or(RouterError::MissingCosmWasmData { pool_id })?;
                return Ok(RoutablePool::AlloyedTransmuter(RoutableAlloyedPool {
                    pool_id,
                    code_id,
                    alloy,
                    balances: pool.sqs_model.balances.clone(),
                    pool_denoms,
                    token_in_denom: String::new(),
                    token_out_denom,
                    taker_fee,
                }));
            }

            if params.config.orderbook_code_ids.contains(&code_id) {
                let orderbook = model
                    .data
                    .orderbook
                    .clone()
                    .ok_or(RouterError::MissingCosmWasmData { pool_id })?;
                return Ok(RoutablePool::Orderbook(RoutableOrderbookPool {
                    pool_id,
                    code_id,
                    orderbook,
                    token_in_denom: String::new(),
                    token_out_denom,
                    taker_fee,
                }));
            }

            if params.config.general_cosmwasm_code_ids.contains(&code_id) {
                let wasm_client = params
                    .wasm_client
                    .clone()
                    .ok_or(RouterError::WasmClientNotSet { pool_id })?;
                return Ok(RoutablePool::GeneralizedCosmWasm(RoutableGeneralizedPool {
                    pool_id,
                    code_id,
                    contract_address: chain_pool.contract_address.clone(),
                    pool_denoms,
                    token_in_denom: String::new(),
                    token_out_denom,
                    taker_fee,
                    wasm_client,
                }));
            }

            Err(RouterError::UnsupportedCosmWasmCodeId { pool_id, code_id })
        }
    }
}

impl RoutablePool {
    pub fn id(&self) -> u64 {
        match self {
            RoutablePool::Balancer(p) => p.pool_id,
            RoutablePool::StableSwap(p) => p.pool_id,
            RoutablePool::Concentrated(p) => p.pool_id,
            RoutablePool::TransmuterV1(p) => p.pool_id,
            RoutablePool::AlloyedTransmuter(p) => p.pool_id,
            RoutablePool::Orderbook(p) => p.pool_id,
            RoutablePool::GeneralizedCosmWasm(p) => p.pool_id,
        }
    }

    pub fn pool_type(&self) -> ChainPoolType {
        match self {
            RoutablePool::Balancer(_) => ChainPoolType::Balancer,
            RoutablePool::StableSwap(_) => ChainPoolType::StableSwap,
            RoutablePool::Concentrated(_) => ChainPoolType::Concentrated,
            _ => ChainPoolType::CosmWasm,
        }
    }

    pub fn variant(&self) -> PoolVariant {
        match self {
            RoutablePool::Balancer(_) => PoolVariant::Balancer,
            RoutablePool::StableSwap(_) => PoolVariant::StableSwap,
            RoutablePool::Concentrated(_) => PoolVariant::Concentrated,
            RoutablePool::TransmuterV1(_) => PoolVariant::TransmuterV1,
            RoutablePool::AlloyedTransmuter(_) => PoolVariant::AlloyedTransmuter,
            RoutablePool::Orderbook(_) => PoolVariant::Orderbook,
            RoutablePool::GeneralizedCosmWasm(_) => PoolVariant::GeneralizedCosmWasm,
        }
    }

    /// Code id of the cosmwasm contract, or 0 for non-cosmwasm pools.
    pub fn code_id(&self) -> u64 {
        match self {
            RoutablePool::TransmuterV1(p) => p.code_id,
            RoutablePool::AlloyedTransmuter(p) => p.code_id,
            RoutablePool::Orderbook(p) => p.code_id,
            RoutablePool::GeneralizedCosmWasm(p) => p.code_id,
            _ => NOT_COSMWASM_POOL_CODE_ID,
        }
    }

    pub fn pool_denoms(&self) -> Vec<String> {
        match self {
            RoutablePool::Balancer(p) => p.pool_denoms.clone(),
            RoutablePool::StableSwap(p) => p.pool_denoms.clone(),
            RoutablePool::Concentrated(p) => {
                vec![p.data.token0.clone(), p.data.token1.clone()]
            }
            RoutablePool::TransmuterV1(p) => p.pool_denoms.clone(),
            RoutablePool::AlloyedTransmuter(p) => p.pool_denoms.clone(),
            RoutablePool::Orderbook(p) => vec![
                p.orderbook.base_denom.clone(),
                p.orderbook.quote_denom.clone(),
            ],
            RoutablePool::GeneralizedCosmWasm(p) => p.pool_denoms.clone(),
        }
    }

    pub fn token_out_denom(&self) -> &str {
        match self {
            RoutablePool::Balancer(p) => &p.token_out_denom,
            RoutablePool::StableSwap(p) => &p.token_out_denom,
            RoutablePool::Concentrated(p) => &p.token_out_denom,
            RoutablePool::TransmuterV1(p) => &p.token_out_denom,
            RoutablePool::AlloyedTransmuter(p) => &p.token_out_denom,
            RoutablePool::Orderbook(p) => &p.token_out_denom,
            RoutablePool::GeneralizedCosmWasm(p) => &p.token_out_denom,
        }
    }

    pub fn set_token_out_denom(&mut self, denom: String) {
        match self {
            RoutablePool::Balancer(p) => p.token_out_denom = denom,
            RoutablePool::StableSwap(p) => p.token_out_denom = denom,
            RoutablePool::Concentrated(p) => p.token_out_denom = denom,
            RoutablePool::TransmuterV1(p) => p.token_out_denom = denom,
            RoutablePool::AlloyedTransmuter(p) => p.token_out_denom = denom,
            RoutablePool::Orderbook(p) => p.token_out_denom = denom,
            RoutablePool::GeneralizedCosmWasm(p) => p.token_out_denom = denom,
        }
    }

    pub fn token_in_denom(&self) -> &str {
        match self {
            RoutablePool::Balancer(p) => &p.token_in_denom,
            RoutablePool::StableSwap(p) => &p.token_in_denom,
            RoutablePool::Concentrated(p) => &p.token_in_denom,
            RoutablePool::TransmuterV1(p) => &p.token_in_denom,
            RoutablePool::AlloyedTransmuter(p) => &p.token_in_denom,
            RoutablePool::Orderbook(p) => &p.token_in_denom,
            RoutablePool::GeneralizedCosmWasm(p) => &p.token_in_denom,
        }
    }

    pub fn set_token_in_denom(&mut self, denom: String) {
        match self {
            RoutablePool::Balancer(p) => p.token_in_denom = denom,
            RoutablePool::StableSwap(p) => p.token_in_denom = denom,
            RoutablePool::Concentrated(p) => p.token_in_denom = denom,
            RoutablePool::TransmuterV1(p) => p.token_in_denom = denom,
            RoutablePool::AlloyedTransmuter(p) => p.token_in_denom = denom,
            RoutablePool::Orderbook(p) => p.token_in_denom = denom,
            RoutablePool::GeneralizedCosmWasm(p) => p.token_in_denom = denom,
        }
    }

    pub fn taker_fee(&self) -> Decimal {
        match self {
            RoutablePool::Balancer(p) => p.taker_fee,
            RoutablePool::StableSwap(p) => p.taker_fee,
            RoutablePool::Concentrated(p) => p.taker_fee,
            RoutablePool::TransmuterV1(p) => p.taker_fee,
            RoutablePool::AlloyedTransmuter(p) => p.taker_fee,
            RoutablePool::Orderbook(p) => p.taker_fee,
            RoutablePool::GeneralizedCosmWasm(p) => p.taker_fee,
        }
    }

    /// Spread factor charged by the pool math itself; transmuter-family and
    /// orderbook pools charge none.
    pub fn spread_factor(&self) -> Decimal {
        match self {
            RoutablePool::Balancer(p) => p.spread_factor,
            RoutablePool::StableSwap(p) => p.spread_factor,
            RoutablePool::Concentrated(p) => p.spread_factor,
            _ => Decimal::zero(),
        }
    }

    /// Returns the token in net of the taker fee, rounded down.
    pub fn charge_taker_fee_exact_in(&self, token_in: &Coin) -> Coin {
        let one_minus_fee = Decimal::one() - self.taker_fee();
        Coin {
            denom: token_in.denom.clone(),
            amount: token_in.amount.mul_floor(one_minus_fee),
        }
    }

    /// Prices a swap of the exact `token_in` through the pool.
    pub async fn calculate_token_out_given_in(
        &self,
        token_in: &Coin,
    ) -> Result<Coin, RouterError> {
        match self {
            RoutablePool::Balancer(p) => p.calculate_token_out_given_in(token_in),
            RoutablePool::StableSwap(p) => p.calculate_token_out_given_in(token_in),
            RoutablePool::Concentrated(p) => p.calculate_token_out_given_in(token_in),
            RoutablePool::TransmuterV1(p) => p.calculate_token_out_given_in(token_in),
            RoutablePool::AlloyedTransmuter(p) => p.calculate_token_out_given_in(token_in),
            RoutablePool::Orderbook(p) => p.calculate_token_out_given_in(token_in),
            RoutablePool::GeneralizedCosmWasm(p) => {
                p.calculate_token_out_given_in(token_in).await
            }
        }
    }

    /// Spot price of one unit of `base` in `quote`, before fees.
    pub async fn calc_spot_price(
        &self,
        base_denom: &str,
        quote_denom: &str,
    ) -> Result<Decimal256, RouterError> {
        match self {
            RoutablePool::Balancer(p) => p.calc_spot_price(base_denom, quote_denom),
            RoutablePool::StableSwap(p) => p.calc_spot_price(base_denom, quote_denom),
            RoutablePool::Concentrated(p) => p.calc_spot_price(base_denom, quote_denom),
            RoutablePool::TransmuterV1(p) => p.calc_spot_price(base_denom, quote_denom),
            RoutablePool::AlloyedTransmuter(p) => p.calc_spot_price(base_denom, quote_denom),
            RoutablePool::Orderbook(p) => p.calc_spot_price(base_denom, quote_denom),
            RoutablePool::GeneralizedCosmWasm(p) => {
                p.calc_spot_price(base_denom, quote_denom).await
            }
        }
    }
}
