//! Pool model
//!
//! Data structures describing a pool as ingested from the chain: the
//! variant-specific chain payload, the sidecar attributes (balances, spread
//! factor, liquidity cap), and the optional tick model for concentrated
//! pools.

use cosmwasm_std::{Coin, Decimal, Decimal256, Uint128};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Contract name identifying orderbook pool contracts.
pub const ORDERBOOK_CONTRACT_NAME: &str = "crates.io:sumtree-orderbook";

/// Pool errors raised by the model and registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("pool not found: {pool_id}")]
    NotFound { pool_id: u64 },

    #[error("pool with ID {pool_id} is not concentrated")]
    NotConcentrated { pool_id: u64 },

    #[error("tick model is not set for concentrated pool {pool_id}")]
    TickModelNotSet { pool_id: u64 },

    #[error("canonical orderbook not found for base {base} and quote {quote}")]
    CanonicalOrderbookNotFound { base: String, quote: String },

    #[error("failed to split canonical orderbook key {key}")]
    FailSplitCanonicalOrderbookKey { key: String },

    #[error("pool {pool_id} is missing a cosmwasm model")]
    CosmWasmPoolModelNil { pool_id: u64 },

    #[error("pool {pool_id} is not an orderbook pool")]
    NotAnOrderbookPool { pool_id: u64 },
}

/// Chain-level pool category; mirrors the on-chain pool manager types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainPoolType {
    Balancer,
    StableSwap,
    Concentrated,
    CosmWasm,
}

impl ChainPoolType {
    /// Numeric encoding used by the `/pools` type filter.
    pub fn as_u64(&self) -> u64 {
        match self {
            ChainPoolType::Balancer => 0,
            ChainPoolType::StableSwap => 1,
            ChainPoolType::Concentrated => 2,
            ChainPoolType::CosmWasm => 3,
        }
    }
}

/// Incentive category of a pool, derived from its APR breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncentiveType {
    Superfluid,
    Osmosis,
    Boost,
    None,
}

impl IncentiveType {
    /// Numeric encoding used by the `/pools` incentive filter.
    pub fn from_u64(value: u64) -> Option<Self> {
        match value {
            0 => Some(IncentiveType::Superfluid),
            1 => Some(IncentiveType::Osmosis),
            2 => Some(IncentiveType::Boost),
            3 => Some(IncentiveType::None),
            _ => None,
        }
    }
}

/// A weighted pool asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedPoolAsset {
    pub token: Coin,
    pub weight: Uint128,
}

/// Balancer (weighted constant-product) chain payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancerPoolData {
    pub assets: Vec<WeightedPoolAsset>,
    pub total_weight: Uint128,
}

/// StableSwap chain payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StableSwapPoolData {
    pub liquidity: Vec<Coin>,
    /// Per-asset scaling factors, parallel to `liquidity`.
    pub scaling_factors: Vec<u64>,
}

/// Concentrated-liquidity chain payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentratedPoolData {
    pub token0: String,
    pub token1: String,
    pub current_tick: i64,
    pub current_sqrt_price: Decimal256,
    pub tick_spacing: u64,
}

impl ConcentratedPoolData {
    /// Whether the chain-reported current tick lies within `[lower, upper]`.
    pub fn is_current_tick_in_range(&self, lower_tick: i64, upper_tick: i64) -> bool {
        self.current_tick >= lower_tick && self.current_tick <= upper_tick
    }
}

/// Per-tick liquidity on both sides of an orderbook pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderbookPoolTick {
    pub tick_id: i64,
    pub bid_liquidity: Decimal256,
    pub ask_liquidity: Decimal256,
}

/// Orderbook contract state carried in the cosmwasm pool model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderbookData {
    pub base_denom: String,
    pub quote_denom: String,
    /// Index into `ticks` of the next bid tick, if any.
    pub next_bid_tick_index: Option<usize>,
    /// Index into `ticks` of the next ask tick, if any.
    pub next_ask_tick_index: Option<usize>,
    pub ticks: Vec<OrderbookPoolTick>,
}

/// Per-asset normalization for alloyed transmuter pools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransmuterAssetConfig {
    pub denom: String,
    pub normalization_factor: Uint128,
}

/// Alloyed transmuter contract state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlloyTransmuterData {
    pub alloyed_denom: String,
    pub asset_configs: Vec<TransmuterAssetConfig>,
}

/// Versioned contract identity reported by the cosmwasm pool contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractInfo {
    pub contract: String,
    pub version: String,
}

impl ContractInfo {
    pub fn is_orderbook(&self) -> bool {
        self.contract == ORDERBOOK_CONTRACT_NAME
    }
}

/// Variant-specific contract state of a cosmwasm pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CosmWasmPoolData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orderbook: Option<OrderbookData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alloy_transmuter: Option<AlloyTransmuterData>,
}

/// Cosmwasm pool model attached to the sidecar pool attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CosmWasmPoolModel {
    pub contract_info: ContractInfo,
    pub data: CosmWasmPoolData,
}

impl CosmWasmPoolModel {
    pub fn is_orderbook(&self) -> bool {
        self.contract_info.is_orderbook()
    }
}

/// CosmWasm chain payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CosmWasmChainPool {
    pub contract_address: String,
    pub code_id: u64,
}

/// Variant-specific chain payload of a pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChainPoolModel {
    Balancer(BalancerPoolData),
    StableSwap(StableSwapPoolData),
    Concentrated(ConcentratedPoolData),
    CosmWasm(CosmWasmChainPool),
}

/// A liquidity bucket of a concentrated pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityDepthsWithRange {
    pub lower_tick: i64,
    pub upper_tick: i64,
    pub liquidity_amount: Decimal,
}

/// Tick model of a concentrated pool, fetched on demand from the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickModel {
    /// Buckets ordered by lower tick; non-overlapping and gap-free over the
    /// active range.
    pub ticks: Vec<LiquidityDepthsWithRange>,
    /// Index into `ticks` of the bucket holding the current tick.
    pub current_tick_index: i64,
    pub has_no_liquidity: bool,
}

/// One bound of an APR range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AprRange {
    pub lower: f64,
    pub upper: f64,
}

/// APR breakdown for a pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolApr {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swap_fees: Option<AprRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superfluid_apr: Option<AprRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub osmosis_apr: Option<AprRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost_apr: Option<AprRange>,
    #[serde(default)]
    pub total_apr: AprRange,
}

/// Fee and volume aggregates for a pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolFee {
    pub volume_24h: f64,
    pub volume_7d: f64,
    pub fees_spent_24h: f64,
    pub fees_spent_7d: f64,
}

/// APR data wrapped with fetch health flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolAprData {
    #[serde(flatten)]
    pub apr: PoolApr,
    pub is_stale: bool,
    pub is_error: bool,
}

/// Fee data wrapped with fetch health flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolFeesData {
    #[serde(flatten)]
    pub fees: PoolFee,
    pub is_stale: bool,
    pub is_error: bool,
}

/// Sidecar attributes computed by the ingester for every pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqsModel {
    pub balances: Vec<Coin>,
    pub pool_denoms: Vec<String>,
    pub spread_factor: Decimal,
    pub liquidity_cap: Uint128,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub liquidity_cap_error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cosmwasm_pool_model: Option<CosmWasmPoolModel>,
}

/// A pool as stored in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub id: u64,
    pub chain_model: ChainPoolModel,
    pub sqs_model: SqsModel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick_model: Option<TickModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apr_data: Option<PoolAprData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fees_data: Option<PoolFeesData>,
}

impl Pool {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn pool_type(&self) -> ChainPoolType {
        match self.chain_model {
            ChainPoolModel::Balancer(_) => ChainPoolType::Balancer,
            ChainPoolModel::StableSwap(_) => ChainPoolType::StableSwap,
            ChainPoolModel::Concentrated(_) => ChainPoolType::Concentrated,
            ChainPoolModel::CosmWasm(_) => ChainPoolType::CosmWasm,
        }
    }

    pub fn pool_denoms(&self) -> &[String] {
        &self.sqs_model.pool_denoms
    }

    pub fn liquidity_cap(&self) -> Uint128 {
        self.sqs_model.liquidity_cap
    }

    pub fn spread_factor(&self) -> Decimal {
        self.sqs_model.spread_factor
    }

    /// Code id of the cosmwasm contract, or 0 for non-cosmwasm pools.
    pub fn code_id(&self) -> u64 {
        match &self.chain_model {
            ChainPoolModel::CosmWasm(pool) => pool.code_id,
            _ => 0,
        }
    }

    /// Contract address of the cosmwasm contract, if this is a cosmwasm pool.
    pub fn contract_address(&self) -> Option<&str> {
        match &self.chain_model {
            ChainPoolModel::CosmWasm(pool) => Some(&pool.contract_address),
            _ => None,
        }
    }

    /// Whether this pool is an orderbook pool with orderbook data present.
    pub fn is_orderbook(&self) -> bool {
        self.sqs_model
            .cosmwasm_pool_model
            .as_ref()
            .is_some_and(|model| model.is_orderbook() && model.data.orderbook.is_some())
    }

    /// The orderbook payload, if this pool carries one.
    pub fn orderbook_data(&self) -> Option<&OrderbookData> {
        self.sqs_model
            .cosmwasm_pool_model
            .as_ref()
            .and_then(|model| model.data.orderbook.as_ref())
    }

    /// Incentive category derived from the APR breakdown. Pools without APR
    /// data fall into `None`.
    pub fn incentive(&self) -> IncentiveType {
        let Some(apr_data) = &self.apr_data else {
            return IncentiveType::None;
        };

        if apr_data.apr.superfluid_apr.is_some() {
            IncentiveType::Superfluid
        } else if apr_data.apr.osmosis_apr.is_some() {
            IncentiveType::Osmosis
        } else if apr_data.apr.boost_apr.is_some() {
            IncentiveType::Boost
        } else {
            IncentiveType::None
        }
    }

    pub fn set_tick_model(&mut self, tick_model: TickModel) {
        self.tick_model = Some(tick_model);
    }

    pub fn set_apr_data(&mut self, apr_data: PoolAprData) {
        self.apr_data = Some(apr_data);
    }

    pub fn set_fees_data(&mut self, fees_data: PoolFeesData) {
        self.fees_data = Some(fees_data);
    }
}
