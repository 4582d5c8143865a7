//! Router error types

use thiserror::Error;

use sidecar_chain::ChainError;
use sidecar_pools::model::PoolError;
use sidecar_pools::tick_math::TickMathError;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("no routes found between {token_in_denom} and {token_out_denom}")]
    NoRoutes {
        token_in_denom: String,
        token_out_denom: String,
    },

    #[error("denom {denom} of token in is not in pool {pool_id}")]
    TokenInDenomPoolNotFound { denom: String, pool_id: u64 },

    #[error("denom {denom} of token out is not in pool {pool_id}")]
    TokenOutDenomPoolNotFound { denom: String, pool_id: u64 },

    #[error("validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("tick model is not set on concentrated pool {pool_id}")]
    ConcentratedTickModelNotSet { pool_id: u64 },

    #[error("concentrated pool {pool_id} has no liquidity")]
    ConcentratedNoLiquidity { pool_id: u64 },

    #[error(
        "current bucket index {current_bucket_index} of pool {pool_id} is not within [0, {total_buckets})"
    )]
    ConcentratedCurrentTickNotWithinBucket {
        pool_id: u64,
        current_bucket_index: i64,
        total_buckets: i64,
    },

    #[error(
        "current tick {current_tick} of pool {pool_id} is outside bucket [{lower_tick}, {upper_tick}]"
    )]
    ConcentratedCurrentTickAndBucketMismatch {
        pool_id: u64,
        current_tick: i64,
        lower_tick: i64,
        upper_tick: i64,
    },

    #[error("current sqrt price of concentrated pool {pool_id} is zero")]
    ConcentratedZeroCurrentSqrtPrice { pool_id: u64 },

    #[error("not enough liquidity in pool {pool_id} to complete the swap")]
    NotEnoughLiquidityToCompleteSwap { pool_id: u64 },

    #[error("cosmwasm pool {pool_id} with code id {code_id} maps to no routable variant")]
    UnsupportedCosmWasmCodeId { pool_id: u64, code_id: u64 },

    #[error("pool {pool_id} is missing cosmwasm data for routing")]
    MissingCosmWasmData { pool_id: u64 },

    #[error("normalization factor missing for denom {denom} in pool {pool_id}")]
    MissingNormalizationFactor { denom: String, pool_id: u64 },

    #[error("wasm client is not configured for generalized cosmwasm pool {pool_id}")]
    WasmClientNotSet { pool_id: u64 },

    #[error("spot price is unsupported for base {base} and quote {quote} in pool {pool_id}")]
    SpotPriceUnsupported {
        base: String,
        quote: String,
        pool_id: u64,
    },

    #[error("arithmetic overflow while routing through pool {pool_id}")]
    MathOverflow { pool_id: u64 },

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    TickMath(#[from] TickMathError),

    #[error(transparent)]
    Chain(#[from] ChainError),
}
