//! Orderbook usecase errors

use thiserror::Error;

use sidecar_core::errors::ValidationError;
use sidecar_pools::tick_math::TickMathError;

#[derive(Debug, Error)]
pub enum OrderbookError {
    #[error("pool has no cosmwasm pool model")]
    CosmWasmPoolModelNil,

    #[error("pool {pool_id} is not an orderbook pool")]
    NotAnOrderbookPool { pool_id: u64 },

    #[error("pool {pool_id} has no orderbook data")]
    NoOrderbookData { pool_id: u64 },

    #[error("failed to cast pool model for pool {pool_id}")]
    FailedToCastPoolModel { pool_id: u64 },

    #[error("failed to fetch ticks for contract {contract_address}: {source}")]
    FetchTicks {
        contract_address: String,
        source: sidecar_chain::ChainError,
    },

    #[error("failed to fetch unrealized cancels for contract {contract_address}: {source}")]
    FetchUnrealizedCancels {
        contract_address: String,
        source: sidecar_chain::ChainError,
    },

    #[error("tick id mismatch: expected {expected}, got {actual}")]
    TickIdMismatch { expected: i64, actual: i64 },

    #[error("failed to get all canonical orderbook pool ids: {0}")]
    FailedGetAllCanonicalOrderbookPoolIds(#[from] sidecar_pools::model::PoolError),

    #[error(transparent)]
    OrderbookNotValid(#[from] ValidationError),

    #[error("failed to get active orders for contract {contract_address} owner {owner}: {source}")]
    FailedToGetActiveOrders {
        contract_address: String,
        owner: String,
        source: sidecar_chain::ChainError,
    },

    #[error("failed to get metadata for denom {denom}: {source}")]
    FailedToGetMetadata {
        denom: String,
        source: sidecar_pools::tokens::TokenError,
    },

    #[error("failed to get spot price scaling factor for base {base} quote {quote}: {source}")]
    GettingSpotPriceScalingFactor {
        base: String,
        quote: String,
        source: sidecar_pools::tokens::TokenError,
    },

    #[error("tick {tick_id} not found for orderbook {orderbook_address}")]
    TickForOrderbookNotFound {
        orderbook_address: String,
        tick_id: i64,
    },

    #[error("invalid placed quantity {placed_quantity}")]
    InvalidPlacedQuantity { placed_quantity: String },

    #[error("failed to parse quantity {quantity}")]
    ParsingQuantity { quantity: String },

    #[error("failed to parse placed quantity {placed_quantity}")]
    ParsingPlacedQuantity { placed_quantity: String },

    #[error("failed to parse tick values field {field}")]
    ParsingTickValues { field: &'static str },

    #[error("failed to parse unrealized cancels field {field}")]
    ParsingUnrealizedCancels { field: &'static str },

    #[error("failed to parse etas {etas}")]
    ParsingEtas { etas: String },

    #[error("failed to parse placed at {placed_at}")]
    ParsingPlacedAt { placed_at: String },

    #[error("failed to convert tick {tick_id} to price: {source}")]
    ConvertingTickToPrice {
        tick_id: i64,
        source: TickMathError,
    },

    #[error("failed to map order status: {reason}")]
    MappingOrderStatus { reason: String },

    #[error("no ticks found for orderbook {contract_address} with pool {pool_id}")]
    NoTicks {
        contract_address: String,
        pool_id: u64,
    },

    #[error("failed to fetch orders for tick {tick_id}: {source}")]
    FetchTickOrders {
        tick_id: i64,
        source: sidecar_chain::ChainError,
    },
}
