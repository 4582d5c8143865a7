//! Chain client traits
//!
//! Each trait covers exactly the slice of the node's gRPC surface one
//! component needs. Implementations live outside the workspace; tests use
//! hand-rolled mocks.

use async_trait::async_trait;
use cosmwasm_std::{Coin, Decimal};
use thiserror::Error;

use sidecar_core::orderbook::{Orders, TickState, UnrealizedCancels};

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("chain query failed: {0}")]
    Query(String),

    #[error("broadcast failed: {0}")]
    Broadcast(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("failed to price transaction: {0}")]
    Pricing(String),

    #[error("account not found for address {address}")]
    AccountNotFound { address: String },
}

/// A base account as reported by the auth module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub address: String,
    pub account_number: u64,
    pub sequence: u64,
}

impl Account {
    /// Bumps the local sequence number after a successful broadcast.
    pub fn increment_sequence(&mut self) {
        self.sequence += 1;
    }
}

/// Auth module queries.
#[async_trait]
pub trait AccountQueryClient: Send + Sync {
    async fn get_account(&self, address: &str) -> Result<Account, ChainError>;
}

/// Tx fees module queries, used by the base-fee ingest hook.
#[async_trait]
pub trait TxFeesClient: Send + Sync {
    async fn base_denom(&self) -> Result<String, ChainError>;
    async fn eip_base_fee(&self) -> Result<Decimal, ChainError>;
}

/// Result of simulating a transaction on the chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulateResponse {
    pub gas_used: u64,
}

/// Gas estimation through chain-side simulation. The implementation applies
/// the factory's gas adjustment and returns both the raw response and the
/// adjusted gas.
#[async_trait]
pub trait GasCalculator: Send + Sync {
    async fn calculate_gas(
        &self,
        factory: &crate::tx::TxFactory,
        msgs: &[osmosis_std::shim::Any],
    ) -> Result<(SimulateResponse, u64), ChainError>;
}

/// Broadcast mode for submitted transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastMode {
    Sync,
    Async,
}

/// Result of a broadcast, trimmed to the fields the claimbot inspects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxResponse {
    pub code: u32,
    pub tx_hash: String,
    pub raw_log: String,
}

/// Tx service broadcast surface.
#[async_trait]
pub trait TxServiceClient: Send + Sync {
    async fn broadcast_tx(
        &self,
        tx_bytes: Vec<u8>,
        mode: BroadcastMode,
    ) -> Result<TxResponse, ChainError>;
}

/// CosmWasm smart-query surface used by generalized cosmwasm pools.
#[async_trait]
pub trait WasmQueryClient: Send + Sync {
    /// Asks the pool contract for the out amount given an exact in amount.
    async fn calc_out_amount_given_in(
        &self,
        contract_address: &str,
        token_in: &Coin,
        token_out_denom: &str,
    ) -> Result<Coin, ChainError>;

    /// Asks the pool contract for its spot price.
    async fn spot_price(
        &self,
        contract_address: &str,
        base_denom: &str,
        quote_denom: &str,
    ) -> Result<Decimal, ChainError>;
}

/// A tick id paired with its contract-reported state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickIdAndState {
    pub tick_id: i64,
    pub tick_state: TickState,
}

/// A tick id paired with its unrealized cancel amounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickUnrealizedCancels {
    pub tick_id: i64,
    pub unrealized_cancels: UnrealizedCancels,
}

/// Orderbook contract queries.
#[async_trait]
pub trait OrderbookContractClient: Send + Sync {
    /// Fetches tick states in chunks of at most `max_per_query` ids.
    async fn fetch_ticks(
        &self,
        max_per_query: usize,
        contract_address: &str,
        tick_ids: &[i64],
    ) -> Result<Vec<TickIdAndState>, ChainError>;

    /// Fetches unrealized cancels in chunks of at most `max_per_query` ids.
    async fn fetch_tick_unrealized_cancels(
        &self,
        max_per_query: usize,
        contract_address: &str,
        tick_ids: &[i64],
    ) -> Result<Vec<TickUnrealizedCancels>, ChainError>;

    /// Active orders of an owner together with the total count.
    async fn get_active_orders(
        &self,
        contract_address: &str,
        owner: &str,
    ) -> Result<(Orders, u64), ChainError>;

    /// All orders sitting on a tick.
    async fn get_orders_by_tick(
        &self,
        contract_address: &str,
        tick_id: i64,
    ) -> Result<Orders, ChainError>;
}

/// Signing key access. The key material never leaves the implementation.
pub trait Keyring: Send + Sync {
    /// Bech32 address of the signing key.
    fn address(&self) -> String;

    /// Compressed secp256k1 public key bytes.
    fn pub_key_bytes(&self) -> Vec<u8>;

    /// Signs the given sign-doc bytes.
    fn sign(&self, bytes: &[u8]) -> Result<Vec<u8>, ChainError>;
}
