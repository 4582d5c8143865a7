//! Claimbot wiring

use std::sync::Arc;

use sidecar_chain::{AccountQueryClient, Keyring, MsgSimulator, TxServiceClient};
use sidecar_orderbook::OrderbookUsecase;
use sidecar_pools::registry::PoolRegistry;

/// Collaborators of the claimbot plugin.
pub struct Config {
    pub keyring: Arc<dyn Keyring>,
    pub registry: Arc<PoolRegistry>,
    pub orderbook_usecase: Arc<OrderbookUsecase>,
    pub account_query_client: Arc<dyn AccountQueryClient>,
    pub msg_simulator: Arc<dyn MsgSimulator>,
    pub tx_service_client: Arc<dyn TxServiceClient>,
    pub chain_id: String,
}
