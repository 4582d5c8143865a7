//! Sidecar query service daemon
//!
//! Loads configuration, wires the registries and usecases together, and
//! serves the HTTP API. Chain client adapters are plugged in by the ingest
//! deployment; until a connection is configured the placeholder client
//! reports itself unavailable.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sidecar_api::{start_server, AppState};
use sidecar_chain::{
    ChainError, OrderbookContractClient, TickIdAndState, TickUnrealizedCancels,
};
use sidecar_core::config::AppConfig;
use sidecar_core::orderbook::Orders;
use sidecar_orderbook::{OrderbookRepository, OrderbookUsecase};
use sidecar_pools::registry::PoolRegistry;
use sidecar_pools::tokens::TokenRegistry;
use sidecar_router::routable::CosmWasmPoolsParams;
use sidecar_router::{RouterRepository, RouterUsecase};

/// Orderbook client used before a node connection is configured.
struct DisconnectedOrderbookClient;

impl DisconnectedOrderbookClient {
    fn unavailable() -> ChainError {
        ChainError::Query("node connection is not configured".to_string())
    }
}

#[async_trait]
impl OrderbookContractClient for DisconnectedOrderbookClient {
    async fn fetch_ticks(
        &self,
        _max_per_query: usize,
        _contract_address: &str,
        _tick_ids: &[i64],
    ) -> Result<Vec<TickIdAndState>, ChainError> {
        Err(Self::unavailable())
    }

    async fn fetch_tick_unrealized_cancels(
        &self,
        _max_per_query: usize,
        _contract_address: &str,
        _tick_ids: &[i64],
    ) -> Result<Vec<TickUnrealizedCancels>, ChainError> {
        Err(Self::unavailable())
    }

    async fn get_active_orders(
        &self,
        _contract_address: &str,
        _owner: &str,
    ) -> Result<(Orders, u64), ChainError> {
        Err(Self::unavailable())
    }

    async fn get_orders_by_tick(
        &self,
        _contract_address: &str,
        _tick_id: i64,
    ) -> Result<Orders, ChainError> {
        Err(Self::unavailable())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!(path, "loading configuration");
            AppConfig::from_json_file(path)?
        }
        None => {
            info!("no configuration file given, using defaults");
            AppConfig::default()
        }
    };

    let tokens = Arc::new(TokenRegistry::new());
    let registry = Arc::new(PoolRegistry::new(tokens.clone()));
    let router_repository = Arc::new(RouterRepository::new());

    let cosmwasm_params = CosmWasmPoolsParams {
        config: (&config.pools).into(),
        wasm_client: None,
    };

    let router = Arc::new(RouterUsecase::new(
        config.router.clone(),
        router_repository.clone(),
        registry.clone(),
        tokens.clone(),
        cosmwasm_params,
    ));

    let orderbook = Arc::new(OrderbookUsecase::new(
        Arc::new(OrderbookRepository::new()),
        Arc::new(DisconnectedOrderbookClient),
        registry.clone(),
        tokens.clone(),
    ));

    if config.claimbot.enabled {
        warn!("claimbot is enabled but no keyring is wired; skipping claimbot startup");
    }

    let port = config.api.port;
    let state = AppState::new(
        config,
        registry,
        router_repository,
        router,
        orderbook,
        None,
    );

    start_server(state, port).await?;

    Ok(())
}
