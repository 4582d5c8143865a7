//! Application state shared across API handlers

use std::sync::Arc;

use sidecar_core::config::AppConfig;
use sidecar_orderbook::OrderbookUsecase;
use sidecar_pools::registry::PoolRegistry;
use sidecar_router::quote_simulator::QuoteSimulator;
use sidecar_router::{RouterRepository, RouterUsecase};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    registry: Arc<PoolRegistry>,
    router_repository: Arc<RouterRepository>,
    router: Arc<RouterUsecase>,
    orderbook: Arc<OrderbookUsecase>,
    quote_simulator: Option<Arc<QuoteSimulator>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        registry: Arc<PoolRegistry>,
        router_repository: Arc<RouterRepository>,
        router: Arc<RouterUsecase>,
        orderbook: Arc<OrderbookUsecase>,
        quote_simulator: Option<Arc<QuoteSimulator>>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                registry,
                router_repository,
                router,
                orderbook,
                quote_simulator,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &Arc<PoolRegistry> {
        &self.inner.registry
    }

    pub fn router_repository(&self) -> &Arc<RouterRepository> {
        &self.inner.router_repository
    }

    pub fn router(&self) -> &Arc<RouterUsecase> {
        &self.inner.router
    }

    pub fn orderbook(&self) -> &Arc<OrderbookUsecase> {
        &self.inner.orderbook
    }

    pub fn quote_simulator(&self) -> Option<&Arc<QuoteSimulator>> {
        self.inner.quote_simulator.as_ref()
    }
}
