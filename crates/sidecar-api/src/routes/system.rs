//! Operational routes

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use sidecar_core::config::AppConfig;
use sidecar_orderbook::telemetry;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthcheck", get(healthcheck))
        .route("/config", get(get_config))
        .route("/config-private", get(get_config_private))
        .route("/version", get(get_version))
        .route("/metrics", get(get_metrics))
}

#[derive(Debug, Serialize)]
struct HealthcheckResponse {
    status: &'static str,
}

async fn healthcheck() -> Json<HealthcheckResponse> {
    Json(HealthcheckResponse { status: "healthy" })
}

#[derive(Debug, Serialize)]
struct PublicConfig {
    api: sidecar_core::config::ApiConfig,
    router: sidecar_core::config::RouterConfig,
}

/// GET /config - the public configuration subset.
async fn get_config(State(state): State<AppState>) -> Json<PublicConfig> {
    let config = state.config();
    Json(PublicConfig {
        api: config.api.clone(),
        router: config.router.clone(),
    })
}

/// GET /config-private - the full configuration.
async fn get_config_private(State(state): State<AppState>) -> Json<AppConfig> {
    Json(state.config().clone())
}

async fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[derive(Debug, Serialize)]
struct MetricsResponse {
    orderbook_active_orders_errors: u64,
    create_limit_order_errors: u64,
    tick_by_id_not_found: u64,
}

/// GET /metrics - telemetry counters.
async fn get_metrics() -> Json<MetricsResponse> {
    Json(MetricsResponse {
        orderbook_active_orders_errors: telemetry::get(
            &telemetry::PROCESSING_ORDERBOOK_ACTIVE_ORDERS_ERRORS,
        ),
        create_limit_order_errors: telemetry::get(&telemetry::CREATE_LIMIT_ORDER_ERRORS),
        tick_by_id_not_found: telemetry::get(&telemetry::TICK_BY_ID_NOT_FOUND),
    })
}
