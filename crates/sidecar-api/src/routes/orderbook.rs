//! Orderbook routes

use std::collections::HashMap;
use std::convert::Infallible;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::{Json, Router};
use futures_util::stream::{Stream, StreamExt};
use serde::Serialize;

use sidecar_core::orderbook::LimitOrder;

use crate::dto::{ApiError, ErrorResponse};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orderbook/active-orders", get(get_active_orders))
        .route(
            "/orderbook/active-orders-stream",
            get(get_active_orders_stream),
        )
}

#[derive(Debug, Serialize)]
struct ActiveOrdersResponse {
    orders: Vec<LimitOrder>,
    is_best_effort: bool,
}

fn owner_address(params: &HashMap<String, String>) -> Result<String, ErrorResponse> {
    params
        .get("userOsmoAddress")
        .filter(|value| !value.is_empty())
        .cloned()
        .ok_or_else(|| ApiError::bad_request("userOsmoAddress is required"))
}

/// GET /orderbook/active-orders - aggregate active orders of an address
/// across all canonical orderbooks.
async fn get_active_orders(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ActiveOrdersResponse>, ErrorResponse> {
    let address = owner_address(&params)?;

    let (orders, is_best_effort) = state
        .orderbook()
        .get_active_orders(&address)
        .await
        .map_err(|err| ApiError::internal(err.to_string()))?;

    Ok(Json(ActiveOrdersResponse {
        orders,
        is_best_effort,
    }))
}

/// GET /orderbook/active-orders-stream - server-sent stream of per-orderbook
/// active order results. The stream stays open until the client disconnects.
async fn get_active_orders_stream(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ErrorResponse> {
    let address = owner_address(&params)?;

    let receiver = state.orderbook().get_active_orders_stream(address);
    let stream = futures_util::stream::unfold(receiver, |mut receiver| async move {
        receiver.recv().await.map(|result| (result, receiver))
    })
    .map(|result| {
        let event = Event::default()
            .json_data(&result)
            .unwrap_or_else(|_| Event::default().data("serialization error"));
        Ok(event)
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
