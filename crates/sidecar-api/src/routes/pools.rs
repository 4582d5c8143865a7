//! Pool routes

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use sidecar_core::pagination::PaginationResponse;
use sidecar_pools::filters::PoolsOptions;

use crate::dto::{pool_error_response, ApiError, CanonicalOrderbookDto, ErrorResponse, PoolsResponse};
use crate::query::GetPoolsRequest;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pools", get(get_pools))
        .route("/pools/ticks/{id}", get(get_pool_ticks))
        .route("/pools/canonical-orderbook", get(get_canonical_orderbook))
        .route("/pools/canonical-orderbooks", get(get_canonical_orderbooks))
}

/// GET /pools - filter, sort and paginate pools.
async fn get_pools(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ErrorResponse> {
    let request = GetPoolsRequest::from_query(&params)
        .map_err(|err| ApiError::bad_request(err.to_string()))?;

    let pagination = request.pagination.clone();
    let (pools, total) = state.registry().pools(PoolsOptions {
        filter: request.filter,
        sort: request.sort,
        pagination: pagination.clone(),
    });

    // Paginated requests are wrapped with pagination metadata; plain
    // requests return the bare list.
    match pagination {
        Some(pagination) => Ok(Json(PoolsResponse {
            data: pools,
            pagination: PaginationResponse::new(Some(&pagination), total),
        })
        .into_response()),
        None => Ok(Json(pools).into_response()),
    }
}

/// GET /pools/ticks/{id} - tick model of a concentrated pool.
async fn get_pool_ticks(
    State(state): State<AppState>,
    Path(pool_id): Path<u64>,
) -> Result<Response, ErrorResponse> {
    let mut tick_models = state
        .registry()
        .tick_model_map(&[pool_id])
        .map_err(pool_error_response)?;

    let tick_model = tick_models
        .remove(&pool_id)
        .ok_or_else(|| ApiError::not_found(format!("tick model not found for pool {pool_id}")))?;

    Ok(Json(tick_model).into_response())
}

/// GET /pools/canonical-orderbook?base=..&quote=..
async fn get_canonical_orderbook(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<CanonicalOrderbookDto>, ErrorResponse> {
    let base = params
        .get("base")
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::bad_request("base denom is required"))?;
    let quote = params
        .get("quote")
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::bad_request("quote denom is required"))?;

    let (pool_id, contract_address) = state
        .registry()
        .canonical_orderbook(base, quote)
        .map_err(pool_error_response)?;

    Ok(Json(CanonicalOrderbookDto {
        pool_id,
        contract_address,
    }))
}

/// GET /pools/canonical-orderbooks - all canonical orderbooks, sorted by
/// pool id.
async fn get_canonical_orderbooks(
    State(state): State<AppState>,
) -> Result<Response, ErrorResponse> {
    let orderbooks = state
        .registry()
        .all_canonical_orderbooks()
        .map_err(pool_error_response)?;
    Ok(Json(orderbooks).into_response())
}
