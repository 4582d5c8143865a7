//! Response DTOs and error translation

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use sidecar_core::pagination::PaginationResponse;
use sidecar_core::types::TxFeeInfo;
use sidecar_pools::model::{Pool, PoolError};
use sidecar_router::routable::RoutablePool;
use sidecar_router::route::Quote;
use sidecar_router::RouterError;

/// Error payload returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

pub type ErrorResponse = (StatusCode, Json<ApiError>);

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> ErrorResponse {
        (
            StatusCode::BAD_REQUEST,
            Json(Self::new("bad_request", message)),
        )
    }

    pub fn not_found(message: impl Into<String>) -> ErrorResponse {
        (StatusCode::NOT_FOUND, Json(Self::new("not_found", message)))
    }

    pub fn internal(message: impl Into<String>) -> ErrorResponse {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Self::new("internal", message)),
        )
    }
}

/// Translates pool registry errors to HTTP responses: not-found conditions
/// map to 404, invalid arguments to 400, everything else to 500.
pub fn pool_error_response(err: PoolError) -> ErrorResponse {
    match err {
        PoolError::NotFound { .. }
        | PoolError::CanonicalOrderbookNotFound { .. }
        | PoolError::TickModelNotSet { .. } => ApiError::not_found(err.to_string()),
        PoolError::NotConcentrated { .. } => ApiError::bad_request(err.to_string()),
        _ => ApiError::internal(err.to_string()),
    }
}

/// Translates router errors to HTTP responses.
pub fn router_error_response(err: RouterError) -> ErrorResponse {
    match &err {
        RouterError::TokenInDenomPoolNotFound { .. }
        | RouterError::TokenOutDenomPoolNotFound { .. }
        | RouterError::ValidationFailed { .. } => ApiError::bad_request(err.to_string()),
        RouterError::Pool(PoolError::NotFound { .. }) => ApiError::not_found(err.to_string()),
        _ => ApiError::internal(err.to_string()),
    }
}

/// Paginated pool listing.
#[derive(Debug, Serialize)]
pub struct PoolsResponse {
    pub data: Vec<Pool>,
    #[serde(flatten)]
    pub pagination: PaginationResponse,
}

/// One hop of a quoted route.
#[derive(Debug, Serialize)]
pub struct RoutePoolDto {
    pub id: u64,
    #[serde(rename = "type")]
    pub pool_type: u64,
    pub token_out_denom: String,
    pub taker_fee: String,
    pub spread_factor: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub code_id: u64,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

impl From<&RoutablePool> for RoutePoolDto {
    fn from(pool: &RoutablePool) -> Self {
        Self {
            id: pool.id(),
            pool_type: pool.pool_type().as_u64(),
            token_out_denom: pool.token_out_denom().to_string(),
            taker_fee: pool.taker_fee().to_string(),
            spread_factor: pool.spread_factor().to_string(),
            code_id: pool.code_id(),
        }
    }
}

/// One split route of a quote.
#[derive(Debug, Serialize)]
pub struct SplitRouteDto {
    pub pools: Vec<RoutePoolDto>,
    pub in_amount: String,
    pub out_amount: String,
}

/// Quote response for `/router/quote`.
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub amount_in: CoinDto,
    pub amount_out: String,
    pub route: Vec<SplitRouteDto>,
    pub effective_fee: String,
    pub price_impact: String,
    pub in_base_out_quote_spot_price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_info: Option<TxFeeInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CoinDto {
    pub denom: String,
    pub amount: String,
}

impl From<&Quote> for QuoteResponse {
    fn from(quote: &Quote) -> Self {
        Self {
            amount_in: CoinDto {
                denom: quote.amount_in.denom.clone(),
                amount: quote.amount_in.amount.to_string(),
            },
            amount_out: quote.amount_out.to_string(),
            route: quote
                .routes
                .iter()
                .map(|split| SplitRouteDto {
                    pools: split.route.pools.iter().map(RoutePoolDto::from).collect(),
                    in_amount: split.in_amount.to_string(),
                    out_amount: split.out_amount.to_string(),
                })
                .collect(),
            effective_fee: quote.effective_fee.to_string(),
            price_impact: quote.price_impact.to_string(),
            in_base_out_quote_spot_price: quote.in_base_out_quote_spot_price.to_string(),
            price_info: quote.price_info.clone(),
        }
    }
}

/// `/pools/canonical-orderbook` response.
#[derive(Debug, Serialize)]
pub struct CanonicalOrderbookDto {
    pub pool_id: u64,
    pub contract_address: String,
}
