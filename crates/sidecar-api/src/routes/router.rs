//! Router routes

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};

use sidecar_core::types::{BaseFeeSource, TxFeeInfo};
use sidecar_router::usecase::QuoteOptions;

use crate::dto::{router_error_response, ApiError, ErrorResponse, QuoteResponse};
use crate::query::{GetQuoteRequest, TokenSwapMethod};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/router/quote", get(get_quote))
}

/// GET /router/quote - optimal quote, or a custom direct quote when a pool
/// id list is given. The swap method follows from which token parameters are
/// present.
async fn get_quote(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<QuoteResponse>, ErrorResponse> {
    let request = GetQuoteRequest::from_query(&params)
        .map_err(|err| ApiError::bad_request(err.to_string()))?;
    request
        .validate()
        .map_err(|err| ApiError::bad_request(err.to_string()))?;

    let options = QuoteOptions {
        disable_cache: false,
        single_route: request.single_route,
    };

    let router = state.router();
    let mut quote = match (
        request.swap_method(),
        request.token_in.clone(),
        request.token_out.clone(),
    ) {
        (TokenSwapMethod::ExactIn, Some(token_in), _) => {
            if request.pool_ids.is_empty() {
                router
                    .get_optimal_quote(token_in, &request.token_out_denom, options)
                    .await
            } else {
                let token_out_denoms = split_denoms(&request.token_out_denom);
                router
                    .get_custom_direct_quote_multi_pool(
                        token_in,
                        &token_out_denoms,
                        &request.pool_ids,
                    )
                    .await
            }
        }
        (TokenSwapMethod::ExactOut, _, Some(token_out)) => {
            if request.pool_ids.is_empty() {
                router
                    .get_optimal_quote_exact_out(token_out, &request.token_in_denom, options)
                    .await
            } else {
                let token_in_denoms = split_denoms(&request.token_in_denom);
                router
                    .get_custom_direct_quote_multi_pool_exact_out(
                        token_out,
                        &token_in_denoms,
                        &request.pool_ids,
                    )
                    .await
            }
        }
        _ => return Err(ApiError::bad_request("swap method is not valid")),
    }
    .map_err(router_error_response)?;

    if let Some(multiplier) = request.slippage_tolerance_multiplier {
        let simulator = state
            .quote_simulator()
            .ok_or_else(|| ApiError::internal("quote simulator is not configured"))?;
        let price_info = simulator
            .simulate_quote(&quote, multiplier, &request.simulator_address)
            .await;
        quote.price_info = Some(price_info);
    } else if request.append_base_fee {
        let base_fee = state.router_repository().base_fee();
        quote.price_info = Some(TxFeeInfo {
            base_fee: base_fee.current_fee,
            ..Default::default()
        });
    }

    Ok(Json(QuoteResponse::from(&quote)))
}

fn split_denoms(denoms: &str) -> Vec<String> {
    denoms
        .split(',')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}
