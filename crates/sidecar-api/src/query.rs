//! Query parameter decoding
//!
//! Request shapes for `/pools` and `/router/quote`, decoded from the raw
//! query map. Deprecated parameter aliases remain accepted.

use std::collections::HashMap;

use cosmwasm_std::{Coin, Decimal, Uint128};
use thiserror::Error;

use sidecar_core::errors::{PaginationError, SortError, ValidationError};
use sidecar_core::number::{parse_number_type, parse_numbers};
use sidecar_core::pagination::PaginationRequest;
use sidecar_core::sort::SortRequest;
use sidecar_core::types::validate_input_denoms;
use sidecar_pools::filters::GetPoolsFilter;
use sidecar_pools::model::IncentiveType;
use sidecar_pools::registry::MAX_SEARCH_QUERY_LENGTH;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid value {value} for query parameter {name}")]
    InvalidParam { name: &'static str, value: String },

    #[error("search query is too long")]
    SearchTooLong,

    #[error("swap method is not valid")]
    SwapMethodNotValid,

    #[error("tokenIn is not valid")]
    TokenInNotValid,

    #[error("tokenOut is not valid")]
    TokenOutNotValid,

    #[error("{0}")]
    Simulation(String),

    #[error(transparent)]
    Pagination(#[from] PaginationError),

    #[error(transparent)]
    Sort(#[from] SortError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Parses a boolean query parameter accepting `true`/`false`/`1`/`0`.
/// An absent or empty parameter is `false`.
pub fn parse_boolean_query_param(
    params: &HashMap<String, String>,
    name: &'static str,
) -> Result<bool, QueryError> {
    match params.get(name).map(String::as_str) {
        None | Some("") => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some("false") | Some("0") => Ok(false),
        Some(value) => Err(QueryError::InvalidParam {
            name,
            value: value.to_string(),
        }),
    }
}

/// Parses a coin of the form `<amount><denom>`, e.g. `1000000uosmo`.
pub fn parse_coin(value: &str) -> Option<Coin> {
    let split = value.find(|c: char| !c.is_ascii_digit())?;
    if split == 0 {
        return None;
    }

    let (amount, denom) = value.split_at(split);
    let amount: u128 = amount.parse().ok()?;
    if denom.is_empty() {
        return None;
    }

    Some(Coin {
        denom: denom.to_string(),
        amount: Uint128::new(amount),
    })
}

// Query parameter names for /pools. The bare names are deprecated aliases.
const QUERY_IDS: &str = "IDs"; // Deprecated: use filter[id]
const QUERY_MIN_LIQUIDITY_CAP: &str = "min_liquidity_cap"; // Deprecated: use filter[min_liquidity_cap]
const QUERY_WITH_MARKET_INCENTIVES: &str = "with_market_incentives"; // Deprecated: use filter[with_market_incentives]
const QUERY_FILTER_ID: &str = "filter[id]";
const QUERY_FILTER_ID_NOT_IN: &str = "filter[id][not_in]";
const QUERY_FILTER_TYPE: &str = "filter[type]";
const QUERY_FILTER_INCENTIVE: &str = "filter[incentive]";
const QUERY_FILTER_MIN_LIQUIDITY_CAP: &str = "filter[min_liquidity_cap]";
const QUERY_FILTER_WITH_MARKET_INCENTIVES: &str = "filter[with_market_incentives]";
const QUERY_FILTER_SEARCH: &str = "filter[search]";

const QUERY_PAGE_NUMBER: &str = "page[number]";
const QUERY_PAGE_SIZE: &str = "page[size]";
const QUERY_PAGE_CURSOR: &str = "page[cursor]";
const QUERY_SORT: &str = "sort";

/// Decoded `/pools` request.
#[derive(Debug, Default)]
pub struct GetPoolsRequest {
    pub filter: Option<GetPoolsFilter>,
    pub sort: Option<SortRequest>,
    pub pagination: Option<PaginationRequest>,
}

impl GetPoolsRequest {
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self, QueryError> {
        let mut request = Self::default();

        if filter_is_present(params) {
            request.filter = Some(parse_pools_filter(params)?);
        }

        if params.contains_key(QUERY_PAGE_NUMBER)
            || params.contains_key(QUERY_PAGE_SIZE)
            || params.contains_key(QUERY_PAGE_CURSOR)
        {
            let pagination = PaginationRequest::from_query_params(
                params.get(QUERY_PAGE_NUMBER).map(String::as_str),
                params.get(QUERY_PAGE_SIZE).map(String::as_str),
                params.get(QUERY_PAGE_CURSOR).map(String::as_str),
            )?;
            pagination.validate()?;
            request.pagination = Some(pagination);
        }

        if let Some(sort) = params.get(QUERY_SORT) {
            request.sort = Some(SortRequest::parse(sort)?);
        }

        Ok(request)
    }
}

fn filter_is_present(params: &HashMap<String, String>) -> bool {
    [
        QUERY_IDS,
        QUERY_FILTER_ID,
        QUERY_FILTER_ID_NOT_IN,
        QUERY_FILTER_TYPE,
        QUERY_FILTER_INCENTIVE,
        QUERY_MIN_LIQUIDITY_CAP,
        QUERY_FILTER_MIN_LIQUIDITY_CAP,
        QUERY_WITH_MARKET_INCENTIVES,
        QUERY_FILTER_WITH_MARKET_INCENTIVES,
        QUERY_FILTER_SEARCH,
    ]
    .iter()
    .any(|name| params.get(*name).is_some_and(|value| !value.is_empty()))
}

fn parse_pools_filter(params: &HashMap<String, String>) -> Result<GetPoolsFilter, QueryError> {
    let mut filter = GetPoolsFilter::default();

    let mut pool_ids = Vec::new();
    let mut id_filter_present = false;
    for name in [QUERY_IDS, QUERY_FILTER_ID] {
        if let Some(value) = params.get(name) {
            id_filter_present = true;
            pool_ids.extend(parse_numbers(value).map_err(|_| QueryError::InvalidParam {
                name: QUERY_FILTER_ID,
                value: value.clone(),
            })?);
        }
    }
    if id_filter_present {
        filter.pool_id = Some(pool_ids);
    }

    if let Some(value) = params.get(QUERY_FILTER_ID_NOT_IN) {
        filter.pool_id_not_in = parse_numbers(value).map_err(|_| QueryError::InvalidParam {
            name: QUERY_FILTER_ID_NOT_IN,
            value: value.clone(),
        })?;
    }

    if let Some(value) = params.get(QUERY_FILTER_TYPE) {
        filter.pool_type = parse_numbers(value).map_err(|_| QueryError::InvalidParam {
            name: QUERY_FILTER_TYPE,
            value: value.clone(),
        })?;
    }

    if let Some(value) = params.get(QUERY_FILTER_INCENTIVE) {
        filter.incentive = parse_number_type(value, |segment| {
            segment
                .parse::<u64>()
                .ok()
                .and_then(IncentiveType::from_u64)
                .ok_or(QueryError::InvalidParam {
                    name: QUERY_FILTER_INCENTIVE,
                    value: segment.to_string(),
                })
        })?;
    }

    for name in [QUERY_MIN_LIQUIDITY_CAP, QUERY_FILTER_MIN_LIQUIDITY_CAP] {
        if let Some(value) = params.get(name).filter(|value| !value.is_empty()) {
            filter.min_liquidity_cap =
                value.parse().map_err(|_| QueryError::InvalidParam {
                    name: QUERY_FILTER_MIN_LIQUIDITY_CAP,
                    value: value.clone(),
                })?;
        }
    }

    filter.with_market_incentives =
        parse_boolean_query_param(params, QUERY_WITH_MARKET_INCENTIVES)?
            || parse_boolean_query_param(params, QUERY_FILTER_WITH_MARKET_INCENTIVES)?;

    if let Some(value) = params.get(QUERY_FILTER_SEARCH).filter(|v| !v.is_empty()) {
        if value.len() > MAX_SEARCH_QUERY_LENGTH {
            return Err(QueryError::SearchTooLong);
        }
        filter.search = Some(value.clone());
    }

    Ok(filter)
}

/// Which side of the swap is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSwapMethod {
    ExactIn,
    ExactOut,
    Invalid,
}

/// Decoded `/router/quote` request.
#[derive(Debug, Default)]
pub struct GetQuoteRequest {
    pub token_in: Option<Coin>,
    pub token_out: Option<Coin>,
    pub token_in_denom: String,
    pub token_out_denom: String,
    pub single_route: bool,
    pub apply_exponents: bool,
    pub append_base_fee: bool,
    pub simulator_address: String,
    pub slippage_tolerance_multiplier: Option<Decimal>,
    /// Pool ids for the custom direct quote dispatch.
    pub pool_ids: Vec<u64>,
}

impl GetQuoteRequest {
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self, QueryError> {
        let mut request = Self {
            single_route: parse_boolean_query_param(params, "singleRoute")?,
            apply_exponents: parse_boolean_query_param(params, "applyExponents")?,
            append_base_fee: parse_boolean_query_param(params, "appendBaseFee")?,
            ..Default::default()
        };

        if let Some(value) = params.get("tokenIn").filter(|v| !v.is_empty()) {
            request.token_in = Some(parse_coin(value).ok_or(QueryError::TokenInNotValid)?);
        }
        if let Some(value) = params.get("tokenOut").filter(|v| !v.is_empty()) {
            request.token_out = Some(parse_coin(value).ok_or(QueryError::TokenOutNotValid)?);
        }

        request.token_in_denom = params.get("tokenInDenom").cloned().unwrap_or_default();
        request.token_out_denom = params.get("tokenOutDenom").cloned().unwrap_or_default();

        if let Some(value) = params.get("poolID").filter(|v| !v.is_empty()) {
            request.pool_ids = parse_numbers(value).map_err(|_| QueryError::InvalidParam {
                name: "poolID",
                value: value.clone(),
            })?;
        }

        let simulator_address = params
            .get("simulatorAddress")
            .cloned()
            .unwrap_or_default();
        let slippage_tolerance = params
            .get("simulationSlippageTolerance")
            .cloned()
            .unwrap_or_default();

        request.slippage_tolerance_multiplier = validate_simulation_params(
            request.swap_method(),
            &simulator_address,
            &slippage_tolerance,
        )?;
        request.simulator_address = simulator_address;

        Ok(request)
    }

    /// The request may carry data for both swap methods; exactly one must be
    /// specified.
    pub fn swap_method(&self) -> TokenSwapMethod {
        let exact_in = self.token_in.is_some() && !self.token_out_denom.is_empty();
        let exact_out = self.token_out.is_some() && !self.token_in_denom.is_empty();

        match (exact_in, exact_out) {
            (true, false) => TokenSwapMethod::ExactIn,
            (false, true) => TokenSwapMethod::ExactOut,
            _ => TokenSwapMethod::Invalid,
        }
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        match (self.swap_method(), &self.token_in, &self.token_out) {
            (TokenSwapMethod::ExactIn, Some(token_in), _) => {
                validate_input_denoms(&token_in.denom, &self.token_out_denom)?;
            }
            (TokenSwapMethod::ExactOut, _, Some(token_out)) => {
                validate_input_denoms(&token_out.denom, &self.token_in_denom)?;
            }
            _ => return Err(QueryError::SwapMethodNotValid),
        }
        Ok(())
    }
}

/// Simulation requires a plausible bech32 address, the exact-in method, and
/// a positive slippage tolerance.
fn validate_simulation_params(
    swap_method: TokenSwapMethod,
    simulator_address: &str,
    slippage_tolerance: &str,
) -> Result<Option<Decimal>, QueryError> {
    if simulator_address.is_empty() {
        if !slippage_tolerance.is_empty() {
            return Err(QueryError::Simulation(
                "slippage tolerance is not supported without simulator address".to_string(),
            ));
        }
        return Ok(None);
    }

    if !is_plausible_bech32(simulator_address) {
        return Err(QueryError::Simulation(format!(
            "simulator address is not valid: ({simulator_address})"
        )));
    }

    if swap_method != TokenSwapMethod::ExactIn {
        return Err(QueryError::Simulation(
            "only 'out given in' swap method is supported for simulation".to_string(),
        ));
    }

    if slippage_tolerance.is_empty() {
        return Err(QueryError::Simulation(
            "slippage tolerance is required for simulation".to_string(),
        ));
    }

    let multiplier: Decimal = slippage_tolerance.parse().map_err(|_| {
        QueryError::Simulation(format!(
            "slippage tolerance is not valid: {slippage_tolerance}"
        ))
    })?;

    if multiplier.is_zero() {
        return Err(QueryError::Simulation(
            "slippage tolerance must be greater than 0".to_string(),
        ));
    }

    Ok(Some(multiplier))
}

/// Shallow bech32 shape check: `<hrp>1<data>` over the bech32 alphabet.
fn is_plausible_bech32(address: &str) -> bool {
    let Some(separator) = address.rfind('1') else {
        return false;
    };
    if separator == 0 || address.len() < 8 {
        return false;
    }
    address[separator + 1..]
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}
