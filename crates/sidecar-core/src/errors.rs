//! Error types shared across the workspace

use thiserror::Error;

/// Input validation errors surfaced as HTTP 400 by the delivery layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("denom must not be empty")]
    DenomEmpty,

    #[error("input and output denom are the same: {denom}")]
    SameDenom { denom: String },

    #[error("base denom is not valid")]
    BaseDenomNotValid,

    #[error("quote denom is not valid")]
    QuoteDenomNotValid,

    #[error("pool ID is not valid")]
    PoolIdNotValid,

    #[error("contract address is not valid")]
    ContractAddressNotValid,
}

/// Pagination request errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("page is not valid")]
    PageNotValid,

    #[error("limit is not valid")]
    LimitNotValid,

    #[error("page is too large, maximum allowed is {max}")]
    PageTooLarge { max: u64 },

    #[error("limit is too large, maximum allowed is {max}")]
    LimitTooLarge { max: u64 },

    #[error("pagination strategy is not supported")]
    StrategyNotSupported,

    #[error("failed to parse pagination parameter: {0}")]
    Parse(String),
}

/// Sort request errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SortError {
    #[error("sort parameter exceeds maximum length of {max} characters")]
    FieldTooLong { max: usize },
}
