//! Core type definitions shared across the workspace

use std::collections::HashSet;
use std::fmt;

use cosmwasm_std::{Coin, Decimal};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// A directional pair of denominations.
///
/// Both orderings are stored explicitly by callers because taker fees are
/// directional: `(a, b)` and `(b, a)` may carry different fees.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DenomPair {
    pub denom0: String,
    pub denom1: String,
}

impl DenomPair {
    pub fn new(denom0: impl Into<String>, denom1: impl Into<String>) -> Self {
        Self {
            denom0: denom0.into(),
            denom1: denom1.into(),
        }
    }
}

impl fmt::Display for DenomPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.denom0, self.denom1)
    }
}

/// The prevailing per-gas price in the chain's fee denom.
///
/// `current_fee` is `None` until the first end-block update arrives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaseFee {
    pub denom: String,
    pub current_fee: Option<Decimal>,
}

/// Result of pricing a simulated transaction.
///
/// A failed pricing attempt is reported through `err` rather than an error
/// value so that partial results (e.g. the base fee) survive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TxFeeInfo {
    pub adjusted_gas_used: u64,
    pub fee_coin: Option<Coin>,
    pub base_fee: Option<Decimal>,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub err: String,
}

impl TxFeeInfo {
    /// Shorthand for a pricing failure carrying only the error message.
    pub fn from_error(err: impl Into<String>) -> Self {
        Self {
            err: err.into(),
            ..Default::default()
        }
    }
}

/// Read access to the current base fee. Implemented by the router repository;
/// consumed by the message simulator when pricing transactions.
pub trait BaseFeeSource: Send + Sync {
    fn base_fee(&self) -> BaseFee;
}

/// Canonical orderbook entry returned to clients: the single orderbook pool
/// for a `(base, quote)` pair with the highest observed liquidity cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalOrderbookResult {
    pub base: String,
    pub quote: String,
    pub pool_id: u64,
    pub contract_address: String,
}

impl CanonicalOrderbookResult {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base.is_empty() {
            return Err(ValidationError::BaseDenomNotValid);
        }
        if self.quote.is_empty() {
            return Err(ValidationError::QuoteDenomNotValid);
        }
        if self.pool_id == 0 {
            return Err(ValidationError::PoolIdNotValid);
        }
        if self.contract_address.is_empty() {
            return Err(ValidationError::ContractAddressNotValid);
        }
        Ok(())
    }
}

/// Token metadata resolved from the asset list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// On-chain denomination, e.g. an IBC hash denom.
    pub chain_denom: String,
    /// Human readable denomination, e.g. "atom".
    pub human_denom: String,
    /// Display name, e.g. "Cosmos Hub".
    pub name: String,
    /// Number of decimal places the chain representation carries.
    pub precision: u32,
    /// Total liquidity capitalization across all pools holding this token.
    #[serde(default)]
    pub total_liquidity_cap: cosmwasm_std::Uint128,
}

/// Per-block pool metadata handed to end-block plugins by the ingester.
#[derive(Debug, Clone, Default)]
pub struct BlockPoolMetadata {
    /// Pool ids updated within the block.
    pub pool_ids: HashSet<u64>,
}

/// Validates that the two sides of a swap request name distinct, non-empty
/// denominations.
pub fn validate_input_denoms(denom_a: &str, denom_b: &str) -> Result<(), ValidationError> {
    if denom_a.is_empty() || denom_b.is_empty() {
        return Err(ValidationError::DenomEmpty);
    }
    if denom_a == denom_b {
        return Err(ValidationError::SameDenom {
            denom: denom_a.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denom_pair_directional_identity() {
        let ab = DenomPair::new("uosmo", "uatom");
        let ba = DenomPair::new("uatom", "uosmo");
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_validate_input_denoms() {
        assert!(validate_input_denoms("uosmo", "uatom").is_ok());
        assert!(matches!(
            validate_input_denoms("uosmo", "uosmo"),
            Err(ValidationError::SameDenom { .. })
        ));
        assert!(matches!(
            validate_input_denoms("", "uatom"),
            Err(ValidationError::DenomEmpty)
        ));
    }

    #[test]
    fn test_canonical_orderbook_result_validate() {
        let valid = CanonicalOrderbookResult {
            base: "uosmo".to_string(),
            quote: "uatom".to_string(),
            pool_id: 1,
            contract_address: "osmo1contract".to_string(),
        };
        assert!(valid.validate().is_ok());

        let missing_pool = CanonicalOrderbookResult {
            pool_id: 0,
            ..valid.clone()
        };
        assert!(matches!(
            missing_pool.validate(),
            Err(ValidationError::PoolIdNotValid)
        ));
    }
}
