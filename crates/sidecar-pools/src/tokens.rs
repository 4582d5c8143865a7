//! Token metadata registry
//!
//! Chain-denom keyed metadata fed by the asset-list ingester. The registry
//! also answers the spot-price scaling factor between two denominations,
//! which normalizes chain-precision prices to human precision.

use cosmwasm_std::{Decimal, Uint128};
use dashmap::DashMap;
use thiserror::Error;

use sidecar_core::types::Token;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("metadata not found for denom {denom}")]
    MetadataNotFound { denom: String },

    #[error("scaling factor overflow for base {base} and quote {quote}")]
    ScalingFactorOverflow { base: String, quote: String },
}

/// Read side of the token metadata registry, consumed by the registry search,
/// the router's liquidity-cap mapping, and the orderbook formatter.
pub trait TokenMetadataProvider: Send + Sync {
    /// Metadata for a chain denom.
    fn metadata_by_chain_denom(&self, denom: &str) -> Result<Token, TokenError>;

    /// Multiplier converting a chain-precision price quoted in `quote` per
    /// `base` into human precision: `10^base_precision / 10^quote_precision`.
    fn spot_price_scaling_factor(&self, base: &str, quote: &str) -> Result<Decimal, TokenError>;
}

/// In-memory token metadata registry.
#[derive(Default)]
pub struct TokenRegistry {
    tokens: DashMap<String, Token>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the metadata entry for the token's chain denom.
    pub fn store(&self, token: Token) {
        self.tokens.insert(token.chain_denom.clone(), token);
    }

    /// Bulk upsert.
    pub fn store_all(&self, tokens: impl IntoIterator<Item = Token>) {
        for token in tokens {
            self.store(token);
        }
    }

    /// Total liquidity cap recorded for a denom, if known.
    pub fn total_liquidity_cap(&self, denom: &str) -> Option<Uint128> {
        self.tokens
            .get(denom)
            .map(|token| token.total_liquidity_cap)
    }
}

impl TokenMetadataProvider for TokenRegistry {
    fn metadata_by_chain_denom(&self, denom: &str) -> Result<Token, TokenError> {
        self.tokens
            .get(denom)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| TokenError::MetadataNotFound {
                denom: denom.to_string(),
            })
    }

    fn spot_price_scaling_factor(&self, base: &str, quote: &str) -> Result<Decimal, TokenError> {
        let base_token = self.metadata_by_chain_denom(base)?;
        let quote_token = self.metadata_by_chain_denom(quote)?;

        let overflow = || TokenError::ScalingFactorOverflow {
            base: base.to_string(),
            quote: quote.to_string(),
        };

        let base_factor = 10u128.checked_pow(base_token.precision).ok_or_else(overflow)?;
        let quote_factor = 10u128
            .checked_pow(quote_token.precision)
            .ok_or_else(overflow)?;

        Ok(Decimal::from_ratio(base_factor, quote_factor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(chain_denom: &str, human_denom: &str, precision: u32) -> Token {
        Token {
            chain_denom: chain_denom.to_string(),
            human_denom: human_denom.to_string(),
            name: human_denom.to_uppercase(),
            precision,
            total_liquidity_cap: Uint128::zero(),
        }
    }

    #[test]
    fn test_metadata_lookup() {
        let registry = TokenRegistry::new();
        registry.store(token("uosmo", "osmo", 6));

        let found = registry.metadata_by_chain_denom("uosmo").unwrap();
        assert_eq!(found.human_denom, "osmo");

        assert_eq!(
            registry.metadata_by_chain_denom("missing"),
            Err(TokenError::MetadataNotFound {
                denom: "missing".to_string()
            })
        );
    }

    #[test]
    fn test_spot_price_scaling_factor() {
        let registry = TokenRegistry::new();
        registry.store(token("wei", "eth", 18));
        registry.store(token("uosmo", "osmo", 6));

        // 10^18 / 10^6 = 10^12
        let factor = registry.spot_price_scaling_factor("wei", "uosmo").unwrap();
        assert_eq!(factor, Decimal::from_ratio(10u128.pow(12), 1u128));

        // Inverse direction scales down.
        let inverse = registry.spot_price_scaling_factor("uosmo", "wei").unwrap();
        assert_eq!(inverse, Decimal::from_ratio(1u128, 10u128.pow(12)));
    }

    #[test]
    fn test_store_overwrites() {
        let registry = TokenRegistry::new();
        registry.store(token("uosmo", "osmo", 6));
        registry.store(token("uosmo", "osmosis", 6));

        let found = registry.metadata_by_chain_denom("uosmo").unwrap();
        assert_eq!(found.human_denom, "osmosis");
    }
}
