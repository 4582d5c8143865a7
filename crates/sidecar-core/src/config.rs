//! Configuration types for the sidecar service

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Chain connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// gRPC gateway endpoint of the full node, e.g. "http://127.0.0.1:9090".
    pub grpc_gateway_endpoint: String,

    /// Chain identifier used when signing transactions.
    pub chain_id: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            grpc_gateway_endpoint: "http://127.0.0.1:9090".to_string(),
            chain_id: "osmosis-1".to_string(),
        }
    }
}

/// HTTP API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_port")]
    pub port: u16,
}

fn default_api_port() -> u16 {
    9092
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: default_api_port(),
        }
    }
}

/// One threshold of the dynamic min-liquidity-cap mapping. Entries are
/// consulted in descending `min_tokens_cap` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicMinLiquidityCapFilterEntry {
    /// Lower bound on min(token-in cap, token-out cap) for this entry to apply.
    pub min_tokens_cap: u64,
    /// Min-pool-liquidity-cap filter applied when the entry matches.
    pub filter_value: u64,
}

/// Router configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Maximum number of candidate routes to discover per request.
    #[serde(default = "default_max_routes")]
    pub max_routes: usize,

    /// Maximum number of pool hops within a single route.
    #[serde(default = "default_max_pools_per_route")]
    pub max_pools_per_route: usize,

    /// Maximum number of routes an input may be split across.
    /// `-1` disables split quotes entirely.
    #[serde(default = "default_max_split_routes")]
    pub max_split_routes: i64,

    /// Granularity of the split search: input shares are multiples of
    /// `1 / max_split_iterations`.
    #[serde(default = "default_max_split_iterations")]
    pub max_split_iterations: usize,

    /// Default minimum liquidity capitalization for a pool to be routable.
    #[serde(default)]
    pub min_pool_liquidity_cap: u64,

    /// Whether the candidate and ranked route caches are consulted.
    #[serde(default = "default_true")]
    pub route_cache_enabled: bool,

    /// TTL of candidate-route cache entries.
    #[serde(default = "default_candidate_route_cache_expiry_seconds")]
    pub candidate_route_cache_expiry_seconds: u64,

    /// TTL of ranked-route cache entries.
    #[serde(default = "default_ranked_route_cache_expiry_seconds")]
    pub ranked_route_cache_expiry_seconds: u64,

    /// Dynamic min-liquidity-cap thresholds, sorted descending by
    /// `min_tokens_cap`.
    #[serde(default)]
    pub dynamic_min_liquidity_cap_filters_desc: Vec<DynamicMinLiquidityCapFilterEntry>,
}

/// Sentinel for `max_split_routes` disabling split quotes.
pub const DISABLE_SPLIT_ROUTES: i64 = -1;

fn default_max_routes() -> usize {
    20
}

fn default_max_pools_per_route() -> usize {
    4
}

fn default_max_split_routes() -> i64 {
    3
}

fn default_max_split_iterations() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_candidate_route_cache_expiry_seconds() -> u64 {
    600
}

fn default_ranked_route_cache_expiry_seconds() -> u64 {
    300
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_routes: default_max_routes(),
            max_pools_per_route: default_max_pools_per_route(),
            max_split_routes: default_max_split_routes(),
            max_split_iterations: default_max_split_iterations(),
            min_pool_liquidity_cap: 0,
            route_cache_enabled: true,
            candidate_route_cache_expiry_seconds: default_candidate_route_cache_expiry_seconds(),
            ranked_route_cache_expiry_seconds: default_ranked_route_cache_expiry_seconds(),
            dynamic_min_liquidity_cap_filters_desc: Vec::new(),
        }
    }
}

/// CosmWasm code ids classifying pool contracts into routable variants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolsConfig {
    #[serde(default)]
    pub transmuter_code_ids: Vec<u64>,
    #[serde(default)]
    pub alloyed_transmuter_code_ids: Vec<u64>,
    #[serde(default)]
    pub orderbook_code_ids: Vec<u64>,
    #[serde(default)]
    pub general_cosmwasm_code_ids: Vec<u64>,
}

/// Claimbot plugin configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaimbotConfig {
    #[serde(default)]
    pub enabled: bool,
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub chain: ChainConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub router: RouterConfig,

    #[serde(default)]
    pub pools: PoolsConfig,

    #[serde(default)]
    pub claimbot: ClaimbotConfig,
}

impl AppConfig {
    /// Loads the configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(std::io::Error::other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.api.port, 9092);
        assert_eq!(config.chain.chain_id, "osmosis-1");
        assert_eq!(config.router.max_pools_per_route, 4);
        assert!(config.router.route_cache_enabled);
        assert!(!config.claimbot.enabled);
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.api.port, config.api.port);
        assert_eq!(
            parsed.router.candidate_route_cache_expiry_seconds,
            config.router.candidate_route_cache_expiry_seconds
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"router":{"max_routes":5}}"#).unwrap();
        assert_eq!(parsed.router.max_routes, 5);
        assert_eq!(parsed.router.max_pools_per_route, 4);
        assert_eq!(parsed.api.port, 9092);
    }
}
