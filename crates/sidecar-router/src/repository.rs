//! Router repository
//!
//! Concurrent stores for taker fees, the current base fee, and the
//! denom-indexed candidate route search data written by the ingester.

use std::collections::HashMap;

use cosmwasm_std::{Decimal, Uint128};
use dashmap::DashMap;
use parking_lot::RwLock;

use sidecar_core::types::{BaseFee, BaseFeeSource, DenomPair};

/// Taker fee charged when no per-pair fee has been ingested.
pub fn default_taker_fee() -> Decimal {
    Decimal::permille(1)
}

/// Summary of a pool as indexed for candidate route search, ranked by the
/// ingester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRoutePoolData {
    pub id: u64,
    pub pool_denoms: Vec<String>,
    pub liquidity_cap: Uint128,
}

/// Pools touching a denom, in the ingester's ranking order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateRouteDenomData {
    pub sorted_pools: Vec<CandidateRoutePoolData>,
}

/// In-memory router repository.
#[derive(Default)]
pub struct RouterRepository {
    taker_fees: DashMap<DenomPair, Decimal>,
    candidate_route_search_data: DashMap<String, CandidateRouteDenomData>,
    base_fee: RwLock<BaseFee>,
}

impl RouterRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// The taker fee for the directional pair, if one has been ingested.
    /// No sorting is performed: taker fees are bi-directional.
    pub fn taker_fee(&self, denom0: &str, denom1: &str) -> Option<Decimal> {
        self.taker_fees
            .get(&DenomPair::new(denom0, denom1))
            .map(|entry| *entry.value())
    }

    /// Sets the taker fee for a directional pair.
    pub fn set_taker_fee(&self, denom0: &str, denom1: &str, taker_fee: Decimal) {
        self.taker_fees
            .insert(DenomPair::new(denom0, denom1), taker_fee);
    }

    /// Bulk taker fee update.
    pub fn set_taker_fees(&self, taker_fees: HashMap<DenomPair, Decimal>) {
        for (pair, fee) in taker_fees {
            self.taker_fees.insert(pair, fee);
        }
    }

    /// Snapshot of all taker fees.
    pub fn all_taker_fees(&self) -> HashMap<DenomPair, Decimal> {
        self.taker_fees
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    /// Candidate route search data for a denom; empty if the denom has not
    /// been indexed.
    pub fn denom_data(&self, denom: &str) -> CandidateRouteDenomData {
        self.candidate_route_search_data
            .get(denom)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Merges in denom-indexed search data from the ingester.
    pub fn set_candidate_route_search_data(
        &self,
        data: HashMap<String, CandidateRouteDenomData>,
    ) {
        for (denom, denom_data) in data {
            self.candidate_route_search_data.insert(denom, denom_data);
        }
    }

    /// Updates the base fee; called by the end-block ingest hook.
    pub fn set_base_fee(&self, base_fee: BaseFee) {
        *self.base_fee.write() = base_fee;
    }
}

impl BaseFeeSource for RouterRepository {
    fn base_fee(&self) -> BaseFee {
        self.base_fee.read().clone()
    }
}
