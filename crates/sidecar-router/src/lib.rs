//! sidecar-router: Optimal quote routing
//!
//! Candidate route discovery over the pool graph, route ranking with
//! two cache tiers, split-quote optimization, and the routable pool wrappers
//! pricing swaps across every pool variant.

pub mod cache;
pub mod candidate_routes;
pub mod errors;
pub mod quote_simulator;
pub mod repository;
pub mod routable;
pub mod route;
pub mod usecase;

pub use errors::RouterError;
pub use repository::RouterRepository;
pub use usecase::RouterUsecase;
