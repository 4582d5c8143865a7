//! sidecar-pools: Pool model and concurrent registry
//!
//! The pool model covers every routable pool shape ingested from the chain.
//! The registry stores pools behind a concurrent map, answers filtered and
//! paginated listings, and keeps the canonical-orderbook bookkeeping for each
//! `(base, quote)` pair.

pub mod fetchers;
pub mod filters;
pub mod model;
pub mod registry;
pub mod tick_math;
pub mod tokens;

pub use filters::*;
pub use model::*;
pub use registry::*;
