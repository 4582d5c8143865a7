//! sidecar-orderbook: Orderbook usecase
//!
//! Ingests tick state per orderbook pool, formats active limit orders for an
//! address (aggregate and streaming), and detects claimable orders for the
//! claimbot.

pub mod errors;
pub mod repository;
pub mod telemetry;
pub mod usecase;

pub use errors::OrderbookError;
pub use repository::OrderbookRepository;
pub use usecase::OrderbookUsecase;
