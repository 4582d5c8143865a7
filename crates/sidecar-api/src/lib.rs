//! sidecar-api: HTTP delivery
//!
//! Thin request decoding and response marshaling over the pool registry,
//! router and orderbook usecases.

pub mod dto;
pub mod query;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{create_app, start_server};
pub use state::AppState;
