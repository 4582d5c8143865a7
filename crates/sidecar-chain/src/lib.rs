//! sidecar-chain: Chain surface behind narrow interfaces
//!
//! The full node's gRPC surface is consumed through the client traits in
//! this crate; the rest of the workspace never talks to the chain directly.
//! Transaction construction, signing scaffolding and the message simulator
//! live here as well.

pub mod clients;
pub mod msg_simulator;
pub mod tx;

pub use clients::*;
pub use msg_simulator::*;
