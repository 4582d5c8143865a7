//! sidecar-claimbot: End-of-block order claiming
//!
//! Scans canonical orderbooks for sufficiently filled limit orders at the
//! end of each block and submits batched claim transactions. At most one
//! block is processed at a time.

mod config;
mod orderbooks;
mod plugin;
mod tx;

pub use config::Config;
pub use plugin::{Claimbot, ClaimbotError};
pub use tx::prepare_batch_claim_msg;
