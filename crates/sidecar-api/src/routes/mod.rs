//! API route registration

pub mod orderbook;
pub mod pools;
pub mod router;
pub mod system;

use axum::Router;

use crate::AppState;

/// Assembles all route groups.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(pools::router())
        .merge(router::router())
        .merge(orderbook::router())
        .merge(system::router())
        .with_state(state)
}
