//! Pipeline utilities over concurrent maps
//!
//! A transformer snapshots the keys of a [`dashmap::DashMap`], applies
//! filters and sorts to the key set without copying values, and hands the
//! surviving keys to an iterator that a paginator slices into pages.

mod iterator;
mod paginator;
mod transformer;

pub use iterator::MapIterator;
pub use paginator::Paginator;
pub use transformer::MapTransformer;
