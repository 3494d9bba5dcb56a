//! City-scoped cache for routes and stations
//!
//! The `CacheCoordinator` serves route and station lists for a city from the
//! local store when the stored entry belongs to that city, and fetches them
//! from the API otherwise, writing fresh results through to the store.
//! Concurrent loads of the same list share a single network request.

mod coordinator;
mod inflight;

pub use coordinator::{CacheCoordinator, CacheEntry, CacheKind};
pub use inflight::InFlight;
