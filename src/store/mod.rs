//! Injected data services with explicit lifecycles.
//!
//! Each store is constructed over a [`crate::storage::KeyValueStore`],
//! loaded once at process start, and passed by reference to consumers.
//! No ambient singletons.
//!
//! - `LocationStore`: the local cache & sync layer for locations/reviews
//! - `ProfileStore`: the signed-in user, with best-effort remote sync
//! - `GeoStore`: remembered city/country and the geocode rate limit

pub mod geo;
pub mod locations;
pub mod profile;

pub use geo::GeoStore;
pub use locations::{LocationStore, StoreState};
pub use profile::ProfileStore;
