//! CitySync core - the data layer behind the CitySync location-review app.
//!
//! This crate owns the local-first state the UI renders: location and
//! review collections cached in memory and written through to a persisted
//! key-value store, the signed-in user's profile with best-effort sync to
//! the remote profile store, and the remembered location preferences.
//!
//! Persisted snapshots from older builds may be stale or corrupted, so
//! every slot is strictly validated on load and purged-and-reseeded when it
//! fails. Mutations persist first and commit to memory only on success.
//!
//! UI concerns (screens, navigation, maps, image picking) live elsewhere
//! and consume these stores by reference.

pub mod api;
pub mod config;
pub mod models;
pub mod seed;
pub mod storage;
pub mod store;

pub use config::Config;
pub use store::{GeoStore, LocationStore, ProfileStore, StoreState};
