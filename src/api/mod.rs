//! RPC client module for the CitySync backend.
//!
//! This module provides the `ProfileClient` for the thin profile
//! procedures (get/update) and the echo probe. Calls carry an opaque
//! per-user id header; there are no retries and no backoff - failures
//! surface once to the caller.

pub mod client;
pub mod error;

pub use client::{HelloResponse, ProfileClient};
pub use error::ApiError;
