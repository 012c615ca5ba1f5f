//! Data models for CitySync entities.
//!
//! This module contains the data structures shared across the data layer:
//!
//! - `Location`, `NewLocation`: places and their derived rating aggregates
//! - `Review`, `NewReview`: user reviews, immutable once created
//! - `UserProfile`, `ProfileUpdate`, `RemoteProfile`: the signed-in user

pub mod location;
pub mod profile;
pub mod review;

pub use location::{Location, NewLocation};
pub use profile::{ProfileUpdate, RemoteProfile, UserProfile};
pub use review::{NewReview, Review};
