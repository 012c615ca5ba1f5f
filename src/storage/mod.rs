//! Persisted key-value storage for local snapshots.
//!
//! This module provides the `KeyValueStore` seam the data stores persist
//! through, plus the strict slot decoder that classifies stored values as
//! valid, corrupted, or malformed before anything reaches in-memory state.
//!
//! Implementations:
//! - `FileStore`: one file per slot under the app data directory
//! - `MemoryStore`: ephemeral, for tests

pub mod file;
pub mod memory;
pub mod slot;

use anyhow::Result;
use async_trait::async_trait;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use slot::{decode_plain, decode_slot, is_corrupt_sentinel, SlotError};

/// String-keyed storage with no schema enforcement of its own.
///
/// Stored values may be stale or corrupted; callers validate through
/// [`decode_slot`] before adopting anything.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
    async fn keys(&self) -> Result<Vec<String>>;
}

// One physical store is shared by the location, profile, and preference
// services, so Arc<S> must be usable wherever S is.
#[async_trait]
impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key).await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        (**self).keys().await
    }
}
