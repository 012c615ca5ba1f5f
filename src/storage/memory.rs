use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use super::KeyValueStore;

/// In-memory key-value store. Used in tests and for ephemeral sessions
/// where nothing should touch the filesystem.
#[derive(Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a slot, bypassing the trait. Test convenience.
    pub fn seed_raw(&self, key: &str, value: &str) {
        self.slots
            .lock()
            .expect("memory store lock")
            .insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.lock().expect("memory store lock").get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.slots
            .lock()
            .expect("memory store lock")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.slots.lock().expect("memory store lock").remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self
            .slots
            .lock()
            .expect("memory store lock")
            .keys()
            .cloned()
            .collect())
    }
}
