mod config;
mod sqlite;

pub use config::{Config, EstimatorConfig, ProfileOverride};
pub use sqlite::SqliteStore;

use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::StoreError;

/// Key holding the serialized activity profiles.
pub const PROFILES_KEY: &str = "timing-profiles";
/// Key holding the learned multipliers and preference log.
pub const PREFERENCES_KEY: &str = "timing-preferences";

/// Opaque JSON key-value persistence supplied by the host.
pub trait KeyValueStore: Send {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<_> = map.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Insert a raw value, bypassing the trait (useful to seed bad data).
    pub fn insert(&self, key: &str, value: Value) {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        map.insert(key.to_string(), value);
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(map.get(key).cloned())
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        map.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        map.remove(key);
        Ok(())
    }
}

/// Returns `~/.config/wellspring[-dev]/` based on WELLSPRING_ENV.
///
/// Set WELLSPRING_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("WELLSPRING_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("wellspring-dev")
    } else {
        base_dir.join("wellspring")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.load("a").unwrap().is_none());
        store.save("a", &json!({"x": 1})).unwrap();
        assert_eq!(store.load("a").unwrap(), Some(json!({"x": 1})));
        store.remove("a").unwrap();
        assert!(store.load("a").unwrap().is_none());
    }

    #[test]
    fn memory_store_clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.save(PROFILES_KEY, &json!([])).unwrap();
        assert_eq!(other.keys(), vec![PROFILES_KEY.to_string()]);
    }
}
