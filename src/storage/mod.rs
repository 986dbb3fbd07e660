//! Persisted key-value storage
//!
//! The engines keep all state as JSON documents under a handful of fixed
//! keys. Backends only move strings; (de)serialization lives in the helpers
//! below so that "no data yet" (`Ok(None)`) stays distinguishable from a
//! broken backend or malformed document (`Err`).

pub mod file;
pub mod memory;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

pub use file::FileStore;
pub use memory::InMemoryStore;

/// Persisted key names
pub mod keys {
    pub const PROGRESS: &str = "progress";
    pub const COMPLETED_EXPERIMENT_IDS: &str = "completed-experiment-ids";
    pub const USER_OBSERVATIONS: &str = "user-observations";
    pub const TAXON_INFO_CACHE: &str = "taxon-info-cache";
    pub const ACTIVE_OBSERVATION_TASKS: &str = "active-observation-tasks";
    pub const OBSERVATION_TASK_HISTORY: &str = "observation-task-history";
    pub const COMPLETED_OBSERVATIONS: &str = "completed-observations";
    pub const USER_PROFILE: &str = "user-profile";
}

/// Storage failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed data under '{key}': {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
}

/// Minimal async key-value backend
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value for a key; `Ok(None)` when never written
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite the value for a key
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Delete a key; deleting a missing key is not an error
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Read and decode a JSON document
pub async fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Malformed { key: key.to_string(), source }),
        None => Ok(None),
    }
}

/// Encode and write a JSON document
pub async fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value)
        .map_err(|source| StoreError::Serialize { key: key.to_string(), source })?;
    store.set(key, raw).await
}

/// Read a document, substituting the default for missing or unreadable data
pub async fn load_or_default<T: DeserializeOwned + Default>(
    store: &dyn KeyValueStore,
    key: &str,
) -> T {
    match read_json(store, key).await {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(e) => {
            warn!("Falling back to defaults: {}", e);
            T::default()
        }
    }
}

/// Write a document, logging failures instead of surfacing them
pub async fn save_logged<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> bool {
    match write_json(store, key, value).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Ignoring storage write failure: {}", e);
            false
        }
    }
}

/// Remove a key, logging failures instead of surfacing them
pub async fn remove_logged(store: &dyn KeyValueStore, key: &str) {
    if let Err(e) = store.remove(key).await {
        warn!("Ignoring storage remove failure: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let store = InMemoryStore::new();
        let value: Option<Vec<String>> = read_json(&store, "nothing").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_malformed_is_error_but_defaults() {
        let store = InMemoryStore::new();
        store.set("broken", "{not json".to_string()).await.unwrap();

        let result: Result<Option<Vec<String>>, _> = read_json(&store, "broken").await;
        assert!(matches!(result, Err(StoreError::Malformed { .. })));

        let fallback: Vec<String> = load_or_default(&store, "broken").await;
        assert!(fallback.is_empty());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let store = InMemoryStore::new();
        let mut map = HashMap::new();
        map.insert("a".to_string(), 1u32);
        assert!(save_logged(&store, "map", &map).await);

        let loaded: HashMap<String, u32> = load_or_default(&store, "map").await;
        assert_eq!(loaded.get("a"), Some(&1));
    }
}
