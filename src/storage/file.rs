//! File-backed store: one `<key>.json` document per key under a data directory

use std::path::PathBuf;
use tracing::debug;

use super::{KeyValueStore, StoreError};

pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at the given directory (created lazily on first write)
    pub fn with_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Create a store at the configured data directory
    pub fn from_config(config: &crate::config::Config) -> anyhow::Result<Self> {
        Ok(Self::with_dir(config.storage.resolve_dir()?))
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.base_dir.join(format!("{}.json", key)))
    }

    /// Get the base directory path
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }
}

fn io_error(key: &str, source: std::io::Error) -> StoreError {
    StoreError::Io { key: key.to_string(), source }
}

#[async_trait::async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.key_path(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key, e)),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let path = self.key_path(key)?;
        tokio::fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| io_error(key, e))?;

        // Readers never observe a partially written document
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await.map_err(|e| io_error(key, e))?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| io_error(key, e))?;
        debug!("Persisted {:?}", path);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.key_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{keys, load_or_default, save_logged};

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::with_dir(dir.path().join("state"));

        assert!(store.get(keys::PROGRESS).await.unwrap().is_none());
        store.set(keys::PROGRESS, "{}".to_string()).await.unwrap();
        assert_eq!(store.get(keys::PROGRESS).await.unwrap().as_deref(), Some("{}"));
        assert!(dir.path().join("state").join("progress.json").exists());

        store.remove(keys::PROGRESS).await.unwrap();
        assert!(store.get(keys::PROGRESS).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::with_dir(dir.path().to_path_buf());
        let result = store.set("../escape", "x".to_string()).await;
        assert!(matches!(result, Err(StoreError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_typed_helpers_over_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::with_dir(dir.path().to_path_buf());
        let ids = vec!["exp-1".to_string()];
        assert!(save_logged(&store, keys::COMPLETED_EXPERIMENT_IDS, &ids).await);

        let loaded: Vec<String> = load_or_default(&store, keys::COMPLETED_EXPERIMENT_IDS).await;
        assert_eq!(loaded, ids);
    }
}
