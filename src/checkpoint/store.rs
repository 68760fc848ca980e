//! File-backed checkpoint store
//!
//! Provides JSON file persistence with atomic writes.

use super::CheckpointStore;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Checkpoint store persisting a `{input: millis}` map to a JSON file
#[derive(Debug)]
pub struct FileCheckpointStore {
    /// Path to the checkpoint file
    path: PathBuf,
    /// Current checkpoints (cached)
    checkpoints: Arc<RwLock<HashMap<String, i64>>>,
    /// Whether to save on every update
    auto_save: bool,
}

impl FileCheckpointStore {
    /// Create a new checkpoint store with the given path
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            checkpoints: Arc::new(RwLock::new(HashMap::new())),
            auto_save: true,
        }
    }

    /// Create an in-memory checkpoint store (no file persistence)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            checkpoints: Arc::new(RwLock::new(HashMap::new())),
            auto_save: false,
        }
    }

    /// Create a checkpoint store from a file, loading existing state if present
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let checkpoints = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::checkpoint(format!("Failed to read checkpoint file: {e}")))?;
            serde_json::from_str(&contents)
                .map_err(|e| Error::checkpoint(format!("Failed to parse checkpoint file: {e}")))?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            checkpoints: Arc::new(RwLock::new(checkpoints)),
            auto_save: true,
        })
    }

    /// Save current checkpoints to file
    pub async fn save(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Ok(()); // In-memory mode
        }

        let checkpoints = self.checkpoints.read().await;
        let contents = serde_json::to_string_pretty(&*checkpoints)
            .map_err(|e| Error::checkpoint(format!("Failed to serialize checkpoints: {e}")))?;

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::checkpoint(format!("Failed to write checkpoint file: {e}")))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::checkpoint(format!("Failed to rename checkpoint file: {e}")))?;

        Ok(())
    }

    /// Get the checkpoint file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn get(&self, input: &str) -> Result<Option<i64>> {
        let checkpoints = self.checkpoints.read().await;
        Ok(checkpoints.get(input).copied())
    }

    async fn set(&self, input: &str, value: i64) -> Result<()> {
        {
            let mut checkpoints = self.checkpoints.write().await;
            checkpoints.insert(input.to_string(), value);
        }

        if self.auto_save {
            self.save().await?;
        }

        Ok(())
    }

    async fn delete(&self, input: &str) -> Result<()> {
        {
            let mut checkpoints = self.checkpoints.write().await;
            checkpoints.remove(input);
        }

        if self.auto_save {
            self.save().await?;
        }

        Ok(())
    }
}

impl Clone for FileCheckpointStore {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            checkpoints: Arc::clone(&self.checkpoints),
            auto_save: self.auto_save,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_in_memory_roundtrip() {
        let store = FileCheckpointStore::in_memory();
        assert!(store.is_in_memory());

        assert_eq!(store.get("prod-bugs").await.unwrap(), None);
        store.set("prod-bugs", 1_700_000_000_000).await.unwrap();
        assert_eq!(
            store.get("prod-bugs").await.unwrap(),
            Some(1_700_000_000_000)
        );

        store.delete("prod-bugs").await.unwrap();
        assert_eq!(store.get("prod-bugs").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_inputs_are_independent() {
        let store = FileCheckpointStore::in_memory();
        store.set("a", 1).await.unwrap();
        store.set("b", 2).await.unwrap();

        store.delete("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
        assert_eq!(store.get("b").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_file_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoints.json");

        let store = FileCheckpointStore::from_file(&path).unwrap();
        store.set("prod-bugs", 42).await.unwrap();

        // A fresh store reads back what the first one persisted
        let reloaded = FileCheckpointStore::from_file(&path).unwrap();
        assert_eq!(reloaded.get("prod-bugs").await.unwrap(), Some(42));
    }

    #[tokio::test]
    async fn test_from_file_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoints.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(FileCheckpointStore::from_file(&path).is_err());
    }
}
