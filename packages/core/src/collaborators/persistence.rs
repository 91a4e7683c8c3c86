//! Persistence collaborator
//!
//! The engine reads and writes scene text through [`DocumentStore`]; both
//! calls are suspension points that either succeed or raise a
//! [`PersistenceError`]. Parsing is the engine's job, not the store's.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tokio::fs;

/// Storage failures surfaced as hard operation failures
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Document not found: {path}")]
    NotFound { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PersistenceError {
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist serialized scene text at `path`
    async fn save_document(&self, path: &Path, text: &str) -> Result<(), PersistenceError>;

    /// Read serialized scene text from `path`
    async fn read_document(&self, path: &Path) -> Result<String, PersistenceError>;
}

/// Filesystem-backed store using tokio's async file API
#[derive(Debug, Clone, Default)]
pub struct FileDocumentStore;

impl FileDocumentStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn save_document(&self, path: &Path, text: &str) -> Result<(), PersistenceError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        // Atomic write: write to temp file, then rename
        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_file = PathBuf::from(temp_name);

        fs::write(&temp_file, text).await?;
        fs::rename(&temp_file, path).await?;

        tracing::debug!("Saved document to {}", path.display());
        Ok(())
    }

    async fn read_document(&self, path: &Path) -> Result<String, PersistenceError> {
        match fs::read_to_string(path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PersistenceError::not_found(path))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tooling and tests
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    files: Mutex<HashMap<PathBuf, String>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.lock().insert(path.into(), text.into());
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        self.lock().get(path).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, String>> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn save_document(&self, path: &Path, text: &str) -> Result<(), PersistenceError> {
        self.insert(path, text);
        Ok(())
    }

    async fn read_document(&self, path: &Path) -> Result<String, PersistenceError> {
        self.get(path)
            .ok_or_else(|| PersistenceError::not_found(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("scenes").join("level.json");
        let store = FileDocumentStore::new();

        store.save_document(&path, "{\"name\":\"x\"}").await.unwrap();
        let text = store.read_document(&path).await.unwrap();

        assert_eq!(text, "{\"name\":\"x\"}");
        assert!(!temp_dir.path().join("scenes").join("level.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_file_store_missing_document() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileDocumentStore::new();

        let result = store.read_document(&temp_dir.path().join("nope.json")).await;
        assert!(matches!(result, Err(PersistenceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryDocumentStore::new();
        let path = Path::new("/virtual/a.json");

        assert!(store.read_document(path).await.is_err());
        store.save_document(path, "text").await.unwrap();
        assert_eq!(store.read_document(path).await.unwrap(), "text");
    }
}
