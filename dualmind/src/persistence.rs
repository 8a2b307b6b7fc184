//! Persistence ports for the baseline bias and vault contents.
//!
//! The core never talks to storage directly. Callers inject a [`BiasStore`]
//! and a [`MemoryStorage`]; failures surface as warnings and never abort a
//! turn.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use crate::types::CurrentBias;
use crate::vault::MemoryItem;

/// Errors from a persistence backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PersistenceError {
    /// Filesystem or backend I/O failure
    #[error("I/O error: {0}")]
    Io(String),

    /// Stored data could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Backend refused the operation
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<std::io::Error> for PersistenceError {
    fn from(e: std::io::Error) -> Self {
        PersistenceError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        PersistenceError::Serialization(e.to_string())
    }
}

/// Durable home of the baseline bias.
#[async_trait]
pub trait BiasStore: Send + Sync {
    /// Load the persisted bias, `None` when nothing was saved yet.
    async fn load(&self) -> Result<Option<CurrentBias>, PersistenceError>;

    /// Persist the bias.
    async fn save(&self, bias: CurrentBias) -> Result<(), PersistenceError>;
}

/// Durable home of vault contents.
#[async_trait]
pub trait MemoryStorage: Send + Sync {
    /// Load every persisted memory.
    async fn load_all(&self) -> Result<Vec<MemoryItem>, PersistenceError>;

    /// Replace persisted memories with `items`.
    async fn save_all(&self, items: &[MemoryItem]) -> Result<(), PersistenceError>;
}

/// In-process store, mainly for tests and embedding without durability.
#[derive(Default)]
pub struct InMemoryStore {
    bias: RwLock<Option<CurrentBias>>,
    memories: RwLock<Vec<MemoryItem>>,
    failing: AtomicBool,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a bias.
    pub fn with_bias(bias: CurrentBias) -> Self {
        Self {
            bias: RwLock::new(Some(bias)),
            ..Self::default()
        }
    }

    /// Make every subsequent operation fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Last saved bias.
    pub async fn saved_bias(&self) -> Option<CurrentBias> {
        *self.bias.read().await
    }

    /// Number of saved memories.
    pub async fn saved_memory_count(&self) -> usize {
        self.memories.read().await.len()
    }

    fn check(&self) -> Result<(), PersistenceError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(PersistenceError::Unavailable("in-memory store set to fail".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BiasStore for InMemoryStore {
    async fn load(&self) -> Result<Option<CurrentBias>, PersistenceError> {
        self.check()?;
        Ok(*self.bias.read().await)
    }

    async fn save(&self, bias: CurrentBias) -> Result<(), PersistenceError> {
        self.check()?;
        *self.bias.write().await = Some(bias);
        Ok(())
    }
}

#[async_trait]
impl MemoryStorage for InMemoryStore {
    async fn load_all(&self) -> Result<Vec<MemoryItem>, PersistenceError> {
        self.check()?;
        Ok(self.memories.read().await.clone())
    }

    async fn save_all(&self, items: &[MemoryItem]) -> Result<(), PersistenceError> {
        self.check()?;
        *self.memories.write().await = items.to_vec();
        Ok(())
    }
}

/// On-disk form of the bias. Kept raw so invalid files are detected on load.
#[derive(Debug, Serialize, Deserialize)]
struct StoredBias {
    valon: f64,
    modi: f64,
}

/// JSON files in a directory: `bias.json` and `memories.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    const BIAS_FILE: &'static str = "bias.json";
    const MEMORIES_FILE: &'static str = "memories.json";

    /// Store files under `dir` (created on first save).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        match tokio::fs::read(self.dir.join(name)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write through a temp file so a crash never leaves a torn file.
    async fn write(&self, name: &str, bytes: Vec<u8>) -> Result<(), PersistenceError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let target = self.dir.join(name);
        let staging = self.dir.join(format!("{name}.tmp"));
        tokio::fs::write(&staging, bytes).await?;
        tokio::fs::rename(&staging, &target).await?;
        debug!(path = %target.display(), "Persisted file");
        Ok(())
    }
}

#[async_trait]
impl BiasStore for JsonFileStore {
    async fn load(&self) -> Result<Option<CurrentBias>, PersistenceError> {
        let Some(bytes) = self.read(Self::BIAS_FILE).await? else {
            return Ok(None);
        };
        let stored: StoredBias = serde_json::from_slice(&bytes)?;
        CurrentBias::normalized(stored.valon, stored.modi)
            .map(Some)
            .ok_or_else(|| {
                PersistenceError::Serialization(format!(
                    "invalid stored bias {}/{}",
                    stored.valon, stored.modi
                ))
            })
    }

    async fn save(&self, bias: CurrentBias) -> Result<(), PersistenceError> {
        let stored = StoredBias {
            valon: bias.valon,
            modi: bias.modi,
        };
        self.write(Self::BIAS_FILE, serde_json::to_vec_pretty(&stored)?)
            .await
    }
}

#[async_trait]
impl MemoryStorage for JsonFileStore {
    async fn load_all(&self) -> Result<Vec<MemoryItem>, PersistenceError> {
        match self.read(Self::MEMORIES_FILE).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save_all(&self, items: &[MemoryItem]) -> Result<(), PersistenceError> {
        self.write(Self::MEMORIES_FILE, serde_json::to_vec(items)?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::MemoryType;

    #[tokio::test]
    async fn test_in_memory_bias_roundtrip() {
        let store = InMemoryStore::new();
        assert_eq!(store.load().await.unwrap(), None);

        store.save(CurrentBias::NEUTRAL).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(CurrentBias::NEUTRAL));
    }

    #[tokio::test]
    async fn test_in_memory_failure_toggle() {
        let store = InMemoryStore::new();
        store.set_failing(true);

        assert!(matches!(
            store.save(CurrentBias::DEFAULT).await,
            Err(PersistenceError::Unavailable(_))
        ));
        assert!(store.load_all().await.is_err());

        store.set_failing(false);
        assert!(store.save(CurrentBias::DEFAULT).await.is_ok());
    }

    #[tokio::test]
    async fn test_json_store_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state"));

        assert_eq!(store.load().await.unwrap(), None);
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_json_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        store.save(CurrentBias::NEUTRAL).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(CurrentBias::NEUTRAL));

        let items = vec![
            MemoryItem::new("first", MemoryType::Synthesis).with_associations(["a"]),
            MemoryItem::new("second", MemoryType::Emotional).with_emotion(0.7, "hope"),
        ];
        store.save_all(&items).await.unwrap();
        assert_eq!(store.load_all().await.unwrap(), items);
    }

    #[tokio::test]
    async fn test_json_store_rejects_invalid_bias() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bias.json"), r#"{"valon":-1.0,"modi":0.5}"#).unwrap();
        let store = JsonFileStore::new(dir.path());

        assert!(matches!(
            store.load().await,
            Err(PersistenceError::Serialization(_))
        ));

        std::fs::write(dir.path().join("bias.json"), "not json").unwrap();
        assert!(store.load().await.is_err());
    }
}
