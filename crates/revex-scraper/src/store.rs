//! Durable session-state store.
//!
//! Extraction state lives in two well-known slots: [`STATE_KEY`] holds the
//! full session state of the page context, [`SUMMARY_KEY`] holds the
//! cross-context summary the coordinating side maintains. Values are plain
//! JSON so the slots stay readable and a schema change cannot brick a store.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::error::StoreError;

/// Slot key of the locally persisted full session state.
pub const STATE_KEY: &str = "extraction_state";

/// Slot key of the cross-context extraction summary.
pub const SUMMARY_KEY: &str = "extraction_summary";

/// Keyed JSON persistence for extraction state.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Value stored under `key`, `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Typed read of a stored slot.
///
/// # Errors
///
/// Returns [`StoreError::Serialize`] when the stored value does not match
/// the requested shape.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn StateStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Typed write of a stored slot.
///
/// # Errors
///
/// Returns [`StoreError::Serialize`] when `value` cannot be represented as
/// JSON.
pub async fn set_json<T: Serialize + Sync>(
    store: &dyn StateStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    store.set(key, serde_json::to_value(value)?).await
}

/// In-memory store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.slots.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.slots.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.slots.lock().await.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON document on disk.
///
/// The whole document is read and rewritten per operation. Writes land via
/// a sibling temp file and a rename, so a crash mid-write cannot leave a
/// truncated document behind.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing document.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn read_document(&self) -> Result<Map<String, Value>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(err) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source: err,
                })
            }
        };
        match serde_json::from_slice::<Value>(&bytes)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }

    async fn write_document(&self, document: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|err| StoreError::Io {
                        path: parent.to_path_buf(),
                        source: err,
                    })?;
            }
        }
        let staged = self.path.with_extension("tmp");
        let bytes = serde_json::to_vec_pretty(&Value::Object(document.clone()))?;
        tokio::fs::write(&staged, &bytes)
            .await
            .map_err(|err| StoreError::Io {
                path: staged.clone(),
                source: err,
            })?;
        tokio::fs::rename(&staged, &self.path)
            .await
            .map_err(|err| StoreError::Io {
                path: self.path.clone(),
                source: err,
            })
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;
        Ok(document.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;
        document.insert(key.to_string(), value);
        self.write_document(&document).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;
        if document.remove(key).is_some() {
            self.write_document(&document).await?;
        }
        Ok(())
    }
}
