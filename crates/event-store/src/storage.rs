//! Key/value persistence for the event log
//!
//! Values are plain JSON documents addressed by the storage keys the capture
//! layer uses (`eventLog`, `sessionStats`, `currentSession`, `sessionStartTime`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::warn;

use crate::errors::{EsError, EsErrorKind, EsResult};

/// Storage backend for log state
#[async_trait]
pub trait LogStorage: Send + Sync {
    /// Fetch the value stored under `key`
    async fn get(&self, key: &str) -> EsResult<Option<Value>>;

    /// Store several keys as one batch. When the call errors no key of the
    /// batch is left with a new value, except where restoring a replaced key
    /// itself fails.
    async fn set_many(&self, values: Vec<(String, Value)>) -> EsResult<()>;

    /// Drop a key, succeeding when it is already absent
    async fn remove(&self, key: &str) -> EsResult<()>;

    /// Keys currently stored
    async fn keys(&self) -> EsResult<Vec<String>>;

    async fn set(&self, key: &str, value: Value) -> EsResult<()> {
        self.set_many(vec![(key.to_string(), value)]).await
    }
}

/// In-memory storage implementation
#[derive(Default)]
pub struct MemoryStorage {
    values: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LogStorage for MemoryStorage {
    async fn get(&self, key: &str) -> EsResult<Option<Value>> {
        let values = self.values.read().await;
        Ok(values.get(key).cloned())
    }

    async fn set_many(&self, entries: Vec<(String, Value)>) -> EsResult<()> {
        let mut values = self.values.write().await;
        values.extend(entries);
        Ok(())
    }

    async fn remove(&self, key: &str) -> EsResult<()> {
        let mut values = self.values.write().await;
        values.remove(key);
        Ok(())
    }

    async fn keys(&self) -> EsResult<Vec<String>> {
        let values = self.values.read().await;
        let mut keys: Vec<String> = values.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

/// File-based storage implementation, one `<key>.json` per key
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }

    fn tmp_path(&self, key: &str) -> PathBuf {
        self.key_path(key).with_extension("json.tmp")
    }

    /// Write every value to its temp file; nothing is replaced yet.
    async fn stage(&self, values: &[(String, Value)]) -> EsResult<()> {
        for (idx, (key, value)) in values.iter().enumerate() {
            let tmp = self.tmp_path(key);
            let written = match serde_json::to_vec_pretty(value) {
                Ok(json) => tokio::fs::write(&tmp, json)
                    .await
                    .map_err(|err| write_error(&tmp, err)),
                Err(err) => Err(EsError::new(EsErrorKind::Internal(err.to_string()))),
            };
            if let Err(err) = written {
                self.discard(&values[..idx]).await;
                return Err(err);
            }
        }
        Ok(())
    }

    async fn discard(&self, values: &[(String, Value)]) {
        for (key, _) in values {
            let _ = tokio::fs::remove_file(self.tmp_path(key)).await;
        }
    }

    /// Current on-disk bytes of `key`, `None` when absent
    async fn snapshot(&self, key: &str) -> EsResult<Option<Vec<u8>>> {
        let path = self.key_path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(EsError::new(EsErrorKind::StorageRead(format!(
                "{}: {}",
                path.display(),
                err
            )))),
        }
    }

    /// Put back the previous contents of keys already replaced by a batch.
    async fn restore(&self, committed: &[(&str, Option<Vec<u8>>)]) {
        for (key, previous) in committed {
            let path = self.key_path(key);
            let restored = match previous {
                Some(bytes) => tokio::fs::write(&path, bytes).await,
                None => tokio::fs::remove_file(&path).await,
            };
            if let Err(err) = restored {
                warn!(key = *key, error = %err, "failed to restore key after a partial batch");
            }
        }
    }
}

#[async_trait]
impl LogStorage for FileStorage {
    async fn get(&self, key: &str) -> EsResult<Option<Value>> {
        let path = self.key_path(key);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(EsError::new(EsErrorKind::StorageRead(format!(
                    "{}: {}",
                    path.display(),
                    err
                ))))
            }
        };
        serde_json::from_str(&raw).map(Some).map_err(|err| {
            EsError::new(EsErrorKind::Malformed {
                key: key.to_string(),
                reason: err.to_string(),
            })
        })
    }

    async fn set_many(&self, values: Vec<(String, Value)>) -> EsResult<()> {
        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|err| write_error(&self.base_path, err))?;
        let mut previous = Vec::with_capacity(values.len());
        for (key, _) in &values {
            previous.push(self.snapshot(key).await?);
        }
        self.stage(&values).await?;

        let mut committed: Vec<(&str, Option<Vec<u8>>)> = Vec::with_capacity(values.len());
        for (idx, ((key, _), before)) in values.iter().zip(previous).enumerate() {
            let path = self.key_path(key);
            if let Err(err) = tokio::fs::rename(self.tmp_path(key), &path).await {
                self.restore(&committed).await;
                self.discard(&values[idx..]).await;
                return Err(write_error(&path, err));
            }
            committed.push((key.as_str(), before));
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> EsResult<()> {
        match tokio::fs::remove_file(self.key_path(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(write_error(&self.key_path(key), err)),
        }
    }

    async fn keys(&self) -> EsResult<Vec<String>> {
        if !self.base_path.exists() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.base_path)
            .await
            .map_err(|err| EsError::new(EsErrorKind::StorageRead(err.to_string())))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| EsError::new(EsErrorKind::StorageRead(err.to_string())))?
        {
            let path = entry.path();
            if path.extension() == Some(std::ffi::OsStr::new("json")) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

fn write_error(path: &Path, err: std::io::Error) -> EsError {
    EsError::new(EsErrorKind::StorageWrite(format!(
        "{}: {}",
        path.display(),
        err
    )))
}

/// Storage manager that can switch between backends
pub struct StorageManager {
    backend: Arc<dyn LogStorage>,
}

impl StorageManager {
    /// Create with in-memory backend
    pub fn in_memory() -> Self {
        Self {
            backend: Arc::new(MemoryStorage::new()),
        }
    }

    /// Create with file backend
    pub fn file_based(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: Arc::new(FileStorage::new(path)),
        }
    }

    /// Get the storage backend
    pub fn backend(&self) -> Arc<dyn LogStorage> {
        self.backend.clone()
    }
}
