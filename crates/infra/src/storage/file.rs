//! File-backed key-value store
//!
//! All keys live in one JSON object on disk. Every write replaces the whole
//! document atomically: the new content goes to a sibling temp file, is
//! flushed with `sync_all`, then renamed over the original.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use friendsync_core::{KeyValueStore, Result};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::errors::{InfraError, InfraResult};

type Document = BTreeMap<String, String>;

/// Key-value store persisted as a single JSON document
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileKeyValueStore {
    /// Create a store at `path`; the file is created on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn read_document(&self) -> InfraResult<Document> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(Document::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Document::new()),
            Err(e) => Err(InfraError::io(&self.path, e)),
        }
    }

    /// Read the document for a read-modify-write cycle
    ///
    /// An unparseable document is replaced rather than blocking all writes.
    async fn read_document_for_update(&self) -> InfraResult<Document> {
        match self.read_document().await {
            Err(InfraError::Serialization(error)) => {
                warn!(path = %self.path.display(), error = %error, "kv_document_corrupt_replacing");
                Ok(Document::new())
            }
            other => other,
        }
    }

    async fn write_document(&self, document: &Document) -> InfraResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| InfraError::io(parent, e))?;
        }

        let json = serde_json::to_vec_pretty(document)?;
        let temp = self.temp_path();

        let mut file = tokio::fs::File::create(&temp).await.map_err(|e| InfraError::io(&temp, e))?;
        file.write_all(&json).await.map_err(|e| InfraError::io(&temp, e))?;
        file.sync_all().await.map_err(|e| InfraError::io(&temp, e))?;
        drop(file);

        tokio::fs::rename(&temp, &self.path).await.map_err(|e| InfraError::io(&self.path, e))?;
        debug!(path = %self.path.display(), keys = document.len(), "kv_document_written");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let document = self.read_document().await?;
        Ok(document.get(key).cloned())
    }

    #[instrument(skip(self, value), fields(path = %self.path.display(), bytes = value.len()))]
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _write = self.write_lock.lock().await;
        let mut document = self.read_document_for_update().await?;
        document.insert(key.to_string(), value.to_string());
        self.write_document(&document).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _write = self.write_lock.lock().await;
        let mut document = self.read_document_for_update().await?;
        if document.remove(key).is_some() {
            self.write_document(&document).await?;
        }
        Ok(())
    }
}
