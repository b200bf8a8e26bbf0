//! File-backed document store.
//!
//! Each document lives in its own JSON file. Collections map to directories,
//! so `tools/<category>/urls/<id>` is stored at
//! `<root>/tools/<category>/urls/<id>.json`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{
    CollectionPath, DocPath, Document, DocumentStore, Precondition, Snapshot, WriteMode,
    apply_write,
};
use crate::error::StoreError;

/// On-disk envelope for a document.
#[derive(Debug, Serialize, Deserialize)]
struct StoredDocument {
    version: u64,
    data: Document,
}

/// Document store persisted as JSON files under a root directory.
pub struct JsonFileStore {
    /// Root directory for document storage.
    root: PathBuf,

    /// Serializes read-check-write sequences within this process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| StoreError::CreateDirectory(format!("{}: {e}", root.display())))?;

        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    fn document_path(&self, path: &DocPath) -> PathBuf {
        let mut file = self.root.clone();
        let segments = path.segments();
        if let Some((last, parents)) = segments.split_last() {
            for segment in parents {
                file.push(segment);
            }
            file.push(format!("{last}.json"));
        }
        file
    }

    fn collection_dir(&self, collection: &CollectionPath) -> PathBuf {
        let mut dir = self.root.clone();
        for segment in collection.segments() {
            dir.push(segment);
        }
        dir
    }

    async fn load_file(path: &Path) -> Result<Option<Snapshot>, StoreError> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Read(format!("{}: {e}", path.display()))),
        };

        let stored: StoredDocument = serde_json::from_str(&content)
            .map_err(|e| StoreError::Read(format!("{}: {e}", path.display())))?;
        Ok(Some(Snapshot {
            data: stored.data,
            version: stored.version,
        }))
    }

    async fn save_file(path: &Path, snapshot: &Snapshot) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::CreateDirectory(format!("{}: {e}", parent.display())))?;
        }

        let stored = StoredDocument {
            version: snapshot.version,
            data: snapshot.data.clone(),
        };
        let content = serde_json::to_string_pretty(&stored)
            .map_err(|e| StoreError::Write(format!("{}: {e}", path.display())))?;

        // Write atomically
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &content)
            .await
            .map_err(|e| StoreError::Write(format!("{}: {e}", temp_path.display())))?;

        fs::rename(&temp_path, path)
            .await
            .map_err(|e| StoreError::Write(format!("{}: {e}", path.display())))?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn read(&self, path: &DocPath) -> Result<Option<Snapshot>, StoreError> {
        Self::load_file(&self.document_path(path)).await
    }

    async fn write(
        &self,
        path: &DocPath,
        document: Document,
        mode: WriteMode,
        precondition: Precondition,
    ) -> Result<u64, StoreError> {
        let _guard = self.write_lock.lock().await;
        let file = self.document_path(path);
        let existing = Self::load_file(&file).await?;
        let snapshot = apply_write(path, existing.as_ref(), document, mode, precondition)?;
        Self::save_file(&file, &snapshot).await?;

        debug!("Saved {path} at version {}", snapshot.version);
        Ok(snapshot.version)
    }

    async fn list(&self, collection: &CollectionPath) -> Result<Vec<(String, Snapshot)>, StoreError> {
        let dir = self.collection_dir(collection);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Read(format!("{}: {e}", dir.display()))),
        };

        let mut documents = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::Read(format!("{}: {e}", dir.display())))?
        {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };

            match Self::load_file(&path).await {
                Ok(Some(snapshot)) => documents.push((id, snapshot)),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable document {}: {e}", path.display()),
            }
        }

        documents.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(documents)
    }
}
