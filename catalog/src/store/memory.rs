//! In-memory document store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{
    CollectionPath, DocPath, Document, DocumentStore, Precondition, Snapshot, WriteMode,
    apply_write,
};
use crate::error::StoreError;

/// Document store kept entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<DocPath, Snapshot>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Whether the store holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self, path: &DocPath) -> Result<Option<Snapshot>, StoreError> {
        Ok(self.documents.read().await.get(path).cloned())
    }

    async fn write(
        &self,
        path: &DocPath,
        document: Document,
        mode: WriteMode,
        precondition: Precondition,
    ) -> Result<u64, StoreError> {
        let mut documents = self.documents.write().await;
        let snapshot = apply_write(path, documents.get(path), document, mode, precondition)?;
        let version = snapshot.version;
        documents.insert(path.clone(), snapshot);
        debug!("Wrote {path} at version {version}");
        Ok(version)
    }

    async fn list(&self, collection: &CollectionPath) -> Result<Vec<(String, Snapshot)>, StoreError> {
        let prefix = collection.segments();
        let documents = self.documents.read().await;
        let mut entries: Vec<(String, Snapshot)> = documents
            .iter()
            .filter(|(path, _)| {
                let segments = path.segments();
                segments.len() == prefix.len() + 1 && segments.starts_with(prefix)
            })
            .map(|(path, snapshot)| (path.id().to_string(), snapshot.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }
}
