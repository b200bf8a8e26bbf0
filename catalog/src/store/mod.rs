//! Document store abstraction.
//!
//! All persistence goes through [`DocumentStore`], a narrow interface over a
//! hosted document database: whole-document reads, whole-document writes
//! (replace or merge), and collection listings. Every document carries a
//! version number so callers can opt into optimistic concurrency with
//! [`Precondition::Version`].

mod file;
mod memory;

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{CatalogError, Result, StoreError};

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// A stored record: a JSON object.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// A document as read from the store, with its current version.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// The document body.
    pub data: Document,

    /// Version of the document; starts at 1 and increases on every write.
    pub version: u64,
}

/// How a write combines with the existing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the whole document.
    Replace,
    /// Deep-merge nested objects; any other value overwrites.
    Merge,
}

/// Condition the store checks before applying a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Apply unconditionally (last writer wins).
    None,
    /// Apply only if the document is still at this version (0 = absent).
    Version(u64),
}

/// Path to a single document, e.g. `tools/<category>/urls/<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath {
    segments: Vec<String>,
}

/// Path to a collection of documents, e.g. `tools/<category>/urls`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath {
    segments: Vec<String>,
}

fn check_segment(segment: &str) -> std::result::Result<(), StoreError> {
    if segment.is_empty() || segment == "." || segment == ".." || segment.contains('/') {
        return Err(StoreError::InvalidPath(format!("bad segment {segment:?}")));
    }
    Ok(())
}

impl CollectionPath {
    /// A top-level collection.
    pub fn root(name: &str) -> std::result::Result<Self, StoreError> {
        check_segment(name)?;
        Ok(Self {
            segments: vec![name.to_string()],
        })
    }

    /// The document with the given id inside this collection.
    pub fn doc(&self, id: &str) -> std::result::Result<DocPath, StoreError> {
        check_segment(id)?;
        let mut segments = self.segments.clone();
        segments.push(id.to_string());
        Ok(DocPath { segments })
    }

    /// Path segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl DocPath {
    /// Category document holding a `urls` subcollection of tools.
    pub fn category(category: &str) -> std::result::Result<Self, StoreError> {
        CollectionPath::root("tools")?.doc(category)
    }

    /// Tool score record.
    pub fn tool(category: &str, id: &str) -> std::result::Result<Self, StoreError> {
        Self::category(category)?.collection("urls")?.doc(id)
    }

    /// User profile record.
    pub fn user(uid: &str) -> std::result::Result<Self, StoreError> {
        CollectionPath::root("users")?.doc(uid)
    }

    /// A subcollection nested under this document.
    pub fn collection(&self, name: &str) -> std::result::Result<CollectionPath, StoreError> {
        check_segment(name)?;
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(CollectionPath { segments })
    }

    /// Last segment: the document id.
    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Path segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// Interface to the external document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document, or `None` if it does not exist.
    async fn read(&self, path: &DocPath) -> std::result::Result<Option<Snapshot>, StoreError>;

    /// Write a document and return its new version.
    async fn write(
        &self,
        path: &DocPath,
        document: Document,
        mode: WriteMode,
        precondition: Precondition,
    ) -> std::result::Result<u64, StoreError>;

    /// List every document directly inside a collection, ordered by id.
    async fn list(
        &self,
        collection: &CollectionPath,
    ) -> std::result::Result<Vec<(String, Snapshot)>, StoreError>;

    /// List the documents of a subcollection under `parent`.
    async fn read_subcollection(
        &self,
        parent: &DocPath,
        name: &str,
    ) -> std::result::Result<Vec<(String, Snapshot)>, StoreError> {
        let collection = parent.collection(name)?;
        self.list(&collection).await
    }
}

/// Deep-merge `patch` into `target`.
pub fn merge_documents(target: &mut Document, patch: Document) {
    for (key, value) in patch {
        match (target.get_mut(&key), value) {
            (Some(serde_json::Value::Object(existing)), serde_json::Value::Object(incoming)) => {
                merge_documents(existing, incoming);
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

/// Compute the document a write produces, enforcing the precondition.
pub(crate) fn apply_write(
    path: &DocPath,
    existing: Option<&Snapshot>,
    document: Document,
    mode: WriteMode,
    precondition: Precondition,
) -> std::result::Result<Snapshot, StoreError> {
    let current_version = existing.map_or(0, |s| s.version);
    if let Precondition::Version(expected) = precondition {
        if expected != current_version {
            return Err(StoreError::Conflict {
                path: path.to_string(),
                expected,
                actual: current_version,
            });
        }
    }

    let data = match (mode, existing) {
        (WriteMode::Merge, Some(snapshot)) => {
            let mut data = snapshot.data.clone();
            merge_documents(&mut data, document);
            data
        }
        _ => document,
    };

    Ok(Snapshot {
        data,
        version: current_version + 1,
    })
}

/// Serialize a record into a store document.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(CatalogError::InvalidRecord(format!(
            "expected an object, got {other}"
        ))),
    }
}

/// Deserialize a store document into a record.
pub fn from_document<T: DeserializeOwned>(document: Document) -> Result<T> {
    Ok(serde_json::from_value(serde_json::Value::Object(document))?)
}
