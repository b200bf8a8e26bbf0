//! Error types for the catalog.

use thiserror::Error;

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors that can occur while voting, curating workbenches or listing tools.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// No signed-in user was supplied.
    #[error("user not authenticated")]
    Unauthenticated,

    /// A referenced tool, user or workbench record is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// The tool is already saved in the target workbench.
    #[error("tool {tool_id} already exists in workbench {workbench}")]
    DuplicateTool { workbench: String, tool_id: String },

    /// No workbench name could be resolved.
    #[error("workbench name is required")]
    NameRequired,

    /// The underlying document store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A stored record could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A record is well-formed JSON but violates the data model.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl CatalogError {
    /// Whether this error came from the store rather than from a rule.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

/// Document store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to create a storage directory.
    #[error("failed to create directory: {0}")]
    CreateDirectory(String),

    /// Failed to read a document.
    #[error("failed to read document: {0}")]
    Read(String),

    /// Failed to write a document.
    #[error("failed to write document: {0}")]
    Write(String),

    /// The document changed since it was read.
    #[error("version conflict on {path}: expected {expected}, found {actual}")]
    Conflict {
        path: String,
        expected: u64,
        actual: u64,
    },

    /// The document path is malformed.
    #[error("invalid document path: {0}")]
    InvalidPath(String),
}
