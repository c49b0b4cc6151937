use thiserror::Error;

use common::DocPath;

use crate::document::Revision;

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum DocStoreError {
    /// A guarded write found the document at a different revision than
    /// the caller observed.
    #[error("Concurrency conflict for document {path}: expected revision {expected}, found {actual}")]
    ConcurrencyConflict {
        path: DocPath,
        expected: Revision,
        actual: Revision,
    },

    /// The document does not exist.
    #[error("Document not found: {0}")]
    NotFound(DocPath),

    /// A create targeted a path that already holds a document.
    #[error("Document already exists: {0}")]
    AlreadyExists(DocPath),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored path could not be parsed back into a typed path.
    #[error("Corrupt document path: {0}")]
    Path(#[from] common::PathParseError),
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, DocStoreError>;
