use async_trait::async_trait;
use serde_json::Value;

use common::DocPath;

use crate::{DocQuery, Document, Precondition, Result, WriteResult};

/// One guarded update inside an atomic batch.
///
/// The target document must exist; if the precondition carries an
/// expected revision the document must still be at it.
#[derive(Debug, Clone)]
pub struct BatchOp {
    pub path: DocPath,
    pub data: Value,
    pub precondition: Precondition,
}

impl BatchOp {
    pub fn update(path: DocPath, data: Value, precondition: Precondition) -> Self {
        Self {
            path,
            data,
            precondition,
        }
    }
}

/// Core trait for document store implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads a document. Returns None if it does not exist.
    async fn get(&self, path: &DocPath) -> Result<Option<Document>>;

    /// Creates a document at a path that must not already hold one.
    ///
    /// Fails with `AlreadyExists` otherwise.
    async fn create(&self, path: &DocPath, data: Value) -> Result<WriteResult>;

    /// Replaces a document's body, guarded by the precondition.
    ///
    /// Fails with `NotFound` if the document does not exist and with
    /// `ConcurrencyConflict` if an expected revision no longer matches.
    async fn update(
        &self,
        path: &DocPath,
        data: Value,
        precondition: Precondition,
    ) -> Result<WriteResult>;

    /// Retrieves documents matching a query.
    async fn query(&self, query: DocQuery) -> Result<Vec<Document>>;

    /// Applies a batch of guarded updates atomically.
    ///
    /// Either every operation succeeds or none is applied. Results are
    /// returned in operation order.
    async fn commit(&self, batch: Vec<BatchOp>) -> Result<Vec<WriteResult>>;
}

/// Extension trait providing convenience methods for document stores.
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Reads a document, failing with `NotFound` if it is absent.
    async fn get_required(&self, path: &DocPath) -> Result<Document> {
        self.get(path)
            .await?
            .ok_or_else(|| crate::DocStoreError::NotFound(path.clone()))
    }

    /// Checks whether a document exists.
    async fn exists(&self, path: &DocPath) -> Result<bool> {
        Ok(self.get(path).await?.is_some())
    }
}

// Blanket implementation for all DocumentStore implementations
impl<T: DocumentStore + ?Sized> DocumentStoreExt for T {}
