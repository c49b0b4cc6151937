use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use common::DocPath;

use crate::{
    DocQuery, DocStoreError, Document, Filter, FilterOp, Precondition, Result, Revision,
    WriteResult,
    store::{BatchOp, DocumentStore},
};

/// In-memory document store implementation for testing.
///
/// This implementation stores all documents in memory and provides
/// the same interface as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryDocStore {
    docs: Arc<RwLock<HashMap<String, Document>>>,
}

impl InMemoryDocStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of documents stored.
    pub async fn document_count(&self) -> usize {
        self.docs.read().await.len()
    }

    /// Clears all documents.
    pub async fn clear(&self) {
        self.docs.write().await.clear();
    }

    fn matches(doc: &Document, query: &DocQuery) -> bool {
        if doc.path.collection() != query.collection {
            return false;
        }
        if let Some(ref parent) = query.parent
            && doc.path.parent().as_ref() != Some(parent)
        {
            return false;
        }
        query.filters.iter().all(|f| Self::filter_matches(&doc.data, f))
    }

    fn filter_matches(data: &Value, filter: &Filter) -> bool {
        let Some(field) = data.get(&filter.field) else {
            return false;
        };
        match filter.op {
            FilterOp::Eq => field == &filter.value,
            FilterOp::Lt | FilterOp::Gt => {
                let (Some(lhs), Some(rhs)) = (
                    crate::query::text_form(field),
                    crate::query::text_form(&filter.value),
                ) else {
                    return false;
                };
                match filter.op {
                    FilterOp::Lt => lhs < rhs,
                    FilterOp::Gt => lhs > rhs,
                    FilterOp::Eq => unreachable!(),
                }
            }
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>> {
        let docs = self.docs.read().await;
        Ok(docs.get(&path.resolve()).cloned())
    }

    async fn create(&self, path: &DocPath, data: Value) -> Result<WriteResult> {
        let mut docs = self.docs.write().await;
        let key = path.resolve();
        if docs.contains_key(&key) {
            return Err(DocStoreError::AlreadyExists(path.clone()));
        }
        let doc = Document {
            path: path.clone(),
            revision: Revision::first(),
            updated_at: Utc::now(),
            data,
        };
        let result = WriteResult {
            revision: doc.revision,
            updated_at: doc.updated_at,
        };
        docs.insert(key, doc);
        Ok(result)
    }

    async fn update(
        &self,
        path: &DocPath,
        data: Value,
        precondition: Precondition,
    ) -> Result<WriteResult> {
        let mut docs = self.docs.write().await;
        let key = path.resolve();
        let doc = docs
            .get_mut(&key)
            .ok_or_else(|| DocStoreError::NotFound(path.clone()))?;

        if let Some(expected) = precondition.expected_revision
            && doc.revision != expected
        {
            return Err(DocStoreError::ConcurrencyConflict {
                path: path.clone(),
                expected,
                actual: doc.revision,
            });
        }

        doc.revision = doc.revision.next();
        doc.updated_at = Utc::now();
        doc.data = data;
        Ok(WriteResult {
            revision: doc.revision,
            updated_at: doc.updated_at,
        })
    }

    async fn query(&self, query: DocQuery) -> Result<Vec<Document>> {
        let docs = self.docs.read().await;
        let mut results: Vec<_> = docs
            .values()
            .filter(|doc| Self::matches(doc, &query))
            .cloned()
            .collect();

        // Deterministic order for tests and pagination
        results.sort_by_key(|doc| doc.path.resolve());

        if let Some(limit) = query.limit {
            results.truncate(limit);
        }
        Ok(results)
    }

    async fn commit(&self, batch: Vec<BatchOp>) -> Result<Vec<WriteResult>> {
        let mut docs = self.docs.write().await;

        // Validate every precondition before touching anything
        for op in &batch {
            let key = op.path.resolve();
            let doc = docs
                .get(&key)
                .ok_or_else(|| DocStoreError::NotFound(op.path.clone()))?;
            if let Some(expected) = op.precondition.expected_revision
                && doc.revision != expected
            {
                return Err(DocStoreError::ConcurrencyConflict {
                    path: op.path.clone(),
                    expected,
                    actual: doc.revision,
                });
            }
        }

        let now = Utc::now();
        let mut results = Vec::with_capacity(batch.len());
        for op in batch {
            let doc = docs
                .get_mut(&op.path.resolve())
                .ok_or_else(|| DocStoreError::NotFound(op.path.clone()))?;
            doc.revision = doc.revision.next();
            doc.updated_at = now;
            doc.data = op.data;
            results.push(WriteResult {
                revision: doc.revision,
                updated_at: doc.updated_at,
            });
        }
        Ok(results)
    }
}
