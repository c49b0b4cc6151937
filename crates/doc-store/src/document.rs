use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use common::DocPath;

use crate::Result;

/// Monotonic revision of a stored document.
///
/// Every successful write increments the revision by one. Callers hand
/// the revision they observed back as a precondition to detect writes
/// that raced past them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Revision(i64);

impl Revision {
    /// Creates a revision from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// The revision a document carries right after creation.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the revision after one more write.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A document as read from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub path: DocPath,
    pub revision: Revision,
    pub updated_at: DateTime<Utc>,
    pub data: Value,
}

impl Document {
    /// Deserializes the document body into a typed value.
    pub fn to_typed<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// Outcome of a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteResult {
    pub revision: Revision,
    pub updated_at: DateTime<Utc>,
}

/// Guard attached to an update.
///
/// With an expected revision the write only succeeds if the document is
/// still at that revision; without one the write is unconditional (the
/// document must still exist).
#[derive(Debug, Clone, Copy, Default)]
pub struct Precondition {
    pub expected_revision: Option<Revision>,
}

impl Precondition {
    /// No revision check.
    pub fn none() -> Self {
        Self::default()
    }

    /// The document must still be at the given revision.
    pub fn revision(revision: Revision) -> Self {
        Self {
            expected_revision: Some(revision),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Collection;
    use uuid::Uuid;

    #[test]
    fn revision_increments() {
        let r = Revision::first();
        assert_eq!(r.as_i64(), 1);
        assert_eq!(r.next().as_i64(), 2);
        assert!(r < r.next());
    }

    #[test]
    fn document_to_typed() {
        #[derive(serde::Deserialize)]
        struct Body {
            name: String,
        }

        let doc = Document {
            path: DocPath::root(Collection::Venues, Uuid::new_v4()),
            revision: Revision::first(),
            updated_at: Utc::now(),
            data: serde_json::json!({"name": "Berghain"}),
        };

        let body: Body = doc.to_typed().unwrap();
        assert_eq!(body.name, "Berghain");
    }
}
