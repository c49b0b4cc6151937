use serde_json::Value;

use common::{Collection, DocPath};

/// Comparison applied by a query filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Lt,
    Gt,
}

/// A single field filter.
///
/// `Lt` and `Gt` compare the field's text form. RFC 3339 timestamps
/// order correctly under this comparison as long as both sides carry
/// the same sub-second precision; mixed precision can misorder values
/// that fall within the same second, so timestamp cutoffs must be
/// coarse relative to one second.
#[derive(Debug, Clone)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

/// Query for documents in a collection.
///
/// Use the builder-style methods to construct queries:
///
/// ```
/// use doc_store::{DocQuery, FilterOp};
/// use common::Collection;
///
/// let query = DocQuery::collection(Collection::Reservations)
///     .filter("eligible_for_timeout", FilterOp::Eq, serde_json::json!(true))
///     .limit(100);
/// ```
#[derive(Debug, Clone)]
pub struct DocQuery {
    /// Collection the documents belong to.
    pub collection: Collection,
    /// Restricts results to documents nested under this parent.
    pub parent: Option<DocPath>,
    /// Field filters, all of which must match.
    pub filters: Vec<Filter>,
    /// Maximum number of documents to return.
    pub limit: Option<usize>,
}

impl DocQuery {
    /// Creates a query over a collection.
    pub fn collection(collection: Collection) -> Self {
        Self {
            collection,
            parent: None,
            filters: Vec::new(),
            limit: None,
        }
    }

    /// Restricts results to documents directly under the given parent.
    pub fn under(mut self, parent: DocPath) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Adds a field filter.
    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: Value) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value,
        });
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Text form used for ordered comparisons, matching the `->>` operator
/// of the PostgreSQL implementation.
pub(crate) fn text_form(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
