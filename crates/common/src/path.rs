//! Typed hierarchical document paths.
//!
//! Nested references (venue/wardrobe/section/hanger) are modelled as an
//! ordered list of typed segments with a single resolution function,
//! instead of string concatenation at every call site.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// The document collections the system stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Venues,
    Wardrobes,
    Sections,
    Hangers,
    Reservations,
    Users,
}

impl Collection {
    /// Returns the collection name as stored in document paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Venues => "venues",
            Collection::Wardrobes => "wardrobes",
            Collection::Sections => "sections",
            Collection::Hangers => "hangers",
            Collection::Reservations => "reservations",
            Collection::Users => "users",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "venues" => Some(Collection::Venues),
            "wardrobes" => Some(Collection::Wardrobes),
            "sections" => Some(Collection::Sections),
            "hangers" => Some(Collection::Hangers),
            "reservations" => Some(Collection::Reservations),
            "users" => Some(Collection::Users),
            _ => None,
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One `collection/id` step of a document path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathSegment {
    pub collection: Collection,
    pub id: Uuid,
}

/// A typed, ordered document path such as
/// `venues/{v}/wardrobes/{w}/sections/{s}/hangers/{h}`.
///
/// Always non-empty. The leaf segment names the document; ancestors name
/// the collections it is nested under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocPath {
    segments: Vec<PathSegment>,
}

impl DocPath {
    /// Creates a path rooted at a top-level collection.
    pub fn root(collection: Collection, id: impl Into<Uuid>) -> Self {
        Self {
            segments: vec![PathSegment {
                collection,
                id: id.into(),
            }],
        }
    }

    /// Appends a nested segment and returns the extended path.
    pub fn child(mut self, collection: Collection, id: impl Into<Uuid>) -> Self {
        self.segments.push(PathSegment {
            collection,
            id: id.into(),
        });
        self
    }

    /// Returns the ordered segments.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns the collection of the leaf document.
    pub fn collection(&self) -> Collection {
        self.segments[self.segments.len() - 1].collection
    }

    /// Returns the id of the leaf document.
    pub fn leaf_id(&self) -> Uuid {
        self.segments[self.segments.len() - 1].id
    }

    /// Returns the path of the parent document, if any.
    pub fn parent(&self) -> Option<DocPath> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(DocPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Resolves the path to its canonical string form.
    ///
    /// This is the only place path strings are constructed.
    pub fn resolve(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push('/');
            }
            out.push_str(segment.collection.as_str());
            out.push('/');
            out.push_str(&segment.id.to_string());
        }
        out
    }

    /// Parses a canonical path string back into a typed path.
    pub fn parse(s: &str) -> Result<Self, PathParseError> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.is_empty() || parts.len() % 2 != 0 {
            return Err(PathParseError::Malformed(s.to_string()));
        }
        let mut segments = Vec::with_capacity(parts.len() / 2);
        for pair in parts.chunks(2) {
            let collection = Collection::from_str(pair[0])
                .ok_or_else(|| PathParseError::UnknownCollection(pair[0].to_string()))?;
            let id = Uuid::parse_str(pair[1])
                .map_err(|_| PathParseError::InvalidId(pair[1].to_string()))?;
            segments.push(PathSegment { collection, id });
        }
        Ok(Self { segments })
    }
}

impl std::fmt::Display for DocPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.resolve())
    }
}

impl From<DocPath> for String {
    fn from(path: DocPath) -> Self {
        path.resolve()
    }
}

impl TryFrom<String> for DocPath {
    type Error = PathParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        DocPath::parse(&s)
    }
}

/// Errors from parsing a document path string.
#[derive(Debug, Error)]
pub enum PathParseError {
    /// The path does not consist of `collection/id` pairs.
    #[error("malformed document path: {0}")]
    Malformed(String),

    /// A segment names a collection the system does not store.
    #[error("unknown collection in document path: {0}")]
    UnknownCollection(String),

    /// A segment id is not a valid UUID.
    #[error("invalid document id in path: {0}")]
    InvalidId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_single_segment() {
        let id = Uuid::new_v4();
        let path = DocPath::root(Collection::Reservations, id);
        assert_eq!(path.resolve(), format!("reservations/{id}"));
        assert_eq!(path.collection(), Collection::Reservations);
        assert_eq!(path.leaf_id(), id);
        assert!(path.parent().is_none());
    }

    #[test]
    fn resolve_nested_path() {
        let v = Uuid::new_v4();
        let w = Uuid::new_v4();
        let s = Uuid::new_v4();
        let h = Uuid::new_v4();
        let path = DocPath::root(Collection::Venues, v)
            .child(Collection::Wardrobes, w)
            .child(Collection::Sections, s)
            .child(Collection::Hangers, h);

        assert_eq!(
            path.resolve(),
            format!("venues/{v}/wardrobes/{w}/sections/{s}/hangers/{h}")
        );
        assert_eq!(path.collection(), Collection::Hangers);
        assert_eq!(path.leaf_id(), h);

        let parent = path.parent().unwrap();
        assert_eq!(parent.collection(), Collection::Sections);
        assert_eq!(parent.leaf_id(), s);
    }

    #[test]
    fn parse_roundtrip() {
        let path = DocPath::root(Collection::Venues, Uuid::new_v4())
            .child(Collection::Wardrobes, Uuid::new_v4());
        let parsed = DocPath::parse(&path.resolve()).unwrap();
        assert_eq!(parsed, path);
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(matches!(
            DocPath::parse("reservations"),
            Err(PathParseError::Malformed(_))
        ));
        assert!(matches!(
            DocPath::parse("closets/123"),
            Err(PathParseError::UnknownCollection(_))
        ));
        assert!(matches!(
            DocPath::parse("reservations/not-a-uuid"),
            Err(PathParseError::InvalidId(_))
        ));
    }

    #[test]
    fn serde_as_string() {
        let path = DocPath::root(Collection::Users, Uuid::new_v4());
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, format!("\"{}\"", path.resolve()));
        let back: DocPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
