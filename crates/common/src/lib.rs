//! Shared types for the cloakroom reservation system.
//!
//! Provides the typed identifiers used across crates, the hierarchical
//! document path (`DocPath`) that replaces ad-hoc string path building,
//! and the composite section/hanger references.

pub mod path;
pub mod refs;
pub mod types;

pub use path::{Collection, DocPath, PathParseError, PathSegment};
pub use refs::{HangerRef, SectionRef};
pub use types::{HangerId, ReservationId, SectionId, UserId, VenueId, WardrobeId};
