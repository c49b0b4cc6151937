//! Composite references into the venue/wardrobe/section/hanger hierarchy.

use serde::{Deserialize, Serialize};

use crate::path::{Collection, DocPath};
use crate::types::{HangerId, SectionId, VenueId, WardrobeId};

/// Fully-qualified reference to a section, the unit a scanned code
/// identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionRef {
    pub venue: VenueId,
    pub wardrobe: WardrobeId,
    pub section: SectionId,
}

impl SectionRef {
    pub fn new(venue: VenueId, wardrobe: WardrobeId, section: SectionId) -> Self {
        Self {
            venue,
            wardrobe,
            section,
        }
    }

    /// Path of the section document itself.
    pub fn doc_path(&self) -> DocPath {
        DocPath::root(Collection::Venues, self.venue)
            .child(Collection::Wardrobes, self.wardrobe)
            .child(Collection::Sections, self.section)
    }

    /// Path of the venue document.
    pub fn venue_path(&self) -> DocPath {
        DocPath::root(Collection::Venues, self.venue)
    }

    /// Path of the wardrobe document.
    pub fn wardrobe_path(&self) -> DocPath {
        DocPath::root(Collection::Venues, self.venue).child(Collection::Wardrobes, self.wardrobe)
    }

    /// Reference to a hanger in this section.
    pub fn hanger(&self, hanger: HangerId) -> HangerRef {
        HangerRef {
            section: *self,
            hanger,
        }
    }
}

impl std::fmt::Display for SectionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.doc_path())
    }
}

/// Fully-qualified reference to a single hanger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HangerRef {
    pub section: SectionRef,
    pub hanger: HangerId,
}

impl HangerRef {
    /// Path of the hanger document.
    pub fn doc_path(&self) -> DocPath {
        self.section.doc_path().child(Collection::Hangers, self.hanger)
    }
}

impl std::fmt::Display for HangerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.doc_path())
    }
}
