//! Bodies of the catalog documents check-in resolves.
//!
//! These are owned by admin tooling; the lifecycle only reads them.

use serde::{Deserialize, Serialize};

use common::{Collection, DocPath, UserId};

/// A venue document body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueDoc {
    pub name: String,
}

/// A wardrobe document body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WardrobeDoc {
    pub name: String,
}

/// A section document body. Carries the deposit the venue charges for
/// garments checked into this section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDoc {
    pub name: String,
    pub deposit_cents: i64,
    pub currency: String,
}

/// A user document body. The gateway customer id is attached at signup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDoc {
    pub name: String,
    pub gateway_customer: String,
}

impl UserDoc {
    /// Path of a user document.
    pub fn path(id: UserId) -> DocPath {
        DocPath::root(Collection::Users, id)
    }
}
