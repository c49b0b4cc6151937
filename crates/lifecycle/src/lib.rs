//! Reservation lifecycle orchestration.
//!
//! Ties the document store, the domain model and the payment gateway
//! together: claiming hangers, walking reservations through check-in
//! and check-out, and reclaiming the ones that stall.

pub mod allocator;
pub mod docs;
pub mod error;
pub mod reclaimer;
pub mod service;

pub use allocator::{ClaimedHanger, HangerAllocator, MAX_CLAIM_ATTEMPTS};
pub use docs::{SectionDoc, UserDoc, VenueDoc, WardrobeDoc};
pub use error::{LifecycleError, Result};
pub use reclaimer::{ReclaimerConfig, SweepOutcome, TimeoutReclaimer};
pub use service::{
    CheckInOutcome, CheckInRequest, CheckOutCompletion, PaymentConfirmation,
    ReservationCoordinator,
};
