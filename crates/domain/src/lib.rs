//! Domain model for the cloakroom reservation system.

pub mod error;
pub mod hanger;
pub mod payment;
pub mod reservation;

pub use error::{DomainError, Result};
pub use hanger::{Hanger, HangerState, HangerStore, StoredHanger};
pub use payment::PaymentStatus;
pub use reservation::{
    Named, Reservation, ReservationState, ReservationStore, StoredReservation, Visibility,
};
