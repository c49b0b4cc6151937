//! The reservation aggregate: model, state machine, and repository.

pub mod model;
pub mod state;
pub mod store;

pub use model::{Named, Reservation};
pub use state::{ReservationState, Visibility};
pub use store::{ReservationStore, StoredReservation};
