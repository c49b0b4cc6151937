//! Payment gateway abstraction for deposit holds.
//!
//! The reservation system never captures at check-in; it opens a
//! manual-capture hold, confirms it when the guest completes payment,
//! and cancels it when a reservation is rejected or reclaimed.

pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod mock;

pub use coordinator::PaymentCoordinator;
pub use error::{PaymentError, Result};
pub use gateway::{HoldRequest, IntentStatus, PaymentGateway, PaymentIntent};
pub use mock::InMemoryPaymentGateway;
