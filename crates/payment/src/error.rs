//! Payment error types.

use thiserror::Error;

/// Errors that can occur when talking to the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The gateway refused the hold or confirmation.
    #[error("Payment rejected: {detail}")]
    Rejected { detail: String },

    /// No intent exists with the given id.
    #[error("Payment intent not found: {0}")]
    IntentNotFound(String),

    /// The gateway could not be reached or answered with a server error.
    #[error("Payment gateway unavailable: {0}")]
    Unavailable(String),
}

/// Convenience type alias for payment results.
pub type Result<T> = std::result::Result<T, PaymentError>;
