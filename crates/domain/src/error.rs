use thiserror::Error;

use common::ReservationId;

use crate::reservation::ReservationState;

/// Errors produced by the domain layer.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A lifecycle operation was attempted from a state that does not
    /// allow it.
    #[error("Invalid transition for reservation {id}: {from} does not allow {attempted}")]
    InvalidTransition {
        id: ReservationId,
        from: ReservationState,
        attempted: &'static str,
    },

    /// The underlying document store failed.
    #[error("Document store error: {0}")]
    Store(#[from] doc_store::DocStoreError),

    /// A document body could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
