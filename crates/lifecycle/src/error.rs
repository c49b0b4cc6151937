//! Lifecycle error types.
//!
//! The closed kind set every inbound surface maps from. Lower layers
//! keep their own error enums and convert on the way up.

use doc_store::DocStoreError;
use domain::DomainError;
use payment::PaymentError;
use thiserror::Error;

/// Errors surfaced by lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// No hanger could be claimed in the requested section.
    #[error("No available hangers in section {section}")]
    CapacityExhausted { section: String },

    /// An optimistic-concurrency race was lost and retries ran out, or
    /// the operation is not valid in the resource's current state.
    #[error("Conflicting update on {path}: {detail}")]
    Conflict { path: String, detail: String },

    /// The payment gateway declined.
    #[error("Payment rejected: {detail}")]
    GatewayRejected { detail: String },

    /// A referenced resource does not exist.
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// A dependency failed in a way worth retrying later.
    #[error("Transient failure: {detail}")]
    Transient { detail: String },
}

impl From<DocStoreError> for LifecycleError {
    fn from(e: DocStoreError) -> Self {
        match e {
            DocStoreError::ConcurrencyConflict { path, .. } => LifecycleError::Conflict {
                path: path.resolve(),
                detail: "document changed concurrently".to_string(),
            },
            DocStoreError::AlreadyExists(path) => LifecycleError::Conflict {
                path: path.resolve(),
                detail: "document already exists".to_string(),
            },
            DocStoreError::NotFound(path) => LifecycleError::NotFound {
                path: path.resolve(),
            },
            other => LifecycleError::Transient {
                detail: other.to_string(),
            },
        }
    }
}

impl From<DomainError> for LifecycleError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::InvalidTransition { id, .. } => LifecycleError::Conflict {
                path: format!("reservations/{id}"),
                detail: e.to_string(),
            },
            DomainError::Store(store) => store.into(),
            DomainError::Serialization(ser) => LifecycleError::Transient {
                detail: ser.to_string(),
            },
        }
    }
}

impl From<PaymentError> for LifecycleError {
    fn from(e: PaymentError) -> Self {
        match e {
            PaymentError::Rejected { detail } => LifecycleError::GatewayRejected { detail },
            PaymentError::IntentNotFound(id) => LifecycleError::NotFound {
                path: format!("payment_intents/{id}"),
            },
            PaymentError::Unavailable(detail) => LifecycleError::Transient { detail },
        }
    }
}

/// Convenience type alias for lifecycle results.
pub type Result<T> = std::result::Result<T, LifecycleError>;
