//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lifecycle::LifecycleError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Lifecycle operation error.
    Lifecycle(LifecycleError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Lifecycle(err) => lifecycle_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message, "code": code });
        (status, axum::Json(body)).into_response()
    }
}

fn lifecycle_error_to_response(err: LifecycleError) -> (StatusCode, &'static str, String) {
    match &err {
        LifecycleError::CapacityExhausted { .. } => {
            (StatusCode::CONFLICT, "capacity_exhausted", err.to_string())
        }
        LifecycleError::Conflict { .. } => (StatusCode::CONFLICT, "conflict", err.to_string()),
        LifecycleError::GatewayRejected { .. } => (
            StatusCode::PAYMENT_REQUIRED,
            "payment_rejected",
            err.to_string(),
        ),
        LifecycleError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found", err.to_string()),
        LifecycleError::Transient { .. } => {
            tracing::error!(error = %err, "transient dependency failure");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "transient",
                err.to_string(),
            )
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        ApiError::Lifecycle(err)
    }
}
