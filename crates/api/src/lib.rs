//! HTTP API server with observability for the cloakroom reservation
//! system.
//!
//! Provides REST endpoints for the reservation lifecycle, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use doc_store::{DocumentStore, InMemoryDocStore};
use lifecycle::{ReclaimerConfig, ReservationCoordinator, TimeoutReclaimer};
use metrics_exporter_prometheus::PrometheusHandle;
use payment::{InMemoryPaymentGateway, PaymentGateway};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::reservations::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, G>(state: Arc<AppState<S, G>>, metrics_handle: PrometheusHandle) -> Router
where
    S: DocumentStore + Clone + 'static,
    G: PaymentGateway + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/reservations/check-in",
            post(routes::reservations::check_in::<S, G>),
        )
        .route(
            "/payments/confirm",
            post(routes::reservations::confirm_payment::<S, G>),
        )
        .route("/reservations/{id}", get(routes::reservations::get::<S, G>))
        .route(
            "/reservations/{id}/confirm-check-in",
            post(routes::reservations::confirm_check_in::<S, G>),
        )
        .route(
            "/reservations/{id}/check-out",
            post(routes::reservations::request_check_out::<S, G>),
        )
        .route(
            "/reservations/{id}/confirm-check-out",
            post(routes::reservations::confirm_check_out::<S, G>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state over the in-memory store and
/// gateway, plus the timeout reclaimer for the caller to run.
pub fn create_default_state(
    reclaimer_config: ReclaimerConfig,
) -> (
    Arc<AppState<InMemoryDocStore, InMemoryPaymentGateway>>,
    TimeoutReclaimer<InMemoryDocStore, InMemoryPaymentGateway>,
    InMemoryPaymentGateway,
) {
    let store = InMemoryDocStore::new();
    let gateway = InMemoryPaymentGateway::new();

    let coordinator = ReservationCoordinator::new(store.clone(), gateway.clone());
    let reclaimer = TimeoutReclaimer::new(store.clone(), gateway.clone(), reclaimer_config);

    let state = Arc::new(AppState { coordinator, store });
    (state, reclaimer, gateway)
}
