//! Reservation lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{ReservationId, SectionRef};
use doc_store::DocumentStore;
use domain::Reservation;
use lifecycle::{CheckInRequest, ReservationCoordinator};
use payment::{PaymentGateway, PaymentIntent};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: DocumentStore, G: PaymentGateway> {
    pub coordinator: ReservationCoordinator<S, G>,
    pub store: S,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CheckInBody {
    pub venue_id: Uuid,
    pub wardrobe_id: Uuid,
    pub section_id: Uuid,
    pub user_id: Uuid,
    pub payment_method: Option<String>,
}

#[derive(Deserialize)]
pub struct ConfirmPaymentBody {
    pub payment_intent_id: String,
    pub payment_method: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct PaymentIntentResponse {
    pub id: String,
    pub status: String,
    pub next_action: Option<serde_json::Value>,
    pub client_secret: Option<String>,
}

impl From<PaymentIntent> for PaymentIntentResponse {
    fn from(intent: PaymentIntent) -> Self {
        Self {
            id: intent.id,
            status: intent.status.as_str().to_string(),
            next_action: intent.next_action,
            client_secret: intent.client_secret,
        }
    }
}

#[derive(Serialize)]
pub struct CheckInResponse {
    pub reservation_id: String,
    pub payment_intent: PaymentIntentResponse,
}

#[derive(Serialize)]
pub struct ConfirmPaymentResponse {
    pub reservation_id: String,
    pub payment_status: String,
    pub intent_status: Option<String>,
    pub next_action: Option<serde_json::Value>,
    pub client_secret: Option<String>,
}

#[derive(Serialize)]
pub struct NamedResponse {
    pub id: String,
    pub name: String,
}

#[derive(Serialize)]
pub struct ReservationResponse {
    pub id: String,
    pub venue: NamedResponse,
    pub wardrobe: NamedResponse,
    pub section: NamedResponse,
    pub hanger_id: Option<String>,
    pub user: NamedResponse,
    pub state: String,
    pub payment_status: String,
    pub reservation_time: String,
    pub checked_in: Option<String>,
    pub checked_out: Option<String>,
    pub visible_in_app: bool,
    pub visible_in_admin: bool,
    pub timed_out: bool,
}

impl From<&Reservation> for ReservationResponse {
    fn from(r: &Reservation) -> Self {
        Self {
            id: r.id.to_string(),
            venue: NamedResponse {
                id: r.venue.id.to_string(),
                name: r.venue.name.clone(),
            },
            wardrobe: NamedResponse {
                id: r.wardrobe.id.to_string(),
                name: r.wardrobe.name.clone(),
            },
            section: NamedResponse {
                id: r.section.id.to_string(),
                name: r.section.name.clone(),
            },
            hanger_id: r.hanger.map(|h| h.to_string()),
            user: NamedResponse {
                id: r.user.id.to_string(),
                name: r.user.name.clone(),
            },
            state: r.state.as_str().to_string(),
            payment_status: r.payment_status.as_str().to_string(),
            reservation_time: r.reservation_time.to_rfc3339(),
            checked_in: r.checked_in.map(|t| t.to_rfc3339()),
            checked_out: r.checked_out.map(|t| t.to_rfc3339()),
            visible_in_app: r.visible_in_app,
            visible_in_admin: r.visible_in_admin,
            timed_out: r.timed_out,
        }
    }
}

#[derive(Serialize)]
pub struct TransitionResponse {
    pub reservation_id: String,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct CheckOutResponse {
    pub reservation_id: String,
    pub reservation_updated: String,
    pub hanger_updated: Option<String>,
}

// -- Handlers --

/// POST /reservations/check-in — start a check-in in the scanned section.
#[tracing::instrument(skip(state, body))]
pub async fn check_in<S: DocumentStore + Clone + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Json(body): Json<CheckInBody>,
) -> Result<(axum::http::StatusCode, Json<CheckInResponse>), ApiError> {
    let section = SectionRef::new(
        body.venue_id.into(),
        body.wardrobe_id.into(),
        body.section_id.into(),
    );
    let outcome = state
        .coordinator
        .request_check_in(CheckInRequest {
            section,
            user: body.user_id.into(),
            payment_method: body.payment_method,
        })
        .await?;

    let response = CheckInResponse {
        reservation_id: outcome.reservation_id.to_string(),
        payment_intent: outcome.payment_intent.into(),
    };
    Ok((axum::http::StatusCode::CREATED, Json(response)))
}

/// POST /payments/confirm — apply a gateway confirmation.
#[tracing::instrument(skip(state, body))]
pub async fn confirm_payment<S: DocumentStore + Clone + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Json(body): Json<ConfirmPaymentBody>,
) -> Result<Json<ConfirmPaymentResponse>, ApiError> {
    let confirmation = state
        .coordinator
        .confirm_payment(&body.payment_intent_id, body.payment_method.as_deref())
        .await?;

    Ok(Json(ConfirmPaymentResponse {
        reservation_id: confirmation.reservation_id.to_string(),
        payment_status: confirmation.payment_status.as_str().to_string(),
        intent_status: confirmation.intent_status.map(|s| s.as_str().to_string()),
        next_action: confirmation.next_action,
        client_secret: confirmation.client_secret,
    }))
}

/// GET /reservations/:id — load one reservation.
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let stored = state
        .coordinator
        .get_reservation(ReservationId::from(id))
        .await?;
    Ok(Json(ReservationResponse::from(&stored.reservation)))
}

/// POST /reservations/:id/confirm-check-in — staff confirms the garment
/// is on the hanger.
#[tracing::instrument(skip(state))]
pub async fn confirm_check_in<S: DocumentStore + Clone + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let id = ReservationId::from(id);
    let write = state.coordinator.confirm_check_in(id).await?;

    Ok(Json(TransitionResponse {
        reservation_id: id.to_string(),
        updated_at: write.updated_at.to_rfc3339(),
    }))
}

/// POST /reservations/:id/check-out — the guest asks for the garment back.
#[tracing::instrument(skip(state))]
pub async fn request_check_out<S: DocumentStore + Clone + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let id = ReservationId::from(id);
    let write = state.coordinator.request_check_out(id).await?;

    Ok(Json(TransitionResponse {
        reservation_id: id.to_string(),
        updated_at: write.updated_at.to_rfc3339(),
    }))
}

/// POST /reservations/:id/confirm-check-out — staff hands the garment
/// back, closing the reservation and freeing the hanger.
#[tracing::instrument(skip(state))]
pub async fn confirm_check_out<S: DocumentStore + Clone + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CheckOutResponse>, ApiError> {
    let id = ReservationId::from(id);
    let completion = state.coordinator.confirm_check_out(id).await?;

    Ok(Json(CheckOutResponse {
        reservation_id: id.to_string(),
        reservation_updated: completion.reservation_updated.to_rfc3339(),
        hanger_updated: completion.hanger_updated.map(|t| t.to_rfc3339()),
    }))
}
