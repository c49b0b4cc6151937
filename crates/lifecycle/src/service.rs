//! The reservation lifecycle coordinator.
//!
//! Drives check-in (claim hanger → place hold → create record, with
//! compensating rollback), payment confirmation, and the staff-facing
//! check-in/check-out transitions. Reservation state, hanger state, and
//! gateway state live in three places with no shared transaction; every
//! step is ordered so a crash leaves at worst a claimed hanger and an
//! uncaptured hold, both of which the timeout reclaimer converges.

use chrono::{DateTime, Utc};

use common::{DocPath, ReservationId, SectionRef, UserId};
use doc_store::{DocStoreError, DocumentStore, DocumentStoreExt, WriteResult};
use domain::{
    DomainError, HangerStore, Named, PaymentStatus, Reservation, ReservationStore,
    StoredReservation,
};
use payment::{
    HoldRequest, IntentStatus, PaymentCoordinator, PaymentError, PaymentGateway, PaymentIntent,
};

use crate::allocator::HangerAllocator;
use crate::docs::{SectionDoc, UserDoc, VenueDoc, WardrobeDoc};
use crate::error::{LifecycleError, Result};

/// How often a guarded reservation write retries a lost revision race.
const MAX_UPDATE_ATTEMPTS: usize = 3;

/// Parameters for a guest starting a check-in.
#[derive(Debug, Clone)]
pub struct CheckInRequest {
    /// The section the guest scanned.
    pub section: SectionRef,
    pub user: UserId,
    /// Saved payment method to confirm the hold with, if chosen up front.
    pub payment_method: Option<String>,
}

/// Outcome of a successful check-in request.
#[derive(Debug, Clone)]
pub struct CheckInOutcome {
    pub reservation_id: ReservationId,
    /// The staged hold; the client drives confirmation with its secret.
    pub payment_intent: PaymentIntent,
}

/// Outcome of a payment confirmation.
#[derive(Debug, Clone)]
pub struct PaymentConfirmation {
    pub reservation_id: ReservationId,
    pub payment_status: PaymentStatus,
    /// Absent when the confirmation was ignored (closed reservation).
    pub intent_status: Option<IntentStatus>,
    pub next_action: Option<serde_json::Value>,
    pub client_secret: Option<String>,
}

/// Write times of a completed check-out.
#[derive(Debug, Clone)]
pub struct CheckOutCompletion {
    pub reservation_updated: DateTime<Utc>,
    pub hanger_updated: Option<DateTime<Utc>>,
}

/// Orchestrates the reservation lifecycle over the document store and
/// the payment gateway.
#[derive(Clone)]
pub struct ReservationCoordinator<S, G> {
    store: S,
    reservations: ReservationStore<S>,
    hangers: HangerStore<S>,
    allocator: HangerAllocator<S>,
    payments: PaymentCoordinator<G>,
}

impl<S, G> ReservationCoordinator<S, G>
where
    S: DocumentStore + Clone,
    G: PaymentGateway,
{
    /// Creates a new coordinator.
    pub fn new(store: S, gateway: G) -> Self {
        let hangers = HangerStore::new(store.clone());
        Self {
            reservations: ReservationStore::new(store.clone()),
            allocator: HangerAllocator::new(hangers.clone()),
            hangers,
            payments: PaymentCoordinator::new(gateway),
            store,
        }
    }

    /// Starts a check-in: claim a hanger, stage a deposit hold, create
    /// the reservation record. Fixed order; failures roll back in
    /// reverse.
    #[tracing::instrument(skip(self, request), fields(section = %request.section, user = %request.user))]
    pub async fn request_check_in(&self, request: CheckInRequest) -> Result<CheckInOutcome> {
        let now = Utc::now();

        let venue: VenueDoc = self.resolve(&request.section.venue_path()).await?;
        let wardrobe: WardrobeDoc = self.resolve(&request.section.wardrobe_path()).await?;
        let section_doc: SectionDoc = self.resolve(&request.section.doc_path()).await?;
        let user: UserDoc = self.resolve(&UserDoc::path(request.user)).await?;

        let claimed = self.allocator.claim_one(&request.section, now).await?;

        let hold = HoldRequest {
            customer: user.gateway_customer,
            payment_method: request.payment_method.clone(),
            amount_cents: section_doc.deposit_cents,
            currency: section_doc.currency,
        };
        let intent = match self.payments.create_hold(hold).await {
            Ok(intent) => intent,
            Err(e) => {
                self.rollback_claim(&claimed.hanger_ref, now).await;
                return Err(e.into());
            }
        };

        // With a payment method supplied up front the hold is confirmed
        // inline; a decline means no reservation record is ever created.
        let intent = if let Some(method) = request.payment_method.as_deref() {
            match self.payments.confirm(&intent.id, Some(method)).await {
                Ok(confirmed) => confirmed,
                Err(e) => {
                    self.rollback_hold(&intent.id).await;
                    self.rollback_claim(&claimed.hanger_ref, now).await;
                    return Err(e.into());
                }
            }
        } else {
            intent
        };

        let mut reservation = Reservation::new(
            ReservationId::new(),
            Named::new(request.section.venue, venue.name),
            Named::new(request.section.wardrobe, wardrobe.name),
            Named::new(request.section.section, section_doc.name),
            claimed.hanger_ref.hanger,
            Named::new(request.user, user.name),
            intent.id.clone(),
            now,
        );
        reservation.set_payment_status(intent.status.to_payment_status());
        if let Err(e) = self.reservations.create(&reservation).await {
            self.rollback_hold(&intent.id).await;
            self.rollback_claim(&claimed.hanger_ref, now).await;
            return Err(e.into());
        }

        metrics::counter!("reservations_created_total").increment(1);
        tracing::info!(reservation = %reservation.id, intent = %intent.id, "check-in started");
        Ok(CheckInOutcome {
            reservation_id: reservation.id,
            payment_intent: intent,
        })
    }

    /// Applies a gateway confirmation to the owning reservation.
    ///
    /// Confirmations arrive from the guest's client and can land long
    /// after the reservation was reclaimed or closed; those are ignored
    /// without calling the gateway, so a late confirmation can neither
    /// resurrect visibility nor re-place a canceled hold.
    #[tracing::instrument(skip(self, payment_method))]
    pub async fn confirm_payment(
        &self,
        intent_id: &str,
        payment_method: Option<&str>,
    ) -> Result<PaymentConfirmation> {
        let now = Utc::now();

        let stored = self
            .reservations
            .find_by_payment_intent(intent_id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound {
                path: format!("payment_intents/{intent_id}"),
            })?;
        let reservation_id = stored.reservation.id;

        if stored.reservation.timed_out || stored.reservation.state.is_terminal() {
            tracing::info!(
                reservation = %reservation_id,
                state = %stored.reservation.state,
                timed_out = stored.reservation.timed_out,
                "ignoring confirmation for closed reservation"
            );
            return Ok(PaymentConfirmation {
                reservation_id,
                payment_status: stored.reservation.payment_status,
                intent_status: None,
                next_action: None,
                client_secret: None,
            });
        }

        let intent = match self.payments.confirm(intent_id, payment_method).await {
            Ok(intent) => intent,
            Err(PaymentError::Rejected { detail }) => {
                self.reject(reservation_id, now).await?;
                return Err(LifecycleError::GatewayRejected { detail });
            }
            Err(e) => return Err(e.into()),
        };

        let payment_status = intent.status.to_payment_status();
        self.record_payment_status(stored, payment_status).await?;

        Ok(PaymentConfirmation {
            reservation_id,
            payment_status,
            intent_status: Some(intent.status),
            next_action: intent.next_action,
            client_secret: intent.client_secret,
        })
    }

    /// Staff confirms the garment is on the hanger.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_check_in(&self, id: ReservationId) -> Result<WriteResult> {
        let write = self
            .transition(id, |r, now| r.confirm_check_in(now))
            .await?;
        metrics::counter!("reservations_checked_in_total").increment(1);
        Ok(write)
    }

    /// The guest asks for the garment back.
    #[tracing::instrument(skip(self))]
    pub async fn request_check_out(&self, id: ReservationId) -> Result<WriteResult> {
        self.transition(id, |r, now| r.request_check_out(now)).await
    }

    /// Staff hands the garment back.
    ///
    /// The only transition that touches two documents: the reservation
    /// closes and the hanger returns to the pool, atomically, each write
    /// guarded by the revision read just before.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_check_out(&self, id: ReservationId) -> Result<CheckOutCompletion> {
        let now = Utc::now();
        let mut attempts = 0;
        loop {
            let stored = self.get_reservation(id).await?;
            let mut reservation = stored.reservation;
            reservation.confirm_check_out(now)?;

            let mut batch = vec![ReservationStore::<S>::batch_update(
                &reservation,
                stored.revision,
            )?];
            let hanger_included = match reservation.hanger_ref() {
                Some(hanger_ref) => {
                    let stored_hanger =
                        self.hangers.get(&hanger_ref).await?.ok_or_else(|| {
                            LifecycleError::NotFound {
                                path: hanger_ref.doc_path().resolve(),
                            }
                        })?;
                    batch.push(HangerStore::<S>::batch_release(&stored_hanger, now)?);
                    true
                }
                None => false,
            };

            match self.store.commit(batch).await {
                Ok(results) => {
                    metrics::counter!("reservations_checked_out_total").increment(1);
                    tracing::info!(reservation = %id, "check-out completed");
                    return Ok(CheckOutCompletion {
                        reservation_updated: results[0].updated_at,
                        hanger_updated: hanger_included.then(|| results[1].updated_at),
                    });
                }
                Err(e @ DocStoreError::ConcurrencyConflict { .. }) => {
                    attempts += 1;
                    if attempts >= MAX_UPDATE_ATTEMPTS {
                        return Err(e.into());
                    }
                    tracing::debug!(reservation = %id, attempts, "check-out batch lost a race, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Reads one reservation, for inbound surfaces.
    pub async fn get_reservation(&self, id: ReservationId) -> Result<StoredReservation> {
        self.reservations
            .get(id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound {
                path: ReservationStore::<S>::path(id).resolve(),
            })
    }

    /// Marks a reservation rejected and releases its hanger.
    async fn reject(&self, id: ReservationId, now: DateTime<Utc>) -> Result<()> {
        let rejected = self.transition(id, |r, now| r.reject(now)).await;
        match rejected {
            Ok(_) => {}
            // Already closed by a concurrent path; nothing left to do
            Err(LifecycleError::Conflict { .. }) => return Ok(()),
            Err(e) => return Err(e),
        }

        let stored = self.get_reservation(id).await?;
        if let Some(hanger_ref) = stored.reservation.hanger_ref() {
            self.rollback_claim(&hanger_ref, now).await;
        }
        metrics::counter!("reservations_rejected_total").increment(1);
        Ok(())
    }

    /// Applies one reservation transition with bounded retry on lost
    /// revision races. Each retry re-reads and re-checks the transition
    /// against the fresh state.
    async fn transition<F>(&self, id: ReservationId, apply: F) -> Result<WriteResult>
    where
        F: Fn(&mut Reservation, DateTime<Utc>) -> domain::Result<()>,
    {
        let now = Utc::now();
        let mut attempts = 0;
        loop {
            let stored = self.get_reservation(id).await?;
            let mut reservation = stored.reservation;
            apply(&mut reservation, now)?;

            match self.reservations.update(&reservation, stored.revision).await {
                Ok(write) => return Ok(write),
                Err(DomainError::Store(e @ DocStoreError::ConcurrencyConflict { .. })) => {
                    attempts += 1;
                    if attempts >= MAX_UPDATE_ATTEMPTS {
                        return Err(e.into());
                    }
                    tracing::debug!(reservation = %id, attempts, "transition lost a race, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Writes an observed payment status onto the reservation, keeping
    /// every other field from the freshest read.
    async fn record_payment_status(
        &self,
        mut stored: StoredReservation,
        status: PaymentStatus,
    ) -> Result<()> {
        let mut attempts = 0;
        loop {
            if stored.reservation.timed_out || stored.reservation.state.is_terminal() {
                // Closed while we were talking to the gateway
                return Ok(());
            }
            let mut reservation = stored.reservation.clone();
            reservation.set_payment_status(status);

            match self.reservations.update(&reservation, stored.revision).await {
                Ok(_) => return Ok(()),
                Err(DomainError::Store(e @ DocStoreError::ConcurrencyConflict { .. })) => {
                    attempts += 1;
                    if attempts >= MAX_UPDATE_ATTEMPTS {
                        return Err(e.into());
                    }
                    stored = self.get_reservation(reservation.id).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn resolve<T: serde::de::DeserializeOwned>(&self, path: &DocPath) -> Result<T> {
        let doc = self.store.get_required(path).await?;
        Ok(doc.to_typed()?)
    }

    /// Best-effort hanger release during rollback. A failure here leaves
    /// a claimed hanger for the reclaimer to pick up.
    async fn rollback_claim(&self, hanger_ref: &common::HangerRef, now: DateTime<Utc>) {
        if let Err(e) = self.allocator.release(hanger_ref, now).await {
            tracing::error!(hanger = %hanger_ref, error = %e, "failed to release hanger during rollback");
        }
    }

    /// Best-effort hold cancellation during rollback.
    async fn rollback_hold(&self, intent_id: &str) {
        if let Err(e) = self.payments.cancel(intent_id).await {
            tracing::error!(intent = %intent_id, error = %e, "failed to cancel hold during rollback");
        }
    }
}
