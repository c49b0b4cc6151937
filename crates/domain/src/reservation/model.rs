//! The reservation aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::{HangerId, HangerRef, ReservationId, SectionId, SectionRef, UserId, VenueId, WardrobeId};

use crate::error::{DomainError, Result};
use crate::payment::PaymentStatus;
use crate::reservation::state::ReservationState;

/// A reference paired with the display name captured at creation.
///
/// Names are denormalized onto the reservation so that listing surfaces
/// never need to resolve the venue hierarchy again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Named<Id> {
    pub id: Id,
    pub name: String,
}

impl<Id> Named<Id> {
    pub fn new(id: Id, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// One guest's claim on one hanger, from check-in to check-out.
///
/// Reservations are never deleted; terminal records stay in the store
/// with both visibility flags withdrawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub venue: Named<VenueId>,
    pub wardrobe: Named<WardrobeId>,
    pub section: Named<SectionId>,
    pub hanger: Option<HangerId>,
    pub user: Named<UserId>,
    pub state: ReservationState,
    pub payment_status: PaymentStatus,
    /// Opaque gateway intent id, immutable once set.
    pub payment_intent: String,
    pub reservation_time: DateTime<Utc>,
    pub checked_in: Option<DateTime<Utc>>,
    pub checked_out: Option<DateTime<Utc>>,
    pub state_updated: DateTime<Utc>,
    pub visible_in_app: bool,
    pub visible_in_admin: bool,
    pub eligible_for_timeout: bool,
    pub timed_out: bool,
}

impl Reservation {
    /// Creates a fresh reservation in the initial `CheckingIn` state.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ReservationId,
        venue: Named<VenueId>,
        wardrobe: Named<WardrobeId>,
        section: Named<SectionId>,
        hanger: HangerId,
        user: Named<UserId>,
        payment_intent: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let state = ReservationState::CheckingIn;
        let visibility = state.visibility();
        Self {
            id,
            venue,
            wardrobe,
            section,
            hanger: Some(hanger),
            user,
            state,
            payment_status: PaymentStatus::Initial,
            payment_intent: payment_intent.into(),
            reservation_time: now,
            checked_in: None,
            checked_out: None,
            state_updated: now,
            visible_in_app: visibility.app,
            visible_in_admin: visibility.admin,
            eligible_for_timeout: true,
            timed_out: false,
        }
    }

    /// The claimed hanger as a fully-qualified reference, if any.
    pub fn hanger_ref(&self) -> Option<HangerRef> {
        self.hanger.map(|hanger| {
            SectionRef::new(self.venue.id, self.wardrobe.id, self.section.id).hanger(hanger)
        })
    }

    /// Staff confirmed the garment is on the hanger.
    ///
    /// Also takes the reservation out of the reclaimer's reach.
    pub fn confirm_check_in(&mut self, now: DateTime<Utc>) -> Result<()> {
        if !self.state.can_confirm_check_in() {
            return Err(self.invalid_transition("confirm_check_in"));
        }
        self.state = ReservationState::CheckedIn;
        self.checked_in = Some(now);
        self.eligible_for_timeout = false;
        self.touch(now);
        Ok(())
    }

    /// The guest asked for the garment back.
    pub fn request_check_out(&mut self, now: DateTime<Utc>) -> Result<()> {
        if !self.state.can_request_check_out() {
            return Err(self.invalid_transition("request_check_out"));
        }
        self.state = ReservationState::CheckingOut;
        self.touch(now);
        Ok(())
    }

    /// Staff handed the garment back.
    pub fn confirm_check_out(&mut self, now: DateTime<Utc>) -> Result<()> {
        if !self.state.can_confirm_check_out() {
            return Err(self.invalid_transition("confirm_check_out"));
        }
        self.state = ReservationState::CheckedOut;
        self.checked_out = Some(now);
        self.touch(now);
        Ok(())
    }

    /// Rejects the reservation (payment declined or staff refusal).
    pub fn reject(&mut self, now: DateTime<Utc>) -> Result<()> {
        if !self.state.can_reject() {
            return Err(self.invalid_transition("reject"));
        }
        self.state = ReservationState::CheckInRejected;
        self.eligible_for_timeout = false;
        self.touch(now);
        Ok(())
    }

    /// Marks the reservation as reclaimed by the timeout sweep.
    ///
    /// Clearing the eligibility flag is what stops the next sweep from
    /// matching the reservation again. Idempotent: re-marking an already
    /// timed-out reservation succeeds, so a sweep whose gateway or
    /// hanger cleanup failed can finish the job on a later run.
    pub fn mark_timed_out(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.timed_out {
            self.eligible_for_timeout = false;
            return Ok(());
        }
        if !self.state.can_reject() {
            return Err(self.invalid_transition("mark_timed_out"));
        }
        self.state = ReservationState::CheckInRejected;
        self.timed_out = true;
        self.eligible_for_timeout = false;
        self.touch(now);
        Ok(())
    }

    /// Puts the reservation back in the timeout sweep's reach.
    ///
    /// Used when a sweep marked the reservation but could not finish its
    /// hold or hanger cleanup; the flag keeps it matching until a sweep
    /// completes every sub-step.
    pub fn retain_timeout_eligibility(&mut self) {
        self.eligible_for_timeout = true;
    }

    /// Records the latest payment status observed from the gateway.
    pub fn set_payment_status(&mut self, status: PaymentStatus) {
        self.payment_status = status;
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.state_updated = now;
        let visibility = self.state.visibility();
        self.visible_in_app = visibility.app;
        self.visible_in_admin = visibility.admin;
    }

    fn invalid_transition(&self, attempted: &'static str) -> DomainError {
        DomainError::InvalidTransition {
            id: self.id,
            from: self.state,
            attempted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_reservation() -> Reservation {
        Reservation::new(
            ReservationId::new(),
            Named::new(VenueId::new(), "Berghain"),
            Named::new(WardrobeId::new(), "Main floor"),
            Named::new(SectionId::new(), "A"),
            HangerId::new(),
            Named::new(UserId::new(), "Mara"),
            "pi_test_0001",
            Utc::now(),
        )
    }

    #[test]
    fn new_reservation_is_checking_in_and_app_visible() {
        let r = sample_reservation();
        assert_eq!(r.state, ReservationState::CheckingIn);
        assert!(r.visible_in_app);
        assert!(!r.visible_in_admin);
        assert!(r.eligible_for_timeout);
        assert!(!r.timed_out);
        assert_eq!(r.payment_status, PaymentStatus::Initial);
    }

    #[test]
    fn happy_path_transitions() {
        let mut r = sample_reservation();
        let now = Utc::now();

        r.confirm_check_in(now).unwrap();
        assert_eq!(r.state, ReservationState::CheckedIn);
        assert_eq!(r.checked_in, Some(now));
        assert!(!r.eligible_for_timeout);
        assert!(r.visible_in_app && r.visible_in_admin);

        r.request_check_out(now).unwrap();
        assert_eq!(r.state, ReservationState::CheckingOut);
        assert!(r.visible_in_app && r.visible_in_admin);

        r.confirm_check_out(now).unwrap();
        assert_eq!(r.state, ReservationState::CheckedOut);
        assert_eq!(r.checked_out, Some(now));
        assert!(!r.visible_in_app && !r.visible_in_admin);
    }

    #[test]
    fn out_of_order_transitions_are_rejected() {
        let now = Utc::now();

        let mut r = sample_reservation();
        assert!(matches!(
            r.request_check_out(now),
            Err(DomainError::InvalidTransition { .. })
        ));
        assert!(matches!(
            r.confirm_check_out(now),
            Err(DomainError::InvalidTransition { .. })
        ));

        r.confirm_check_in(now).unwrap();
        assert!(matches!(
            r.confirm_check_in(now),
            Err(DomainError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn reject_is_not_allowed_after_check_out() {
        let mut r = sample_reservation();
        let now = Utc::now();
        r.confirm_check_in(now).unwrap();
        r.request_check_out(now).unwrap();
        r.confirm_check_out(now).unwrap();

        assert!(matches!(
            r.reject(now),
            Err(DomainError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn reject_withdraws_visibility() {
        let mut r = sample_reservation();
        r.reject(Utc::now()).unwrap();
        assert_eq!(r.state, ReservationState::CheckInRejected);
        assert!(!r.visible_in_app && !r.visible_in_admin);
        assert!(!r.eligible_for_timeout);
    }

    #[test]
    fn mark_timed_out_clears_eligibility() {
        let mut r = sample_reservation();
        r.mark_timed_out(Utc::now()).unwrap();
        assert!(r.timed_out);
        assert!(!r.eligible_for_timeout);
        assert!(!r.visible_in_app && !r.visible_in_admin);
        assert!(r.state.is_terminal());
    }

    #[test]
    fn mark_timed_out_is_idempotent_after_retained_eligibility() {
        let mut r = sample_reservation();
        r.mark_timed_out(Utc::now()).unwrap();

        // A sweep that could not finish its cleanup keeps the record
        // in reach, then marks again once the cleanup goes through
        r.retain_timeout_eligibility();
        assert!(r.eligible_for_timeout);

        r.mark_timed_out(Utc::now()).unwrap();
        assert!(r.timed_out);
        assert!(!r.eligible_for_timeout);
        assert_eq!(r.state, ReservationState::CheckInRejected);
    }

    #[test]
    fn hanger_ref_resolves_under_section() {
        let r = sample_reservation();
        let hanger_ref = r.hanger_ref().unwrap();
        assert_eq!(hanger_ref.section.section, r.section.id);
        assert_eq!(hanger_ref.hanger, r.hanger.unwrap());
    }

    #[test]
    fn serialization_roundtrip() {
        let r = sample_reservation();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["state"], "checking_in");
        assert_eq!(json["eligible_for_timeout"], true);
        let back: Reservation = serde_json::from_value(json).unwrap();
        assert_eq!(back, r);
    }
}
