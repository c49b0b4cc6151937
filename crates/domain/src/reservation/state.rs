//! Reservation state machine.

use serde::{Deserialize, Serialize};

/// The state of a reservation in its lifecycle.
///
/// State transitions:
/// ```text
/// CheckingIn ──► CheckedIn ──► CheckingOut ──► CheckedOut
///      │              │             │
///      └──────────────┴─────────────┴──► CheckInRejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReservationState {
    /// A hanger is claimed and a deposit hold is being placed.
    #[default]
    CheckingIn,

    /// Staff confirmed the garment is on the hanger.
    CheckedIn,

    /// The guest asked for the garment back.
    CheckingOut,

    /// The garment was returned and the hanger released (terminal state).
    CheckedOut,

    /// The reservation was rejected or timed out (terminal state).
    CheckInRejected,
}

/// Which surfaces a reservation shows up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    pub app: bool,
    pub admin: bool,
}

impl ReservationState {
    /// Returns true if staff can confirm the check-in in this state.
    pub fn can_confirm_check_in(&self) -> bool {
        matches!(self, ReservationState::CheckingIn)
    }

    /// Returns true if the guest can request a check-out in this state.
    pub fn can_request_check_out(&self) -> bool {
        matches!(self, ReservationState::CheckedIn)
    }

    /// Returns true if staff can confirm the check-out in this state.
    pub fn can_confirm_check_out(&self) -> bool {
        matches!(self, ReservationState::CheckingOut)
    }

    /// Returns true if the reservation can still be rejected.
    ///
    /// A completed check-out can no longer be rejected.
    pub fn can_reject(&self) -> bool {
        !matches!(
            self,
            ReservationState::CheckedOut | ReservationState::CheckInRejected
        )
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationState::CheckedOut | ReservationState::CheckInRejected
        )
    }

    /// The surfaces a reservation in this state appears on.
    ///
    /// Visibility is a pure function of the state. A pending check-in is
    /// only shown to the guest until staff confirms it; terminal states
    /// disappear from both surfaces.
    pub fn visibility(&self) -> Visibility {
        match self {
            ReservationState::CheckingIn => Visibility {
                app: true,
                admin: false,
            },
            ReservationState::CheckedIn | ReservationState::CheckingOut => Visibility {
                app: true,
                admin: true,
            },
            ReservationState::CheckedOut | ReservationState::CheckInRejected => Visibility {
                app: false,
                admin: false,
            },
        }
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationState::CheckingIn => "checking_in",
            ReservationState::CheckedIn => "checked_in",
            ReservationState::CheckingOut => "checking_out",
            ReservationState::CheckedOut => "checked_out",
            ReservationState::CheckInRejected => "check_in_rejected",
        }
    }
}

impl std::fmt::Display for ReservationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ReservationState; 5] = [
        ReservationState::CheckingIn,
        ReservationState::CheckedIn,
        ReservationState::CheckingOut,
        ReservationState::CheckedOut,
        ReservationState::CheckInRejected,
    ];

    #[test]
    fn test_default_state_is_checking_in() {
        assert_eq!(ReservationState::default(), ReservationState::CheckingIn);
    }

    #[test]
    fn test_only_checking_in_can_confirm_check_in() {
        assert!(ReservationState::CheckingIn.can_confirm_check_in());
        assert!(!ReservationState::CheckedIn.can_confirm_check_in());
        assert!(!ReservationState::CheckingOut.can_confirm_check_in());
        assert!(!ReservationState::CheckedOut.can_confirm_check_in());
        assert!(!ReservationState::CheckInRejected.can_confirm_check_in());
    }

    #[test]
    fn test_only_checked_in_can_request_check_out() {
        assert!(!ReservationState::CheckingIn.can_request_check_out());
        assert!(ReservationState::CheckedIn.can_request_check_out());
        assert!(!ReservationState::CheckingOut.can_request_check_out());
        assert!(!ReservationState::CheckedOut.can_request_check_out());
        assert!(!ReservationState::CheckInRejected.can_request_check_out());
    }

    #[test]
    fn test_only_checking_out_can_confirm_check_out() {
        assert!(!ReservationState::CheckingIn.can_confirm_check_out());
        assert!(!ReservationState::CheckedIn.can_confirm_check_out());
        assert!(ReservationState::CheckingOut.can_confirm_check_out());
        assert!(!ReservationState::CheckedOut.can_confirm_check_out());
        assert!(!ReservationState::CheckInRejected.can_confirm_check_out());
    }

    #[test]
    fn test_can_reject_from_non_terminal_states() {
        assert!(ReservationState::CheckingIn.can_reject());
        assert!(ReservationState::CheckedIn.can_reject());
        assert!(ReservationState::CheckingOut.can_reject());
        assert!(!ReservationState::CheckedOut.can_reject());
        assert!(!ReservationState::CheckInRejected.can_reject());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ReservationState::CheckingIn.is_terminal());
        assert!(!ReservationState::CheckedIn.is_terminal());
        assert!(!ReservationState::CheckingOut.is_terminal());
        assert!(ReservationState::CheckedOut.is_terminal());
        assert!(ReservationState::CheckInRejected.is_terminal());
    }

    #[test]
    fn test_visibility_table() {
        let v = ReservationState::CheckingIn.visibility();
        assert!(v.app && !v.admin);

        for state in [ReservationState::CheckedIn, ReservationState::CheckingOut] {
            let v = state.visibility();
            assert!(v.app && v.admin);
        }

        for state in [
            ReservationState::CheckedOut,
            ReservationState::CheckInRejected,
        ] {
            let v = state.visibility();
            assert!(!v.app && !v.admin);
        }
    }

    #[test]
    fn test_serialization_roundtrip() {
        for state in ALL {
            let json = serde_json::to_string(&state).unwrap();
            let back: ReservationState = serde_json::from_str(&json).unwrap();
            assert_eq!(back, state);
        }
        assert_eq!(
            serde_json::to_string(&ReservationState::CheckInRejected).unwrap(),
            "\"check_in_rejected\""
        );
    }
}
