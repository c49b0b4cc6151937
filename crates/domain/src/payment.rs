//! Payment status as mirrored onto a reservation.

use serde::{Deserialize, Serialize};

/// Where the deposit payment stands.
///
/// The variants are declared in progression order so that comparisons
/// read naturally: a `Reserved` hold has progressed further than
/// `Initial`, a `Captured` deposit further still, and the negative
/// outcomes sort below all of them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// The deposit was returned to the guest.
    Refunded,

    /// The payment intent was canceled before any money moved.
    Canceled,

    /// No hold has been placed yet, or the gateway still needs input.
    #[default]
    Initial,

    /// The deposit is held on the guest's card but not captured.
    Reserved,

    /// The deposit has been captured.
    Captured,
}

impl PaymentStatus {
    /// Returns true once a hold or capture is in place.
    pub fn is_secured(&self) -> bool {
        matches!(self, PaymentStatus::Reserved | PaymentStatus::Captured)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Canceled => "canceled",
            PaymentStatus::Initial => "initial",
            PaymentStatus::Reserved => "reserved",
            PaymentStatus::Captured => "captured",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_initial() {
        assert_eq!(PaymentStatus::default(), PaymentStatus::Initial);
    }

    #[test]
    fn progression_order() {
        assert!(PaymentStatus::Refunded < PaymentStatus::Canceled);
        assert!(PaymentStatus::Canceled < PaymentStatus::Initial);
        assert!(PaymentStatus::Initial < PaymentStatus::Reserved);
        assert!(PaymentStatus::Reserved < PaymentStatus::Captured);
    }

    #[test]
    fn secured_statuses() {
        assert!(PaymentStatus::Reserved.is_secured());
        assert!(PaymentStatus::Captured.is_secured());
        assert!(!PaymentStatus::Initial.is_secured());
        assert!(!PaymentStatus::Canceled.is_secured());
        assert!(!PaymentStatus::Refunded.is_secured());
    }

    #[test]
    fn serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Reserved).unwrap(),
            "\"reserved\""
        );
        let back: PaymentStatus = serde_json::from_str("\"captured\"").unwrap();
        assert_eq!(back, PaymentStatus::Captured);
    }
}
