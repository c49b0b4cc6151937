//! Payment gateway trait and wire types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use domain::PaymentStatus;

use crate::error::Result;

/// Status of a payment intent as reported by the gateway.
///
/// The catch-all `Other` variant absorbs statuses introduced by the
/// gateway after this code was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IntentStatus {
    Succeeded,
    RequiresCapture,
    RequiresAction,
    RequiresPaymentMethod,
    RequiresConfirmation,
    Processing,
    Canceled,
    Other(String),
}

impl IntentStatus {
    /// Returns the gateway's wire name for the status.
    pub fn as_str(&self) -> &str {
        match self {
            IntentStatus::Succeeded => "succeeded",
            IntentStatus::RequiresCapture => "requires_capture",
            IntentStatus::RequiresAction => "requires_action",
            IntentStatus::RequiresPaymentMethod => "requires_payment_method",
            IntentStatus::RequiresConfirmation => "requires_confirmation",
            IntentStatus::Processing => "processing",
            IntentStatus::Canceled => "canceled",
            IntentStatus::Other(s) => s,
        }
    }

    /// Maps the gateway status onto the reservation's payment status.
    ///
    /// Total over every possible input: unrecognized statuses fall back
    /// to `Initial` rather than failing the caller.
    pub fn to_payment_status(&self) -> PaymentStatus {
        match self {
            IntentStatus::Succeeded => PaymentStatus::Captured,
            IntentStatus::RequiresCapture => PaymentStatus::Reserved,
            IntentStatus::RequiresAction
            | IntentStatus::RequiresPaymentMethod
            | IntentStatus::RequiresConfirmation => PaymentStatus::Initial,
            IntentStatus::Processing => {
                // Manual-capture holds settle synchronously; seeing this
                // status means the gateway is doing something unexpected.
                tracing::warn!(status = "processing", "unexpected intent status for a hold");
                PaymentStatus::Initial
            }
            IntentStatus::Canceled => PaymentStatus::Canceled,
            IntentStatus::Other(s) => {
                tracing::warn!(status = %s, "unrecognized intent status from gateway");
                PaymentStatus::Initial
            }
        }
    }
}

impl From<String> for IntentStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "succeeded" => IntentStatus::Succeeded,
            "requires_capture" => IntentStatus::RequiresCapture,
            "requires_action" => IntentStatus::RequiresAction,
            "requires_payment_method" => IntentStatus::RequiresPaymentMethod,
            "requires_confirmation" => IntentStatus::RequiresConfirmation,
            "processing" => IntentStatus::Processing,
            "canceled" => IntentStatus::Canceled,
            _ => IntentStatus::Other(s),
        }
    }
}

impl From<IntentStatus> for String {
    fn from(status: IntentStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A payment intent as returned by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: IntentStatus,
    /// Gateway-specific instructions when the guest must act (3DS etc).
    pub next_action: Option<Value>,
    /// Secret the client app needs to drive the confirmation UI.
    pub client_secret: Option<String>,
}

/// Parameters for opening a deposit hold.
#[derive(Debug, Clone)]
pub struct HoldRequest {
    /// Gateway customer the hold is placed against.
    pub customer: String,
    /// Saved payment method to use, if the guest picked one up front.
    pub payment_method: Option<String>,
    pub amount_cents: i64,
    pub currency: String,
}

/// Trait for payment gateway operations.
///
/// Holds are manual-capture and manual-confirmation: `create_hold` only
/// stages the intent, `confirm` places the actual hold on the card.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a new deposit hold intent.
    async fn create_hold(&self, request: HoldRequest) -> Result<PaymentIntent>;

    /// Confirms an intent, optionally supplying the payment method.
    async fn confirm(&self, intent_id: &str, payment_method: Option<&str>)
    -> Result<PaymentIntent>;

    /// Cancels an intent. Idempotent: canceling a canceled intent succeeds.
    async fn cancel(&self, intent_id: &str) -> Result<PaymentIntent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_exact() {
        assert_eq!(
            IntentStatus::Succeeded.to_payment_status(),
            PaymentStatus::Captured
        );
        assert_eq!(
            IntentStatus::RequiresCapture.to_payment_status(),
            PaymentStatus::Reserved
        );
        assert_eq!(
            IntentStatus::RequiresAction.to_payment_status(),
            PaymentStatus::Initial
        );
        assert_eq!(
            IntentStatus::RequiresPaymentMethod.to_payment_status(),
            PaymentStatus::Initial
        );
        assert_eq!(
            IntentStatus::RequiresConfirmation.to_payment_status(),
            PaymentStatus::Initial
        );
        assert_eq!(
            IntentStatus::Processing.to_payment_status(),
            PaymentStatus::Initial
        );
        assert_eq!(
            IntentStatus::Canceled.to_payment_status(),
            PaymentStatus::Canceled
        );
        assert_eq!(
            IntentStatus::Other("unknown_x".to_string()).to_payment_status(),
            PaymentStatus::Initial
        );
    }

    #[test]
    fn wire_roundtrip_preserves_unknown_statuses() {
        let parsed = IntentStatus::from("requires_capture".to_string());
        assert_eq!(parsed, IntentStatus::RequiresCapture);

        let unknown = IntentStatus::from("partially_funded".to_string());
        assert_eq!(unknown, IntentStatus::Other("partially_funded".to_string()));
        assert_eq!(String::from(unknown), "partially_funded");
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&IntentStatus::RequiresConfirmation).unwrap();
        assert_eq!(json, "\"requires_confirmation\"");
        let back: IntentStatus = serde_json::from_str("\"succeeded\"").unwrap();
        assert_eq!(back, IntentStatus::Succeeded);
    }
}
