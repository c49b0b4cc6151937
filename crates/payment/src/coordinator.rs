//! Instrumented front for the payment gateway.

use crate::error::Result;
use crate::gateway::{HoldRequest, PaymentGateway, PaymentIntent};

/// Wraps a gateway with logging and metrics.
///
/// Every gateway call the rest of the system makes goes through here, so
/// this is the single place that counts holds, confirmations, and
/// cancellations.
#[derive(Clone)]
pub struct PaymentCoordinator<G> {
    gateway: G,
}

impl<G: PaymentGateway> PaymentCoordinator<G> {
    /// Creates a new coordinator over a gateway.
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Opens a deposit hold intent.
    #[tracing::instrument(skip(self, request), fields(customer = %request.customer, amount_cents = request.amount_cents))]
    pub async fn create_hold(&self, request: HoldRequest) -> Result<PaymentIntent> {
        metrics::counter!("payment_holds_created_total").increment(1);
        let intent = self.gateway.create_hold(request).await.inspect_err(|e| {
            metrics::counter!("payment_holds_failed_total").increment(1);
            tracing::warn!(error = %e, "hold creation failed");
        })?;
        tracing::info!(intent = %intent.id, status = %intent.status, "hold created");
        Ok(intent)
    }

    /// Confirms an intent, placing the actual hold on the card.
    #[tracing::instrument(skip(self, payment_method))]
    pub async fn confirm(
        &self,
        intent_id: &str,
        payment_method: Option<&str>,
    ) -> Result<PaymentIntent> {
        metrics::counter!("payment_confirms_total").increment(1);
        let intent = self
            .gateway
            .confirm(intent_id, payment_method)
            .await
            .inspect_err(|e| {
                metrics::counter!("payment_confirms_failed_total").increment(1);
                tracing::warn!(intent = %intent_id, error = %e, "confirmation failed");
            })?;
        tracing::info!(intent = %intent.id, status = %intent.status, "intent confirmed");
        Ok(intent)
    }

    /// Cancels an intent. Idempotent.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, intent_id: &str) -> Result<PaymentIntent> {
        metrics::counter!("payment_cancels_total").increment(1);
        let intent = self.gateway.cancel(intent_id).await.inspect_err(|e| {
            metrics::counter!("payment_cancels_failed_total").increment(1);
            tracing::warn!(intent = %intent_id, error = %e, "cancellation failed");
        })?;
        tracing::info!(intent = %intent.id, "intent canceled");
        Ok(intent)
    }
}
