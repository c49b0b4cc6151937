//! Periodic reclaim of abandoned reservations.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;

use doc_store::DocumentStore;
use domain::{DomainError, HangerStore, ReservationStore, StoredReservation};
use payment::{PaymentCoordinator, PaymentError, PaymentGateway};

use crate::error::Result;

/// Reclaimer timing knobs.
#[derive(Debug, Clone)]
pub struct ReclaimerConfig {
    /// How often the sweep runs.
    pub period: Duration,
    /// How old a pending reservation must be before it is reclaimed.
    /// At least the period, so nothing is swept before it had a fair
    /// chance to complete.
    pub delay: chrono::Duration,
    /// Maximum reservations processed per sweep.
    pub batch_limit: usize,
}

impl Default for ReclaimerConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(300),
            delay: chrono::Duration::minutes(5),
            batch_limit: 100,
        }
    }
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Reservations matched by the timeout query.
    pub matched: usize,
    /// Reservations whose cleanup fully succeeded.
    pub reclaimed: usize,
    /// Reservations with at least one failed sub-step, left for a later
    /// sweep or manual attention.
    pub incomplete: usize,
}

/// Sweeps reservations stuck in check-in past the delay threshold,
/// cancelling their hold, releasing their hanger, and closing them.
///
/// Different reservations are cleaned up concurrently, one task each;
/// a panicking task never cancels its siblings. Within one reservation
/// the three sub-steps run jointly and each failure is logged rather
/// than propagated. A reservation keeps its timeout eligibility until a
/// sweep completes every sub-step, so a partially-failed cleanup is
/// retried by later runs.
#[derive(Clone)]
pub struct TimeoutReclaimer<S, G> {
    reservations: ReservationStore<S>,
    hangers: HangerStore<S>,
    payments: PaymentCoordinator<G>,
    config: ReclaimerConfig,
}

impl<S, G> TimeoutReclaimer<S, G>
where
    S: DocumentStore + Clone + Send + Sync + 'static,
    G: PaymentGateway + Clone + Send + Sync + 'static,
{
    /// Creates a new reclaimer.
    pub fn new(store: S, gateway: G, config: ReclaimerConfig) -> Self {
        Self {
            reservations: ReservationStore::new(store.clone()),
            hangers: HangerStore::new(store),
            payments: PaymentCoordinator::new(gateway),
            config,
        }
    }

    /// Runs sweeps forever on the configured period.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.config.period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match self.sweep(Utc::now()).await {
                Ok(outcome) if outcome.matched > 0 => {
                    tracing::info!(
                        matched = outcome.matched,
                        reclaimed = outcome.reclaimed,
                        incomplete = outcome.incomplete,
                        "timeout sweep finished"
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "timeout sweep failed"),
            }
        }
    }

    /// Executes one sweep against the given clock reading.
    #[tracing::instrument(skip(self))]
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepOutcome> {
        let cutoff = now - self.config.delay;
        let candidates = self
            .reservations
            .find_timeout_candidates(cutoff, self.config.batch_limit)
            .await?;
        let matched = candidates.len();
        metrics::counter!("reclaimer_matched_total").increment(matched as u64);

        let mut tasks = JoinSet::new();
        for stored in candidates {
            let reclaimer = self.clone();
            tasks.spawn(async move { reclaimer.reclaim_one(stored, now).await });
        }

        let mut reclaimed = 0;
        let mut incomplete = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => reclaimed += 1,
                Ok(false) => incomplete += 1,
                Err(e) => {
                    tracing::error!(error = %e, "reclaim task panicked");
                    incomplete += 1;
                }
            }
        }

        metrics::counter!("reclaimer_reclaimed_total").increment(reclaimed as u64);
        Ok(SweepOutcome {
            matched,
            reclaimed,
            incomplete,
        })
    }

    /// Cleans up one reservation. Returns true when every sub-step
    /// succeeded.
    async fn reclaim_one(&self, stored: StoredReservation, now: DateTime<Utc>) -> bool {
        let id = stored.reservation.id;
        let intent_id = stored.reservation.payment_intent.clone();
        let hanger_ref = stored.reservation.hanger_ref();

        let cancel = async {
            match self.payments.cancel(&intent_id).await {
                Ok(_) => Ok(()),
                // Nothing to cancel is success
                Err(PaymentError::IntentNotFound(_)) => Ok(()),
                Err(e) => Err(e),
            }
        };
        let release = async {
            match hanger_ref {
                Some(ref hanger_ref) => self.hangers.release(hanger_ref, now).await,
                None => Ok(()),
            }
        };
        let mark = async {
            let mut reservation = stored.reservation.clone();
            reservation.mark_timed_out(now)?;
            let write = self.reservations.update(&reservation, stored.revision).await?;
            Ok::<_, DomainError>((reservation, write.revision))
        };

        let (cancel_result, release_result, mark_result) = tokio::join!(cancel, release, mark);

        let mut cleanup_ok = true;
        if let Err(e) = cancel_result {
            tracing::warn!(reservation = %id, error = %e, "failed to cancel hold during reclaim");
            cleanup_ok = false;
        }
        if let Err(e) = release_result {
            tracing::warn!(reservation = %id, error = %e, "failed to release hanger during reclaim");
            cleanup_ok = false;
        }

        let complete = match mark_result {
            Ok(_) if cleanup_ok => true,
            Ok((mut reservation, revision)) => {
                // The record is marked but the hold or hanger still needs
                // attention; put the reservation back in the sweep's reach
                // so the next run retries the failed sub-steps.
                reservation.retain_timeout_eligibility();
                if let Err(e) = self.reservations.update(&reservation, revision).await {
                    tracing::error!(reservation = %id, error = %e, "failed to retain timeout eligibility");
                }
                false
            }
            Err(e) => {
                // Eligibility stays set, the next sweep picks this one up again
                tracing::warn!(reservation = %id, error = %e, "failed to mark reservation timed out");
                false
            }
        };

        if complete {
            tracing::info!(reservation = %id, "reservation reclaimed");
        }
        complete
    }
}
