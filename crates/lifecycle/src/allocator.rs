//! Hanger allocation.

use chrono::{DateTime, Utc};

use common::{HangerRef, SectionRef};
use doc_store::{DocStoreError, DocumentStore, Revision};
use domain::{DomainError, HangerStore};

use crate::error::{LifecycleError, Result};

/// How many re-query passes a claim makes before giving up.
pub const MAX_CLAIM_ATTEMPTS: usize = 3;

/// How many candidates each pass pulls from the store.
const CANDIDATE_BATCH: usize = 8;

/// A hanger successfully claimed for a reservation.
#[derive(Debug, Clone)]
pub struct ClaimedHanger {
    pub hanger_ref: HangerRef,
    /// Revision after the claim write.
    pub revision: Revision,
}

/// Claims and releases hangers with optimistic concurrency.
///
/// The store gives no ordering guarantee on candidates, so concurrent
/// claimants tend to spread over different hangers instead of all
/// fighting over the first one.
#[derive(Clone)]
pub struct HangerAllocator<S> {
    hangers: HangerStore<S>,
}

impl<S: DocumentStore> HangerAllocator<S> {
    pub fn new(hangers: HangerStore<S>) -> Self {
        Self { hangers }
    }

    /// Claims one available hanger in the section.
    ///
    /// Losing a revision race on one candidate moves on to the next;
    /// exhausting a candidate batch re-queries, up to `MAX_CLAIM_ATTEMPTS`
    /// passes. Only when the section is genuinely out of hangers does
    /// this surface `CapacityExhausted`.
    #[tracing::instrument(skip(self), fields(section = %section))]
    pub async fn claim_one(
        &self,
        section: &SectionRef,
        now: DateTime<Utc>,
    ) -> Result<ClaimedHanger> {
        for pass in 0..MAX_CLAIM_ATTEMPTS {
            let candidates = self.hangers.find_available(section, CANDIDATE_BATCH).await?;
            if candidates.is_empty() {
                break;
            }

            for candidate in candidates {
                match self.hangers.claim(&candidate, now).await {
                    Ok(write) => {
                        metrics::counter!("hangers_claimed_total").increment(1);
                        tracing::debug!(hanger = %candidate.hanger_ref, pass, "hanger claimed");
                        return Ok(ClaimedHanger {
                            hanger_ref: candidate.hanger_ref,
                            revision: write.revision,
                        });
                    }
                    Err(DomainError::Store(DocStoreError::ConcurrencyConflict { .. })) => {
                        // Someone else got this one, try the next candidate
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        metrics::counter!("hangers_claim_exhausted_total").increment(1);
        Err(LifecycleError::CapacityExhausted {
            section: section.to_string(),
        })
    }

    /// Returns a hanger to the available pool. Idempotent.
    #[tracing::instrument(skip(self), fields(hanger = %hanger_ref))]
    pub async fn release(&self, hanger_ref: &HangerRef, now: DateTime<Utc>) -> Result<()> {
        self.hangers.release(hanger_ref, now).await?;
        metrics::counter!("hangers_released_total").increment(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{HangerId, SectionId, VenueId, WardrobeId};
    use doc_store::InMemoryDocStore;
    use domain::Hanger;
    use std::sync::Arc;

    fn section() -> SectionRef {
        SectionRef::new(VenueId::new(), WardrobeId::new(), SectionId::new())
    }

    async fn seed(store: &HangerStore<InMemoryDocStore>, section: &SectionRef, n: usize) {
        for _ in 0..n {
            store
                .create(&section.hanger(HangerId::new()), &Hanger::available(Utc::now()))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn claims_an_available_hanger() {
        let hangers = HangerStore::new(InMemoryDocStore::new());
        let section = section();
        seed(&hangers, &section, 2).await;

        let allocator = HangerAllocator::new(hangers.clone());
        let claimed = allocator.claim_one(&section, Utc::now()).await.unwrap();

        let stored = hangers.get(&claimed.hanger_ref).await.unwrap().unwrap();
        assert_eq!(stored.hanger.state, domain::HangerState::Taken);
        assert_eq!(hangers.find_available(&section, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_section_exhausts_immediately() {
        let allocator = HangerAllocator::new(HangerStore::new(InMemoryDocStore::new()));
        let result = allocator.claim_one(&section(), Utc::now()).await;
        assert!(matches!(
            result,
            Err(LifecycleError::CapacityExhausted { .. })
        ));
    }

    #[tokio::test]
    async fn concurrent_claims_on_one_hanger_have_single_winner() {
        let hangers = HangerStore::new(InMemoryDocStore::new());
        let section = section();
        seed(&hangers, &section, 1).await;

        let allocator = Arc::new(HangerAllocator::new(hangers));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let allocator = allocator.clone();
            let section = section;
            handles.push(tokio::spawn(async move {
                allocator.claim_one(&section, Utc::now()).await
            }));
        }

        let mut winners = 0;
        let mut exhausted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => winners += 1,
                Err(LifecycleError::CapacityExhausted { .. }) => exhausted += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(exhausted, 3);
    }

    #[tokio::test]
    async fn release_makes_hanger_claimable_again() {
        let hangers = HangerStore::new(InMemoryDocStore::new());
        let section = section();
        seed(&hangers, &section, 1).await;

        let allocator = HangerAllocator::new(hangers);
        let claimed = allocator.claim_one(&section, Utc::now()).await.unwrap();

        allocator.release(&claimed.hanger_ref, Utc::now()).await.unwrap();
        let reclaimed = allocator.claim_one(&section, Utc::now()).await.unwrap();
        assert_eq!(reclaimed.hanger_ref, claimed.hanger_ref);
    }
}
