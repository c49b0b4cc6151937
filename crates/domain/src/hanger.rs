//! Hangers and their typed repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::{HangerRef, SectionRef};
use doc_store::{
    DocQuery, DocStoreError, DocumentStore, FilterOp, Precondition, Revision, WriteResult,
    store::BatchOp,
};

use crate::error::Result;

/// Whether a hanger can take a new garment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HangerState {
    #[default]
    Available,
    Taken,
}

/// A physical hanger in a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hanger {
    pub state: HangerState,
    pub state_updated: DateTime<Utc>,
}

impl Hanger {
    /// A hanger that has never been claimed.
    pub fn available(now: DateTime<Utc>) -> Self {
        Self {
            state: HangerState::Available,
            state_updated: now,
        }
    }
}

/// A hanger read from the store together with its revision.
#[derive(Debug, Clone)]
pub struct StoredHanger {
    pub hanger_ref: HangerRef,
    pub hanger: Hanger,
    pub revision: Revision,
}

/// How often an idempotent release retries a lost revision race.
const MAX_RELEASE_ATTEMPTS: usize = 3;

/// Typed repository for hanger documents.
///
/// Every mutation is a revision-guarded write so that two racers for
/// the same hanger cannot both succeed.
#[derive(Clone)]
pub struct HangerStore<S> {
    store: S,
}

impl<S: DocumentStore> HangerStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Seeds a hanger document, used by admin tooling and tests.
    pub async fn create(&self, hanger_ref: &HangerRef, hanger: &Hanger) -> Result<WriteResult> {
        let data = serde_json::to_value(hanger)?;
        Ok(self.store.create(&hanger_ref.doc_path(), data).await?)
    }

    /// Reads one hanger.
    pub async fn get(&self, hanger_ref: &HangerRef) -> Result<Option<StoredHanger>> {
        let doc = self.store.get(&hanger_ref.doc_path()).await?;
        match doc {
            Some(doc) => Ok(Some(StoredHanger {
                hanger_ref: *hanger_ref,
                hanger: doc.to_typed()?,
                revision: doc.revision,
            })),
            None => Ok(None),
        }
    }

    /// Lists available hangers in a section, up to `limit`.
    ///
    /// No ordering guarantee; callers treat the result as a candidate
    /// batch and expect some entries to be stale by the time they act.
    pub async fn find_available(
        &self,
        section: &SectionRef,
        limit: usize,
    ) -> Result<Vec<StoredHanger>> {
        let docs = self
            .store
            .query(
                DocQuery::collection(common::Collection::Hangers)
                    .under(section.doc_path())
                    .filter("state", FilterOp::Eq, serde_json::json!("available"))
                    .limit(limit),
            )
            .await?;

        let mut hangers = Vec::with_capacity(docs.len());
        for doc in docs {
            let hanger_ref = section.hanger(doc.path.leaf_id().into());
            hangers.push(StoredHanger {
                hanger_ref,
                hanger: doc.to_typed()?,
                revision: doc.revision,
            });
        }
        Ok(hangers)
    }

    /// Claims a candidate hanger, guarded by the revision it was read at.
    ///
    /// Fails with `ConcurrencyConflict` when another reservation claimed
    /// the hanger first.
    pub async fn claim(&self, candidate: &StoredHanger, now: DateTime<Utc>) -> Result<WriteResult> {
        let claimed = Hanger {
            state: HangerState::Taken,
            state_updated: now,
        };
        let data = serde_json::to_value(&claimed)?;
        Ok(self
            .store
            .update(
                &candidate.hanger_ref.doc_path(),
                data,
                Precondition::revision(candidate.revision),
            )
            .await?)
    }

    /// Returns a hanger to `Available`. Idempotent.
    ///
    /// A lost revision race is retried from a fresh read a bounded number
    /// of times; an already-available hanger is success.
    pub async fn release(&self, hanger_ref: &HangerRef, now: DateTime<Utc>) -> Result<()> {
        let mut attempts = 0;
        loop {
            let Some(stored) = self.get(hanger_ref).await? else {
                return Err(DocStoreError::NotFound(hanger_ref.doc_path()).into());
            };
            if stored.hanger.state == HangerState::Available {
                return Ok(());
            }

            let released = Hanger {
                state: HangerState::Available,
                state_updated: now,
            };
            let data = serde_json::to_value(&released)?;
            match self
                .store
                .update(
                    &hanger_ref.doc_path(),
                    data,
                    Precondition::revision(stored.revision),
                )
                .await
            {
                Ok(_) => return Ok(()),
                Err(e @ DocStoreError::ConcurrencyConflict { .. }) => {
                    attempts += 1;
                    if attempts >= MAX_RELEASE_ATTEMPTS {
                        return Err(e.into());
                    }
                    tracing::debug!(hanger = %hanger_ref, attempts, "release lost a revision race, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Builds the release as a batch operation for atomic multi-document
    /// writes (the check-out path pairs it with the reservation update).
    pub fn batch_release(stored: &StoredHanger, now: DateTime<Utc>) -> Result<BatchOp> {
        let released = Hanger {
            state: HangerState::Available,
            state_updated: now,
        };
        Ok(BatchOp::update(
            stored.hanger_ref.doc_path(),
            serde_json::to_value(&released)?,
            Precondition::revision(stored.revision),
        ))
    }
}
