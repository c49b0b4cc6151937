//! Typed repository for reservation documents.

use chrono::{DateTime, Utc};

use common::{Collection, DocPath, ReservationId};
use doc_store::{
    DocQuery, DocumentStore, FilterOp, Precondition, Revision, WriteResult, store::BatchOp,
};

use crate::error::Result;
use crate::reservation::model::Reservation;

/// A reservation read from the store together with its revision.
#[derive(Debug, Clone)]
pub struct StoredReservation {
    pub reservation: Reservation,
    pub revision: Revision,
    pub updated_at: DateTime<Utc>,
}

/// Typed repository for reservation documents.
#[derive(Clone)]
pub struct ReservationStore<S> {
    store: S,
}

impl<S: DocumentStore> ReservationStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Path of a reservation document.
    pub fn path(id: ReservationId) -> DocPath {
        DocPath::root(Collection::Reservations, id)
    }

    /// Persists a new reservation.
    pub async fn create(&self, reservation: &Reservation) -> Result<WriteResult> {
        let data = serde_json::to_value(reservation)?;
        Ok(self
            .store
            .create(&Self::path(reservation.id), data)
            .await?)
    }

    /// Reads one reservation.
    pub async fn get(&self, id: ReservationId) -> Result<Option<StoredReservation>> {
        let doc = self.store.get(&Self::path(id)).await?;
        match doc {
            Some(doc) => Ok(Some(StoredReservation {
                reservation: doc.to_typed()?,
                revision: doc.revision,
                updated_at: doc.updated_at,
            })),
            None => Ok(None),
        }
    }

    /// Replaces a reservation, guarded by the revision it was read at.
    pub async fn update(
        &self,
        reservation: &Reservation,
        expected: Revision,
    ) -> Result<WriteResult> {
        let data = serde_json::to_value(reservation)?;
        Ok(self
            .store
            .update(
                &Self::path(reservation.id),
                data,
                Precondition::revision(expected),
            )
            .await?)
    }

    /// Secondary-index lookup by the stored gateway intent id.
    ///
    /// Intent ids are never reused, so at most one reservation matches.
    pub async fn find_by_payment_intent(&self, intent: &str) -> Result<Option<StoredReservation>> {
        let mut docs = self
            .store
            .query(
                DocQuery::collection(Collection::Reservations)
                    .filter("payment_intent", FilterOp::Eq, serde_json::json!(intent))
                    .limit(1),
            )
            .await?;

        match docs.pop() {
            Some(doc) => Ok(Some(StoredReservation {
                reservation: doc.to_typed()?,
                revision: doc.revision,
                updated_at: doc.updated_at,
            })),
            None => Ok(None),
        }
    }

    /// Reservations still eligible for timeout whose reservation time
    /// fell before the cutoff.
    pub async fn find_timeout_candidates(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<StoredReservation>> {
        let docs = self
            .store
            .query(
                DocQuery::collection(Collection::Reservations)
                    .filter("eligible_for_timeout", FilterOp::Eq, serde_json::json!(true))
                    .filter(
                        "reservation_time",
                        FilterOp::Lt,
                        serde_json::to_value(cutoff)?,
                    )
                    .limit(limit),
            )
            .await?;

        docs.into_iter()
            .map(|doc| {
                Ok(StoredReservation {
                    reservation: doc.to_typed()?,
                    revision: doc.revision,
                    updated_at: doc.updated_at,
                })
            })
            .collect()
    }

    /// Builds a guarded reservation update as a batch operation.
    pub fn batch_update(reservation: &Reservation, expected: Revision) -> Result<BatchOp> {
        Ok(BatchOp::update(
            Self::path(reservation.id),
            serde_json::to_value(reservation)?,
            Precondition::revision(expected),
        ))
    }
}
