use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    ArtifactKind, ArtifactMeta, ArtifactRecord, BookingIndexRow, BookingPatch, BookingRecord,
    PurchaseRecord, Reservation,
};

/// Store for reservation records, keyed by upstream reservation id.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn get(
        &self,
        reservation_id: &str,
    ) -> Result<Option<Reservation>, Box<dyn std::error::Error + Send + Sync>>;

    async fn upsert(
        &self,
        record: &Reservation,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn list(
        &self,
    ) -> Result<Vec<Reservation>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Document store holding booking records keyed by PNR. The system of
/// record; writes rely on the store's per-key merge semantics.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn get(
        &self,
        pnr: &str,
    ) -> Result<Option<BookingRecord>, Box<dyn std::error::Error + Send + Sync>>;

    /// Merge `patch` into the record for `pnr`, creating it if absent.
    /// Returns the merged record.
    async fn upsert(
        &self,
        pnr: &str,
        patch: &BookingPatch,
    ) -> Result<BookingRecord, Box<dyn std::error::Error + Send + Sync>>;

    /// Reverse lookup: the PNR currently pointing at a reservation id.
    async fn find_by_reservation(
        &self,
        reservation_id: &str,
    ) -> Result<Option<BookingRecord>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Relational mirror of the booking records. Written best-effort, after the
/// authoritative document-store write.
#[async_trait]
pub trait BookingIndex: Send + Sync {
    async fn upsert(
        &self,
        row: &BookingIndexRow,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn mark_paid(
        &self,
        pnr: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Durable cache of rendered artifacts, keyed by (PNR, kind).
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn get(
        &self,
        pnr: &str,
    ) -> Result<Option<ArtifactRecord>, Box<dyn std::error::Error + Send + Sync>>;

    /// Upsert one kind's payload, leaving the other kinds untouched.
    async fn put(
        &self,
        pnr: &str,
        kind: ArtifactKind,
        bytes: &[u8],
        meta: &ArtifactMeta,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Purchase-completion records in the relational store.
#[async_trait]
pub trait PurchaseStore: Send + Sync {
    async fn get(
        &self,
        pnr: &str,
    ) -> Result<Option<PurchaseRecord>, Box<dyn std::error::Error + Send + Sync>>;

    async fn put(
        &self,
        record: &PurchaseRecord,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
