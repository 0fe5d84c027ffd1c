use std::sync::Arc;

use chrono::Utc;
use coachline_core::identifier::BookingRef;
use coachline_core::models::{BookingIndexRow, BookingPatch, BookingRecord, BookingStatus};
use coachline_core::repository::BookingStore;
use coachline_core::upstream::PaymentResult;
use uuid::Uuid;

use crate::mirror::{MirrorJob, MirrorWriter};

/// Bidirectional mapping between the internally generated PNR and the
/// upstream reservation id. Writes go to the document store first (the
/// source of truth), then a denormalized projection is mirrored into the
/// relational store best-effort.
pub struct PnrMapper {
    bookings: Arc<dyn BookingStore>,
    mirror: MirrorWriter,
}

impl PnrMapper {
    pub fn new(bookings: Arc<dyn BookingStore>, mirror: MirrorWriter) -> Self {
        Self { bookings, mirror }
    }

    /// Generate a fresh 6-character booking reference.
    pub fn generate_pnr() -> String {
        Uuid::new_v4().simple().to_string()[..6].to_uppercase()
    }

    /// Decide what a caller-supplied reference is. Unresolved inputs are not
    /// an error; older records predate the mapping and use the raw string as
    /// a reservation id.
    pub async fn classify(&self, input: &str) -> Result<BookingRef, MapperError> {
        if self
            .bookings
            .get(input)
            .await
            .map_err(MapperError::Store)?
            .is_some()
        {
            return Ok(BookingRef::Pnr(input.to_string()));
        }
        if self
            .bookings
            .find_by_reservation(input)
            .await
            .map_err(MapperError::Store)?
            .is_some()
        {
            return Ok(BookingRef::ReservationId(input.to_string()));
        }
        Ok(BookingRef::Unresolved(input.to_string()))
    }

    /// Reverse lookup: the PNR currently pointing at a reservation id.
    pub async fn resolve_pnr_for_reservation(
        &self,
        reservation_id: &str,
    ) -> Result<Option<String>, MapperError> {
        Ok(self
            .bookings
            .find_by_reservation(reservation_id)
            .await
            .map_err(MapperError::Store)?
            .map(|booking| booking.pnr))
    }

    /// Fetch the booking record for a PNR.
    pub async fn get(&self, pnr: &str) -> Result<Option<BookingRecord>, MapperError> {
        self.bookings.get(pnr).await.map_err(MapperError::Store)
    }

    /// Resolve a reference to the reservation id other subsystems need.
    /// A PNR resolves through its mapping; anything else passes through.
    pub async fn reservation_id_for(&self, reference: &BookingRef) -> Result<Option<String>, MapperError> {
        match reference {
            BookingRef::Pnr(pnr) => Ok(self
                .bookings
                .get(pnr)
                .await
                .map_err(MapperError::Store)?
                .and_then(|booking| booking.reservation_id)),
            BookingRef::ReservationId(id) | BookingRef::Unresolved(id) => Ok(Some(id.clone())),
        }
    }

    /// Write/merge a mapping record. Re-running with the same PNR refreshes
    /// fields, never duplicates. The relational mirror write is queued and
    /// non-fatal.
    pub async fn upsert_mapping(
        &self,
        pnr: &str,
        reservation_id: &str,
        mut patch: BookingPatch,
    ) -> Result<BookingRecord, MapperError> {
        patch.reservation_id = Some(reservation_id.to_string());
        let booking = self
            .bookings
            .upsert(pnr, &patch)
            .await
            .map_err(MapperError::Store)?;

        self.mirror
            .enqueue(MirrorJob::Upsert(BookingIndexRow::project(&booking)));
        Ok(booking)
    }

    /// Flip the mapping to paid and stamp the payment time; mirrored
    /// best-effort like every other relational write.
    pub async fn mark_paid(
        &self,
        pnr: &str,
        payment: &PaymentResult,
    ) -> Result<BookingRecord, MapperError> {
        if !payment.success {
            return Err(MapperError::PaymentNotConfirmed(pnr.to_string()));
        }

        let paid_at = Utc::now();
        let patch = BookingPatch {
            status: Some(BookingStatus::Paid),
            paid_at: Some(paid_at),
            ..Default::default()
        };
        let booking = self
            .bookings
            .upsert(pnr, &patch)
            .await
            .map_err(MapperError::Store)?;

        self.mirror.enqueue(MirrorJob::MarkPaid {
            pnr: pnr.to_string(),
            paid_at,
        });
        Ok(booking)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    #[error("Payment not confirmed for {0}")]
    PaymentNotConfirmed(String),

    #[error("Booking store failed: {0}")]
    Store(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use coachline_core::repository::BookingIndex;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeBookingStore {
        records: Mutex<HashMap<String, BookingRecord>>,
    }

    #[async_trait]
    impl BookingStore for FakeBookingStore {
        async fn get(
            &self,
            pnr: &str,
        ) -> Result<Option<BookingRecord>, Box<dyn std::error::Error + Send + Sync>> {
            Ok(self.records.lock().unwrap().get(pnr).cloned())
        }

        async fn upsert(
            &self,
            pnr: &str,
            patch: &BookingPatch,
        ) -> Result<BookingRecord, Box<dyn std::error::Error + Send + Sync>> {
            let now = Utc::now();
            let mut records = self.records.lock().unwrap();
            let record = records
                .entry(pnr.to_string())
                .or_insert_with(|| BookingRecord::new(pnr.to_string(), now));
            record.apply(patch, now);
            Ok(record.clone())
        }

        async fn find_by_reservation(
            &self,
            reservation_id: &str,
        ) -> Result<Option<BookingRecord>, Box<dyn std::error::Error + Send + Sync>> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .values()
                .find(|b| b.reservation_id.as_deref() == Some(reservation_id))
                .cloned())
        }
    }

    struct NullIndex;

    #[async_trait]
    impl BookingIndex for NullIndex {
        async fn upsert(
            &self,
            _row: &BookingIndexRow,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Ok(())
        }

        async fn mark_paid(
            &self,
            _pnr: &str,
            _paid_at: DateTime<Utc>,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Ok(())
        }
    }

    fn mapper() -> (PnrMapper, Arc<FakeBookingStore>) {
        let store = Arc::new(FakeBookingStore::default());
        let writer = MirrorWriter::spawn(Arc::new(NullIndex), 8);
        (PnrMapper::new(store.clone(), writer), store)
    }

    fn success_payment() -> PaymentResult {
        PaymentResult {
            success: true,
            amount: 80.0,
            method: "AGENT_CREDIT".to_string(),
            raw: serde_json::json!({"ok": true}),
        }
    }

    #[tokio::test]
    async fn test_upsert_mapping_is_idempotent() {
        let (mapper, store) = mapper();

        mapper
            .upsert_mapping("AB12CD", "RSV-1", BookingPatch::default())
            .await
            .unwrap();
        mapper
            .upsert_mapping(
                "AB12CD",
                "RSV-1",
                BookingPatch {
                    total: Some(120.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let records = store.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        let booking = records.get("AB12CD").unwrap();
        assert_eq!(booking.reservation_id.as_deref(), Some("RSV-1"));
        assert_eq!(booking.total, Some(120.0));
    }

    #[tokio::test]
    async fn test_classify_covers_all_variants() {
        let (mapper, _store) = mapper();

        mapper
            .upsert_mapping("AB12CD", "RSV-1", BookingPatch::default())
            .await
            .unwrap();

        assert_eq!(
            mapper.classify("AB12CD").await.unwrap(),
            BookingRef::Pnr("AB12CD".to_string())
        );
        assert_eq!(
            mapper.classify("RSV-1").await.unwrap(),
            BookingRef::ReservationId("RSV-1".to_string())
        );
        assert_eq!(
            mapper.classify("legacy-99").await.unwrap(),
            BookingRef::Unresolved("legacy-99".to_string())
        );
    }

    #[tokio::test]
    async fn test_unresolved_reference_passes_through_as_reservation_id() {
        let (mapper, _store) = mapper();

        let reference = BookingRef::Unresolved("legacy-99".to_string());
        assert_eq!(
            mapper.reservation_id_for(&reference).await.unwrap(),
            Some("legacy-99".to_string())
        );
    }

    #[tokio::test]
    async fn test_reverse_lookup_finds_pnr() {
        let (mapper, _store) = mapper();

        mapper
            .upsert_mapping("AB12CD", "RSV-1", BookingPatch::default())
            .await
            .unwrap();

        assert_eq!(
            mapper.resolve_pnr_for_reservation("RSV-1").await.unwrap(),
            Some("AB12CD".to_string())
        );
        assert_eq!(mapper.resolve_pnr_for_reservation("RSV-2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_mark_paid_flips_status_and_stamps_time() {
        let (mapper, _store) = mapper();

        mapper
            .upsert_mapping("AB12CD", "RSV-1", BookingPatch::default())
            .await
            .unwrap();
        let booking = mapper.mark_paid("AB12CD", &success_payment()).await.unwrap();

        assert_eq!(booking.status, BookingStatus::Paid);
        assert!(booking.paid_at.is_some());
    }

    #[test]
    fn test_generated_pnr_shape() {
        let pnr = PnrMapper::generate_pnr();
        assert_eq!(pnr.len(), 6);
        assert!(pnr.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(pnr, pnr.to_uppercase());
    }
}
