use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use coachline_core::models::{BookingPatch, BookingRecord, Reservation};
use coachline_core::repository::{BookingStore, ReservationStore};
use tokio::sync::RwLock;

/// Document-store stand-in for the booking records, with the same per-key
/// merge-upsert semantics a real document store provides. The repository
/// traits keep the persistence strategy swappable.
#[derive(Default)]
pub struct InMemoryBookingStore {
    records: RwLock<HashMap<String, BookingRecord>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn get(
        &self,
        pnr: &str,
    ) -> Result<Option<BookingRecord>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.records.read().await.get(pnr).cloned())
    }

    async fn upsert(
        &self,
        pnr: &str,
        patch: &BookingPatch,
    ) -> Result<BookingRecord, Box<dyn std::error::Error + Send + Sync>> {
        let now = Utc::now();
        let mut records = self.records.write().await;
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
            .read()
            .await
            .values()
            .find(|record| record.reservation_id.as_deref() == Some(reservation_id))
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryReservationStore {
    records: RwLock<HashMap<String, Reservation>>,
}

impl InMemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn get(
        &self,
        reservation_id: &str,
    ) -> Result<Option<Reservation>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.records.read().await.get(reservation_id).cloned())
    }

    async fn upsert(
        &self,
        record: &Reservation,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.records
            .write()
            .await
            .insert(record.reservation_id.clone(), record.clone());
        Ok(())
    }

    async fn list(
        &self,
    ) -> Result<Vec<Reservation>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.records.read().await.values().cloned().collect())
    }
}
