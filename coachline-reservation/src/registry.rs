use std::sync::Arc;

use chrono::{DateTime, Utc};
use coachline_core::models::{Reservation, ReservationPatch, ReservationStatus};
use coachline_core::repository::ReservationStore;
use coachline_core::status::{derive_status, lease_expiry, normalize_lease};
use coachline_core::upstream::PaymentResult;

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Tracks one record per upstream reservation: lease, status, passenger
/// snapshot. Status is never trusted blindly; every read re-derives it
/// against the clock and persists the result.
pub struct ReservationRegistry {
    store: Arc<dyn ReservationStore>,
    clock: Clock,
}

impl ReservationRegistry {
    pub fn new(store: Arc<dyn ReservationStore>) -> Self {
        Self::with_clock(store, Arc::new(Utc::now))
    }

    /// Inject a clock for tests; `derive_status` stays pure either way.
    pub fn with_clock(store: Arc<dyn ReservationStore>, clock: Clock) -> Self {
        Self { store, clock }
    }

    /// Merge `patch` into the record for `reservation_id`, creating it if
    /// absent. Normalizes the lease, fills a missing expiry from it, and
    /// re-derives status before persisting.
    pub async fn upsert(
        &self,
        reservation_id: &str,
        patch: ReservationPatch,
    ) -> Result<Reservation, RegistryError> {
        let now = (self.clock)();
        let mut record = self
            .store
            .get(reservation_id)
            .await
            .map_err(RegistryError::Store)?
            .unwrap_or_else(|| {
                Reservation::new(
                    reservation_id.to_string(),
                    patch.created_at.unwrap_or(now),
                )
            });

        if let Some(status) = patch.status {
            record.status = status;
        }
        if let Some(trip) = patch.trip {
            record.trip = Some(trip);
        }
        if let Some(passenger_count) = patch.passenger_count {
            record.passenger_count = passenger_count;
        }
        if let Some(passengers) = patch.passengers {
            record.passengers = passengers;
        }
        if let Some(seat_ids) = patch.seat_ids {
            record.seat_ids = seat_ids;
        }
        if let Some(lease_seconds) = patch.lease_seconds {
            record.lease_seconds = normalize_lease(lease_seconds);
        }
        if let Some(created_at) = patch.created_at {
            record.created_at = created_at;
        }
        if let Some(expires_at) = patch.expires_at {
            record.expires_at = Some(expires_at);
        }
        if let Some(last_payment) = patch.last_payment {
            record.last_payment = Some(last_payment);
        }
        if let Some(last_print) = patch.last_print {
            record.last_print = Some(last_print);
        }
        if let Some(printed_at) = patch.printed_at {
            record.printed_at = Some(printed_at);
        }

        if record.expires_at.is_none() {
            record.expires_at = lease_expiry(record.created_at, record.lease_seconds);
        }
        record.status = derive_status(&record, now);

        self.store.upsert(&record).await.map_err(RegistryError::Store)?;
        Ok(record)
    }

    /// Read a record with status re-derived against the current clock. A
    /// status change observed here is persisted back, not just reported.
    pub async fn get(&self, reservation_id: &str) -> Result<Option<Reservation>, RegistryError> {
        let Some(mut record) = self
            .store
            .get(reservation_id)
            .await
            .map_err(RegistryError::Store)?
        else {
            return Ok(None);
        };

        let effective = derive_status(&record, (self.clock)());
        if effective != record.status {
            record.status = effective;
            self.store.upsert(&record).await.map_err(RegistryError::Store)?;
        }
        Ok(Some(record))
    }

    /// Terminal cancellation. No-op if the record does not exist.
    pub async fn mark_cancelled(&self, reservation_id: &str) -> Result<(), RegistryError> {
        let Some(mut record) = self
            .store
            .get(reservation_id)
            .await
            .map_err(RegistryError::Store)?
        else {
            return Ok(());
        };

        record.status = ReservationStatus::Cancelled;
        record.cancelled_at = Some((self.clock)());
        self.store.upsert(&record).await.map_err(RegistryError::Store)
    }

    /// Record a payment result. The raw result is stored for audit even on
    /// failure; the terminal `Paid` flag is only set on success, and wins
    /// even when the lease already ran out.
    pub async fn mark_paid(
        &self,
        reservation_id: &str,
        payment: &PaymentResult,
    ) -> Result<Reservation, RegistryError> {
        let mut record = self
            .store
            .get(reservation_id)
            .await
            .map_err(RegistryError::Store)?
            .ok_or_else(|| RegistryError::NotFound(reservation_id.to_string()))?;

        record.last_payment = Some(payment.raw.clone());
        if payment.success {
            record.status = ReservationStatus::Paid;
            record.paid_at = Some((self.clock)());
        }
        self.store.upsert(&record).await.map_err(RegistryError::Store)?;
        Ok(record)
    }

    /// All records, newest first, each re-derived (and persisted) the same
    /// way `get` does.
    pub async fn list(&self) -> Result<Vec<Reservation>, RegistryError> {
        let now = (self.clock)();
        let mut records = self.store.list().await.map_err(RegistryError::Store)?;

        for record in records.iter_mut() {
            let effective = derive_status(record, now);
            if effective != record.status {
                record.status = effective;
                self.store.upsert(record).await.map_err(RegistryError::Store)?;
            }
        }

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Reservation not found: {0}")]
    NotFound(String),

    #[error("Reservation store failed: {0}")]
    Store(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeStore {
        records: Mutex<HashMap<String, Reservation>>,
    }

    #[async_trait]
    impl ReservationStore for FakeStore {
        async fn get(
            &self,
            reservation_id: &str,
        ) -> Result<Option<Reservation>, Box<dyn std::error::Error + Send + Sync>> {
            Ok(self.records.lock().unwrap().get(reservation_id).cloned())
        }

        async fn upsert(
            &self,
            record: &Reservation,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.records
                .lock()
                .unwrap()
                .insert(record.reservation_id.clone(), record.clone());
            Ok(())
        }

        async fn list(
            &self,
        ) -> Result<Vec<Reservation>, Box<dyn std::error::Error + Send + Sync>> {
            Ok(self.records.lock().unwrap().values().cloned().collect())
        }
    }

    fn registry_at(
        t0: DateTime<Utc>,
    ) -> (ReservationRegistry, Arc<FakeStore>, Arc<Mutex<DateTime<Utc>>>) {
        let store = Arc::new(FakeStore::default());
        let now = Arc::new(Mutex::new(t0));
        let clock_now = now.clone();
        let registry = ReservationRegistry::with_clock(
            store.clone(),
            Arc::new(move || *clock_now.lock().unwrap()),
        );
        (registry, store, now)
    }

    fn lease_patch(lease_seconds: i64) -> ReservationPatch {
        ReservationPatch {
            lease_seconds: Some(lease_seconds),
            ..Default::default()
        }
    }

    fn payment(success: bool) -> PaymentResult {
        PaymentResult {
            success,
            amount: 49.0,
            method: "AGENT_CREDIT".to_string(),
            raw: serde_json::json!({"ok": success}),
        }
    }

    #[tokio::test]
    async fn test_lease_expiry_observed_on_read() {
        let t0 = Utc::now();
        let (registry, _store, now) = registry_at(t0);

        registry.upsert("RSV-1", lease_patch(60)).await.unwrap();

        *now.lock().unwrap() = t0 + Duration::seconds(30);
        let record = registry.get("RSV-1").await.unwrap().unwrap();
        assert_eq!(record.status, ReservationStatus::Reserved);

        *now.lock().unwrap() = t0 + Duration::seconds(90);
        let record = registry.get("RSV-1").await.unwrap().unwrap();
        assert_eq!(record.status, ReservationStatus::Expired);
    }

    #[tokio::test]
    async fn test_expired_status_is_persisted_back() {
        let t0 = Utc::now();
        let (registry, store, now) = registry_at(t0);

        registry.upsert("RSV-1", lease_patch(60)).await.unwrap();
        *now.lock().unwrap() = t0 + Duration::seconds(120);
        registry.get("RSV-1").await.unwrap();

        // The store itself must now hold EXPIRED, not just the read view.
        let stored = store.records.lock().unwrap().get("RSV-1").cloned().unwrap();
        assert_eq!(stored.status, ReservationStatus::Expired);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_per_id() {
        let t0 = Utc::now();
        let (registry, store, _now) = registry_at(t0);

        registry.upsert("RSV-1", lease_patch(60)).await.unwrap();
        registry
            .upsert(
                "RSV-1",
                ReservationPatch {
                    passenger_count: Some(3),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let records = store.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        let record = records.get("RSV-1").unwrap();
        assert_eq!(record.passenger_count, 3);
        assert_eq!(record.lease_seconds, 60);
    }

    #[tokio::test]
    async fn test_mark_paid_is_terminal_past_expiry() {
        let t0 = Utc::now();
        let (registry, _store, now) = registry_at(t0);

        registry.upsert("RSV-1", lease_patch(60)).await.unwrap();

        // Payment lands after the lease ran out; it still wins.
        *now.lock().unwrap() = t0 + Duration::seconds(300);
        registry.mark_paid("RSV-1", &payment(true)).await.unwrap();

        *now.lock().unwrap() = t0 + Duration::days(7);
        let record = registry.get("RSV-1").await.unwrap().unwrap();
        assert_eq!(record.status, ReservationStatus::Paid);
    }

    #[tokio::test]
    async fn test_failed_payment_keeps_status_but_stores_result() {
        let t0 = Utc::now();
        let (registry, _store, _now) = registry_at(t0);

        registry.upsert("RSV-1", lease_patch(600)).await.unwrap();
        let record = registry.mark_paid("RSV-1", &payment(false)).await.unwrap();

        assert_eq!(record.status, ReservationStatus::Reserved);
        assert!(record.last_payment.is_some());
    }

    #[tokio::test]
    async fn test_mark_cancelled_is_sticky_and_missing_is_noop() {
        let t0 = Utc::now();
        let (registry, _store, now) = registry_at(t0);

        registry.mark_cancelled("missing").await.unwrap();

        registry.upsert("RSV-1", lease_patch(60)).await.unwrap();
        registry.mark_cancelled("RSV-1").await.unwrap();

        *now.lock().unwrap() = t0 + Duration::days(1);
        let record = registry.get("RSV-1").await.unwrap().unwrap();
        assert_eq!(record.status, ReservationStatus::Cancelled);
        assert!(record.cancelled_at.is_some());
    }

    #[tokio::test]
    async fn test_list_orders_by_creation_descending() {
        let t0 = Utc::now();
        let (registry, _store, _now) = registry_at(t0);

        for (i, id) in ["RSV-1", "RSV-2", "RSV-3"].iter().enumerate() {
            registry
                .upsert(
                    id,
                    ReservationPatch {
                        created_at: Some(t0 + Duration::seconds(i as i64)),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }

        let records = registry.list().await.unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.reservation_id.as_str()).collect();
        assert_eq!(ids, vec!["RSV-3", "RSV-2", "RSV-1"]);
    }
}
