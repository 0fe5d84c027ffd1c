use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coachline_core::models::{BookingIndexRow, BookingStatus};
use coachline_core::repository::BookingIndex;

use crate::database::DbClient;

/// Relational projection of the booking records, fed by the mirror queue.
/// Never authoritative; exists for fast lookup and reporting.
pub struct StoreBookingIndex {
    db: DbClient,
}

impl StoreBookingIndex {
    pub fn new(db: DbClient) -> Self {
        Self { db }
    }

    fn status_label(status: BookingStatus) -> &'static str {
        match status {
            BookingStatus::AwaitingPayment => "AWAITING_PAYMENT",
            BookingStatus::Paid => "PAID",
        }
    }
}

#[async_trait]
impl BookingIndex for StoreBookingIndex {
    async fn upsert(
        &self,
        row: &BookingIndexRow,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            r#"
            INSERT INTO booking_index (pnr, reservation_id, origin, destination, departure_date, total, status, updated_at, paid_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(pnr) DO UPDATE SET
                reservation_id = excluded.reservation_id,
                origin = excluded.origin,
                destination = excluded.destination,
                departure_date = excluded.departure_date,
                total = excluded.total,
                status = excluded.status,
                updated_at = excluded.updated_at,
                paid_at = COALESCE(excluded.paid_at, booking_index.paid_at)
            "#,
        )
        .bind(&row.pnr)
        .bind(row.reservation_id.as_deref())
        .bind(row.origin.as_deref())
        .bind(row.destination.as_deref())
        .bind(row.departure_date.as_deref())
        .bind(row.total)
        .bind(Self::status_label(row.status))
        .bind(row.updated_at.timestamp())
        .bind(row.paid_at.map(|t| t.timestamp()))
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    async fn mark_paid(
        &self,
        pnr: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            "UPDATE booking_index SET status = 'PAID', paid_at = ?, updated_at = ? WHERE pnr = ?",
        )
        .bind(paid_at.timestamp())
        .bind(Utc::now().timestamp())
        .bind(pnr)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(sqlx::FromRow)]
    struct IndexProbe {
        status: String,
        paid_at: Option<i64>,
    }

    fn row(pnr: &str) -> BookingIndexRow {
        BookingIndexRow {
            pnr: pnr.to_string(),
            reservation_id: Some("RSV-1".to_string()),
            origin: Some("Tallinn".to_string()),
            destination: Some("Riga".to_string()),
            departure_date: Some("2026-09-01".to_string()),
            total: Some(100.0),
            status: BookingStatus::AwaitingPayment,
            updated_at: Utc::now(),
            paid_at: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_then_mark_paid() {
        let db = DbClient::open_in_memory().await.unwrap();
        let index = StoreBookingIndex::new(db.clone());

        index.upsert(&row("AB12CD")).await.unwrap();
        index.upsert(&row("AB12CD")).await.unwrap();
        index.mark_paid("AB12CD", Utc::now()).await.unwrap();

        let probe = sqlx::query_as::<_, IndexProbe>(
            "SELECT status, paid_at FROM booking_index WHERE pnr = ?",
        )
        .bind("AB12CD")
        .fetch_one(db.pool())
        .await
        .unwrap();

        assert_eq!(probe.status, "PAID");
        assert!(probe.paid_at.is_some());
    }
}
