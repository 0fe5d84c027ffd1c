use async_trait::async_trait;
use chrono::DateTime;
use coachline_core::models::{PurchaseItem, PurchaseRecord};
use coachline_core::repository::PurchaseStore;
use serde_json::Value;

use crate::database::DbClient;

pub struct StorePurchaseRepository {
    db: DbClient,
}

impl StorePurchaseRepository {
    pub fn new(db: DbClient) -> Self {
        Self { db }
    }
}

#[derive(sqlx::FromRow)]
struct PurchaseRow {
    pnr: String,
    status: Option<String>,
    total: Option<f64>,
    currency: Option<String>,
    items: String,
    tickets: String,
    adult_price: Option<f64>,
    adult_count: Option<i64>,
    child_price: Option<f64>,
    child_count: Option<i64>,
    completed_at: Option<i64>,
}

impl PurchaseRow {
    fn into_record(self) -> PurchaseRecord {
        let items: Vec<PurchaseItem> = serde_json::from_str(&self.items).unwrap_or_default();
        let tickets: Vec<Value> = serde_json::from_str(&self.tickets).unwrap_or_default();
        PurchaseRecord {
            pnr: self.pnr,
            status: self.status,
            total: self.total,
            currency: self.currency,
            items,
            tickets,
            adult_price: self.adult_price,
            adult_count: self.adult_count.map(|c| c.max(0) as u32),
            child_price: self.child_price,
            child_count: self.child_count.map(|c| c.max(0) as u32),
            completed_at: self
                .completed_at
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        }
    }
}

#[async_trait]
impl PurchaseStore for StorePurchaseRepository {
    async fn get(
        &self,
        pnr: &str,
    ) -> Result<Option<PurchaseRecord>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query_as::<_, PurchaseRow>(
            "SELECT pnr, status, total, currency, items, tickets, adult_price, adult_count, child_price, child_count, completed_at FROM purchases WHERE pnr = ?",
        )
        .bind(pnr)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(PurchaseRow::into_record))
    }

    async fn put(
        &self,
        record: &PurchaseRecord,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let items = serde_json::to_string(&record.items)?;
        let tickets = serde_json::to_string(&record.tickets)?;

        sqlx::query(
            r#"
            INSERT INTO purchases (pnr, status, total, currency, items, tickets, adult_price, adult_count, child_price, child_count, completed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(pnr) DO UPDATE SET
                status = excluded.status,
                total = excluded.total,
                currency = excluded.currency,
                items = excluded.items,
                tickets = excluded.tickets,
                adult_price = excluded.adult_price,
                adult_count = excluded.adult_count,
                child_price = excluded.child_price,
                child_count = excluded.child_count,
                completed_at = excluded.completed_at
            "#,
        )
        .bind(&record.pnr)
        .bind(record.status.as_deref())
        .bind(record.total)
        .bind(record.currency.as_deref())
        .bind(items)
        .bind(tickets)
        .bind(record.adult_price)
        .bind(record.adult_count.map(|c| c as i64))
        .bind(record.child_price)
        .bind(record.child_count.map(|c| c as i64))
        .bind(record.completed_at.map(|t| t.timestamp()))
        .execute(self.db.pool())
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[tokio::test]
    async fn test_purchase_round_trips_through_sqlite() {
        let db = DbClient::open_in_memory().await.unwrap();
        let repo = StorePurchaseRepository::new(db);

        let record = PurchaseRecord {
            pnr: "AB12CD".to_string(),
            status: Some("purchase_completed".to_string()),
            total: Some(88.5),
            currency: Some("EUR".to_string()),
            items: vec![PurchaseItem {
                description: Some("Tallinn - Riga".to_string()),
                price: Some(44.25),
                category: Some("adult".to_string()),
            }],
            tickets: vec![json!({"ticket_no": "T1"})],
            adult_price: Some(44.25),
            adult_count: Some(2),
            child_price: None,
            child_count: None,
            completed_at: Some(Utc::now()),
        };
        repo.put(&record).await.unwrap();

        let loaded = repo.get("AB12CD").await.unwrap().unwrap();
        assert_eq!(loaded.status.as_deref(), Some("purchase_completed"));
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.items[0].price, Some(44.25));
        assert_eq!(loaded.tickets.len(), 1);
        assert_eq!(loaded.adult_count, Some(2));
        assert!(loaded.completed_at.is_some());

        assert!(repo.get("MISSING").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_upserts_by_pnr() {
        let db = DbClient::open_in_memory().await.unwrap();
        let repo = StorePurchaseRepository::new(db);

        let mut record = PurchaseRecord {
            pnr: "AB12CD".to_string(),
            status: Some("pending".to_string()),
            total: None,
            currency: None,
            items: Vec::new(),
            tickets: Vec::new(),
            adult_price: None,
            adult_count: None,
            child_price: None,
            child_count: None,
            completed_at: None,
        };
        repo.put(&record).await.unwrap();

        record.status = Some("completed".to_string());
        repo.put(&record).await.unwrap();

        let loaded = repo.get("AB12CD").await.unwrap().unwrap();
        assert_eq!(loaded.status.as_deref(), Some("completed"));
    }
}
