use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coachline_core::artifact::validate;
use coachline_core::models::{ArtifactKind, ArtifactMeta, ArtifactRecord};
use coachline_core::repository::ArtifactStore;

use crate::database::DbClient;

pub struct StoreArtifactCache {
    db: DbClient,
}

impl StoreArtifactCache {
    pub fn new(db: DbClient) -> Self {
        Self { db }
    }
}

#[derive(sqlx::FromRow)]
struct ArtifactRow {
    pnr: String,
    hold_pdf: Option<Vec<u8>>,
    hold_updated_at: Option<i64>,
    final_pdf: Option<Vec<u8>>,
    final_updated_at: Option<i64>,
    final_zip: Option<Vec<u8>>,
    final_zip_updated_at: Option<i64>,
    url: Option<String>,
    booked_by: Option<String>,
}

fn timestamp_to_datetime(value: Option<i64>) -> Option<DateTime<Utc>> {
    value.and_then(|secs| DateTime::from_timestamp(secs, 0))
}

impl From<ArtifactRow> for ArtifactRecord {
    fn from(row: ArtifactRow) -> Self {
        ArtifactRecord {
            pnr: row.pnr,
            hold_pdf: row.hold_pdf,
            hold_updated_at: timestamp_to_datetime(row.hold_updated_at),
            final_pdf: row.final_pdf,
            final_updated_at: timestamp_to_datetime(row.final_updated_at),
            final_zip: row.final_zip,
            final_zip_updated_at: timestamp_to_datetime(row.final_zip_updated_at),
            url: row.url,
            booked_by: row.booked_by,
        }
    }
}

#[async_trait]
impl ArtifactStore for StoreArtifactCache {
    async fn get(
        &self,
        pnr: &str,
    ) -> Result<Option<ArtifactRecord>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query_as::<_, ArtifactRow>(
            "SELECT pnr, hold_pdf, hold_updated_at, final_pdf, final_updated_at, final_zip, final_zip_updated_at, url, booked_by FROM ticket_artifacts WHERE pnr = ?",
        )
        .bind(pnr)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(ArtifactRecord::from))
    }

    async fn put(
        &self,
        pnr: &str,
        kind: ArtifactKind,
        bytes: &[u8],
        meta: &ArtifactMeta,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // The cache must never hold bytes it cannot prove are well-formed.
        validate(kind, bytes)?;

        let sql = match kind {
            ArtifactKind::Hold => {
                r#"
                INSERT INTO ticket_artifacts (pnr, hold_pdf, hold_updated_at, url, booked_by)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(pnr) DO UPDATE SET
                    hold_pdf = excluded.hold_pdf,
                    hold_updated_at = excluded.hold_updated_at,
                    url = COALESCE(excluded.url, ticket_artifacts.url),
                    booked_by = COALESCE(excluded.booked_by, ticket_artifacts.booked_by)
                "#
            }
            ArtifactKind::Final => {
                r#"
                INSERT INTO ticket_artifacts (pnr, final_pdf, final_updated_at, url, booked_by)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(pnr) DO UPDATE SET
                    final_pdf = excluded.final_pdf,
                    final_updated_at = excluded.final_updated_at,
                    url = COALESCE(excluded.url, ticket_artifacts.url),
                    booked_by = COALESCE(excluded.booked_by, ticket_artifacts.booked_by)
                "#
            }
            ArtifactKind::FinalZip => {
                r#"
                INSERT INTO ticket_artifacts (pnr, final_zip, final_zip_updated_at, url, booked_by)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(pnr) DO UPDATE SET
                    final_zip = excluded.final_zip,
                    final_zip_updated_at = excluded.final_zip_updated_at,
                    url = COALESCE(excluded.url, ticket_artifacts.url),
                    booked_by = COALESCE(excluded.booked_by, ticket_artifacts.booked_by)
                "#
            }
        };

        sqlx::query(sql)
            .bind(pnr)
            .bind(bytes)
            .bind(Utc::now().timestamp())
            .bind(meta.url.as_deref())
            .bind(meta.booked_by.as_deref())
            .execute(self.db.pool())
            .await?;

        Ok(())
    }
}
