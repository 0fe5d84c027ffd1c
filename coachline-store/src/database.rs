use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::info;

/// The relational store: durable artifact cache, purchase-completion
/// records, and the denormalized booking index.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool<Sqlite>,
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS ticket_artifacts (
        pnr TEXT PRIMARY KEY,
        hold_pdf BLOB,
        hold_updated_at INTEGER,
        final_pdf BLOB,
        final_updated_at INTEGER,
        final_zip BLOB,
        final_zip_updated_at INTEGER,
        url TEXT,
        booked_by TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS purchases (
        pnr TEXT PRIMARY KEY,
        status TEXT,
        total REAL,
        currency TEXT,
        items TEXT NOT NULL DEFAULT '[]',
        tickets TEXT NOT NULL DEFAULT '[]',
        adult_price REAL,
        adult_count INTEGER,
        child_price REAL,
        child_count INTEGER,
        completed_at INTEGER
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS booking_index (
        pnr TEXT PRIMARY KEY,
        reservation_id TEXT,
        origin TEXT,
        destination TEXT,
        departure_date TEXT,
        total REAL,
        status TEXT NOT NULL,
        updated_at INTEGER NOT NULL,
        paid_at INTEGER
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_booking_index_reservation ON booking_index (reservation_id)",
];

impl DbClient {
    pub async fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io(e.to_string()))?;
        }

        let options =
            SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))
                .map_err(|e| DatabaseError::Connection(e.to_string()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        info!(path = %path.display(), "Ticket database opened");

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    pub async fn open_in_memory() -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    async fn init_schema(&self) -> Result<(), DatabaseError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Query error: {0}")]
    Query(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(e: sqlx::Error) -> Self {
        DatabaseError::Query(e.to_string())
    }
}
