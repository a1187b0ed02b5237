//! SQLite sink, behind the `sqlite` feature.
//!
//! A file-based backend for runs whose output should outlive the
//! process. Records upsert by their sink key, so re-running a city
//! refreshes rows instead of duplicating them.

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::error::{DiscoveryError, Result};
use crate::traits::RecordSink;
use crate::types::DoctorRecord;

pub struct SqliteSink {
    pool: SqlitePool,
}

impl SqliteSink {
    /// Connect and run migrations.
    ///
    /// # Example URLs
    /// - `sqlite::memory:` - ephemeral, for tests
    /// - `sqlite:./doctors.db?mode=rwc` - file, create if missing
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| DiscoveryError::Sink(e.into()))?;

        let sink = Self { pool };
        sink.run_migrations().await?;
        Ok(sink)
    }

    /// In-memory database, for testing.
    pub async fn in_memory() -> Result<Self> {
        Self::new("sqlite::memory:").await
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS doctors (
                key TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                rating REAL NOT NULL,
                review_count INTEGER NOT NULL,
                specialization TEXT NOT NULL,
                city TEXT NOT NULL,
                locations TEXT NOT NULL DEFAULT '[]',
                seed_source TEXT NOT NULL,
                contributing_sources TEXT NOT NULL DEFAULT '[]',
                confidence_score REAL NOT NULL,
                timestamp TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_doctors_city ON doctors(city);
            CREATE INDEX IF NOT EXISTS idx_doctors_specialization ON doctors(specialization);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DiscoveryError::Sink(e.into()))?;

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Count of stored rows.
    pub async fn len(&self) -> Result<u64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM doctors")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DiscoveryError::Sink(e.into()))?;
        Ok(count.0 as u64)
    }
}

#[async_trait]
impl RecordSink for SqliteSink {
    async fn persist(&self, records: &[DoctorRecord]) -> Result<()> {
        for record in records {
            let locations = serde_json::to_string(&record.locations)?;
            let sources = serde_json::to_string(&record.contributing_sources)?;
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO doctors (
                    key, name, rating, review_count, specialization, city,
                    locations, seed_source, contributing_sources,
                    confidence_score, timestamp
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(record.sink_key())
            .bind(&record.name)
            .bind(record.rating)
            .bind(record.review_count)
            .bind(&record.specialization)
            .bind(&record.city)
            .bind(locations)
            .bind(&record.seed_source)
            .bind(sources)
            .bind(record.confidence_score)
            .bind(record.timestamp.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| DiscoveryError::Sink(e.into()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> DoctorRecord {
        DoctorRecord::new(name, "cardiologist", "Mumbai", "practo")
            .unwrap()
            .with_rating(4.5)
            .with_reviews(100)
    }

    #[tokio::test]
    async fn test_persist_and_count() {
        let sink = SqliteSink::in_memory().await.unwrap();
        sink.persist(&[record("Dr. A"), record("Dr. B")])
            .await
            .unwrap();
        assert_eq!(sink.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_replace_by_key() {
        let sink = SqliteSink::in_memory().await.unwrap();
        sink.persist(&[record("Dr. A")]).await.unwrap();
        sink.persist(&[record("Dr. A").with_reviews(999)])
            .await
            .unwrap();
        assert_eq!(sink.len().await.unwrap(), 1);

        let (reviews,): (i64,) =
            sqlx::query_as("SELECT review_count FROM doctors LIMIT 1")
                .fetch_one(sink.pool())
                .await
                .unwrap();
        assert_eq!(reviews, 999);
    }
}
