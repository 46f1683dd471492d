//! SQLite backend.

use crate::codec::{decode_rate, encode_instant, encode_value};
use crate::{RateStore, StoreError};
use async_trait::async_trait;
use bcv_core::Rate;
use chrono::{DateTime, FixedOffset};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::debug;

/// Rate store in an embedded SQLite database.
#[derive(Clone)]
pub struct SqliteRateStore {
    pool: SqlitePool,
}

impl SqliteRateStore {
    /// Connect to a SQLite URL (`sqlite:rates.db`, `sqlite::memory:`) or a
    /// plain file path, creating the file and schema if missing.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = if database_url.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(database_url)?
        } else {
            SqliteConnectOptions::new().filename(database_url)
        }
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rates (
                effective_at TEXT NOT NULL UNIQUE,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl RateStore for SqliteRateStore {
    async fn upsert_many(&self, rates: &[Rate]) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for rate in rates {
            let result = sqlx::query(
                "INSERT INTO rates (effective_at, value) VALUES (?, ?) ON CONFLICT(effective_at) DO NOTHING",
            )
            .bind(encode_instant(&rate.effective_at))
            .bind(encode_value(&rate.value))
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        debug!(batch = rates.len(), inserted, "Stored rate batch");
        Ok(inserted)
    }

    async fn latest_at_or_before(
        &self,
        instant: DateTime<FixedOffset>,
    ) -> Result<Option<Rate>, StoreError> {
        let row = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT effective_at, value FROM rates
            WHERE effective_at <= ?
            ORDER BY effective_at DESC
            LIMIT 1
            "#,
        )
        .bind(encode_instant(&instant))
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(effective_at, value)| decode_rate(&effective_at, &value))
            .transpose()
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Rate>, StoreError> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT effective_at, value FROM rates ORDER BY effective_at DESC LIMIT ?",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|(effective_at, value)| decode_rate(effective_at, value))
            .collect()
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM rates")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract;
    use pretty_assertions::assert_eq;

    async fn memory_store() -> SqliteRateStore {
        SqliteRateStore::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        contract::upsert_is_idempotent(&memory_store().await).await;
    }

    #[tokio::test]
    async fn test_upsert_never_overwrites() {
        contract::upsert_never_overwrites(&memory_store().await).await;
    }

    #[tokio::test]
    async fn test_point_query_boundaries() {
        contract::point_query_boundaries(&memory_store().await).await;
    }

    #[tokio::test]
    async fn test_recent_n_reports_changes() {
        contract::recent_n_reports_changes(&memory_store().await).await;
    }

    #[tokio::test]
    async fn test_duplicate_instants_within_one_batch() {
        let store = memory_store().await;
        let batch = vec![
            contract::rate(2024, 5, 6, rust_decimal_macros::dec!(36.5)),
            contract::rate(2024, 5, 6, rust_decimal_macros::dec!(36.6)),
        ];
        assert_eq!(store.upsert_many(&batch).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store = memory_store().await;
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.recent_n(15).await.unwrap().is_empty());
        assert!(store
            .latest_at_or_before(contract::day(2025, 1, 1))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_connect_with_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rates.db");
        let path = path.to_str().unwrap();

        let store = SqliteRateStore::connect(path).await.unwrap();
        store
            .upsert_many(&[contract::rate(2024, 1, 2, rust_decimal_macros::dec!(36.1))])
            .await
            .unwrap();
        store.pool.close().await;

        let reopened = SqliteRateStore::connect(path).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
        reopened.pool.close().await;
    }
}
