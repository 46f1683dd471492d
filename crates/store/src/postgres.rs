//! PostgreSQL backend.

use crate::{RateStore, StoreError};
use async_trait::async_trait;
use bcv_core::{source_offset, Rate};
use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::debug;

/// Rate store in a PostgreSQL database, using native `TIMESTAMPTZ` and
/// `NUMERIC(13, 4)` columns.
#[derive(Clone)]
pub struct PostgresRateStore {
    pool: PgPool,
}

impl PostgresRateStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rates (
                effective_at TIMESTAMP WITH TIME ZONE NOT NULL UNIQUE,
                value NUMERIC(13, 4) NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn to_rate((effective_at, value): (DateTime<Utc>, Decimal)) -> Rate {
    Rate::new(effective_at.with_timezone(&source_offset()), value)
}

#[async_trait]
impl RateStore for PostgresRateStore {
    async fn upsert_many(&self, rates: &[Rate]) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for rate in rates {
            let result = sqlx::query(
                "INSERT INTO rates (effective_at, value) VALUES ($1, $2) ON CONFLICT (effective_at) DO NOTHING",
            )
            .bind(rate.effective_at)
            .bind(rate.value)
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
        let row = sqlx::query_as::<_, (DateTime<Utc>, Decimal)>(
            r#"
            SELECT effective_at, value FROM rates
            WHERE effective_at <= $1
            ORDER BY effective_at DESC
            LIMIT 1
            "#,
        )
        .bind(instant)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(to_rate))
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Rate>, StoreError> {
        let rows = sqlx::query_as::<_, (DateTime<Utc>, Decimal)>(
            "SELECT effective_at, value FROM rates ORDER BY effective_at DESC LIMIT $1",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(to_rate).collect())
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
    //! These run against a disposable database named by `BCVBOT_TEST_PG_URL`:
    //! `cargo test -p bcv-store -- --ignored`

    use super::*;
    use crate::contract;

    async fn fresh_store() -> PostgresRateStore {
        let url = std::env::var("BCVBOT_TEST_PG_URL").expect("BCVBOT_TEST_PG_URL must be set");
        let store = PostgresRateStore::connect(&url).await.unwrap();
        sqlx::query("TRUNCATE rates").execute(&store.pool).await.unwrap();
        store
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL"]
    async fn test_postgres_store_contract() {
        contract::upsert_is_idempotent(&fresh_store().await).await;
        contract::upsert_never_overwrites(&fresh_store().await).await;
        contract::point_query_boundaries(&fresh_store().await).await;
        contract::recent_n_reports_changes(&fresh_store().await).await;
    }
}
