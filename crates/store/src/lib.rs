//! Durable storage for published rates.
//!
//! One `RateStore` contract with two interchangeable backends:
//! - `SqliteRateStore` - embedded, file-backed
//! - `PostgresRateStore` - networked relational store
//!
//! The backend is picked from the connection string by [`open_store`].

pub mod codec;
pub mod error;
pub mod postgres;
pub mod sqlite;

#[cfg(test)]
mod contract;

pub use error::StoreError;
pub use postgres::PostgresRateStore;
pub use sqlite::SqliteRateStore;

use async_trait::async_trait;
use bcv_core::{Rate, RateChange};
use chrono::{DateTime, FixedOffset};
use std::sync::Arc;
use tracing::info;

/// Keyed store of rates, unique on `effective_at`.
#[async_trait]
pub trait RateStore: Send + Sync {
    /// Insert every rate whose instant is not stored yet, in one transaction.
    /// Existing instants are left untouched. Returns the number of rows
    /// actually inserted.
    async fn upsert_many(&self, rates: &[Rate]) -> Result<u64, StoreError>;

    /// The rate with the greatest `effective_at` not after `instant`.
    async fn latest_at_or_before(
        &self,
        instant: DateTime<FixedOffset>,
    ) -> Result<Option<Rate>, StoreError>;

    /// Up to `limit` rates, most recent first.
    async fn recent(&self, limit: usize) -> Result<Vec<Rate>, StoreError>;

    /// Number of stored rates.
    async fn count(&self) -> Result<u64, StoreError>;

    /// Up to `limit` rates, most recent first, each with its change against
    /// the chronologically previous stored rate.
    async fn recent_n(&self, limit: usize) -> Result<Vec<RateChange>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let rates = self.recent(limit + 1).await?;
        Ok(RateChange::annotate(&rates, limit))
    }
}

/// Open the backend named by `database_url`.
///
/// `postgres://` and `postgresql://` URLs select PostgreSQL; anything else is
/// treated as a SQLite URL (`sqlite:...`) or file path.
pub async fn open_store(database_url: &str) -> Result<Arc<dyn RateStore>, StoreError> {
    let store: Arc<dyn RateStore> =
        if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
            info!("Using PostgreSQL rate store");
            Arc::new(PostgresRateStore::connect(database_url).await?)
        } else {
            info!(path = database_url, "Using SQLite rate store");
            Arc::new(SqliteRateStore::connect(database_url).await?)
        };
    Ok(store)
}
