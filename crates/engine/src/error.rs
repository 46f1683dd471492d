//! Ingestion errors.

use crate::IngestReport;
use bcv_feeds::FeedError;
use bcv_store::StoreError;
use thiserror::Error;

/// Errors that abort an ingestion cycle.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl IngestError {
    /// Returns true if the next scheduled cycle is likely to succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            IngestError::Feed(err) => err.is_transient(),
            IngestError::Store(_) => true,
        }
    }
}

/// A cycle that failed part-way.
///
/// Batches stored before the failure stay stored; `report` counts them so
/// they can still be announced.
#[derive(Error, Debug)]
#[error("Ingestion cycle aborted: {source}")]
pub struct CycleAborted {
    pub report: IngestReport,
    pub source: IngestError,
}

impl CycleAborted {
    pub fn is_transient(&self) -> bool {
        self.source.is_transient()
    }
}
