//! Ingestion cycle: discover spreadsheets, extract their rates and store
//! the new ones.

use crate::{CycleAborted, IngestError};
use bcv_core::Rate;
use bcv_feeds::{FeedError, ParseError, RateExtractor, SheetLocator, Transport, WorkbookExtractor};
use bcv_store::RateStore;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Outcome of one ingestion cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Rows inserted across all processed spreadsheets
    pub new_rows: u64,
    /// Spreadsheets downloaded
    pub sheets_processed: usize,
    /// Spreadsheets skipped because they could not be parsed
    pub sheets_skipped: usize,
    /// Whether processing stopped at an already-known spreadsheet
    pub stopped_early: bool,
}

/// Orchestrates discovery, extraction and storage.
///
/// The listing is newest first, so the first spreadsheet that adds nothing
/// means every older one is already stored and the cycle stops there.
pub struct IngestionService<X: RateExtractor = WorkbookExtractor> {
    locator: SheetLocator,
    transport: Arc<dyn Transport>,
    extractor: X,
    store: Arc<dyn RateStore>,
}

impl<X: RateExtractor> IngestionService<X> {
    pub fn new(
        transport: Arc<dyn Transport>,
        listing_url: Url,
        extractor: X,
        store: Arc<dyn RateStore>,
    ) -> Self {
        Self {
            locator: SheetLocator::new(transport.clone(), listing_url),
            transport,
            extractor,
            store,
        }
    }

    /// Run one cycle.
    ///
    /// Spreadsheets are processed strictly in listing order. A spreadsheet
    /// that fails to parse is skipped as a whole; transport, layout and
    /// store failures abort the cycle. An aborted cycle still reports what
    /// it stored before failing.
    pub async fn run(&self) -> Result<IngestReport, CycleAborted> {
        let mut report = IngestReport::default();

        match self.ingest(&mut report).await {
            Ok(()) => {
                info!(
                    new_rows = report.new_rows,
                    sheets = report.sheets_processed,
                    skipped = report.sheets_skipped,
                    "Ingestion cycle finished"
                );
                Ok(report)
            }
            Err(source) => Err(CycleAborted { report, source }),
        }
    }

    async fn ingest(&self, report: &mut IngestReport) -> Result<(), IngestError> {
        let urls = self.locator.discover().await?;

        for url in urls {
            let bytes = self
                .transport
                .fetch_bytes(&url)
                .await
                .map_err(FeedError::from)?;
            report.sheets_processed += 1;

            let rates = match self.extract_all(bytes) {
                Ok(rates) => rates,
                Err(e) => {
                    warn!(%url, error = %e, "Skipping malformed spreadsheet");
                    report.sheets_skipped += 1;
                    continue;
                }
            };

            let inserted = self.store.upsert_many(&rates).await?;
            report.new_rows += inserted;
            debug!(%url, worksheets = rates.len(), inserted, "Processed spreadsheet");

            if inserted == 0 {
                debug!(%url, "Spreadsheet already stored, older ones are too");
                report.stopped_early = true;
                break;
            }
        }

        Ok(())
    }

    /// All worksheets of one spreadsheet, or the first error.
    fn extract_all(&self, bytes: Vec<u8>) -> Result<Vec<Rate>, ParseError> {
        self.extractor.extract(bytes)?.collect()
    }
}
