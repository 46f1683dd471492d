//! Background rate updater.
//!
//! Runs ingestion cycles back to back: ingest, announce what is new, then
//! sleep for as long as the scheduler says.

use bcv_alerts::Notifier;
use bcv_engine::{IngestionService, PollScheduler};
use bcv_feeds::RateExtractor;
use tracing::{error, info, warn};

/// Run one cycle and return how many new rates it stored.
///
/// A failed cycle is logged and counts as having found nothing, but the
/// rates it stored before failing are still announced.
pub async fn run_cycle<X: RateExtractor>(
    ingestion: &IngestionService<X>,
    notifier: &Notifier,
) -> u64 {
    match ingestion.run().await {
        Ok(report) => {
            announce(notifier, report.new_rows).await;
            report.new_rows
        }
        Err(aborted) => {
            if aborted.is_transient() {
                warn!(
                    error = %aborted,
                    stored = aborted.report.new_rows,
                    "Rate update failed, will retry"
                );
            } else {
                error!(
                    error = %aborted,
                    stored = aborted.report.new_rows,
                    "Rate update failed"
                );
            }
            announce(notifier, aborted.report.new_rows).await;
            0
        }
    }
}

async fn announce(notifier: &Notifier, new_rows: u64) {
    if new_rows == 0 {
        return;
    }
    info!(new_rows, "New rates stored");
    match notifier.broadcast_new_rates(new_rows).await {
        Ok(sent) => info!(sent, "New rates announced"),
        Err(e) => error!(error = %e, "Failed to announce new rates"),
    }
}

/// Run the update loop forever.
pub async fn run_rate_updater<X: RateExtractor>(
    ingestion: IngestionService<X>,
    notifier: Notifier,
    scheduler: PollScheduler,
) {
    info!("Starting rate updater");

    loop {
        let new_rows = run_cycle(&ingestion, &notifier).await;
        let delay = scheduler.delay_from_now(new_rows);
        info!(
            new_rows,
            delay_secs = delay.as_secs(),
            "Next rate check scheduled"
        );
        tokio::time::sleep(delay).await;
    }
}
