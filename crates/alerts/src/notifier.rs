//! New-rate broadcasts.

use crate::messages::format_update_message;
use crate::telegram::TelegramError;
use async_trait::async_trait;
use bcv_store::{RateStore, StoreError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Telegram error: {0}")]
    Telegram(#[from] TelegramError),
}

/// Sends a text message to a chat or channel.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn broadcast(&self, recipient: &str, text: &str) -> Result<(), TelegramError>;
}

/// Configuration for the notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierConfig {
    /// Channel username (`@name`) or numeric chat id receiving broadcasts.
    pub channel: String,
    /// Most rates announced after a single cycle.
    pub max_batch: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            channel: "@bcvdolarbot".to_string(),
            max_batch: 15,
        }
    }
}

/// Announces freshly stored rates.
pub struct Notifier {
    store: Arc<dyn RateStore>,
    sink: Arc<dyn Broadcaster>,
    config: NotifierConfig,
}

impl Notifier {
    pub fn new(
        store: Arc<dyn RateStore>,
        sink: Arc<dyn Broadcaster>,
        config: NotifierConfig,
    ) -> Self {
        Self {
            store,
            sink,
            config,
        }
    }

    /// Broadcast the `new_rows` most recent rates, oldest first, one message
    /// each. Returns how many messages were delivered.
    ///
    /// A failed send is logged and the remaining messages still go out.
    pub async fn broadcast_new_rates(&self, new_rows: u64) -> Result<u32, NotifierError> {
        let limit = usize::try_from(new_rows)
            .unwrap_or(usize::MAX)
            .min(self.config.max_batch);
        if limit == 0 {
            return Ok(0);
        }

        let changes = self.store.recent_n(limit).await?;
        debug!(requested = new_rows, announcing = changes.len(), "Broadcasting new rates");

        let mut sent_count = 0u32;
        for change in changes.iter().rev() {
            let message = format_update_message(change);
            match self.sink.broadcast(&self.config.channel, &message).await {
                Ok(()) => {
                    info!(
                        channel = %self.config.channel,
                        date = %change.rate.effective_date(),
                        value = %change.rate.value,
                        "Rate broadcast sent"
                    );
                    sent_count += 1;
                }
                Err(e) => {
                    error!(
                        channel = %self.config.channel,
                        date = %change.rate.effective_date(),
                        error = %e,
                        "Failed to broadcast rate"
                    );
                }
            }
        }

        Ok(sent_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bcv_core::{source_midnight, Rate};
    use bcv_store::SqliteRateStore;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;
    use teloxide::ApiError;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<(String, String)>>,
        fail_containing: Option<&'static str>,
    }

    impl RecordingSink {
        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Broadcaster for RecordingSink {
        async fn broadcast(&self, recipient: &str, text: &str) -> Result<(), TelegramError> {
            if self.fail_containing.is_some_and(|needle| text.contains(needle)) {
                return Err(TelegramError::Api(teloxide::RequestError::Api(
                    ApiError::BotBlocked,
                )));
            }
            self.sent
                .lock()
                .unwrap()
                .push((recipient.to_string(), text.to_string()));
            Ok(())
        }
    }

    fn rate(d: u32, value: Decimal) -> Rate {
        Rate::new(
            source_midnight(NaiveDate::from_ymd_opt(2025, 7, d).unwrap()),
            value,
        )
    }

    async fn seeded_store() -> Arc<dyn RateStore> {
        let store = SqliteRateStore::connect("sqlite::memory:").await.unwrap();
        store
            .upsert_many(&[
                rate(14, dec!(114.0)),
                rate(15, dec!(114.5)),
                rate(16, dec!(114.2)),
                rate(17, dec!(115.0)),
            ])
            .await
            .unwrap();
        Arc::new(store)
    }

    #[test]
    fn test_notifier_config_default() {
        let config = NotifierConfig::default();
        assert_eq!(config.channel, "@bcvdolarbot");
        assert_eq!(config.max_batch, 15);
    }

    #[tokio::test]
    async fn test_broadcasts_oldest_first() {
        let sink = Arc::new(RecordingSink::default());
        let notifier = Notifier::new(seeded_store().await, sink.clone(), NotifierConfig::default());

        let sent = notifier.broadcast_new_rates(2).await.unwrap();

        assert_eq!(sent, 2);
        let messages = sink.sent();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|(to, _)| to == "@bcvdolarbot"));
        assert!(messages[0].1.contains("Miercoles 2025-07-16\nBsD. 114.2000 (-0.3000)"));
        assert!(messages[1].1.contains("Jueves 2025-07-17\nBsD. 115.0000 (+0.8000)"));
    }

    #[tokio::test]
    async fn test_nothing_new_sends_nothing() {
        let sink = Arc::new(RecordingSink::default());
        let notifier = Notifier::new(seeded_store().await, sink.clone(), NotifierConfig::default());

        assert_eq!(notifier.broadcast_new_rates(0).await.unwrap(), 0);
        assert!(sink.sent().is_empty());
    }

    #[tokio::test]
    async fn test_batch_is_capped() {
        let sink = Arc::new(RecordingSink::default());
        let config = NotifierConfig {
            max_batch: 3,
            ..Default::default()
        };
        let notifier = Notifier::new(seeded_store().await, sink.clone(), config);

        assert_eq!(notifier.broadcast_new_rates(40).await.unwrap(), 3);
        // The oldest stored rate was never announced.
        assert!(sink.sent()[0].1.contains("2025-07-15"));
    }

    #[tokio::test]
    async fn test_first_rate_ever_reports_its_own_value() {
        let sink = Arc::new(RecordingSink::default());
        let notifier = Notifier::new(seeded_store().await, sink.clone(), NotifierConfig::default());

        notifier.broadcast_new_rates(4).await.unwrap();

        assert!(sink.sent()[0].1.ends_with("BsD. 114.0000 (+114.0000)"));
    }

    #[tokio::test]
    async fn test_send_failure_does_not_abort_batch() {
        let sink = Arc::new(RecordingSink {
            fail_containing: Some("2025-07-16"),
            ..Default::default()
        });
        let notifier = Notifier::new(seeded_store().await, sink.clone(), NotifierConfig::default());

        let sent = notifier.broadcast_new_rates(3).await.unwrap();

        assert_eq!(sent, 2);
        let dates: Vec<bool> = sink
            .sent()
            .iter()
            .map(|(_, text)| text.contains("2025-07-16"))
            .collect();
        assert_eq!(dates, vec![false, false]);
    }
}
