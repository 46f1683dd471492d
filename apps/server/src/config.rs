//! Application configuration.

use bcv_alerts::NotifierConfig;
use bcv_engine::SchedulerConfig;
use bcv_feeds::TransportConfig;
use chrono::NaiveTime;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("Invalid listing URL {url}: {reason}")]
    InvalidListingUrl { url: String, reason: String },
    #[error("Check hour must be between 0 and 23, got {0}")]
    InvalidCheckHour(u32),
    #[error("Retry interval must be at least one minute")]
    ZeroRetryInterval,
    #[error("HTTP timeout must be at least one second")]
    ZeroTimeout,
}

/// Raw settings as given on the command line or in the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub bot_token: String,
    pub channel: String,
    pub listing_url: String,
    pub insecure_tls: bool,
    pub http_timeout_secs: u64,
    pub retry_minutes: u64,
    pub check_hour: u32,
}

/// Validated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite path/URL or PostgreSQL URL.
    pub database_url: String,
    /// Bot API token.
    pub bot_token: String,
    /// Listing page the spreadsheets are discovered from.
    pub listing_url: Url,
    pub transport: TransportConfig,
    pub scheduler: SchedulerConfig,
    pub notifier: NotifierConfig,
}

impl TryFrom<Settings> for AppConfig {
    type Error = ConfigError;

    fn try_from(settings: Settings) -> Result<Self, Self::Error> {
        if settings.database_url.trim().is_empty() {
            return Err(ConfigError::Empty("BCVBOT_DATABASE_URL"));
        }
        if settings.bot_token.trim().is_empty() {
            return Err(ConfigError::Empty("BOT_TOKEN"));
        }
        if settings.channel.trim().is_empty() {
            return Err(ConfigError::Empty("BCVBOT_CHANNEL"));
        }

        let listing_url =
            Url::parse(&settings.listing_url).map_err(|e| ConfigError::InvalidListingUrl {
                url: settings.listing_url.clone(),
                reason: e.to_string(),
            })?;

        let check_time = NaiveTime::from_hms_opt(settings.check_hour, 0, 0)
            .ok_or(ConfigError::InvalidCheckHour(settings.check_hour))?;
        if settings.retry_minutes == 0 {
            return Err(ConfigError::ZeroRetryInterval);
        }
        if settings.http_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(Self {
            database_url: settings.database_url.trim().to_string(),
            bot_token: settings.bot_token.trim().to_string(),
            listing_url,
            transport: TransportConfig {
                timeout: Duration::from_secs(settings.http_timeout_secs),
                accept_invalid_certs: settings.insecure_tls,
                ..Default::default()
            },
            scheduler: SchedulerConfig {
                retry_interval: Duration::from_secs(settings.retry_minutes * 60),
                check_time,
            },
            notifier: NotifierConfig {
                channel: settings.channel.trim().to_string(),
                ..Default::default()
            },
        })
    }
}
