//! BCV Rate Bot - Headless Server
//!
//! Collects the central bank's official dollar rate, stores it and serves it
//! over Telegram.

mod config;
mod updater;

use bcv_alerts::{Notifier, TelegramBot, TelegramError};
use bcv_engine::{IngestionService, PollScheduler};
use bcv_feeds::{HttpTransport, WorkbookExtractor, DEFAULT_LISTING_URL};
use bcv_store::{open_store, RateStore};
use clap::Parser;
use config::{AppConfig, Settings};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Attempts to reach the Bot API before giving up.
const STARTUP_ATTEMPTS: u32 = 10;
/// Pause between startup attempts.
const STARTUP_RETRY_DELAY: Duration = Duration::from_secs(10);

/// BCV Rate Bot CLI
#[derive(Parser, Debug)]
#[command(name = "bcv-bot")]
#[command(about = "Official BCV dollar rate scraper and Telegram bot", long_about = None)]
struct Args {
    /// Database: SQLite path or `sqlite:` URL, or a `postgres://` URL
    #[arg(long, env = "BCVBOT_DATABASE_URL")]
    database_url: String,

    /// Telegram Bot API token
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    bot_token: String,

    /// Channel receiving new-rate broadcasts
    #[arg(long, env = "BCVBOT_CHANNEL", default_value = "@bcvdolarbot")]
    channel: String,

    /// Statistics page listing the rate spreadsheets
    #[arg(long, env = "BCVBOT_LISTING_URL", default_value = DEFAULT_LISTING_URL)]
    listing_url: String,

    /// Skip TLS certificate verification for the rate source
    #[arg(long, env = "BCVBOT_INSECURE_TLS", default_value_t = false)]
    insecure_tls: bool,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 30)]
    http_timeout_secs: u64,

    /// Minutes between checks while waiting for the day's rate
    #[arg(long, default_value_t = 15)]
    retry_minutes: u64,

    /// Local hour of the first check on business days
    #[arg(long, default_value_t = 13)]
    check_hour: u32,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

impl From<Args> for Settings {
    fn from(args: Args) -> Self {
        Settings {
            database_url: args.database_url,
            bot_token: args.bot_token,
            channel: args.channel,
            listing_url: args.listing_url,
            insecure_tls: args.insecure_tls,
            http_timeout_secs: args.http_timeout_secs,
            retry_minutes: args.retry_minutes,
            check_hour: args.check_hour,
        }
    }
}

fn init_logging(level: &str) {
    let level = match level {
        "trace" | "debug" | "info" | "warn" | "error" => level,
        _ => "info",
    };
    // RUST_LOG, when set, takes precedence over --log-level.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
    }
}

/// Reach the Bot API and publish the command list, retrying network failures.
async fn connect_bot(bot: &TelegramBot) -> Result<(), TelegramError> {
    let mut attempt = 1;
    loop {
        let result = async {
            let me = bot.check_connection().await?;
            bot.register_commands().await?;
            Ok::<_, TelegramError>(me)
        }
        .await;

        match result {
            Ok(me) => {
                info!(bot_id = %me.id, "Connected to Telegram");
                return Ok(());
            }
            Err(e) if e.is_network() && attempt < STARTUP_ATTEMPTS => {
                warn!(
                    attempt,
                    max_attempts = STARTUP_ATTEMPTS,
                    error = %e,
                    "Telegram unreachable, retrying in {}s",
                    STARTUP_RETRY_DELAY.as_secs()
                );
                attempt += 1;
                tokio::time::sleep(STARTUP_RETRY_DELAY).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    init_logging(&args.log_level);

    let config = match AppConfig::try_from(Settings::from(args)) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("🚀 BCV Rate Bot starting...");
    info!("  Listing: {}", config.listing_url);
    info!("  Channel: {}", config.notifier.channel);
    info!(
        "  Schedule: every {} min, business days from {}",
        config.scheduler.retry_interval.as_secs() / 60,
        config.scheduler.check_time
    );

    let store = match open_store(&config.database_url).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open rate store: {}", e);
            return ExitCode::FAILURE;
        }
    };
    match store.count().await {
        Ok(count) => info!("  Stored rates: {}", count),
        Err(e) => warn!("Failed to count stored rates: {}", e),
    }

    let transport = match HttpTransport::new(&config.transport) {
        Ok(transport) => Arc::new(transport),
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let bot = Arc::new(TelegramBot::new(&config.bot_token, store.clone()));
    if let Err(e) = connect_bot(&bot).await {
        error!("Could not start Telegram bot: {}", e);
        return ExitCode::FAILURE;
    }

    let ingestion = IngestionService::new(
        transport,
        config.listing_url.clone(),
        WorkbookExtractor::default(),
        store.clone(),
    );
    let notifier = Notifier::new(store, bot.clone(), config.notifier.clone());
    let scheduler = PollScheduler::new(config.scheduler);

    let updater_handle = tokio::spawn(updater::run_rate_updater(ingestion, notifier, scheduler));
    let bot_handle = tokio::spawn(bot.run());

    // Handle shutdown
    info!("Press Ctrl+C to stop...");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
    }

    warn!("Shutdown signal received");
    updater_handle.abort();
    let _ = tokio::time::timeout(Duration::from_secs(2), bot_handle).await;

    info!("👋 BCV Rate Bot stopped");
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from([
            "bcv-bot",
            "--database-url",
            "sqlite:rates.db",
            "--bot-token",
            "123:abc",
        ])
        .unwrap();

        assert_eq!(args.retry_minutes, 15);
        assert_eq!(args.check_hour, 13);
        assert_eq!(args.http_timeout_secs, 30);
        assert_eq!(args.log_level, "info");

        let config = AppConfig::try_from(Settings::from(args)).unwrap();
        assert_eq!(config.database_url, "sqlite:rates.db");
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::try_parse_from([
            "bcv-bot",
            "--database-url",
            "postgres://bot@localhost/bcv",
            "--bot-token",
            "123:abc",
            "--insecure-tls",
            "--retry-minutes",
            "5",
            "--check-hour",
            "9",
        ])
        .unwrap();

        let config = AppConfig::try_from(Settings::from(args)).unwrap();
        assert!(config.transport.accept_invalid_certs);
        assert_eq!(config.scheduler.retry_interval, Duration::from_secs(300));
        assert_eq!(config.scheduler.check_time.to_string(), "09:00:00");
    }
}
