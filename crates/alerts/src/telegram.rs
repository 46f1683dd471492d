//! Telegram bot handlers.

use crate::dates::parse_date_arg;
use crate::messages::{
    before_coverage_message, format_rate_reply, HELP_DATES_MSG, HELP_MSG, INVALID_DATE_MSG,
    RATE_UNAVAILABLE_MSG, START_MSG,
};
use crate::notifier::Broadcaster;
use async_trait::async_trait;
use bcv_core::{coverage_start, source_midnight, source_offset};
use bcv_store::{RateStore, StoreError};
use chrono::{DateTime, Datelike, FixedOffset, Utc};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{Me, Recipient};
use teloxide::utils::command::BotCommands;
use teloxide::RequestError;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram API error: {0}")]
    Api(#[from] RequestError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl TelegramError {
    /// Whether the Bot API could not be reached at all.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            TelegramError::Api(RequestError::Network(_) | RequestError::Io(_))
        )
    }
}

/// Bot commands. Each one has a Spanish and an English spelling.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Comandos disponibles:")]
pub enum Command {
    #[command(description = "Iniciar el bot")]
    Start,
    #[command(description = "Uso general del bot")]
    Ayuda,
    #[command(description = "Show help")]
    Help,
    #[command(description = "Formatos de fecha soportados")]
    Fechas,
    #[command(description = "Supported date formats")]
    Dates,
    #[command(description = "Tasa actual, o la efectiva en una fecha. Uso: /tasa 20/07/2025")]
    Tasa(String),
    #[command(description = "Current rate, or the one effective on a date. Usage: /rate 20/07/2025")]
    Rate(String),
}

/// Chat or channel a text is addressed to: numeric ids are chat ids,
/// anything else a channel username such as `@bcvdolarbot`.
pub fn recipient_of(target: &str) -> Recipient {
    match target.trim().parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(target.trim().to_string()),
    }
}

/// Reply text for a rate query with an optional date argument.
///
/// Without a date the rate in force at `now` is reported. Store failures
/// are returned so the caller can log them.
pub async fn answer_rate_query(
    store: &dyn RateStore,
    arg: &str,
    now: DateTime<FixedOffset>,
) -> Result<String, StoreError> {
    let arg = arg.trim();
    let (target, instant) = if arg.is_empty() {
        (now.date_naive(), now)
    } else {
        let Ok(date) = parse_date_arg(arg, now.year()) else {
            return Ok(INVALID_DATE_MSG.to_string());
        };
        if date < coverage_start() {
            return Ok(before_coverage_message(coverage_start()));
        }
        (date, source_midnight(date))
    };

    let reply = match store.latest_at_or_before(instant).await? {
        Some(rate) => format_rate_reply(target, &rate),
        None => RATE_UNAVAILABLE_MSG.to_string(),
    };
    Ok(reply)
}

/// Telegram bot wrapper.
pub struct TelegramBot {
    bot: Bot,
    store: Arc<dyn RateStore>,
}

impl TelegramBot {
    /// Create a new bot with the given token.
    pub fn new(token: &str, store: Arc<dyn RateStore>) -> Self {
        let bot = Bot::new(token);
        Self { bot, store }
    }

    /// Reach the Bot API and return the bot's own account.
    pub async fn check_connection(&self) -> Result<Me, TelegramError> {
        Ok(self.bot.get_me().await?)
    }

    /// Publish the command list, for Spanish clients and as the default.
    pub async fn register_commands(&self) -> Result<(), TelegramError> {
        self.bot
            .set_my_commands(Command::bot_commands())
            .language_code("es")
            .await?;
        self.bot.set_my_commands(Command::bot_commands()).await?;
        debug!("Registered bot commands");
        Ok(())
    }

    /// Send a plain text message to a chat id or channel username.
    pub async fn send_alert(&self, target: &str, message: &str) -> Result<(), TelegramError> {
        self.bot.send_message(recipient_of(target), message).await?;
        Ok(())
    }

    /// Run the bot command handler.
    pub async fn run(self: Arc<Self>) {
        let bot = self.bot.clone();
        let handler = Update::filter_message().filter_command::<Command>().endpoint(
            move |bot: Bot, msg: Message, cmd: Command| {
                let this = Arc::clone(&self);
                async move { this.handle_command(bot, msg, cmd).await }
            },
        );

        info!("Listening for chat commands");
        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }

    async fn handle_command(
        &self,
        bot: Bot,
        msg: Message,
        cmd: Command,
    ) -> Result<(), TelegramError> {
        debug!(chat_id = %msg.chat.id, command = ?cmd, "Received command");

        let text = match cmd {
            Command::Start => START_MSG.to_string(),
            Command::Ayuda | Command::Help => HELP_MSG.to_string(),
            Command::Fechas | Command::Dates => HELP_DATES_MSG.to_string(),
            Command::Tasa(arg) | Command::Rate(arg) => {
                let now = Utc::now().with_timezone(&source_offset());
                match answer_rate_query(self.store.as_ref(), &arg, now).await {
                    Ok(reply) => reply,
                    Err(e) => {
                        error!(chat_id = %msg.chat.id, error = %e, "Rate query failed");
                        RATE_UNAVAILABLE_MSG.to_string()
                    }
                }
            }
        };

        bot.send_message(msg.chat.id, text).await?;
        Ok(())
    }
}

#[async_trait]
impl Broadcaster for TelegramBot {
    async fn broadcast(&self, recipient: &str, text: &str) -> Result<(), TelegramError> {
        self.send_alert(recipient, text).await
    }
}
