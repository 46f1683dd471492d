//! Telegram front end for the rate bot.
//!
//! This crate provides:
//! - New-rate broadcasts to a channel
//! - Chat commands to query the rate effective on a given day
//! - Message formatting and date argument parsing

pub mod dates;
pub mod messages;
pub mod notifier;
pub mod telegram;

pub use notifier::{Broadcaster, Notifier, NotifierConfig, NotifierError};
pub use telegram::{Command, TelegramBot, TelegramError};
