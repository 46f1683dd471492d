//! Core data types for the BCV rate bot.

pub mod calendar;
pub mod rate;

pub use calendar::*;
pub use rate::*;
