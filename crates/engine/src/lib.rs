//! Rate ingestion engine.
//!
//! This crate drives one ingestion cycle (discover, download, extract,
//! store) and decides when the next cycle should run.

pub mod error;
pub mod ingestion;
pub mod scheduler;

pub use error::*;
pub use ingestion::*;
pub use scheduler::*;
