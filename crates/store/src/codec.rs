//! Column codecs for backends without native timestamp/decimal types.
//!
//! Instants are stored as fixed-width UTC text so that lexical order equals
//! chronological order. Values are stored as decimal text with 4 fractional
//! digits.

use crate::StoreError;
use bcv_core::{round_value, source_offset, Rate};
use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

const INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Encode an instant as `YYYY-MM-DDTHH:MM:SSZ` in UTC (sub-seconds dropped).
pub fn encode_instant(instant: &DateTime<FixedOffset>) -> String {
    instant.with_timezone(&Utc).format(INSTANT_FORMAT).to_string()
}

/// Decode a stored instant into the source offset.
pub fn decode_instant(text: &str) -> Result<DateTime<FixedOffset>, StoreError> {
    DateTime::parse_from_rfc3339(text)
        .map(|instant| instant.with_timezone(&source_offset()))
        .map_err(|e| StoreError::Codec(format!("instant {text:?}: {e}")))
}

/// Encode a value with the stored precision.
pub fn encode_value(value: &Decimal) -> String {
    round_value(*value).to_string()
}

/// Decode a stored value.
pub fn decode_value(text: &str) -> Result<Decimal, StoreError> {
    Decimal::from_str(text).map_err(|e| StoreError::Codec(format!("value {text:?}: {e}")))
}

/// Decode one stored row.
pub fn decode_rate(effective_at: &str, value: &str) -> Result<Rate, StoreError> {
    Ok(Rate::new(decode_instant(effective_at)?, decode_value(value)?))
}
