//! Exchange-rate records.

use crate::calendar::{redenomination_day, source_offset, weekday_name_of};
use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

/// Divisor applied to values published before the 2021 redenomination.
pub const REDENOMINATION_FACTOR: u32 = 1_000_000;

/// A published bolivar-per-dollar rate, keyed by the instant it takes effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rate {
    /// Instant the rate becomes effective (unique key)
    pub effective_at: DateTime<FixedOffset>,
    /// Value in current (post-reform) units, 4 fractional digits
    pub value: Decimal,
}

impl Rate {
    /// Fractional digits kept for stored values.
    pub const SCALE: u32 = 4;

    /// Create a rate from a value already in current units.
    pub fn new(effective_at: DateTime<FixedOffset>, value: Decimal) -> Self {
        Self {
            effective_at,
            value: round_value(value),
        }
    }

    /// Create a rate from a value as printed on the source, normalizing
    /// pre-reform values to current units.
    pub fn from_published(effective_at: DateTime<FixedOffset>, raw: Decimal) -> Self {
        Self::new(effective_at, redenominate(effective_at, raw))
    }

    /// Calendar date of the rate in the source offset.
    pub fn effective_date(&self) -> NaiveDate {
        self.effective_at.with_timezone(&source_offset()).date_naive()
    }

    /// Spanish weekday name of the effective date.
    pub fn weekday_name(&self) -> &'static str {
        weekday_name_of(self.effective_date())
    }
}

/// Divide values dated strictly before the redenomination day by 1,000,000.
pub fn redenominate(effective_at: DateTime<FixedOffset>, raw: Decimal) -> Decimal {
    if effective_at < redenomination_day() {
        raw / Decimal::from(REDENOMINATION_FACTOR)
    } else {
        raw
    }
}

/// Round to the stored precision (NUMERIC(13,4) semantics).
pub fn round_value(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(Rate::SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(Rate::SCALE);
    rounded
}

/// A rate annotated with its difference from the chronologically previous rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateChange {
    pub rate: Rate,
    /// `None` when no earlier rate is known
    pub change: Option<Decimal>,
}

impl RateChange {
    /// Change to display; falls back to the rate's own value when there is
    /// no earlier rate.
    pub fn display_change(&self) -> Decimal {
        self.change.unwrap_or(self.rate.value)
    }

    /// Annotate up to `limit` rates given newest-first.
    ///
    /// `newest_first` may hold one extra, older rate beyond `limit`; it is
    /// only used to compute the change of the oldest returned entry.
    pub fn annotate(newest_first: &[Rate], limit: usize) -> Vec<RateChange> {
        newest_first
            .iter()
            .enumerate()
            .take(limit)
            .map(|(i, rate)| RateChange {
                rate: rate.clone(),
                change: newest_first
                    .get(i + 1)
                    .map(|previous| rate.value - previous.value),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::source_midnight;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32) -> DateTime<FixedOffset> {
        source_midnight(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_redenomination_before_cutover() {
        let rate = Rate::from_published(at(2021, 9, 30), dec!(4500000.00));
        assert_eq!(rate.value, dec!(4.5000));
        assert_eq!(rate.value.to_string(), "4.5000");
    }

    #[test]
    fn test_no_redenomination_on_cutover_day() {
        let rate = Rate::from_published(at(2021, 10, 1), dec!(4.5000));
        assert_eq!(rate.value.to_string(), "4.5000");
    }

    #[test]
    fn test_round_value() {
        assert_eq!(round_value(dec!(36.123456)).to_string(), "36.1235");
        assert_eq!(round_value(dec!(0.00005)).to_string(), "0.0001");
        assert_eq!(round_value(dec!(12)).to_string(), "12.0000");
    }

    #[test]
    fn test_effective_date_and_weekday() {
        let rate = Rate::new(at(2025, 7, 18), dec!(115.0));
        assert_eq!(rate.effective_date(), NaiveDate::from_ymd_opt(2025, 7, 18).unwrap());
        assert_eq!(rate.weekday_name(), "Viernes");
    }

    #[test]
    fn test_annotate_changes_newest_first() {
        let rates = vec![
            Rate::new(at(2024, 1, 3), dec!(10.2)),
            Rate::new(at(2024, 1, 2), dec!(10.5)),
            Rate::new(at(2024, 1, 1), dec!(10.0)),
        ];

        let changes = RateChange::annotate(&rates, 3);
        let deltas: Vec<_> = changes.iter().map(|c| c.change).collect();
        assert_eq!(deltas, vec![Some(dec!(-0.3)), Some(dec!(0.5)), None]);
        assert_eq!(changes[2].display_change(), dec!(10.0));
    }

    #[test]
    fn test_annotate_uses_extra_row_for_oldest_change() {
        let rates = vec![
            Rate::new(at(2024, 1, 3), dec!(10.2)),
            Rate::new(at(2024, 1, 2), dec!(10.5)),
        ];

        let changes = RateChange::annotate(&rates, 1);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change, Some(dec!(-0.3)));
    }
}
