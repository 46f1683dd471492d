//! Source calendar: the bank publishes dates in a fixed UTC-4 offset.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Weekday};

/// Seconds west of UTC used by the source (UTC-4, no daylight saving).
pub const SOURCE_UTC_OFFSET_SECS: i32 = 4 * 3600;

/// Spanish weekday names, Monday first.
pub const WEEKDAYS_ES: [&str; 7] = [
    "Lunes",
    "Martes",
    "Miercoles",
    "Jueves",
    "Viernes",
    "Sábado",
    "Domingo",
];

/// The fixed offset every published date is expressed in.
pub fn source_offset() -> FixedOffset {
    FixedOffset::west_opt(SOURCE_UTC_OFFSET_SECS).expect("UTC-4 is a valid offset")
}

/// Midnight of `date` in the source offset.
pub fn source_midnight(date: NaiveDate) -> DateTime<FixedOffset> {
    let offset = source_offset();
    let local = date.and_time(NaiveTime::MIN);
    DateTime::from_naive_utc_and_offset(local - offset, offset)
}

/// First day valued in post-reform units (2021-10-01).
pub fn redenomination_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 10, 1).expect("valid calendar date")
}

/// Instant from which published values are already redenominated.
pub fn redenomination_day() -> DateTime<FixedOffset> {
    source_midnight(redenomination_date())
}

/// Earliest date the source has published rates for.
pub fn coverage_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 3, 30).expect("valid calendar date")
}

/// Spanish name for a weekday.
pub fn weekday_name(weekday: Weekday) -> &'static str {
    WEEKDAYS_ES[weekday.num_days_from_monday() as usize]
}

/// Spanish weekday name of a calendar date.
pub fn weekday_name_of(date: NaiveDate) -> &'static str {
    weekday_name(date.weekday())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_source_midnight_is_utc_minus_four() {
        let date = NaiveDate::from_ymd_opt(2021, 10, 1).unwrap();
        let midnight = source_midnight(date);
        assert_eq!(midnight.to_rfc3339(), "2021-10-01T00:00:00-04:00");
        assert_eq!(midnight.naive_utc().to_string(), "2021-10-01 04:00:00");
    }

    #[test]
    fn test_redenomination_day() {
        assert_eq!(
            redenomination_day().to_rfc3339(),
            "2021-10-01T00:00:00-04:00"
        );
    }

    #[test]
    fn test_weekday_names() {
        assert_eq!(weekday_name(Weekday::Mon), "Lunes");
        assert_eq!(weekday_name(Weekday::Sat), "Sábado");
        assert_eq!(weekday_name(Weekday::Sun), "Domingo");
        // 2020-03-30 was a Monday
        assert_eq!(weekday_name_of(coverage_start()), "Lunes");
    }
}
