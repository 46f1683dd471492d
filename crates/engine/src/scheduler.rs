//! Adaptive polling schedule.
//!
//! The bank publishes at most one rate per business day, usually in the
//! afternoon. After a cycle that found nothing on a weekday the next attempt
//! comes soon; once something new is found, or on weekends, polling resumes
//! on the next business day at the configured hour.

use chrono::{Datelike, Duration as ChronoDuration, Local, NaiveDateTime, NaiveTime, Weekday};
use std::time::Duration;
use tracing::debug;

/// How the next delay was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickMode {
    /// Retry after a short fixed interval.
    ShortTerm,
    /// Wait for the next business day's check time.
    LongTerm,
}

/// Scheduler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Delay used in short-term mode.
    pub retry_interval: Duration,
    /// Local time of day of the long-term check.
    pub check_time: NaiveTime,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_secs(15 * 60),
            check_time: NaiveTime::from_hms_opt(13, 0, 0).expect("valid time of day"),
        }
    }
}

/// Decides how long to sleep before the next ingestion cycle.
#[derive(Debug, Clone, Default)]
pub struct PollScheduler {
    config: SchedulerConfig,
}

fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

impl PollScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// Short-term only when the last cycle found nothing on a weekday.
    /// Failed cycles count as having found nothing.
    pub fn mode(&self, now: NaiveDateTime, new_rows: u64) -> TickMode {
        if new_rows == 0 && !is_weekend(now.weekday()) {
            TickMode::ShortTerm
        } else {
            TickMode::LongTerm
        }
    }

    /// Next business day (tomorrow, or Monday when tomorrow is a weekend day)
    /// at the check time.
    pub fn next_business_check(&self, now: NaiveDateTime) -> NaiveDateTime {
        let mut day = now.date() + ChronoDuration::days(1);
        while is_weekend(day.weekday()) {
            day += ChronoDuration::days(1);
        }
        day.and_time(self.config.check_time)
    }

    /// Delay before the next cycle, given local wall-clock `now`.
    pub fn next_delay(&self, now: NaiveDateTime, new_rows: u64) -> Duration {
        match self.mode(now, new_rows) {
            TickMode::ShortTerm => {
                debug!(delay_secs = self.config.retry_interval.as_secs(), "Next check: short term");
                self.config.retry_interval
            }
            TickMode::LongTerm => {
                let next = self.next_business_check(now);
                debug!(%next, "Next check: next business day");
                (next - now).to_std().unwrap_or(self.config.retry_interval)
            }
        }
    }

    /// Delay before the next cycle from the current local time.
    pub fn delay_from_now(&self, new_rows: u64) -> Duration {
        self.next_delay(Local::now().naive_local(), new_rows)
    }
}
