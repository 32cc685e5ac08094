//! Day-clock helpers.
//!
//! All timestamps are unix seconds in UTC. A day bucket is keyed by the
//! timestamp of its first second.

use chrono::{DateTime, NaiveDate, Utc};

/// Seconds in one calendar day.
pub const SECONDS_IN_DAY: i64 = 86_400;

/// Seconds in one minute.
pub const SECONDS_IN_MINUTE: i64 = 60;

/// Minutes in one calendar day.
pub const MINUTES_IN_DAY: u32 = 1_440;

/// Returns the timestamp of the first second of the day containing `timestamp`.
#[must_use]
pub fn day_start(timestamp: i64) -> i64 {
    timestamp - timestamp.rem_euclid(SECONDS_IN_DAY)
}

/// Returns the timestamp of the last second of the day containing `timestamp`.
#[must_use]
pub fn day_end(timestamp: i64) -> i64 {
    day_start(timestamp) + SECONDS_IN_DAY - 1
}

/// Minute of the day (0..1440) for `timestamp`.
#[must_use]
pub fn minute_of_day(timestamp: i64) -> u32 {
    // rem_euclid keeps the value in 0..86400, so the cast cannot truncate
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let minute = (timestamp.rem_euclid(SECONDS_IN_DAY) / SECONDS_IN_MINUTE) as u32;
    minute
}

/// Start-of-day timestamp for a calendar date.
#[must_use]
pub fn timestamp_of_date(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map_or(0, |dt| dt.and_utc().timestamp())
}

/// Calendar date of `timestamp`, `None` if it is outside chrono's range.
#[must_use]
pub fn date_of_timestamp(timestamp: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(timestamp, 0).map(|dt| dt.date_naive())
}
