//! Time and timestamp utilities

use chrono::{DateTime, Duration, FixedOffset, Timelike, Utc};

/// Get current Unix timestamp in milliseconds
pub fn current_timestamp_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Build a fixed offset from minutes east of UTC
pub fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

/// Current time expressed in `offset`
pub fn now_in(offset: FixedOffset) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&offset)
}

/// Midnight of the day containing `now`, in `now`'s own offset
pub fn start_of_day(now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    now - Duration::seconds(i64::from(now.num_seconds_from_midnight()))
        - Duration::nanoseconds(i64::from(now.nanosecond()))
}

/// Half-open `[lower, upper)` bounds of the daily history buckets.
///
/// Bucket 0 runs from the start of today up to `now`; bucket `i` covers the
/// whole day `i` days before today.
pub fn daily_bounds(now: DateTime<FixedOffset>, days: usize) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let today = start_of_day(now);
    (0..days as i64)
        .map(|i| {
            let lower = today - Duration::days(i);
            let upper = if i == 0 {
                now
            } else {
                today - Duration::days(i - 1)
            };
            (lower.with_timezone(&Utc), upper.with_timezone(&Utc))
        })
        .collect()
}
