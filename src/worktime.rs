//! "Do not disturb" calendar helper.
//!
//! Workers are free on weekends. On weekdays they must pause inside the
//! configured DND window, which is widened by one hour on each side and
//! may wrap past midnight when the start hour is later than the end hour.

use chrono::{Datelike, Duration, NaiveDateTime, Timelike, Weekday};

/// Midnight of the day containing `t`.
pub fn current_day(t: NaiveDateTime) -> NaiveDateTime {
    t.with_hour(0)
        .and_then(|t| t.with_minute(0))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}

/// Whether `t` falls outside the expanded DND window.
pub fn is_available(t: NaiveDateTime, dnd_start: i64, dnd_end: i64) -> bool {
    if matches!(t.weekday(), Weekday::Sat | Weekday::Sun) {
        return true;
    }

    let mut start = dnd_start;
    let stop = dnd_end + 1;
    if start > 0 {
        start -= 1;
    }

    let day = current_day(t);
    let start_at = day + Duration::hours(start);
    let mut stop_at = day + Duration::hours(stop);

    // A window like 22..6 spans midnight into the next day.
    if start > stop {
        stop_at += Duration::hours(24);
    }

    if t > start_at && t < stop_at {
        return false;
    }

    // The same window anchored on the previous day may still cover `t`.
    let start_prev = start_at - Duration::hours(24);
    let stop_prev = stop_at - Duration::hours(24);
    if t > start_prev && t < stop_prev {
        return false;
    }

    true
}
