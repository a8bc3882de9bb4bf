//! Human-readable duration formatting for status endpoints.

use std::time::Duration;

/// Render a duration the way Go's `time.Duration` prints it, down to
/// whole seconds: `26h3m42s`, `3m0s`, `42s`, `0s`.
pub fn format_duration(d: Duration) -> String {
    let total = d.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
