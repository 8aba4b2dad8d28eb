/// Relative "time ago" labels for issue timestamps
///
/// Units use fixed lengths (a month is 30 days, a year is 365 days),
/// so labels are approximate for long spans.

use chrono::{DateTime, Utc};

/// Units in descending order, evaluated first to last
const UNITS: &[(i64, &str)] = &[
    (31_536_000, "year"),
    (2_592_000, "month"),
    (604_800, "week"),
    (86_400, "day"),
    (3_600, "hour"),
    (60, "minute"),
];

/// Label for how long ago `created_at` was, as seen from `now`
///
/// Timestamps in the future are clamped to "just now".
pub fn time_ago(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    format_elapsed((now - created_at).num_seconds())
}

/// Label for an elapsed duration in whole seconds
pub fn format_elapsed(elapsed_seconds: i64) -> String {
    let elapsed = elapsed_seconds.max(0);

    for &(seconds_in_unit, unit) in UNITS {
        let count = elapsed / seconds_in_unit;
        if count >= 1 {
            let plural = if count == 1 { "" } else { "s" };
            return format!("{} {}{} ago", count, unit, plural);
        }
    }

    "just now".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_under_a_minute_is_just_now() {
        for seconds in [0, 1, 30, 59] {
            assert_eq!(format_elapsed(seconds), "just now");
        }
    }

    #[test]
    fn test_minutes_pluralization() {
        assert_eq!(format_elapsed(60), "1 minute ago");
        assert_eq!(format_elapsed(119), "1 minute ago");
        assert_eq!(format_elapsed(120), "2 minutes ago");
        assert_eq!(format_elapsed(3_599), "59 minutes ago");
    }

    #[test]
    fn test_largest_unit_wins() {
        // 1 day 1 hour
        assert_eq!(format_elapsed(90_000), "1 day ago");
        assert_eq!(format_elapsed(604_800), "1 week ago");
        assert_eq!(format_elapsed(2_592_000), "1 month ago");
        assert_eq!(format_elapsed(31_536_000 * 3 + 5), "3 years ago");
    }

    #[test]
    fn test_hours_from_timestamps() {
        let now = Utc::now();
        assert_eq!(time_ago(now - Duration::seconds(3_600), now), "1 hour ago");
        assert_eq!(time_ago(now - Duration::seconds(7_300), now), "2 hours ago");
    }

    #[test]
    fn test_future_timestamp_is_just_now() {
        let now = Utc::now();
        assert_eq!(time_ago(now + Duration::days(2), now), "just now");
        assert_eq!(format_elapsed(-500), "just now");
    }
}
