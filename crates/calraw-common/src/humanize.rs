//! Human-readable formatting for operator-facing output.

use chrono::{DateTime, Utc};

/// Format a byte count as a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Render how long ago a timestamp was, relative to `now`.
///
/// Coarse on purpose: the confirmation summary only needs "2 months ago"
/// granularity, not an exact duration.
pub fn ago(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(timestamp);
    if delta.num_seconds() < 0 {
        return "in the future".to_string();
    }

    let minutes = delta.num_minutes();
    let hours = delta.num_hours();
    let days = delta.num_days();

    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        plural(minutes, "minute")
    } else if hours < 24 {
        plural(hours, "hour")
    } else if days < 30 {
        plural(days, "day")
    } else if days < 365 {
        plural(days / 30, "month")
    } else {
        plural(days / 365, "year")
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_bytes_scales_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
        assert_eq!(format_bytes(824_523_776), "786.33 MB");
    }

    #[test]
    fn ago_picks_coarsest_sensible_unit() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();

        let t = now - chrono::Duration::seconds(30);
        assert_eq!(ago(t, now), "just now");

        let t = now - chrono::Duration::minutes(5);
        assert_eq!(ago(t, now), "5 minutes ago");

        let t = now - chrono::Duration::hours(1);
        assert_eq!(ago(t, now), "1 hour ago");

        let t = now - chrono::Duration::days(3);
        assert_eq!(ago(t, now), "3 days ago");

        let t = now - chrono::Duration::days(70);
        assert_eq!(ago(t, now), "2 months ago");

        let t = now - chrono::Duration::days(800);
        assert_eq!(ago(t, now), "2 years ago");
    }

    #[test]
    fn ago_handles_future_timestamps() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let t = now + chrono::Duration::hours(1);
        assert_eq!(ago(t, now), "in the future");
    }
}
