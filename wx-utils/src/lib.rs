//! Shared utility functions for the weather station crates.

/// Timestamp utility functions
pub mod dates {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};

    /// Canonical storage format, second precision: "YYYY-MM-DD HH:MM:SS"
    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    /// Date prefix of a stored timestamp: "YYYY-MM-DD"
    pub const DATE_FORMAT: &str = "%Y-%m-%d";

    /// Literal layouts accepted for explicit timestamps, tried in order.
    const DATETIME_LAYOUTS: [&str; 6] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%Y%m%d %H%M%S",
        "%Y%m%d %H%M",
    ];

    const DATE_LAYOUTS: [&str; 2] = ["%Y-%m-%d", "%Y%m%d"];

    /// Format a timestamp as "YYYY-MM-DD HH:MM:SS", dropping sub-second digits.
    pub fn format_timestamp(ts: &NaiveDateTime) -> String {
        ts.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Format the date part of a timestamp as "YYYY-MM-DD".
    pub fn format_date(date: &NaiveDate) -> String {
        date.format(DATE_FORMAT).to_string()
    }

    /// Truncate a timestamp to whole seconds.
    pub fn truncate_to_seconds(ts: NaiveDateTime) -> NaiveDateTime {
        ts.with_nanosecond(0).unwrap_or(ts)
    }

    /// Parse a timestamp literal.
    ///
    /// Accepts the storage format (with optional fractional seconds), ISO 8601
    /// with `T` separator, RFC 3339 with an offset (the wall-clock part is
    /// kept), minute precision, compact `YYYYMMDD HHMM[SS]`, and bare dates
    /// (midnight). Returns `None` when nothing matches.
    pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(truncate_to_seconds(dt.naive_local()));
        }
        for layout in DATETIME_LAYOUTS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, layout) {
                return Some(truncate_to_seconds(dt));
            }
        }
        DATE_LAYOUTS
            .iter()
            .find_map(|layout| NaiveDate::parse_from_str(s, layout).ok())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }

}
