use aws_sdk_ec2::primitives::DateTime as SmithyDateTime;
use chrono::{DateTime, NaiveDateTime, Utc};

/// Convert an SDK timestamp into a `chrono` UTC timestamp.
pub fn to_utc(dt: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

/// Convert a milliseconds-since-epoch timestamp (as used by CloudWatch Logs).
pub fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// Whole days elapsed between `then` and `now`.
pub fn days_since(then: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - then).num_days()
}

/// Parse the ISO-8601 `CreationDate` string carried by AMIs.
pub fn parse_iso8601(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Parse a `"YYYY-MM-DD HH:MM:SS"` wall-clock timestamp in UTC.
pub fn parse_gmt(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// RFC 3339 rendering of an optional SDK timestamp, empty when absent.
pub fn iso_or_empty(dt: Option<&SmithyDateTime>) -> String {
    dt.and_then(to_utc)
        .map(|d| d.to_rfc3339())
        .unwrap_or_default()
}
