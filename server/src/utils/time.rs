//! Time utility functions

use chrono::{DateTime, Utc};

/// Fractional bits of a collectd high-resolution timestamp (2^-30 s units)
const HR_FRACTION_BITS: u32 = 30;
const HR_FRACTION_MASK: u64 = (1 << HR_FRACTION_BITS) - 1;

/// Convert a collectd high-resolution time value to milliseconds
pub fn hr_time_to_millis(hr: u64) -> i64 {
    let secs = hr >> HR_FRACTION_BITS;
    let frac_ms = ((hr & HR_FRACTION_MASK) * 1000) >> HR_FRACTION_BITS;
    secs.saturating_mul(1000).saturating_add(frac_ms) as i64
}

/// Convert a collectd whole-second time value to milliseconds
pub fn secs_to_millis(secs: u64) -> i64 {
    secs.saturating_mul(1000) as i64
}

/// Current wall clock time in milliseconds since Unix epoch
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert milliseconds since Unix epoch to DateTime<Utc>
pub fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_else(|| {
        tracing::warn!(millis, "Invalid timestamp, using epoch");
        DateTime::UNIX_EPOCH
    })
}

/// Convert milliseconds since Unix epoch to ISO 8601 string (millisecond precision)
pub fn millis_to_iso(millis: i64) -> String {
    millis_to_datetime(millis).to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
