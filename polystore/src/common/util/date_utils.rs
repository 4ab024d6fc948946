use chrono::{SecondsFormat, Utc};

/// Returns the current instant as an ISO-8601 / RFC 3339 string in UTC,
/// with millisecond precision.
#[inline]
pub fn current_iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
