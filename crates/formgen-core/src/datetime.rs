//! Conversions between stored timestamps and the text shown in date-time inputs.
//!
//! Instances store DateTime values as RFC 3339 strings in UTC. Inputs show them
//! in local time without an offset.

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Display format of a local date-time input value.
pub const DATETIME_LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const DATETIME_LOCAL_SHORT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Current instant as an RFC 3339 UTC string with millisecond precision.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn is_timestamp(text: &str) -> bool {
    DateTime::parse_from_rfc3339(text).is_ok()
}

/// Format a stored timestamp for display. `None` if it does not parse.
pub fn to_datetime_local(stored: &str) -> Option<String> {
    let parsed = DateTime::parse_from_rfc3339(stored).ok()?;
    Some(
        parsed
            .with_timezone(&Local)
            .format(DATETIME_LOCAL_FORMAT)
            .to_string(),
    )
}

/// Parse input text back to a stored timestamp. Seconds may be omitted.
pub fn from_datetime_local(text: &str) -> Option<String> {
    let naive = NaiveDateTime::parse_from_str(text, DATETIME_LOCAL_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, DATETIME_LOCAL_SHORT_FORMAT))
        .ok()?;
    let local = Local.from_local_datetime(&naive).earliest()?;
    Some(
        local
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Millis, true),
    )
}
