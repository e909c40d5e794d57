//! Wire-date normalization.
//!
//! Booking dates arrive from the store either as ISO-8601 strings or as
//! native epoch-millisecond timestamps. Everything is normalized to
//! `chrono` types here, at the boundary; comparison logic elsewhere only
//! ever sees `NaiveDate`/`NaiveDateTime`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a calendar date from its accepted string shapes:
/// `YYYY-MM-DD`, RFC 3339, or `YYYY-MM-DDTHH:MM[:SS]`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    parse_datetime(s).map(|dt| dt.date())
}

/// Parse an instant from its accepted string shapes. Date-only input is
/// anchored at midnight.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        return d.and_hms_opt(0, 0, 0);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    None
}

/// Normalize a raw store value to a calendar date. Accepts strings (see
/// [`parse_date`]) and epoch-millisecond numbers; anything else is not a
/// date.
pub fn date_from_value(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date(s),
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive())
        }
        _ => None,
    }
}

/// serde helper: `NaiveDate` written as `YYYY-MM-DD`, read from any wire
/// shape [`date_from_value`] accepts.
pub mod flex_date {
    use super::*;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        date_from_value(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("not a date: {}", value)))
    }
}
