//! Lenient deserializers for stored records.
//!
//! Older rows were written by a dashboard that stored tables as JSON strings,
//! numbers as either strings or numbers, and dates with or without a time
//! part. These helpers turn all of those into one typed shape.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::{DeserializeOwned, Error as DeError};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A list given either as a JSON array or as a string containing one.
/// `null` and the empty string become an empty list.
pub fn embedded_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let value = match value {
        Value::Null => return Ok(Vec::new()),
        Value::String(text) if text.trim().is_empty() => return Ok(Vec::new()),
        Value::String(text) => serde_json::from_str::<Value>(&text)
            .map_err(|e| D::Error::custom(format!("embedded table is not valid JSON: {e}")))?,
        other => other,
    };
    serde_json::from_value(value).map_err(D::Error::custom)
}

/// A scalar kept as text, whether it arrived as a string or a number.
pub fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        other => Err(D::Error::custom(format!("expected text or number, got {other}"))),
    }
}

/// Optional text, where `null` and missing both mean `None`.
pub fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .map(|value| match value {
            Value::String(text) => text,
            other => other.to_string(),
        })
        .filter(|text| !text.trim().is_empty()))
}

/// Parse `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` or RFC 3339.
pub fn parse_flexible_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(text) {
        return Some(stamp.date_naive());
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|stamp| stamp.date())
}

pub fn flexible_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_flexible_date(&text).ok_or_else(|| D::Error::custom(format!("unrecognised date '{text}'")))
}
