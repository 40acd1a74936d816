use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Milliseconds since the Unix epoch, the unit every stored timestamp uses.
pub fn current_timestamp() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn new_id() -> String {
    nanoid::nanoid!()
}

pub fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Float(f64),
    Text(String),
}

/// Accepts epoch milliseconds or an RFC 3339 string. Unparseable text becomes `None`
/// rather than rejecting the whole document.
pub fn deserialize_optional_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawTimestamp>::deserialize(deserializer)?;

    Ok(match raw {
        Some(RawTimestamp::Millis(millis)) => Some(millis),
        Some(RawTimestamp::Float(millis)) => Some(millis as i64),
        Some(RawTimestamp::Text(text)) => DateTime::parse_from_rfc3339(&text)
            .ok()
            .map(|parsed| parsed.timestamp_millis())
            .or_else(|| text.trim().parse::<i64>().ok()),
        None => None,
    })
}
