//! Backend timestamps.
//!
//! The records service emits `datetime.isoformat()` of naive UTC values
//! (`2024-01-15T10:30:00.123456`), so offsets are usually absent. Both forms
//! are parsed into `DateTime<Utc>` so that imaging and report items compare
//! as instants, never as strings.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

use super::ModelError;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

pub fn parse(raw: &str) -> Result<DateTime<Utc>, ModelError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ModelError::InvalidTimestamp(raw.to_string()))
}

pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_rfc3339())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_naive_isoformat_as_utc() {
        let dt = parse("2024-01-15T10:30:00.123456").unwrap();
        assert_eq!(dt.timestamp(), Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap().timestamp());
    }

    #[test]
    fn parses_naive_without_fraction() {
        assert!(parse("2024-01-15T10:30:00").is_ok());
        assert!(parse("2024-01-15 10:30:00").is_ok());
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let dt = parse("2024-01-15T12:30:00+02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap());
    }

    #[test]
    fn ordering_is_by_instant_not_text() {
        // Lexically "2024-01-15T09:..." > "2024-01-15T10:...+02:00" would be wrong.
        let a = parse("2024-01-15T09:45:00").unwrap();
        let b = parse("2024-01-15T10:30:00+02:00").unwrap();
        assert!(a > b);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse("yesterday"), Err(ModelError::InvalidTimestamp(_))));
    }
}
