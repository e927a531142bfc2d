//! Serde helpers for `OffsetDateTime` timestamps in conversation files.
//!
//! Timestamps are written as RFC 3339.  Reading also accepts ISO 8601
//! timestamps without an offset, which are taken to be UTC.

use serde::{Deserialize, Deserializer, Serializer};
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{OffsetDateTime, PrimitiveDateTime};

/// Parse an RFC 3339 timestamp, falling back to an offset-less ISO 8601 one.
pub fn parse(s: &str) -> Result<OffsetDateTime, time::error::Parse> {
    match OffsetDateTime::parse(s, &Rfc3339) {
        Ok(datetime) => Ok(datetime),
        Err(err) => PrimitiveDateTime::parse(s, &Iso8601::DEFAULT)
            .map(PrimitiveDateTime::assume_utc)
            .map_err(|_| err),
    }
}

/// Deserialize a timestamp string into an OffsetDateTime
pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse(&s).map_err(serde::de::Error::custom)
}

/// Serialize an OffsetDateTime into an RFC 3339 formatted string
pub fn serialize<S>(datetime: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let s = datetime
        .format(&Rfc3339)
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parses_rfc3339() {
        let parsed = parse("2025-03-01T12:30:00Z").unwrap();
        assert_eq!(parsed, datetime!(2025-03-01 12:30:00 UTC));
    }

    #[test]
    fn parses_naive_iso8601_as_utc() {
        let parsed = parse("2025-03-01T12:30:00.123456").unwrap();
        assert_eq!(parsed, datetime!(2025-03-01 12:30:00.123456 UTC));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("yesterday").is_err());
    }
}
