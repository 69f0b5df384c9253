//! Timestamp helpers
//!
//! Records and messages carry UTC timestamps encoded as RFC 3339 strings with
//! millisecond precision (`2024-05-01T12:30:00.123Z`). The fixed width keeps
//! the encoded form lexicographically sortable.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

/// Current time truncated to milliseconds
///
/// Truncation keeps an in-memory value equal to what survives a round trip
/// through the persisted encoding.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Encode a timestamp in the persisted string form
pub fn encode(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serde adapter for `#[serde(with = "...")]` on `DateTime<Utc>` fields
pub mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(missing_docs)]
    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode(value))
    }

    #[allow(missing_docs)]
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
