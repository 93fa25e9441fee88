//! Decoding helpers shared by the row types.
//!
//! Rows arrive with ISO-8601 strings and free-form text for enumerated
//! columns. Required values that do not decode are a `SchemaMismatch`;
//! optional dates that do not decode are dropped.

use crate::domain::{DomainError, DomainResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use std::str::FromStr;
use tracing::warn;

/// Parse an RFC 3339 timestamp, a naive timestamp (taken as UTC) or a bare date (UTC midnight)
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Nullable date column; malformed input becomes absence
pub fn optional_instant(field: &str, value: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = value?;
    let parsed = parse_instant(raw);
    if parsed.is_none() {
        warn!(field = %field, value = %raw, "dropping malformed date");
    }
    parsed
}

pub fn required_instant(entity: &str, field: &str, value: &str) -> DomainResult<DateTime<Utc>> {
    parse_instant(value).ok_or_else(|| {
        DomainError::SchemaMismatch(
            entity.to_string(),
            format!("{field}: invalid timestamp {value:?}"),
        )
    })
}

/// Decode a value of a closed enumeration
pub fn closed_enum<T: FromStr>(entity: &str, field: &str, value: &str) -> DomainResult<T> {
    T::from_str(value).map_err(|_| {
        DomainError::SchemaMismatch(
            entity.to_string(),
            format!("{field}: unexpected value {value:?}"),
        )
    })
}

/// Render an instant the way it is written back to the store
pub fn format_instant(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}
