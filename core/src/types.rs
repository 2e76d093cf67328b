//! Shared primitive types and the canonical timestamp/date encodings.
//!
//! RULE: Every timestamp that reaches SQLite goes through `fmt_ts` and every
//! timestamp read back goes through `parse_ts`. The format is RFC 3339 UTC
//! with microsecond precision and a trailing `Z`, so lexicographic order on
//! the TEXT column equals chronological order and SQL can take MAX(timestamp)
//! without parsing anything.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::error::{StatsError, StatsResult};

/// Canonical guild identity. Upstream numeric ids are carried along but the
/// name is the key everywhere.
pub type GuildName = String;

/// Canonical market item identity.
pub type ItemName = String;

/// Encode a timestamp for storage: `2025-01-15T10:30:00.000000Z`.
pub fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Decode a stored or user-supplied timestamp.
pub fn parse_ts(raw: &str) -> StatsResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StatsError::InvalidTimestamp {
            raw: raw.to_string(),
            reason: e.to_string(),
        })
}

/// Encode a calendar date for storage: `2025-01-15`.
pub fn fmt_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Decode a stored or user-supplied calendar date.
pub fn parse_date(raw: &str) -> StatsResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| StatsError::InvalidTimestamp {
        raw: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Human display for large resource amounts: 1_500_000 -> "1.50M".
pub fn format_amount(amount: f64) -> String {
    if amount >= 1_000_000_000_000.0 {
        format!("{:.2}T", amount / 1_000_000_000_000.0)
    } else if amount >= 1_000_000_000.0 {
        format!("{:.2}B", amount / 1_000_000_000.0)
    } else if amount >= 1_000_000.0 {
        format!("{:.2}M", amount / 1_000_000.0)
    } else if amount >= 1_000.0 {
        format!("{:.2}K", amount / 1_000.0)
    } else {
        format!("{amount:.2}")
    }
}
