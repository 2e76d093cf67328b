//! Daily baseline records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A guild's levels at the first observation of a UTC calendar date.
///
/// Immutable once written: all progress for the rest of that date is measured
/// against this row, so a mid-day upgrade shows up as progress instead of
/// silently shifting the reference point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBaseline {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<i64>,
    pub date: NaiveDate,
    pub guild_name: String,
    pub nexus_level: i64,
    pub study_level: i64,
    pub created_at: DateTime<Utc>,
}

/// What `ensure_baseline` found or did: the active row for the key, plus
/// whether this call was the one that created it.
#[derive(Debug, Clone)]
pub struct BaselineOutcome {
    pub baseline: DailyBaseline,
    pub created: bool,
}
