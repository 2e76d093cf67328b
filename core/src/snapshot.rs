//! Guild observation records: raw upstream rows and persisted snapshots.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StatsError, StatsResult};

fn default_fresh() -> bool {
    true
}

/// One guild row as delivered by the upstream collaborator, before any
/// derivation. `is_fresh` is false when the collaborator served a cached
/// value instead of a live fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationInput {
    pub guild_name: String,
    #[serde(default)]
    pub guild_id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub guild_level: i64,
    pub nexus_level: i64,
    pub study_level: i64,
    #[serde(default)]
    pub total_upgrades: i64,
    #[serde(default = "default_fresh")]
    pub is_fresh: bool,
}

impl ObservationInput {
    /// Reject rows the progress engine must never see. Level fields come
    /// from a remote API and occasionally arrive negative; such a row is
    /// skipped for this cycle, not stored.
    pub fn validate(&self) -> StatsResult<()> {
        let fields: [(&'static str, i64); 4] = [
            ("guild_level", self.guild_level),
            ("nexus_level", self.nexus_level),
            ("study_level", self.study_level),
            ("total_upgrades", self.total_upgrades),
        ];
        for (field, value) in fields {
            if value < 0 {
                return Err(StatsError::InvalidLevel {
                    guild: self.guild_name.clone(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// One persisted snapshot row, progress fields included. `id` is filled in
/// by the store on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildObservation {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub guild_name: String,
    pub guild_id: Option<i64>,
    pub guild_level: i64,
    pub nexus_level: i64,
    pub study_level: i64,
    pub total_upgrades: i64,
    pub nexus_progress: i64,
    pub study_progress: i64,
    pub estimated_cost: i64,
    /// Date of the baseline these progress figures were measured against.
    pub baseline_date: Option<NaiveDate>,
    pub data_fresh: bool,
}
