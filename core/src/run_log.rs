//! Run log records: one append-only audit row per collection cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Freshness of the two upstream feeds for one cycle, reported
/// independently. A cycle can have live guild data and cached market data
/// or the other way around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessSummary {
    pub guild_data: bool,
    pub market_data: bool,
}

/// Outcome of one collection cycle. Written exactly once per cycle run,
/// including aborted ones; never updated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<i64>,
    pub cycle_id: String,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub guilds_processed: i64,
    pub guilds_skipped: i64,
    pub snapshots_new: i64,
    pub snapshots_duplicate: i64,
    pub quotes_new: i64,
    pub quotes_duplicate: i64,
    pub baselines_created: i64,
    pub api_calls: i64,
    pub freshness: FreshnessSummary,
    /// Human-readable messages for every row skipped or failure hit during
    /// the cycle. Stored as a JSON array.
    pub errors: Vec<String>,
}
