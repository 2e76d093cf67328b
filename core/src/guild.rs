//! Guild registry records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Slowly-changing registry row, one per guild ever observed. Refreshed in
/// the same transaction as each accepted snapshot; `owner_id` is assigned
/// manually and survives ingest updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildEntry {
    pub guild_name: String,
    pub guild_id: Option<i64>,
    pub owner_id: Option<i64>,
    pub last_seen: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub total_upgrades: i64,
    pub guild_level: i64,
}
