//! Read-only dashboard queries built on the latest-per-key subquery shape.
//! Nothing here writes; these exist so downstream consumers never have to
//! reimplement "latest snapshot per guild" themselves.

use super::StatsStore;
use crate::error::StatsResult;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// One guild's current standing: its most recent snapshot joined with the
/// registry row.
#[derive(Debug, Clone, Serialize)]
pub struct GuildOverview {
    pub guild_name: String,
    pub guild_id: Option<i64>,
    pub owner_id: Option<i64>,
    pub is_active: bool,
    pub timestamp: DateTime<Utc>,
    pub guild_level: i64,
    pub nexus_level: i64,
    pub study_level: i64,
    pub total_upgrades: i64,
    pub nexus_progress: i64,
    pub study_progress: i64,
    pub estimated_cost: i64,
    pub baseline_date: Option<NaiveDate>,
    pub data_fresh: bool,
}

/// Aggregate progress for one date: each guild's final same-day snapshot,
/// summed across guilds.
#[derive(Debug, Clone, Serialize)]
pub struct DailyProgressTotal {
    pub date: NaiveDate,
    pub guilds: i64,
    pub nexus_progress: i64,
    pub study_progress: i64,
    pub estimated_cost: i64,
}

/// Estimated spend priced in one market item: current total estimated cost
/// across guilds, times the item's mean quoted price over a window.
#[derive(Debug, Clone, Serialize)]
pub struct SpendingSummary {
    pub item_name: String,
    pub total_estimated_cost: i64,
    pub average_unit_price: f64,
    pub projected_spend: f64,
}

fn overview_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<GuildOverview> {
    Ok(GuildOverview {
        guild_name: row.get(0)?,
        guild_id: row.get(1)?,
        owner_id: row.get(2)?,
        is_active: row.get::<_, i64>(3)? != 0,
        timestamp: StatsStore::ts_column(row, 4)?,
        guild_level: row.get(5)?,
        nexus_level: row.get(6)?,
        study_level: row.get(7)?,
        total_upgrades: row.get(8)?,
        nexus_progress: row.get(9)?,
        study_progress: row.get(10)?,
        estimated_cost: row.get(11)?,
        baseline_date: StatsStore::opt_date_column(row, 12)?,
        data_fresh: row.get::<_, i64>(13)? != 0,
    })
}

impl StatsStore {
    // ── Dashboard views ────────────────────────────────────────

    /// Every guild's latest snapshot joined with its registry row, strongest
    /// guilds first (nexus, then study, then lifetime upgrades).
    pub fn latest_overview(&self) -> StatsResult<Vec<GuildOverview>> {
        let mut stmt = self.conn.prepare(
            "SELECT g.guild_name, g.guild_id, g.owner_id, g.is_active,
                    gs.timestamp, gs.guild_level, gs.nexus_level, gs.study_level,
                    gs.total_upgrades, gs.nexus_progress, gs.study_progress,
                    gs.estimated_cost, gs.baseline_date, gs.data_fresh
             FROM guilds g
             JOIN guild_snapshots gs ON gs.guild_name = g.guild_name
             WHERE gs.timestamp = (SELECT MAX(timestamp) FROM guild_snapshots gs2
                                   WHERE gs2.guild_name = g.guild_name)
             ORDER BY gs.nexus_level DESC, gs.study_level DESC, gs.total_upgrades DESC",
        )?;
        let rows = stmt.query_map([], overview_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Per-date progress totals, newest date first. Each guild contributes
    /// its final snapshot of the date, so the totals are end-of-day
    /// cumulative progress, not a sum over every poll.
    pub fn daily_progress_totals(&self) -> StatsResult<Vec<DailyProgressTotal>> {
        let mut stmt = self.conn.prepare(
            "SELECT gs.baseline_date, COUNT(*), SUM(gs.nexus_progress),
                    SUM(gs.study_progress), SUM(gs.estimated_cost)
             FROM guild_snapshots gs
             WHERE gs.baseline_date IS NOT NULL
               AND gs.timestamp = (SELECT MAX(timestamp) FROM guild_snapshots gs2
                                   WHERE gs2.guild_name = gs.guild_name
                                     AND gs2.baseline_date = gs.baseline_date)
             GROUP BY gs.baseline_date
             ORDER BY gs.baseline_date DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DailyProgressTotal {
                date: StatsStore::date_column(row, 0)?,
                guilds: row.get(1)?,
                nexus_progress: row.get(2)?,
                study_progress: row.get(3)?,
                estimated_cost: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Price the fleet's current estimated cost in one market item. None
    /// when the item has no quotes at or after `since`: with no price there
    /// is no projection, never a made-up one.
    pub fn spending_summary(
        &self,
        item: &str,
        since: &DateTime<Utc>,
    ) -> StatsResult<Option<SpendingSummary>> {
        let Some(average_unit_price) = self.average_price_since(item, since)? else {
            return Ok(None);
        };
        let total_estimated_cost: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(estimated_cost), 0) FROM guild_snapshots gs
             WHERE gs.timestamp = (SELECT MAX(timestamp) FROM guild_snapshots gs2
                                   WHERE gs2.guild_name = gs.guild_name)",
            [],
            |row| row.get(0),
        )?;
        Ok(Some(SpendingSummary {
            item_name: item.to_string(),
            total_estimated_cost,
            average_unit_price,
            projected_spend: total_estimated_cost as f64 * average_unit_price,
        }))
    }

    /// End-of-day totals for a single date, if any guild has a snapshot
    /// measured against that date's baseline.
    pub fn progress_total_for(&self, date: NaiveDate) -> StatsResult<Option<DailyProgressTotal>> {
        let totals = self.daily_progress_totals()?;
        Ok(totals.into_iter().find(|t| t.date == date))
    }
}
