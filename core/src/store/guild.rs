use super::StatsStore;
use crate::{error::StatsResult, guild::GuildEntry, types};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

fn guild_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<GuildEntry> {
    Ok(GuildEntry {
        guild_name: row.get(0)?,
        guild_id: row.get(1)?,
        owner_id: row.get(2)?,
        last_seen: StatsStore::opt_ts_column(row, 3)?,
        is_active: row.get::<_, i64>(4)? != 0,
        total_upgrades: row.get(5)?,
        guild_level: row.get(6)?,
    })
}

impl StatsStore {
    // ── Guild registry ─────────────────────────────────────────

    pub fn guild(&self, name: &str) -> StatsResult<Option<GuildEntry>> {
        self.conn
            .query_row(
                "SELECT guild_name, guild_id, owner_id, last_seen, is_active,
                        total_upgrades, guild_level
                 FROM guilds WHERE guild_name = ?1",
                params![name],
                guild_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn all_guilds(&self) -> StatsResult<Vec<GuildEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT guild_name, guild_id, owner_id, last_seen, is_active,
                    total_upgrades, guild_level
             FROM guilds ORDER BY guild_name ASC",
        )?;
        let rows = stmt.query_map([], guild_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Manual owner assignment. Ingest never touches this column.
    pub fn set_guild_owner(&self, name: &str, owner_id: Option<i64>) -> StatsResult<()> {
        self.conn.execute(
            "UPDATE guilds SET owner_id = ?1 WHERE guild_name = ?2",
            params![owner_id, name],
        )?;
        Ok(())
    }

    /// Deactivate guilds not seen since `cutoff`. Returns how many flipped.
    /// A later snapshot reactivates a guild automatically.
    pub fn mark_inactive_before(&self, cutoff: &DateTime<Utc>) -> StatsResult<usize> {
        let changed = self.conn.execute(
            "UPDATE guilds SET is_active = 0
             WHERE is_active = 1 AND last_seen IS NOT NULL AND last_seen < ?1",
            params![types::fmt_ts(cutoff)],
        )?;
        Ok(changed)
    }
}
