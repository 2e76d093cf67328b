use super::StatsStore;
use crate::{
    error::{StatsError, StatsResult},
    snapshot::GuildObservation,
    types,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

fn snapshot_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<GuildObservation> {
    Ok(GuildObservation {
        id: row.get(0)?,
        timestamp: StatsStore::ts_column(row, 1)?,
        guild_name: row.get(2)?,
        guild_id: row.get(3)?,
        guild_level: row.get(4)?,
        nexus_level: row.get(5)?,
        study_level: row.get(6)?,
        total_upgrades: row.get(7)?,
        nexus_progress: row.get(8)?,
        study_progress: row.get(9)?,
        estimated_cost: row.get(10)?,
        baseline_date: StatsStore::opt_date_column(row, 11)?,
        data_fresh: row.get::<_, i64>(12)? != 0,
    })
}

impl StatsStore {
    // ── Guild snapshots ────────────────────────────────────────

    /// Persist one observation and refresh the guild registry, atomically.
    /// A duplicate (timestamp, guild_name) pair rolls the whole write back
    /// and returns `DuplicateKey`; the stored row and the registry keep the
    /// values from the first writer.
    pub fn record_snapshot(&self, obs: &GuildObservation) -> StatsResult<GuildObservation> {
        let tx = self.conn.unchecked_transaction()?;
        let inserted = tx.execute(
            "INSERT INTO guild_snapshots (
                timestamp, guild_name, guild_id, guild_level, nexus_level, study_level,
                total_upgrades, nexus_progress, study_progress, estimated_cost,
                baseline_date, data_fresh
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                types::fmt_ts(&obs.timestamp),
                &obs.guild_name,
                obs.guild_id,
                obs.guild_level,
                obs.nexus_level,
                obs.study_level,
                obs.total_upgrades,
                obs.nexus_progress,
                obs.study_progress,
                obs.estimated_cost,
                obs.baseline_date.map(types::fmt_date),
                if obs.data_fresh { 1 } else { 0 }
            ],
        );
        if let Err(e) = inserted {
            if Self::is_unique_violation(&e) {
                return Err(StatsError::DuplicateKey {
                    entity: "guild_snapshot",
                    key: format!("{}, {}", types::fmt_ts(&obs.timestamp), obs.guild_name),
                });
            }
            return Err(e.into());
        }
        let id = tx.last_insert_rowid();

        // Registry refresh rides in the same transaction: a snapshot is
        // visible if and only if the registry reflects it. The registry
        // tracks the newest timestamp, not the last insert: a backfilled
        // row with an older timestamp never moves last_seen or the totals
        // backwards.
        tx.execute(
            "INSERT INTO guilds (guild_name, guild_id, last_seen, is_active, total_upgrades, guild_level)
             VALUES (?1, ?2, ?3, 1, ?4, ?5)
             ON CONFLICT(guild_name) DO UPDATE SET
                 guild_id       = COALESCE(excluded.guild_id, guilds.guild_id),
                 last_seen      = MAX(COALESCE(guilds.last_seen, ''), excluded.last_seen),
                 is_active      = 1,
                 total_upgrades = CASE WHEN excluded.last_seen >= COALESCE(guilds.last_seen, '')
                                       THEN excluded.total_upgrades ELSE guilds.total_upgrades END,
                 guild_level    = CASE WHEN excluded.last_seen >= COALESCE(guilds.last_seen, '')
                                       THEN excluded.guild_level ELSE guilds.guild_level END",
            params![
                &obs.guild_name,
                obs.guild_id,
                types::fmt_ts(&obs.timestamp),
                obs.total_upgrades,
                obs.guild_level
            ],
        )?;
        tx.commit()?;

        let mut stored = obs.clone();
        stored.id = Some(id);
        Ok(stored)
    }

    /// Most recent snapshot for a guild by stored timestamp, not by
    /// insertion order.
    pub fn latest_snapshot(&self, guild: &str) -> StatsResult<Option<GuildObservation>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, guild_name, guild_id, guild_level, nexus_level,
                    study_level, total_upgrades, nexus_progress, study_progress,
                    estimated_cost, baseline_date, data_fresh
             FROM guild_snapshots WHERE guild_name = ?1
             ORDER BY timestamp DESC LIMIT 1",
        )?;
        stmt.query_row(params![guild], snapshot_from_row)
            .optional()
            .map_err(Into::into)
    }

    /// Snapshots for a guild inside [from, to], both ends inclusive,
    /// ascending by timestamp.
    pub fn snapshot_history(
        &self,
        guild: &str,
        from: &DateTime<Utc>,
        to: &DateTime<Utc>,
    ) -> StatsResult<Vec<GuildObservation>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, guild_name, guild_id, guild_level, nexus_level,
                    study_level, total_upgrades, nexus_progress, study_progress,
                    estimated_cost, baseline_date, data_fresh
             FROM guild_snapshots
             WHERE guild_name = ?1 AND timestamp >= ?2 AND timestamp <= ?3
             ORDER BY timestamp ASC",
        )?;
        let rows = stmt.query_map(
            params![guild, types::fmt_ts(from), types::fmt_ts(to)],
            snapshot_from_row,
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn snapshot_count(&self, guild: &str) -> StatsResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM guild_snapshots WHERE guild_name = ?1",
                params![guild],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }
}
