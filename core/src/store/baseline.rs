use super::StatsStore;
use crate::{
    baseline::{BaselineOutcome, DailyBaseline},
    error::StatsResult,
    types,
};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

fn baseline_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DailyBaseline> {
    Ok(DailyBaseline {
        id: row.get(0)?,
        date: StatsStore::date_column(row, 1)?,
        guild_name: row.get(2)?,
        nexus_level: row.get(3)?,
        study_level: row.get(4)?,
        created_at: StatsStore::ts_column(row, 5)?,
    })
}

fn baseline_row(
    conn: &Connection,
    guild: &str,
    date: NaiveDate,
) -> rusqlite::Result<Option<DailyBaseline>> {
    conn.query_row(
        "SELECT id, date, guild_name, nexus_level, study_level, created_at
         FROM daily_baselines WHERE guild_name = ?1 AND date = ?2",
        params![guild, types::fmt_date(date)],
        baseline_from_row,
    )
    .optional()
}

impl StatsStore {
    // ── Daily baselines ────────────────────────────────────────

    /// Create the (guild, date) baseline if none exists yet, then return the
    /// active row. First observation wins: once the row exists, later calls
    /// hand it back untouched whatever levels they carry. Racing callers are
    /// serialized by the UNIQUE key, so every caller sees the same row and
    /// exactly one sees `created == true`.
    pub fn ensure_baseline(
        &self,
        guild: &str,
        date: NaiveDate,
        nexus_level: i64,
        study_level: i64,
    ) -> StatsResult<BaselineOutcome> {
        let tx = self.conn.unchecked_transaction()?;
        let inserted = tx.execute(
            "INSERT INTO daily_baselines (date, guild_name, nexus_level, study_level, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(date, guild_name) DO NOTHING",
            params![
                types::fmt_date(date),
                guild,
                nexus_level,
                study_level,
                types::fmt_ts(&Utc::now())
            ],
        )?;
        let row = baseline_row(&tx, guild, date)?;
        tx.commit()?;
        let baseline = row.ok_or_else(|| {
            anyhow::anyhow!("baseline row missing after upsert for {guild} on {date}")
        })?;
        Ok(BaselineOutcome {
            baseline,
            created: inserted > 0,
        })
    }

    pub fn baseline_for(&self, guild: &str, date: NaiveDate) -> StatsResult<Option<DailyBaseline>> {
        baseline_row(&self.conn, guild, date).map_err(Into::into)
    }

    /// Every baseline captured for one date, ordered by guild name.
    pub fn baselines_for_date(&self, date: NaiveDate) -> StatsResult<Vec<DailyBaseline>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, guild_name, nexus_level, study_level, created_at
             FROM daily_baselines WHERE date = ?1
             ORDER BY guild_name ASC",
        )?;
        let rows = stmt.query_map(params![types::fmt_date(date)], baseline_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn baseline_count(&self, guild: &str, date: NaiveDate) -> StatsResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM daily_baselines WHERE guild_name = ?1 AND date = ?2",
                params![guild, types::fmt_date(date)],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }
}
