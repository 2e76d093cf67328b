use super::StatsStore;
use crate::{
    error::StatsResult,
    run_log::{FreshnessSummary, RunRecord},
    types,
};
use rusqlite::params;

fn run_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRecord> {
    let errors_json: String = row.get(14)?;
    let errors: Vec<String> = serde_json::from_str(&errors_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(14, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(RunRecord {
        id: row.get(0)?,
        cycle_id: row.get(1)?,
        started_at: StatsStore::ts_column(row, 2)?,
        duration_seconds: row.get(3)?,
        guilds_processed: row.get(4)?,
        guilds_skipped: row.get(5)?,
        snapshots_new: row.get(6)?,
        snapshots_duplicate: row.get(7)?,
        quotes_new: row.get(8)?,
        quotes_duplicate: row.get(9)?,
        baselines_created: row.get(10)?,
        api_calls: row.get(11)?,
        freshness: FreshnessSummary {
            guild_data: row.get::<_, i64>(12)? != 0,
            market_data: row.get::<_, i64>(13)? != 0,
        },
        errors,
    })
}

impl StatsStore {
    // ── Run log ────────────────────────────────────────────────

    /// Append one cycle record. The log is append-only: there is no update
    /// or delete path, aborted cycles get a row like everything else.
    pub fn append_run(&self, record: &RunRecord) -> StatsResult<i64> {
        let errors_json = serde_json::to_string(&record.errors)?;
        self.conn.execute(
            "INSERT INTO run_log (
                cycle_id, started_at, duration_seconds, guilds_processed, guilds_skipped,
                snapshots_new, snapshots_duplicate, quotes_new, quotes_duplicate,
                baselines_created, api_calls, guild_data_fresh, market_data_fresh, errors
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                &record.cycle_id,
                types::fmt_ts(&record.started_at),
                record.duration_seconds,
                record.guilds_processed,
                record.guilds_skipped,
                record.snapshots_new,
                record.snapshots_duplicate,
                record.quotes_new,
                record.quotes_duplicate,
                record.baselines_created,
                record.api_calls,
                if record.freshness.guild_data { 1 } else { 0 },
                if record.freshness.market_data { 1 } else { 0 },
                errors_json
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent cycles first.
    pub fn recent_runs(&self, limit: usize) -> StatsResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, cycle_id, started_at, duration_seconds, guilds_processed,
                    guilds_skipped, snapshots_new, snapshots_duplicate, quotes_new,
                    quotes_duplicate, baselines_created, api_calls, guild_data_fresh,
                    market_data_fresh, errors
             FROM run_log ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], run_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn run_count(&self) -> StatsResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM run_log", [], |row| row.get(0))
            .map_err(Into::into)
    }
}
