//! SQLite persistence layer.
//!
//! RULE: Only the store modules talk to the database.
//! Everything else calls store methods — nothing outside this tree
//! executes SQL directly.
//!
//! Overlapping writers are resolved by the schema, not by the callers:
//! unique keys turn racing inserts into one winner plus `DuplicateKey`
//! losers, and WAL mode plus a busy timeout keeps a second process waiting
//! instead of failing.

mod baseline;
mod guild;
mod market;
mod run_log;
mod snapshot;
mod views;

pub use views::{DailyProgressTotal, GuildOverview, SpendingSummary};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use std::time::Duration;

use crate::error::StatsResult;
use crate::types;

pub struct StatsStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl StatsStore {
    pub fn open(path: &str) -> StatsResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> StatsResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases, this returns a new in-memory database
    /// (isolated). For file-based databases, this opens the same file.
    pub fn reopen(&self) -> StatsResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> StatsResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_market.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_run_log.sql"))?;
        Ok(())
    }

    // ── Shared row helpers ─────────────────────────────────────

    /// True when an INSERT lost to a UNIQUE or PRIMARY KEY constraint.
    pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
        matches!(err, rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
    }

    fn text_column_err(idx: usize, err: crate::error::StatsError) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
    }

    pub(crate) fn ts_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
        let raw: String = row.get(idx)?;
        types::parse_ts(&raw).map_err(|e| Self::text_column_err(idx, e))
    }

    pub(crate) fn opt_ts_column(
        row: &rusqlite::Row<'_>,
        idx: usize,
    ) -> rusqlite::Result<Option<DateTime<Utc>>> {
        row.get::<_, Option<String>>(idx)?
            .map(|raw| types::parse_ts(&raw).map_err(|e| Self::text_column_err(idx, e)))
            .transpose()
    }

    pub(crate) fn date_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
        let raw: String = row.get(idx)?;
        types::parse_date(&raw).map_err(|e| Self::text_column_err(idx, e))
    }

    pub(crate) fn opt_date_column(
        row: &rusqlite::Row<'_>,
        idx: usize,
    ) -> rusqlite::Result<Option<NaiveDate>> {
        row.get::<_, Option<String>>(idx)?
            .map(|raw| types::parse_date(&raw).map_err(|e| Self::text_column_err(idx, e)))
            .transpose()
    }
}
