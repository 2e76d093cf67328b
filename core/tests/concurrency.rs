//! Concurrency tests against a file-backed database.
//!
//! Two connections, one database file: the UNIQUE keys arbitrate racing
//! writers, while WAL mode plus the busy timeout keeps the loser waiting
//! instead of failing.
//!
//! Tests verify:
//! 1. Two connections share one file-backed database
//! 2. Racing baseline creators agree on a single winning row
//! 3. Racing duplicate snapshot writers produce one row and one DuplicateKey

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use guildstats_core::{snapshot::GuildObservation, store::StatsStore};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier};
use std::thread;

fn temp_db(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("guildstats-{tag}-{}.db", std::process::id()))
}

fn open_fresh(path: &Path) -> StatsStore {
    // Leftovers from an earlier interrupted run would break the assertions.
    cleanup(path);
    let store = StatsStore::open(path.to_str().unwrap()).expect("open file store");
    store.migrate().expect("migrate");
    store
}

fn cleanup(path: &Path) {
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}

fn jan15() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
}

fn observation(ts: DateTime<Utc>, nexus: i64) -> GuildObservation {
    GuildObservation {
        id: None,
        timestamp: ts,
        guild_name: "Phoenix Legends".to_string(),
        guild_id: None,
        guild_level: 100,
        nexus_level: nexus,
        study_level: 420,
        total_upgrades: 10_000,
        nexus_progress: 0,
        study_progress: 0,
        estimated_cost: 0,
        baseline_date: Some(ts.date_naive()),
        data_fresh: true,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 1: two connections share one file-backed database
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn two_connections_share_one_file() {
    let path = temp_db("shared");
    let store = open_fresh(&path);

    store
        .ensure_baseline("Phoenix Legends", jan15(), 10, 5)
        .unwrap();

    let other = store.reopen().unwrap();
    let row = other.baseline_for("Phoenix Legends", jan15()).unwrap();
    assert!(row.is_some(), "the second connection sees the first one's commit");

    drop(other);
    drop(store);
    cleanup(&path);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 2: racing baseline creators agree on a single winning row
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn racing_baseline_creators_agree_on_one_row() {
    let path = temp_db("baseline-race");
    let store = open_fresh(&path);

    let barrier = Arc::new(Barrier::new(2));
    let mut handles = Vec::new();
    for (nexus, study) in [(10i64, 5i64), (99, 77)] {
        let conn = store.reopen().expect("reopen");
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            conn.ensure_baseline("Phoenix Legends", jan15(), nexus, study)
                .expect("ensure_baseline")
        }));
    }
    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let created = outcomes.iter().filter(|o| o.created).count();
    assert_eq!(created, 1, "exactly one racer creates the row");
    assert_eq!(
        outcomes[0].baseline, outcomes[1].baseline,
        "every racer sees the same winning row"
    );
    assert_eq!(store.baseline_count("Phoenix Legends", jan15()).unwrap(), 1);

    drop(store);
    cleanup(&path);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 3: racing duplicate snapshots: one row, one DuplicateKey
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn racing_duplicate_snapshots_yield_one_row_and_one_duplicate() {
    let path = temp_db("snapshot-race");
    let store = open_fresh(&path);
    let ts = Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let mut handles = Vec::new();
    for nexus in [580i64, 999] {
        let row = observation(ts, nexus);
        let conn = store.reopen().expect("reopen");
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            (nexus, conn.record_snapshot(&row))
        }));
    }
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners: Vec<i64> = results
        .iter()
        .filter(|(_, r)| r.is_ok())
        .map(|(nexus, _)| *nexus)
        .collect();
    assert_eq!(winners.len(), 1, "exactly one insert succeeds");

    let duplicates = results
        .iter()
        .filter(|(_, r)| matches!(r, Err(e) if e.is_duplicate()))
        .count();
    assert_eq!(duplicates, 1, "the loser gets DuplicateKey, not a raw SQL error");

    assert_eq!(store.snapshot_count("Phoenix Legends").unwrap(), 1);
    let stored = store.latest_snapshot("Phoenix Legends").unwrap().unwrap();
    assert_eq!(stored.nexus_level, winners[0], "the stored row is the winner's");

    drop(store);
    cleanup(&path);
}
