//! Integration tests for the dashboard views.
//!
//! Tests verify the read-side queries:
//! 1. The overview ranks guilds strongest-first with registry fields joined
//! 2. Each guild contributes exactly its latest snapshot
//! 3. Daily totals sum each guild's final same-day snapshot, newest date first
//! 4. The spending summary prices current cost in an item, None without quotes

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use guildstats_core::{market::MarketQuote, snapshot::GuildObservation, store::StatsStore};

fn store() -> StatsStore {
    let store = StatsStore::in_memory().expect("in-memory store");
    store.migrate().expect("migrate");
    store
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, day, hour, 0, 0).unwrap()
}

fn jan(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
}

fn snap(guild: &str, ts: DateTime<Utc>) -> GuildObservation {
    GuildObservation {
        id: None,
        timestamp: ts,
        guild_name: guild.to_string(),
        guild_id: None,
        guild_level: 100,
        nexus_level: 580,
        study_level: 420,
        total_upgrades: 10_000,
        nexus_progress: 0,
        study_progress: 0,
        estimated_cost: 0,
        baseline_date: Some(ts.date_naive()),
        data_fresh: true,
    }
}

fn with_levels(mut s: GuildObservation, nexus: i64, study: i64, upgrades: i64) -> GuildObservation {
    s.nexus_level = nexus;
    s.study_level = study;
    s.total_upgrades = upgrades;
    s
}

fn with_progress(mut s: GuildObservation, nexus: i64, study: i64, cost: i64) -> GuildObservation {
    s.nexus_progress = nexus;
    s.study_progress = study;
    s.estimated_cost = cost;
    s
}

fn quote(item: &str, ts: DateTime<Utc>, buy: i64, sell: i64) -> MarketQuote {
    MarketQuote {
        id: None,
        timestamp: ts,
        item_name: item.to_string(),
        item_id: None,
        buy_price: buy,
        sell_price: sell,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 1: overview ranks strongest first (nexus, then study, then upgrades)
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn overview_ranks_strongest_first() {
    let store = store();
    let ts = at(15, 10);

    store
        .record_snapshot(&with_levels(snap("Mystic Order", ts), 650, 300, 100))
        .unwrap();
    store
        .record_snapshot(&with_levels(snap("Dragon Warriors", ts), 700, 200, 50))
        .unwrap();
    store
        .record_snapshot(&with_levels(snap("Phoenix Legends", ts), 650, 300, 200))
        .unwrap();

    let overview = store.latest_overview().unwrap();
    let names: Vec<&str> = overview.iter().map(|g| g.guild_name.as_str()).collect();
    // Nexus decides; the 650/300 tie falls through to lifetime upgrades.
    assert_eq!(
        names,
        vec!["Dragon Warriors", "Phoenix Legends", "Mystic Order"]
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 2: each guild contributes exactly its latest snapshot
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn overview_shows_each_guilds_latest_snapshot() {
    let store = store();

    store
        .record_snapshot(&with_levels(snap("Phoenix Legends", at(15, 10)), 580, 420, 100))
        .unwrap();
    store
        .record_snapshot(&with_progress(
            with_levels(snap("Phoenix Legends", at(15, 12)), 583, 420, 130),
            3,
            0,
            300,
        ))
        .unwrap();
    store.set_guild_owner("Phoenix Legends", Some(42)).unwrap();

    let overview = store.latest_overview().unwrap();
    assert_eq!(overview.len(), 1, "one row per guild, not per snapshot");

    let row = &overview[0];
    assert_eq!(row.timestamp, at(15, 12));
    assert_eq!(row.nexus_level, 583);
    assert_eq!(row.nexus_progress, 3);
    assert_eq!(row.estimated_cost, 300);
    assert_eq!(row.owner_id, Some(42), "registry fields ride along");
    assert!(row.is_active);

    // The inactivity flag is visible through the join.
    store.mark_inactive_before(&at(16, 0)).unwrap();
    let overview = store.latest_overview().unwrap();
    assert!(!overview[0].is_active);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 3: daily totals sum each guild's final same-day snapshot
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn daily_totals_use_the_final_snapshot_of_each_day() {
    let store = store();

    // Phoenix polls three times on Jan 15; only the 15:00 row may count.
    store
        .record_snapshot(&with_progress(snap("Phoenix Legends", at(15, 9)), 0, 0, 0))
        .unwrap();
    store
        .record_snapshot(&with_progress(snap("Phoenix Legends", at(15, 12)), 2, 1, 350))
        .unwrap();
    store
        .record_snapshot(&with_progress(snap("Phoenix Legends", at(15, 15)), 3, 1, 450))
        .unwrap();
    store
        .record_snapshot(&with_progress(snap("Dragon Warriors", at(15, 10)), 1, 0, 100))
        .unwrap();

    let totals = store.daily_progress_totals().unwrap();
    assert_eq!(totals.len(), 1);
    let day = &totals[0];
    assert_eq!(day.date, jan(15));
    assert_eq!(day.guilds, 2);
    assert_eq!(day.nexus_progress, 4, "3 + 1, intermediate polls do not double-count");
    assert_eq!(day.study_progress, 1);
    assert_eq!(day.estimated_cost, 550);

    // The next day gets its own row, listed first.
    store
        .record_snapshot(&with_progress(snap("Phoenix Legends", at(16, 9)), 0, 0, 0))
        .unwrap();
    let totals = store.daily_progress_totals().unwrap();
    assert_eq!(totals.len(), 2);
    assert_eq!(totals[0].date, jan(16));
    assert_eq!(totals[0].guilds, 1);
    assert_eq!(totals[1].date, jan(15));
}

#[test]
fn progress_total_for_finds_one_date_or_none() {
    let store = store();

    store
        .record_snapshot(&with_progress(snap("Phoenix Legends", at(15, 12)), 3, 1, 450))
        .unwrap();

    let day = store.progress_total_for(jan(15)).unwrap().unwrap();
    assert_eq!(day.nexus_progress, 3);
    assert_eq!(day.estimated_cost, 450);

    assert!(store.progress_total_for(jan(14)).unwrap().is_none());
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 4: spending summary prices current cost in a market item
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn spending_summary_prices_cost_in_the_item() {
    let store = store();

    // Only each guild's latest cost counts: Phoenix 300 (not the stale 100),
    // Dragon 150.
    store
        .record_snapshot(&with_progress(snap("Phoenix Legends", at(15, 10)), 1, 0, 100))
        .unwrap();
    store
        .record_snapshot(&with_progress(snap("Phoenix Legends", at(15, 12)), 3, 0, 300))
        .unwrap();
    store
        .record_snapshot(&with_progress(snap("Dragon Warriors", at(15, 11)), 0, 1, 150))
        .unwrap();
    store.record_quote(&quote("Codex", at(15, 10), 100, 120)).unwrap();

    let summary = store
        .spending_summary("Codex", &at(15, 0))
        .unwrap()
        .expect("a quoted item yields a projection");
    assert_eq!(summary.item_name, "Codex");
    assert_eq!(summary.total_estimated_cost, 450);
    assert_eq!(summary.average_unit_price, 110.0);
    assert_eq!(summary.projected_spend, 450.0 * 110.0);
}

#[test]
fn spending_summary_is_none_without_quotes() {
    let store = store();

    store
        .record_snapshot(&with_progress(snap("Phoenix Legends", at(15, 12)), 3, 0, 300))
        .unwrap();

    // No quotes at all, and no quotes inside the window, both mean None.
    assert!(store.spending_summary("Codex", &at(15, 0)).unwrap().is_none());
    store.record_quote(&quote("Codex", at(15, 10), 100, 120)).unwrap();
    assert!(store.spending_summary("Codex", &at(15, 11)).unwrap().is_none());
}
