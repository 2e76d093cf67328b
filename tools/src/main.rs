//! stats-runner: headless collection harness for guildstats.
//!
//! Usage:
//!   stats-runner --db stats.db --cycles 12 --seed 42
//!   stats-runner --db stats.db --replay batch.json
//!   stats-runner --db stats.db --cost-table costs.json --json
//!
//! Without --replay the runner stands in for the live API client: it
//! generates seeded mock observation/quote batches, one per cycle, spaced
//! --interval-minutes apart and ending at the current time, and feeds them
//! through the collector. --replay instead ingests a single JSON batch file
//! of the shape the API client produces. --json swaps the human-readable
//! end-of-run summary for a machine-readable report on stdout.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use guildstats_core::{
    collector::{Collector, ObservationBatch},
    config::CostTable,
    market::MarketQuote,
    run_log::RunRecord,
    snapshot::ObservationInput,
    store::{DailyProgressTotal, GuildOverview, SpendingSummary, StatsStore},
    types::format_amount,
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use std::env;

/// Guild roster for mock batches, taken from the live leaderboard so
/// generated databases look plausible in the dashboard.
const GUILD_ROSTER: [&str; 12] = [
    "Phoenix Legends",
    "Dragon Warriors",
    "Shadow Hunters",
    "Mystic Order",
    "Iron Brotherhood",
    "Storm Riders",
    "Void Seekers",
    "Crystal Guard",
    "Fire Keepers",
    "Wind Walkers",
    "Earth Shapers",
    "Wave Masters",
];

/// Tradeable items with base prices in gold.
const ITEM_PRICES: [(&str, i64); 5] = [
    ("Codex", 10_000_000_000),
    ("Elemental Shards", 75_000_000),
    ("Mana Dust", 50_000_000),
    ("Orb of Power", 5_000_000_000),
    ("Crystallized Mana", 500_000_000),
];

#[derive(serde::Serialize)]
struct SummaryReport {
    cycles_run: u64,
    runs_logged: i64,
    overview: Vec<GuildOverview>,
    daily_totals: Vec<DailyProgressTotal>,
    spending: Option<SpendingSummary>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let cycles = parse_arg(&args, "--cycles", 6u64);
    let interval_minutes = parse_arg(&args, "--interval-minutes", 30i64);
    let json_output = args.iter().any(|a| a == "--json");
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let replay = args
        .windows(2)
        .find(|w| w[0] == "--replay")
        .map(|w| w[1].as_str());
    let cost_table = match args.windows(2).find(|w| w[0] == "--cost-table") {
        Some(w) => CostTable::load(&w[1])?,
        None => CostTable::default(),
    };

    if !json_output {
        println!("guildstats — stats-runner");
        println!("  db:        {db}");
        match replay {
            Some(path) => println!("  replay:    {path}"),
            None => {
                println!("  seed:      {seed}");
                println!("  cycles:    {cycles}");
                println!("  interval:  {interval_minutes}m");
            }
        }
        println!();
    }

    let store = if db == ":memory:" {
        StatsStore::in_memory()?
    } else {
        StatsStore::open(db)?
    };
    store.migrate()?;

    let collector = Collector::new(cost_table);

    let cycles_run = match replay {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read batch file {path}"))?;
            let batch: ObservationBatch = serde_json::from_str(&raw)
                .with_context(|| format!("cannot parse batch file {path}"))?;
            let record = collector.run_cycle(&store, &batch)?;
            report_cycle(1, &record, json_output);
            1
        }
        None => {
            let mut feed = MockFeed::new(seed);
            // Oldest batch first so the final cycle lands on "now".
            let interval = Duration::minutes(interval_minutes);
            let start = Utc::now() - interval * (cycles.saturating_sub(1) as i32);
            for i in 0..cycles {
                let polled_at = start + interval * (i as i32);
                let batch = feed.next_batch(polled_at);
                let record = collector.run_cycle(&store, &batch)?;
                report_cycle(i + 1, &record, json_output);
            }
            cycles
        }
    };

    if json_output {
        print_json_report(&store, cycles_run)?;
    } else {
        println!();
        print_summary(&store, cycles_run)?;
    }
    Ok(())
}

fn report_cycle(n: u64, record: &RunRecord, json_output: bool) {
    for err in &record.errors {
        log::warn!("cycle {n}: {err}");
    }
    if json_output {
        return;
    }
    println!(
        "cycle {n:>3}: {} guilds, {} skipped, {} new / {} dup snapshots, {} baselines, {} quotes",
        record.guilds_processed,
        record.guilds_skipped,
        record.snapshots_new,
        record.snapshots_duplicate,
        record.baselines_created,
        record.quotes_new,
    );
}

fn print_summary(store: &StatsStore, cycles: u64) -> Result<()> {
    println!("=== COLLECTION SUMMARY ===");
    println!("  cycles run:     {cycles}");
    println!("  runs logged:    {}", store.run_count()?);
    println!("  guilds tracked: {}", store.all_guilds()?.len());

    println!();
    println!("=== GUILD OVERVIEW (strongest first) ===");
    let overview = store.latest_overview()?;
    if overview.is_empty() {
        println!("  (no snapshots recorded)");
    }
    for g in overview.iter().take(10) {
        println!(
            "  {:<20} nexus {:>4} (+{:<3}) study {:>4} (+{:<3}) est. cost {}",
            g.guild_name,
            g.nexus_level,
            g.nexus_progress,
            g.study_level,
            g.study_progress,
            format_amount(g.estimated_cost as f64),
        );
    }

    println!();
    println!("=== DAILY PROGRESS ===");
    let totals = store.daily_progress_totals()?;
    if totals.is_empty() {
        println!("  (no progress measured yet)");
    }
    for t in &totals {
        println!(
            "  {} | {:>3} guilds | +{:<4} nexus | +{:<4} study | {} est. cost",
            t.date,
            t.guilds,
            t.nexus_progress,
            t.study_progress,
            format_amount(t.estimated_cost as f64),
        );
    }

    let since = Utc::now() - Duration::hours(24);
    println!();
    match store.spending_summary("Codex", &since)? {
        Some(s) => {
            println!("=== PROJECTED SPEND (Codex, 24h average) ===");
            println!("  unit price:   {}", format_amount(s.average_unit_price));
            println!("  upgrade cost: {}", format_amount(s.total_estimated_cost as f64));
            println!("  total spend:  {}", format_amount(s.projected_spend));
        }
        None => println!("  (no Codex quotes in the last 24h, spend projection skipped)"),
    }
    Ok(())
}

fn print_json_report(store: &StatsStore, cycles_run: u64) -> Result<()> {
    let since = Utc::now() - Duration::hours(24);
    let report = SummaryReport {
        cycles_run,
        runs_logged: store.run_count()?,
        overview: store.latest_overview()?,
        daily_totals: store.daily_progress_totals()?,
        spending: store.spending_summary("Codex", &since)?,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Seeded stand-in for the live API client. Guild levels drift upward a
/// little every poll; item prices wander around their base with a small
/// buy/sell spread. Identical seeds produce identical batches.
struct MockFeed {
    rng: Pcg64Mcg,
    guilds: Vec<GuildState>,
}

struct GuildState {
    name: &'static str,
    nexus_level: i64,
    study_level: i64,
    total_upgrades: i64,
}

impl MockFeed {
    fn new(seed: u64) -> Self {
        let mut rng = Pcg64Mcg::seed_from_u64(seed);
        let guilds = GUILD_ROSTER
            .iter()
            .map(|name| {
                let nexus_level = 580 + rng.gen_range(-80..=120);
                let study_level = 420 + rng.gen_range(-60..=100);
                GuildState {
                    name,
                    nexus_level,
                    study_level,
                    total_upgrades: (nexus_level + study_level) * 10,
                }
            })
            .collect();
        Self { rng, guilds }
    }

    fn next_batch(&mut self, polled_at: DateTime<Utc>) -> ObservationBatch {
        let Self { rng, guilds } = self;

        let mut observations = Vec::with_capacity(guilds.len());
        for guild in guilds.iter_mut() {
            let nexus_gain = rng.gen_range(0..=2);
            let study_gain = rng.gen_range(0..=2);
            guild.nexus_level += nexus_gain;
            guild.study_level += study_gain;
            guild.total_upgrades += (nexus_gain + study_gain) * 10;
            observations.push(ObservationInput {
                guild_name: guild.name.to_string(),
                guild_id: None,
                timestamp: polled_at,
                guild_level: (guild.nexus_level + guild.study_level) / 10,
                nexus_level: guild.nexus_level,
                study_level: guild.study_level,
                total_upgrades: guild.total_upgrades,
                is_fresh: true,
            });
        }

        let quotes = ITEM_PRICES
            .iter()
            .map(|&(item, base)| {
                let variation = 1.0 + rng.gen_range(-0.15..0.15);
                let buy = (base as f64 * variation) as i64;
                let sell = (buy as f64 * rng.gen_range(1.02..1.12)) as i64;
                MarketQuote {
                    id: None,
                    timestamp: polled_at,
                    item_name: item.to_string(),
                    item_id: None,
                    buy_price: buy,
                    sell_price: sell,
                }
            })
            .collect::<Vec<_>>();

        // One leaderboard page, one detail call per guild, one market feed.
        let api_calls = 1 + observations.len() as i64 + 1;
        ObservationBatch {
            observations,
            quotes,
            market_data_fresh: true,
            api_calls,
        }
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
