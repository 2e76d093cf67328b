//! The collection cycle — one scheduled ingest of upstream data.
//!
//! PIPELINE ORDER (fixed, per observation):
//!   1. Validate levels (negative values skip the row, never store it).
//!   2. Ensure the guild's baseline for the observation's UTC date.
//!   3. Compute progress against that baseline.
//!   4. Record the snapshot + registry refresh in one transaction.
//! Then all market quotes, then exactly one run-log row.
//!
//! RULES:
//!   - A bad row costs that row only; the rest of the batch proceeds.
//!   - A duplicate is a no-op, counted but never an error.
//!   - A store failure aborts the cycle; the run-log row is still attempted
//!     so the audit trail shows the aborted cycle.
//!   - Stale inputs are stored and flagged, never rejected.

use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::CostTable,
    error::{StatsError, StatsResult},
    market::MarketQuote,
    progress,
    run_log::{FreshnessSummary, RunRecord},
    snapshot::{GuildObservation, ObservationInput},
    store::StatsStore,
};

fn default_true() -> bool {
    true
}

/// Everything one scheduled execution ingests: guild observations, market
/// quotes, and what the upstream client reported about itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationBatch {
    pub observations: Vec<ObservationInput>,
    #[serde(default)]
    pub quotes: Vec<MarketQuote>,
    /// False when the market feed served cached data for this batch.
    #[serde(default = "default_true")]
    pub market_data_fresh: bool,
    /// Upstream API call volume, carried into the run log.
    #[serde(default)]
    pub api_calls: i64,
}

impl Default for ObservationBatch {
    fn default() -> Self {
        Self {
            observations: Vec::new(),
            quotes: Vec::new(),
            market_data_fresh: true,
            api_calls: 0,
        }
    }
}

struct ObservationOutcome {
    baseline_created: bool,
    duplicate: bool,
}

pub struct Collector {
    cost_table: CostTable,
}

impl Collector {
    pub fn new(cost_table: CostTable) -> Self {
        Self { cost_table }
    }

    /// Ingest one batch and append its run record. Returns the record as
    /// written. A store failure aborts the remainder of the batch, appends a
    /// best-effort run record, and surfaces the original error.
    pub fn run_cycle(&self, store: &StatsStore, batch: &ObservationBatch) -> StatsResult<RunRecord> {
        let started = Instant::now();
        let mut record = RunRecord {
            id: None,
            cycle_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            duration_seconds: 0.0,
            guilds_processed: 0,
            guilds_skipped: 0,
            snapshots_new: 0,
            snapshots_duplicate: 0,
            quotes_new: 0,
            quotes_duplicate: 0,
            baselines_created: 0,
            api_calls: batch.api_calls,
            // guild_data is ANDed below over the observations that actually
            // land; a row skipped as invalid carries no stored staleness.
            freshness: FreshnessSummary {
                guild_data: true,
                market_data: batch.market_data_fresh,
            },
            errors: Vec::new(),
        };

        for obs in &batch.observations {
            match self.process_observation(store, obs) {
                Ok(outcome) => {
                    record.guilds_processed += 1;
                    if !obs.is_fresh {
                        record.freshness.guild_data = false;
                    }
                    if outcome.baseline_created {
                        record.baselines_created += 1;
                    }
                    if outcome.duplicate {
                        record.snapshots_duplicate += 1;
                    } else {
                        record.snapshots_new += 1;
                    }
                }
                Err(e @ StatsError::InvalidLevel { .. }) => {
                    log::warn!("skipping guild '{}': {e}", obs.guild_name);
                    record.guilds_skipped += 1;
                    record.errors.push(e.to_string());
                }
                Err(e) => return self.abort_cycle(store, record, started, e),
            }
        }

        for quote in &batch.quotes {
            match store.record_quote(quote) {
                Ok(_) => record.quotes_new += 1,
                Err(StatsError::DuplicateKey { .. }) => {
                    log::debug!(
                        "duplicate quote for '{}' at {}",
                        quote.item_name,
                        quote.timestamp
                    );
                    record.quotes_duplicate += 1;
                }
                Err(e) => return self.abort_cycle(store, record, started, e),
            }
        }

        record.duration_seconds = started.elapsed().as_secs_f64();
        let id = store.append_run(&record)?;
        record.id = Some(id);
        log::info!(
            "cycle {}: {} processed, {} skipped, {} new snapshots, {} duplicates, {} baselines created, {} quotes",
            record.cycle_id,
            record.guilds_processed,
            record.guilds_skipped,
            record.snapshots_new,
            record.snapshots_duplicate,
            record.baselines_created,
            record.quotes_new,
        );
        Ok(record)
    }

    fn process_observation(
        &self,
        store: &StatsStore,
        input: &ObservationInput,
    ) -> StatsResult<ObservationOutcome> {
        input.validate()?;
        if !input.is_fresh {
            log::debug!("stale observation for '{}', storing flagged", input.guild_name);
        }

        let date = input.timestamp.date_naive();
        let outcome = store.ensure_baseline(
            &input.guild_name,
            date,
            input.nexus_level,
            input.study_level,
        )?;
        let delta = progress::compute(
            &self.cost_table,
            &outcome.baseline,
            input.nexus_level,
            input.study_level,
        );

        let row = GuildObservation {
            id: None,
            timestamp: input.timestamp,
            guild_name: input.guild_name.clone(),
            guild_id: input.guild_id,
            guild_level: input.guild_level,
            nexus_level: input.nexus_level,
            study_level: input.study_level,
            total_upgrades: input.total_upgrades,
            nexus_progress: delta.nexus_progress,
            study_progress: delta.study_progress,
            estimated_cost: delta.estimated_cost,
            baseline_date: Some(date),
            data_fresh: input.is_fresh,
        };
        match store.record_snapshot(&row) {
            Ok(_) => Ok(ObservationOutcome {
                baseline_created: outcome.created,
                duplicate: false,
            }),
            Err(StatsError::DuplicateKey { .. }) => {
                log::debug!(
                    "duplicate snapshot for '{}' at {}",
                    input.guild_name,
                    input.timestamp
                );
                Ok(ObservationOutcome {
                    baseline_created: outcome.created,
                    duplicate: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// The cycle failed mid-flight. Record what happened as far as the run
    /// log will let us, then surface the original error.
    fn abort_cycle(
        &self,
        store: &StatsStore,
        mut record: RunRecord,
        started: Instant,
        err: StatsError,
    ) -> StatsResult<RunRecord> {
        log::error!("cycle {} aborted: {err}", record.cycle_id);
        record.errors.push(format!("cycle aborted: {err}"));
        record.duration_seconds = started.elapsed().as_secs_f64();
        if let Err(log_err) = store.append_run(&record) {
            log::error!(
                "run log append failed after aborted cycle {}: {log_err}",
                record.cycle_id
            );
        }
        Err(err)
    }
}
