//! Baseline-relative progress computation.
//!
//! Progress is always measured against the guild's baseline for the UTC date
//! of the observation, never against the previous snapshot. Regressions
//! (observed level below baseline, e.g. after upstream corrections) clamp to
//! zero instead of producing negative progress.

use crate::baseline::DailyBaseline;
use crate::config::CostTable;

/// Derived per-observation progress, computed once at ingest and stored
/// alongside the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressDelta {
    pub nexus_progress: i64,
    pub study_progress: i64,
    pub estimated_cost: i64,
}

/// Deltas of the observed levels over the day's baseline, clamped at zero,
/// plus the flat-rate cost estimate for those deltas.
pub fn compute(
    table: &CostTable,
    baseline: &DailyBaseline,
    nexus_level: i64,
    study_level: i64,
) -> ProgressDelta {
    let nexus_progress = nexus_level.saturating_sub(baseline.nexus_level).max(0);
    let study_progress = study_level.saturating_sub(baseline.study_level).max(0);
    let estimated_cost = nexus_progress
        .saturating_mul(table.nexus_unit_cost)
        .saturating_add(study_progress.saturating_mul(table.study_unit_cost));
    ProgressDelta {
        nexus_progress,
        study_progress,
        estimated_cost,
    }
}
