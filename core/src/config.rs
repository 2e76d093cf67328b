//! Cost estimation policy.
//!
//! Progress costs use a flat per-level table: every nexus level gained since
//! the day's baseline costs `nexus_unit_cost` resource units, every study
//! level costs `study_unit_cost`. The defaults match the upstream game's
//! published upgrade prices; deployments can override them from a JSON file
//! without touching the schema.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CostTable {
    pub nexus_unit_cost: i64,
    pub study_unit_cost: i64,
}

impl Default for CostTable {
    fn default() -> Self {
        Self {
            nexus_unit_cost: 100,
            study_unit_cost: 150,
        }
    }
}

impl CostTable {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let table: CostTable = serde_json::from_str(&content)?;
        Ok(table)
    }
}
