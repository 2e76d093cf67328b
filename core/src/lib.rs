//! guildstats-core — baseline-relative guild progression and market price
//! tracking on SQLite.
//!
//! The library ingests periodic observations of game guilds (upgrade levels)
//! and market quotes, measures each observation against the guild's first
//! sighting of that UTC date, and keeps an append-only audit row per
//! collection cycle. All persistence goes through [`store::StatsStore`];
//! [`collector::Collector`] drives one full ingest cycle.

pub mod baseline;
pub mod collector;
pub mod config;
pub mod error;
pub mod guild;
pub mod market;
pub mod progress;
pub mod run_log;
pub mod snapshot;
pub mod store;
pub mod types;
