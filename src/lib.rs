//! Rank players from a stats table by weighted, normalized metrics.
//!
//! The [`ranking`] module is the engine: it takes an already parsed
//! [`table::RecordTable`] and an explicit [`ranking::RankingConfig`] and
//! returns a scored, densely ranked table. Everything else (CSV files, the
//! YAML config file, terminal output) lives around it.

pub mod config;
pub mod output;
pub mod ranking;
pub mod table;
