pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod normalize;
pub mod projection;
pub mod validation;
pub mod weights;

pub use config::*;
pub use engine::{dense_rank, rank_table, weighted_metrics, RankedMetric, RankedRow, RankedTable};
pub use error::RankError;
pub use filter::filter_rows;
pub use normalize::normalize_column;
pub use projection::{default_columns, export_columns, project, MetricValues};
pub use validation::{validate_ranking_config, validate_schema};
pub use weights::normalize_weights;
