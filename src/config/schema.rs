use serde::{Deserialize, Serialize};

use crate::ranking::{MetricValues, RankingConfig};

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Default CSV input path, used when none is given on the command line
    #[serde(default)]
    pub input: Option<String>,

    #[serde(default)]
    pub ranking: RankingConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

/// How ranked results are shown in the terminal.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig {
    /// Columns to show; defaults to identity, Score, Rank and the metric columns
    #[serde(default)]
    pub columns: Option<Vec<String>>,

    /// Show raw or normalized metric values
    #[serde(default)]
    pub values: MetricValues,

    /// Show only the top N rows
    #[serde(default)]
    pub limit: Option<usize>,
}
