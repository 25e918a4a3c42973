use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ranking configuration.
///
/// Declares which columns play which role, how every metric is weighted, the
/// normalization method and the categorical filters. The engine never reads
/// anything that is not in this value.
///
/// Example YAML:
/// ```yaml
/// ranking:
///   columns:
///     identity: Player
///     filters: [Pos, Squad]
///   metrics:
///     - { name: xG, column: xG_Expected, weight: 30 }
///     - { name: Fouls, column: Fls, weight: 5, reverse: true }
///   method: z-score
///   filters:
///     Pos: [FW, MF]
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RankingConfig {
    #[serde(default)]
    pub columns: ColumnRoles,

    /// Metrics in display order
    #[serde(default = "default_metrics")]
    pub metrics: Vec<MetricConfig>,

    #[serde(default)]
    pub method: NormalizationMethod,

    /// Categorical column -> allowed values. An empty list means no restriction.
    #[serde(default)]
    pub filters: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub invalid_values: InvalidValuePolicy,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            columns: ColumnRoles::default(),
            metrics: default_metrics(),
            method: NormalizationMethod::default(),
            filters: BTreeMap::new(),
            invalid_values: InvalidValuePolicy::default(),
        }
    }
}

impl RankingConfig {
    pub fn metric(&self, name: &str) -> Option<&MetricConfig> {
        self.metrics.iter().find(|m| m.name == name)
    }

    /// Raw weight of every metric, keyed by metric name
    pub fn raw_weights(&self) -> BTreeMap<String, f64> {
        self.metrics
            .iter()
            .map(|m| (m.name.clone(), m.weight))
            .collect()
    }

    /// Every column the input table must carry: identity, filter columns
    /// (declared, or with a non-empty selection) and metric columns, without
    /// duplicates.
    pub fn required_columns(&self) -> Vec<String> {
        let mut required: Vec<String> = Vec::new();
        let active_filters = self
            .filters
            .iter()
            .filter(|(_, allowed)| !allowed.is_empty())
            .map(|(column, _)| column);
        let candidates = std::iter::once(&self.columns.identity)
            .chain(self.columns.filters.iter())
            .chain(active_filters)
            .chain(self.metrics.iter().map(|m| &m.column));
        for column in candidates {
            if !required.contains(column) {
                required.push(column.clone());
            }
        }
        required
    }
}

/// Column roles recognized by the engine.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ColumnRoles {
    /// Display name column, e.g. "Player"
    #[serde(default = "default_identity")]
    pub identity: String,

    /// Categorical columns available for filtering, e.g. ["Pos", "Squad"]
    #[serde(default)]
    pub filters: Vec<String>,
}

impl Default for ColumnRoles {
    fn default() -> Self {
        Self {
            identity: default_identity(),
            filters: Vec::new(),
        }
    }
}

/// One scoring metric.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetricConfig {
    /// Label used in weights and overrides, e.g. "xG"
    pub name: String,

    /// Source column in the input table, e.g. "xG_Expected"
    pub column: String,

    /// Raw non-negative weight; weights are rescaled to sum to 1
    pub weight: f64,

    /// Lower is better
    #[serde(default)]
    pub reverse: bool,
}

impl MetricConfig {
    pub fn new(name: &str, column: &str, weight: f64) -> Self {
        Self {
            name: name.to_string(),
            column: column.to_string(),
            weight,
            reverse: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum NormalizationMethod {
    /// Rescale to [0, 1] using the column's own min and max
    #[default]
    MinMax,
    /// Mean 0, unit population standard deviation
    ZScore,
}

impl std::fmt::Display for NormalizationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NormalizationMethod::MinMax => f.write_str("min-max"),
            NormalizationMethod::ZScore => f.write_str("z-score"),
        }
    }
}

/// What to do with a metric cell that is not a number.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidValuePolicy {
    /// Fail the whole run with `InvalidMetricValue`
    #[default]
    Fail,
    /// Drop the row from every metric before normalizing
    Drop,
}

fn default_identity() -> String {
    "Player".to_string()
}

fn default_metrics() -> Vec<MetricConfig> {
    vec![
        MetricConfig::new("xG", "xG_Expected", 30.0),
        MetricConfig::new("xA", "xAG_Expected", 20.0),
        MetricConfig::new("G+A", "G+A", 20.0),
        MetricConfig::new("Tackles Won", "TklW_Tackles", 5.0),
        MetricConfig::new("Shot Blocks", "Sh_Blocks", 5.0),
        MetricConfig::new("Interceptions", "Int", 5.0),
        MetricConfig::new("Clearances", "Clr", 5.0),
        MetricConfig::new("Recoveries", "Recov", 5.0),
        MetricConfig::new("Minutes", "Min_Playing", 5.0),
    ]
}
