use thiserror::Error;

/// Failures of a ranking run.
///
/// Every error is raised before any output row exists, so a caller never sees
/// a partially scored table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RankError {
    #[error("missing required columns: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("all weights are zero; increase at least one weight")]
    ZeroWeightTotal,

    #[error("no rows left after filtering")]
    EmptyResult,

    #[error("row {row}: column '{column}' has non-numeric value '{value}'")]
    InvalidMetricValue {
        /// 1-based data row in the input table
        row: usize,
        column: String,
        value: String,
    },

    #[error("unknown metric '{0}'")]
    UnknownMetric(String),

    #[error("metric '{metric}' has weight {weight}; weights must be non-negative numbers")]
    InvalidWeight { metric: String, weight: f64 },

    #[error("metric '{0}' is configured more than once")]
    DuplicateMetric(String),
}

impl RankError {
    /// Only an empty filter result is recoverable: the caller can show an
    /// empty table instead of failing.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RankError::EmptyResult)
    }
}
