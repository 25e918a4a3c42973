use serde::{Deserialize, Serialize};

use super::config::RankingConfig;
use super::engine::RankedTable;
use super::error::RankError;
use crate::table::{RecordTable, Value};

pub const SCORE_COLUMN: &str = "Score";
pub const RANK_COLUMN: &str = "Rank";

/// Which value a metric column shows in a projection.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MetricValues {
    /// The input cell
    #[default]
    Raw,
    /// The normalized (and possibly reversed) value the score was built from
    Normalized,
}

/// Identity, Score, Rank, then every metric column.
pub fn default_columns(config: &RankingConfig) -> Vec<String> {
    let mut columns = vec![
        config.columns.identity.clone(),
        SCORE_COLUMN.to_string(),
        RANK_COLUMN.to_string(),
    ];
    for metric in &config.metrics {
        if !columns.contains(&metric.column) {
            columns.push(metric.column.clone());
        }
    }
    columns
}

/// Every input column followed by Score and Rank, for a full export. Input
/// columns named Score or Rank are replaced by the computed ones.
pub fn export_columns(input_columns: &[String]) -> Vec<String> {
    input_columns
        .iter()
        .filter(|c| c.as_str() != SCORE_COLUMN && c.as_str() != RANK_COLUMN)
        .cloned()
        .chain([SCORE_COLUMN.to_string(), RANK_COLUMN.to_string()])
        .collect()
}

/// Restrict a ranked table to `columns`, rows sorted by score descending with
/// ties in input order.
///
/// `Score` and `Rank` name the computed values. Any other name must be an
/// input column; unknown names fail with `MissingColumns`.
pub fn project(
    ranked: &RankedTable,
    columns: &[String],
    values: MetricValues,
) -> Result<RecordTable, RankError> {
    let sources: Vec<Option<Source>> = columns
        .iter()
        .map(|name| resolve(ranked, name, values))
        .collect();

    let missing: Vec<String> = columns
        .iter()
        .zip(&sources)
        .filter(|(_, source)| source.is_none())
        .map(|(name, _)| name.clone())
        .collect();
    if !missing.is_empty() {
        return Err(RankError::MissingColumns { columns: missing });
    }

    let mut order: Vec<usize> = (0..ranked.rows.len()).collect();
    order.sort_by(|&a, &b| {
        let (ra, rb) = (&ranked.rows[a], &ranked.rows[b]);
        rb.score
            .partial_cmp(&ra.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(ra.position.cmp(&rb.position))
    });

    let rows = order
        .into_iter()
        .map(|i| {
            let row = &ranked.rows[i];
            sources
                .iter()
                .flatten()
                .map(|source| match *source {
                    Source::Score => Value::Number(row.score),
                    Source::Rank => Value::Integer(row.rank as i64),
                    Source::Normalized(m) => Value::Number(row.normalized[m]),
                    Source::Input(c) => row.values.get(c).cloned().unwrap_or(Value::Missing),
                })
                .collect()
        })
        .collect();

    Ok(RecordTable::with_rows(columns.to_vec(), rows))
}

#[derive(Debug, Clone, Copy)]
enum Source {
    Score,
    Rank,
    Normalized(usize),
    Input(usize),
}

fn resolve(ranked: &RankedTable, name: &str, values: MetricValues) -> Option<Source> {
    match name {
        SCORE_COLUMN => return Some(Source::Score),
        RANK_COLUMN => return Some(Source::Rank),
        _ => {}
    }
    if values == MetricValues::Normalized {
        if let Some(m) = ranked.metrics.iter().position(|m| m.column == name) {
            return Some(Source::Normalized(m));
        }
    }
    ranked
        .columns
        .iter()
        .position(|c| c == name)
        .map(Source::Input)
}
