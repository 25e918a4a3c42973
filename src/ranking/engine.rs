use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, warn};

use super::config::{InvalidValuePolicy, NormalizationMethod, RankingConfig};
use super::error::RankError;
use super::filter::matching_rows;
use super::normalize::normalize_column;
use super::validation::validate_schema;
use super::weights::normalize_weights;
use crate::table::{RecordTable, Value};

/// A metric as it took part in a ranking run.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMetric {
    pub name: String,
    pub column: String,
    /// Normalized weight (all metrics sum to 1)
    pub weight: f64,
    pub reverse: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedRow {
    /// 0-based position in the input table
    pub position: usize,
    /// Input cells, aligned with `RankedTable::columns`
    pub values: Vec<Value>,
    /// Normalized metric values, aligned with `RankedTable::metrics`
    pub normalized: Vec<f64>,
    pub score: f64,
    pub rank: u32,
}

/// Result of a ranking run: rows sorted by score descending, ties in input
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedTable {
    /// Input table header
    pub columns: Vec<String>,
    pub identity: String,
    pub method: NormalizationMethod,
    pub metrics: Vec<RankedMetric>,
    pub rows: Vec<RankedRow>,
}

impl RankedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Run the whole pipeline: schema check, weights, filters, metric extraction,
/// per-column normalization, weighted score and dense rank.
///
/// Every stage either succeeds or fails the run. `EmptyResult` is returned
/// when filtering (or dropping invalid rows) leaves nothing to rank.
pub fn rank_table(table: &RecordTable, config: &RankingConfig) -> Result<RankedTable, RankError> {
    let table = validate_schema(table, &config.required_columns())?;

    let metrics = weighted_metrics(config)?;

    let positions = matching_rows(table, &config.filters)?;
    debug!("Filters kept {} of {} rows", positions.len(), table.len());
    if positions.is_empty() {
        return Err(RankError::EmptyResult);
    }

    let (positions, raw_columns) = extract_metrics(table, &positions, &metrics, config.invalid_values)?;
    if positions.is_empty() {
        return Err(RankError::EmptyResult);
    }

    let normalized: Vec<Vec<f64>> = metrics
        .iter()
        .zip(&raw_columns)
        .map(|(metric, values)| normalize_column(values, config.method, metric.reverse))
        .collect();

    let weights: Vec<f64> = metrics.iter().map(|m| m.weight).collect();
    let scores = weighted_scores(&normalized, &weights, positions.len());
    let ranks = dense_rank(&scores);

    let rows = score_order(&scores)
        .into_iter()
        .map(|i| RankedRow {
            position: positions[i],
            values: table.rows[positions[i]].clone(),
            normalized: normalized.iter().map(|column| column[i]).collect(),
            score: scores[i],
            rank: ranks[i],
        })
        .collect::<Vec<_>>();

    debug!(
        "Ranked {} rows with {} metrics ({})",
        rows.len(),
        metrics.len(),
        config.method
    );

    Ok(RankedTable {
        columns: table.columns.clone(),
        identity: config.columns.identity.clone(),
        method: config.method,
        metrics,
        rows,
    })
}

/// The configured metrics with their weights rescaled to sum to 1.
///
/// Weights are keyed by metric name, so a name may appear only once.
pub fn weighted_metrics(config: &RankingConfig) -> Result<Vec<RankedMetric>, RankError> {
    let mut seen = HashSet::new();
    if let Some(dup) = config.metrics.iter().find(|m| !seen.insert(m.name.as_str())) {
        return Err(RankError::DuplicateMetric(dup.name.clone()));
    }
    let normalized_weights = normalize_weights(&config.raw_weights())?;
    Ok(config
        .metrics
        .iter()
        .map(|m| RankedMetric {
            name: m.name.clone(),
            column: m.column.clone(),
            weight: normalized_weights.get(&m.name).copied().unwrap_or(0.0),
            reverse: m.reverse,
        })
        .collect())
}

/// Pull every metric column out of the selected rows as floats.
///
/// Returns the surviving row positions and one value vector per metric. Under
/// `Drop`, a row with any non-numeric metric cell is removed from every
/// metric, so all columns describe the same row set.
fn extract_metrics(
    table: &RecordTable,
    positions: &[usize],
    metrics: &[RankedMetric],
    policy: InvalidValuePolicy,
) -> Result<(Vec<usize>, Vec<Vec<f64>>), RankError> {
    let indices: Vec<usize> = metrics
        .iter()
        .map(|m| {
            table.column_index(&m.column).ok_or_else(|| RankError::MissingColumns {
                columns: vec![m.column.clone()],
            })
        })
        .collect::<Result<_, _>>()?;

    let mut kept = Vec::with_capacity(positions.len());
    let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(positions.len()); metrics.len()];

    'rows: for &row in positions {
        let mut values = Vec::with_capacity(indices.len());
        for (metric, &idx) in metrics.iter().zip(&indices) {
            let cell = table.cell(row, idx);
            match cell.as_f64() {
                Some(v) => values.push(v),
                None => match policy {
                    InvalidValuePolicy::Fail => {
                        return Err(RankError::InvalidMetricValue {
                            row: row + 1,
                            column: metric.column.clone(),
                            value: cell.to_string(),
                        });
                    }
                    InvalidValuePolicy::Drop => {
                        warn!(
                            "Dropping row {}: column '{}' has non-numeric value '{}'",
                            row + 1,
                            metric.column,
                            cell
                        );
                        continue 'rows;
                    }
                },
            }
        }
        kept.push(row);
        for (column, v) in columns.iter_mut().zip(values) {
            column.push(v);
        }
    }

    Ok((kept, columns))
}

/// score[row] = Σ normalized[metric][row] * weight[metric]
pub fn weighted_scores(normalized: &[Vec<f64>], weights: &[f64], rows: usize) -> Vec<f64> {
    (0..rows)
        .map(|row| {
            normalized
                .iter()
                .zip(weights)
                .fold(0.0, |acc, (column, w)| acc + column[row] * w)
        })
        .collect()
}

/// Row indices ordered by score descending. The sort is stable, so equal
/// scores keep their input order.
pub fn score_order(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));
    order
}

/// Dense rank by descending score: 1 for the highest score, equal scores
/// share a rank, and the next distinct score takes the next integer.
pub fn dense_rank(scores: &[f64]) -> Vec<u32> {
    let mut ranks = vec![0; scores.len()];
    let mut rank = 0;
    let mut previous: Option<f64> = None;
    for i in score_order(scores) {
        if previous != Some(scores[i]) {
            rank += 1;
            previous = Some(scores[i]);
        }
        ranks[i] = rank;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::MetricConfig;
    use std::collections::BTreeMap;

    fn players(rows: &[(&str, &str, &[f64])], metric_columns: &[&str]) -> RecordTable {
        let mut columns = vec!["Player".to_string(), "Pos".to_string()];
        columns.extend(metric_columns.iter().map(|c| c.to_string()));
        RecordTable::with_rows(
            columns,
            rows.iter()
                .map(|(name, pos, metrics)| {
                    let mut row = vec![Value::from(*name), Value::from(*pos)];
                    row.extend(metrics.iter().map(|m| Value::Number(*m)));
                    row
                })
                .collect(),
        )
    }

    fn config(metrics: Vec<MetricConfig>) -> RankingConfig {
        RankingConfig {
            metrics,
            ..RankingConfig::default()
        }
    }

    fn scores(ranked: &RankedTable) -> Vec<f64> {
        ranked.rows.iter().map(|r| r.score).collect()
    }

    fn names(ranked: &RankedTable) -> Vec<String> {
        ranked.rows.iter().map(|r| r.values[0].to_string()).collect()
    }

    #[test]
    fn test_three_rows_single_metric_min_max() {
        let table = players(
            &[("A", "FW", &[0.0]), ("B", "FW", &[5.0]), ("C", "FW", &[10.0])],
            &["xG"],
        );
        let ranked = rank_table(&table, &config(vec![MetricConfig::new("xG", "xG", 100.0)])).unwrap();

        // Sorted by score: C, B, A
        assert_eq!(names(&ranked), vec!["C", "B", "A"]);
        assert_eq!(scores(&ranked), vec![1.0, 0.5, 0.0]);
        assert_eq!(ranked.rows.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3]);

        // Input order view: normalized [0, 0.5, 1], rank [3, 2, 1]
        let mut by_position = ranked.rows.clone();
        by_position.sort_by_key(|r| r.position);
        assert_eq!(
            by_position.iter().map(|r| r.normalized[0]).collect::<Vec<_>>(),
            vec![0.0, 0.5, 1.0]
        );
        assert_eq!(by_position.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![3, 2, 1]);
    }

    #[test]
    fn test_constant_metric_ties() {
        let table = players(&[("A", "FW", &[7.0]), ("B", "FW", &[7.0])], &["xG"]);
        let ranked = rank_table(&table, &config(vec![MetricConfig::new("xG", "xG", 100.0)])).unwrap();

        assert_eq!(scores(&ranked), vec![0.5, 0.5]);
        assert_eq!(ranked.rows.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 1]);
        // Ties keep input order
        assert_eq!(names(&ranked), vec!["A", "B"]);
    }

    #[test]
    fn test_all_zero_weights_fail() {
        let table = players(&[("A", "FW", &[1.0, 2.0])], &["xG", "xA"]);
        let err = rank_table(
            &table,
            &config(vec![
                MetricConfig::new("xG", "xG", 0.0),
                MetricConfig::new("xA", "xA", 0.0),
            ]),
        )
        .unwrap_err();
        assert_eq!(err, RankError::ZeroWeightTotal);
    }

    #[test]
    fn test_filter_to_absent_value_is_empty_result() {
        let table = players(&[("A", "FW", &[1.0]), ("B", "MF", &[2.0])], &["xG"]);
        let mut cfg = config(vec![MetricConfig::new("xG", "xG", 1.0)]);
        cfg.filters.insert("Pos".to_string(), vec!["GK".to_string()]);

        let err = rank_table(&table, &cfg).unwrap_err();
        assert_eq!(err, RankError::EmptyResult);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_missing_columns_reported_together() {
        let table = players(&[("A", "FW", &[1.0])], &["xG"]);
        let err = rank_table(
            &table,
            &config(vec![
                MetricConfig::new("xA", "xAG_Expected", 1.0),
                MetricConfig::new("xG", "xG", 1.0),
                MetricConfig::new("Int", "Int", 1.0),
            ]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            RankError::MissingColumns {
                columns: vec!["xAG_Expected".to_string(), "Int".to_string()]
            }
        );
    }

    #[test]
    fn test_weighted_combination() {
        // xG normalized [0, 1], xA normalized [1, 0]; weights 3:1
        let table = players(&[("A", "FW", &[0.0, 4.0]), ("B", "FW", &[2.0, 0.0])], &["xG", "xA"]);
        let ranked = rank_table(
            &table,
            &config(vec![
                MetricConfig::new("xG", "xG", 75.0),
                MetricConfig::new("xA", "xA", 25.0),
            ]),
        )
        .unwrap();
        assert_eq!(names(&ranked), vec!["B", "A"]);
        assert!((ranked.rows[0].score - 0.75).abs() < 1e-12);
        assert!((ranked.rows[1].score - 0.25).abs() < 1e-12);
        assert!((ranked.metrics[0].weight - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_reversed_metric() {
        let table = players(&[("A", "FW", &[1.0]), ("B", "FW", &[9.0])], &["Fls"]);
        let mut fouls = MetricConfig::new("Fouls", "Fls", 1.0);
        fouls.reverse = true;
        let ranked = rank_table(&table, &config(vec![fouls])).unwrap();
        assert_eq!(names(&ranked), vec!["A", "B"]);
        assert_eq!(scores(&ranked), vec![1.0, 0.0]);
    }

    #[test]
    fn test_z_score_method() {
        let table = players(&[("A", "FW", &[1.0]), ("B", "FW", &[3.0])], &["xG"]);
        let mut cfg = config(vec![MetricConfig::new("xG", "xG", 2.0)]);
        cfg.method = NormalizationMethod::ZScore;
        let ranked = rank_table(&table, &cfg).unwrap();
        assert_eq!(scores(&ranked), vec![1.0, -1.0]);
        assert_eq!(ranked.method, NormalizationMethod::ZScore);
    }

    #[test]
    fn test_normalization_uses_filtered_rows_only() {
        let table = players(
            &[("A", "FW", &[0.0]), ("B", "MF", &[100.0]), ("C", "FW", &[10.0])],
            &["xG"],
        );
        let mut cfg = config(vec![MetricConfig::new("xG", "xG", 1.0)]);
        cfg.filters.insert("Pos".to_string(), vec!["FW".to_string()]);
        let ranked = rank_table(&table, &cfg).unwrap();
        assert_eq!(names(&ranked), vec!["C", "A"]);
        assert_eq!(scores(&ranked), vec![1.0, 0.0]);
        assert_eq!(ranked.rows[0].position, 2);
    }

    #[test]
    fn test_invalid_value_fails_by_default() {
        let mut table = players(&[("A", "FW", &[1.0]), ("B", "FW", &[2.0])], &["xG"]);
        table.rows[1][2] = Value::Text("n/a".to_string());
        let err = rank_table(&table, &config(vec![MetricConfig::new("xG", "xG", 1.0)])).unwrap_err();
        assert_eq!(
            err,
            RankError::InvalidMetricValue {
                row: 2,
                column: "xG".to_string(),
                value: "n/a".to_string()
            }
        );
    }

    #[test]
    fn test_drop_policy_removes_row_from_every_metric() {
        let mut table = players(
            &[("A", "FW", &[0.0, 0.0]), ("B", "FW", &[100.0, 5.0]), ("C", "FW", &[10.0, 10.0])],
            &["xG", "xA"],
        );
        // B has a valid xG outlier but a missing xA; it must not stretch xG's range
        table.rows[1][3] = Value::Missing;
        let mut cfg = config(vec![
            MetricConfig::new("xG", "xG", 1.0),
            MetricConfig::new("xA", "xA", 1.0),
        ]);
        cfg.invalid_values = InvalidValuePolicy::Drop;

        let ranked = rank_table(&table, &cfg).unwrap();
        assert_eq!(names(&ranked), vec!["C", "A"]);
        assert_eq!(ranked.rows[0].normalized, vec![1.0, 1.0]);
        assert_eq!(ranked.rows[1].normalized, vec![0.0, 0.0]);
    }

    #[test]
    fn test_drop_policy_dropping_everything_is_empty_result() {
        let mut table = players(&[("A", "FW", &[1.0])], &["xG"]);
        table.rows[0][2] = Value::Missing;
        let mut cfg = config(vec![MetricConfig::new("xG", "xG", 1.0)]);
        cfg.invalid_values = InvalidValuePolicy::Drop;
        assert_eq!(rank_table(&table, &cfg).unwrap_err(), RankError::EmptyResult);
    }

    #[test]
    fn test_zero_weight_metric_does_not_count() {
        let table = players(&[("A", "FW", &[0.0, 9.0]), ("B", "FW", &[1.0, 0.0])], &["xG", "xA"]);
        let ranked = rank_table(
            &table,
            &config(vec![
                MetricConfig::new("xG", "xG", 1.0),
                MetricConfig::new("xA", "xA", 0.0),
            ]),
        )
        .unwrap();
        assert_eq!(names(&ranked), vec!["B", "A"]);
        assert_eq!(scores(&ranked), vec![1.0, 0.0]);
    }

    #[test]
    fn test_weighted_metrics_keep_config_order() {
        let mut fouls = MetricConfig::new("Fouls", "Fls", 1.0);
        fouls.reverse = true;
        let metrics = weighted_metrics(&config(vec![MetricConfig::new("xG", "xG_Expected", 3.0), fouls])).unwrap();
        assert_eq!(metrics[0].name, "xG");
        assert_eq!(metrics[0].weight, 0.75);
        assert_eq!(metrics[1].column, "Fls");
        assert_eq!(metrics[1].weight, 0.25);
        assert!(metrics[1].reverse);
    }

    #[test]
    fn test_duplicate_metric_names_fail() {
        let table = players(&[("A", "FW", &[1.0, 2.0]), ("B", "FW", &[2.0, 1.0])], &["a", "b"]);
        let err = rank_table(
            &table,
            &config(vec![
                MetricConfig::new("xG", "a", 1.0),
                MetricConfig::new("xG", "b", 3.0),
            ]),
        )
        .unwrap_err();
        assert_eq!(err, RankError::DuplicateMetric("xG".to_string()));
    }

    #[test]
    fn test_negative_weight_fails() {
        let table = players(&[("A", "FW", &[1.0, 2.0]), ("B", "FW", &[2.0, 1.0])], &["xG", "xA"]);
        let err = rank_table(
            &table,
            &config(vec![
                MetricConfig::new("xG", "xG", 2.0),
                MetricConfig::new("xA", "xA", -1.0),
            ]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            RankError::InvalidWeight {
                metric: "xA".to_string(),
                weight: -1.0
            }
        );
    }

    #[test]
    fn test_ranks_parsed_csv() {
        let csv = "Player,Pos,Squad,xG_Expected,Clr\n\
                   Saka,FW,Arsenal,8.1,3\n\
                   Saliba,DF,Arsenal,0.9,60\n\
                   Haaland,FW,Man City,22.3,4\n";
        let table = crate::table::read_csv_from_reader(csv.as_bytes()).unwrap();
        let mut cfg = config(vec![
            MetricConfig::new("xG", "xG_Expected", 50.0),
            MetricConfig::new("Clearances", "Clr", 50.0),
        ]);
        cfg.columns.filters = vec!["Pos".to_string(), "Squad".to_string()];

        let ranked = rank_table(&table, &cfg).unwrap();
        assert_eq!(names(&ranked), vec!["Haaland", "Saliba", "Saka"]);

        cfg.filters.insert("Pos".to_string(), vec!["GK".to_string()]);
        assert_eq!(rank_table(&table, &cfg).unwrap_err(), RankError::EmptyResult);
    }

    #[test]
    fn test_dense_rank_no_gaps() {
        let ranks = dense_rank(&[0.2, 0.9, 0.2, 0.5, 0.9]);
        assert_eq!(ranks, vec![3, 1, 3, 2, 1]);
    }

    #[test]
    fn test_dense_rank_empty() {
        assert!(dense_rank(&[]).is_empty());
    }

    #[test]
    fn test_score_order_is_stable() {
        assert_eq!(score_order(&[1.0, 2.0, 1.0, 2.0]), vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_weighted_scores() {
        let normalized = vec![vec![0.0, 1.0], vec![1.0, 0.5]];
        let scores = weighted_scores(&normalized, &[0.5, 0.5], 2);
        assert_eq!(scores, vec![0.5, 0.75]);
    }

    #[test]
    fn test_unrestricted_filter_keeps_all_rows() {
        let table = players(&[("A", "FW", &[1.0]), ("B", "MF", &[2.0])], &["xG"]);
        let mut cfg = config(vec![MetricConfig::new("xG", "xG", 1.0)]);
        cfg.filters = BTreeMap::from([("Pos".to_string(), vec![])]);
        assert_eq!(rank_table(&table, &cfg).unwrap().len(), 2);
    }

    mod proptests {
        use super::super::dense_rank;
        use proptest::prelude::*;

        proptest! {
            /// Property: equal scores share a rank and ranks run 1..=k without gaps
            #[test]
            fn prop_dense_rank_contiguous(
                scores in proptest::collection::vec(0u8..6, 1..40)
            ) {
                let scores: Vec<f64> = scores.into_iter().map(|s| s as f64 / 5.0).collect();
                let ranks = dense_rank(&scores);

                for i in 0..scores.len() {
                    for j in 0..scores.len() {
                        if scores[i] == scores[j] {
                            prop_assert_eq!(ranks[i], ranks[j]);
                        } else if scores[i] > scores[j] {
                            prop_assert!(ranks[i] < ranks[j]);
                        }
                    }
                }

                let mut distinct: Vec<u32> = ranks.clone();
                distinct.sort_unstable();
                distinct.dedup();
                let expected: Vec<u32> = (1..=distinct.len() as u32).collect();
                prop_assert_eq!(distinct, expected);
            }
        }
    }
}
