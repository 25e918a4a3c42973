use std::collections::HashSet;

use super::config::RankingConfig;
use super::error::RankError;
use crate::table::RecordTable;

/// Check that every required column is present in the table.
/// Fails with all absent columns at once (not just the first), in the order
/// they were requested.
pub fn validate_schema<'a>(
    table: &'a RecordTable,
    required: &[String],
) -> Result<&'a RecordTable, RankError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|column| !table.has_column(column))
        .cloned()
        .collect();

    if missing.is_empty() {
        Ok(table)
    } else {
        Err(RankError::MissingColumns { columns: missing })
    }
}

/// Validate ranking configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_ranking_config(config: &RankingConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.columns.identity.trim().is_empty() {
        errors.push("ranking.columns.identity: must not be empty".to_string());
    }

    for (i, column) in config.columns.filters.iter().enumerate() {
        if column.trim().is_empty() {
            errors.push(format!("ranking.columns.filters[{}]: must not be empty", i));
        }
    }

    if config.metrics.is_empty() {
        errors.push("ranking.metrics: at least one metric is required".to_string());
    }

    let mut seen = HashSet::new();
    for (i, metric) in config.metrics.iter().enumerate() {
        if metric.name.trim().is_empty() {
            errors.push(format!("ranking.metrics[{}].name: must not be empty", i));
        } else if !seen.insert(metric.name.as_str()) {
            errors.push(format!(
                "ranking.metrics[{}].name: duplicate metric '{}'",
                i, metric.name
            ));
        }
        if metric.column.trim().is_empty() {
            errors.push(format!("ranking.metrics[{}].column: must not be empty", i));
        }
        if !metric.weight.is_finite() || metric.weight < 0.0 {
            errors.push(format!(
                "ranking.metrics[{}].weight: must be a non-negative number, got {}",
                i, metric.weight
            ));
        }
    }

    for column in config.filters.keys() {
        if column.trim().is_empty() {
            errors.push("ranking.filters: filter column name must not be empty".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
