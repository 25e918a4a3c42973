use anyhow::{bail, Context, Result};

use crate::ranking::{InvalidValuePolicy, NormalizationMethod, RankError, RankingConfig};

/// Command-line adjustments layered over the file configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankingOverrides {
    pub method: Option<NormalizationMethod>,
    /// Metric name -> raw weight
    pub weights: Vec<(String, f64)>,
    /// Metric names to rank lower-is-better
    pub reverse: Vec<String>,
    /// Column -> allowed values; replaces the configured set for that column
    pub filters: Vec<(String, Vec<String>)>,
    pub invalid_values: Option<InvalidValuePolicy>,
}

impl RankingOverrides {
    /// Build a new configuration with the overrides applied. The base is left
    /// untouched. Naming a metric that is not configured is an error.
    pub fn apply(&self, base: &RankingConfig) -> Result<RankingConfig, RankError> {
        let mut config = base.clone();

        if let Some(method) = self.method {
            config.method = method;
        }
        if let Some(policy) = self.invalid_values {
            config.invalid_values = policy;
        }

        for (name, weight) in &self.weights {
            let metric = config
                .metrics
                .iter_mut()
                .find(|m| &m.name == name)
                .ok_or_else(|| RankError::UnknownMetric(name.clone()))?;
            metric.weight = *weight;
        }

        for name in &self.reverse {
            let metric = config
                .metrics
                .iter_mut()
                .find(|m| &m.name == name)
                .ok_or_else(|| RankError::UnknownMetric(name.clone()))?;
            metric.reverse = true;
        }

        for (column, allowed) in &self.filters {
            config.filters.insert(column.clone(), allowed.clone());
        }

        Ok(config)
    }
}

/// Parse a "NAME=WEIGHT" argument, e.g. "xG=40"
pub fn parse_weight(s: &str) -> Result<(String, f64)> {
    let Some((name, weight)) = s.rsplit_once('=') else {
        bail!("Expected NAME=WEIGHT, got '{}'", s);
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("Missing metric name in '{}'", s);
    }
    let weight: f64 = weight
        .trim()
        .parse()
        .with_context(|| format!("Invalid weight in '{}'", s))?;
    if !weight.is_finite() || weight < 0.0 {
        bail!("Weight must be a non-negative number: '{}'", s);
    }
    Ok((name.to_string(), weight))
}

/// Parse a "COLUMN=V1,V2" argument, e.g. "Pos=FW,MF". "COLUMN=" clears the
/// filter on that column.
pub fn parse_filter(s: &str) -> Result<(String, Vec<String>)> {
    let Some((column, values)) = s.split_once('=') else {
        bail!("Expected COLUMN=VALUE[,VALUE...], got '{}'", s);
    };
    let column = column.trim();
    if column.is_empty() {
        bail!("Missing column name in '{}'", s);
    }
    let values = values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    Ok((column.to_string(), values))
}
