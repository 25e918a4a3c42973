use std::collections::BTreeMap;

use super::error::RankError;

/// Rescale raw weights so they sum to 1.
///
/// Fails with `InvalidWeight` for a negative or non-finite weight, and with
/// `ZeroWeightTotal` when the raw weights add up to zero.
pub fn normalize_weights(raw: &BTreeMap<String, f64>) -> Result<BTreeMap<String, f64>, RankError> {
    if let Some((name, &weight)) = raw.iter().find(|(_, w)| !w.is_finite() || **w < 0.0) {
        return Err(RankError::InvalidWeight {
            metric: name.clone(),
            weight,
        });
    }
    let total: f64 = raw.values().sum();
    if total == 0.0 {
        return Err(RankError::ZeroWeightTotal);
    }
    Ok(raw
        .iter()
        .map(|(name, weight)| (name.clone(), weight / total))
        .collect())
}
