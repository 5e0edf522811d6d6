//! Target column analysis and label mapping
//!
//! The churn target holds text labels ("Yes"/"No"). This module maps them to
//! 1/0 and checks that a cleaned dataset still contains both classes before
//! any model search starts.

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::dataset::column_to_strings;
use super::error::ModelError;

/// Mapping from target values to binary 1/0
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetMapping {
    /// Value that maps to 1 (churned)
    pub positive: String,
    /// Value that maps to 0 (retained)
    pub negative: String,
}

impl TargetMapping {
    pub fn new(positive: String, negative: String) -> Self {
        Self { positive, negative }
    }

    /// Label text for a predicted class
    pub fn label_for(&self, is_positive: bool) -> &str {
        if is_positive {
            &self.positive
        } else {
            &self.negative
        }
    }
}

/// Distinct non-missing target values with their row counts, sorted by value
pub fn target_class_counts(df: &DataFrame, target: &str) -> Result<Vec<(String, usize)>> {
    let target_col = df
        .column(target)
        .with_context(|| format!("Target column '{}' not found", target))?;

    let mut counts: std::collections::BTreeMap<String, usize> = Default::default();
    for value in column_to_strings(target_col)?.into_iter().flatten() {
        *counts.entry(value).or_default() += 1;
    }

    Ok(counts.into_iter().collect())
}

/// Fail with `SingleClass` unless both mapped labels are present.
pub fn ensure_binary_target(
    df: &DataFrame,
    target: &str,
    mapping: &TargetMapping,
) -> Result<()> {
    let classes = target_class_counts(df, target)?;
    let has = |label: &str| classes.iter().any(|(value, n)| value == label && *n > 0);

    if !has(&mapping.positive) || !has(&mapping.negative) {
        return Err(ModelError::SingleClass {
            column: target.to_string(),
            found: classes.len(),
            positive: mapping.positive.clone(),
            negative: mapping.negative.clone(),
        }
        .into());
    }

    Ok(())
}

/// Create a binary target mask based on the mapping
///
/// Returns a Vec<Option<i32>> where:
/// - Some(1) for positive values
/// - Some(0) for negative values
/// - None for missing values or values that match neither label
pub fn create_target_mask(
    df: &DataFrame,
    target: &str,
    mapping: &TargetMapping,
) -> Result<Vec<Option<i32>>> {
    let target_col = df
        .column(target)
        .with_context(|| format!("Target column '{}' not found", target))?;

    let mask = column_to_strings(target_col)?
        .iter()
        .map(|v| match v {
            Some(s) if s == &mapping.positive => Some(1),
            Some(s) if s == &mapping.negative => Some(0),
            _ => None,
        })
        .collect();

    Ok(mask)
}

/// Count (positive, negative, ignored) records under the mapping
pub fn count_mapped_records(
    df: &DataFrame,
    target: &str,
    mapping: &TargetMapping,
) -> Result<(usize, usize, usize)> {
    let mask = create_target_mask(df, target, mapping)?;

    let positives = mask.iter().filter(|v| **v == Some(1)).count();
    let negatives = mask.iter().filter(|v| **v == Some(0)).count();
    let ignored = mask.iter().filter(|v| v.is_none()).count();

    Ok((positives, negatives, ignored))
}
