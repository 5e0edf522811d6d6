//! Raw dataset cleaning
//!
//! Drops the identifier column, coerces numeric text columns (unparsable
//! values become missing) and drops rows without a target label. Malformed
//! numbers never fail a row; they are left for the imputer.

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Serialize;

use super::config::PipelineConfig;
use super::dataset::{column_to_f64, column_to_strings};

/// What the cleaning step changed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleaningReport {
    pub rows_in: usize,
    pub rows_out: usize,
    /// Rows removed because the target was missing or blank
    pub missing_target_rows: usize,
    /// Whether the identifier column was present and dropped
    pub dropped_id_column: Option<String>,
    /// Per coerced column: values that were present but not numeric
    pub coerced_to_missing: Vec<(String, usize)>,
}

/// Clean a raw dataset according to the configuration.
pub fn clean_dataset(df: DataFrame, config: &PipelineConfig) -> Result<(DataFrame, CleaningReport)> {
    let mut report = CleaningReport {
        rows_in: df.height(),
        ..Default::default()
    };

    let mut df = df;

    // (a) identifier column
    if let Some(id) = &config.id_column {
        if has_column(&df, id) {
            df = df
                .drop(id)
                .with_context(|| format!("Failed to drop identifier column '{}'", id))?;
            report.dropped_id_column = Some(id.clone());
        }
    }

    // (b) numeric coercion
    for name in &config.coerce_numeric {
        if !has_column(&df, name) {
            continue;
        }
        let (series, coerced) = coerce_numeric_column(&df, name)?;
        df.with_column(series)
            .with_context(|| format!("Failed to replace column '{}'", name))?;
        report.coerced_to_missing.push((name.clone(), coerced));
    }

    // (c) rows without a target
    let target_col = df
        .column(&config.target)
        .with_context(|| format!("Target column '{}' not found in dataset", config.target))?;
    let keep: Vec<bool> = column_to_strings(target_col)?
        .iter()
        .map(Option::is_some)
        .collect();
    let dropped = keep.iter().filter(|k| !**k).count();

    if dropped > 0 {
        let mask = Series::new("keep".into(), keep);
        df = df
            .filter(mask.bool()?)
            .context("Failed to drop rows with missing target")?;
    }

    report.missing_target_rows = dropped;
    report.rows_out = df.height();

    Ok((df, report))
}

/// Coerce one column to Float64. Returns the new series and how many present
/// values could not be parsed.
fn coerce_numeric_column(df: &DataFrame, name: &str) -> Result<(Series, usize)> {
    let col = df.column(name)?;
    let before = col.len() - col.null_count();
    let values = column_to_f64(col)?;

    // Blank text is read as present by some readers; it counts as coerced too.
    let after = values.iter().filter(|v| v.is_some()).count();
    let coerced = before.saturating_sub(after);

    Ok((Series::new(name.into(), values), coerced))
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}
