//! Missing value analysis
//!
//! Reports which feature columns still contain missing values after cleaning.
//! Those values are filled by the fitted imputer, not dropped.

use anyhow::Result;
use polars::prelude::*;

/// Share of missing values per column, sorted descending.
pub fn analyze_missing_values(df: &DataFrame) -> Result<Vec<(String, f64)>> {
    if df.height() == 0 {
        return Ok(Vec::new());
    }

    let rows = df.height() as f64;
    let mut missing_ratios: Vec<(String, f64)> = df
        .get_columns()
        .iter()
        .map(|col| (col.name().to_string(), col.null_count() as f64 / rows))
        .collect();

    missing_ratios.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    Ok(missing_ratios)
}

/// Columns among `features` with any missing value, with their missing counts
pub fn features_needing_imputation(df: &DataFrame, features: &[String]) -> Vec<(String, usize)> {
    features
        .iter()
        .filter_map(|name| {
            let col = df.column(name).ok()?;
            let nulls = col.null_count();
            (nulls > 0).then(|| (name.clone(), nulls))
        })
        .collect()
}
