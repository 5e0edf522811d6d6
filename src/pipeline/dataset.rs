//! Typed feature rows extracted from a cleaned DataFrame
//!
//! Model search works on row-major raw values: numeric features as
//! `Option<f64>`, categorical features as `Option<String>`, and a 0/1 label
//! per row. Missing values stay `None` until the fitted imputer fills them.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::config::PipelineConfig;
use super::error::ModelError;
use super::target::{create_target_mask, TargetMapping};

/// A single feature value in a prediction record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
    Missing,
}

/// One prediction record keyed by training column name
pub type FeatureRow = BTreeMap<String, FeatureValue>;

/// Raw (unencoded) values of one row
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub numeric: Vec<Option<f64>>,
    pub categorical: Vec<Option<String>>,
}

/// Labeled raw rows ready for preprocessing
#[derive(Debug, Clone)]
pub struct RawDataset {
    pub numeric_names: Vec<String>,
    pub categorical_names: Vec<String>,
    pub rows: Vec<RawRow>,
    /// 1 for the positive label, 0 for the negative label
    pub labels: Vec<u8>,
}

impl RawDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows at the given indices, in that order
    pub fn subset(&self, indices: &[usize]) -> RawDataset {
        RawDataset {
            numeric_names: self.numeric_names.clone(),
            categorical_names: self.categorical_names.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }

    /// (negative, positive) label counts
    pub fn class_counts(&self) -> (usize, usize) {
        let positives = self.labels.iter().filter(|&&l| l == 1).count();
        (self.labels.len() - positives, positives)
    }
}

/// Extract the configured feature columns and the mapped target from a
/// cleaned DataFrame.
///
/// Rows whose target matches neither label are skipped; their count is
/// returned alongside the dataset.
pub fn extract_dataset(df: &DataFrame, config: &PipelineConfig) -> Result<(RawDataset, usize)> {
    let mapping = TargetMapping::new(
        config.positive_label.clone(),
        config.negative_label.clone(),
    );
    let mask = create_target_mask(df, &config.target, &mapping)?;

    let mut numeric_columns = Vec::with_capacity(config.numeric_features.len());
    for name in &config.numeric_features {
        let column = df
            .column(name)
            .with_context(|| format!("Numeric feature '{}' not found in dataset", name))?;
        numeric_columns.push(column_to_f64(column)?);
    }

    let mut categorical_columns = Vec::with_capacity(config.categorical_features.len());
    for name in &config.categorical_features {
        let column = df
            .column(name)
            .with_context(|| format!("Categorical feature '{}' not found in dataset", name))?;
        categorical_columns.push(column_to_strings(column)?);
    }

    let mut rows = Vec::with_capacity(df.height());
    let mut labels = Vec::with_capacity(df.height());
    let mut ignored = 0usize;

    for (row_idx, label) in mask.iter().enumerate() {
        let Some(label) = label else {
            ignored += 1;
            continue;
        };
        rows.push(RawRow {
            numeric: numeric_columns.iter().map(|c| c[row_idx]).collect(),
            categorical: categorical_columns
                .iter()
                .map(|c| c[row_idx].clone())
                .collect(),
        });
        labels.push(*label as u8);
    }

    Ok((
        RawDataset {
            numeric_names: config.numeric_features.clone(),
            categorical_names: config.categorical_features.clone(),
            rows,
            labels,
        },
        ignored,
    ))
}

/// Convert a prediction record to raw values in training column order.
pub fn raw_row_from_features(
    row: &FeatureRow,
    numeric_names: &[String],
    categorical_names: &[String],
) -> Result<RawRow, ModelError> {
    let numeric = numeric_names
        .iter()
        .map(|name| match row.get(name) {
            None => Err(ModelError::MissingFeature(name.clone())),
            Some(FeatureValue::Number(v)) if v.is_finite() => Ok(Some(*v)),
            Some(FeatureValue::Number(_)) | Some(FeatureValue::Missing) => Ok(None),
            Some(FeatureValue::Text(s)) => match parse_numeric_text(s) {
                Some(v) => Ok(Some(v)),
                None if s.trim().is_empty() => Ok(None),
                None => Err(ModelError::TypeMismatch {
                    feature: name.clone(),
                    expected: "numeric",
                }),
            },
        })
        .collect::<Result<Vec<_>, _>>()?;

    let categorical = categorical_names
        .iter()
        .map(|name| match row.get(name) {
            None => Err(ModelError::MissingFeature(name.clone())),
            Some(FeatureValue::Text(s)) if s.trim().is_empty() => Ok(None),
            Some(FeatureValue::Text(s)) => Ok(Some(s.clone())),
            Some(FeatureValue::Number(v)) => Ok(Some(format!("{}", v))),
            Some(FeatureValue::Missing) => Ok(None),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RawRow {
        numeric,
        categorical,
    })
}

/// Parse a text cell as a number, the way the cleaning step coerces values.
pub fn parse_numeric_text(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Read a column as optional floats. Text cells are parsed; anything
/// unparsable becomes `None`.
pub fn column_to_f64(col: &Column) -> Result<Vec<Option<f64>>> {
    let values: Vec<Option<f64>> = match col.dtype() {
        DataType::String => col
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_numeric_text))
            .collect(),
        DataType::Null => vec![None; col.len()],
        dt if dt.is_primitive_numeric() || *dt == DataType::Boolean => {
            let cast = col.cast(&DataType::Float64)?;
            cast.f64()?
                .into_iter()
                .map(|v| v.filter(|x| x.is_finite()))
                .collect()
        }
        _ => {
            let cast = col.cast(&DataType::String)?;
            cast.str()?
                .into_iter()
                .map(|v| v.and_then(parse_numeric_text))
                .collect()
        }
    };

    Ok(values)
}

/// Read a column as optional strings. Blank text counts as missing.
pub fn column_to_strings(col: &Column) -> Result<Vec<Option<String>>> {
    let values: Vec<Option<String>> = match col.dtype() {
        DataType::String => col
            .str()?
            .into_iter()
            .map(|v| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string))
            .collect(),
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
            let cast = col.cast(&DataType::Int64)?;
            cast.i64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            let cast = col.cast(&DataType::UInt64)?;
            cast.u64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::Float32 | DataType::Float64 => {
            let cast = col.cast(&DataType::Float64)?;
            cast.f64()?
                .into_iter()
                .map(|v| v.map(|n| format!("{}", n)))
                .collect()
        }
        DataType::Boolean => col
            .bool()?
            .into_iter()
            .map(|v| v.map(|b| b.to_string()))
            .collect(),
        DataType::Null => vec![None; col.len()],
        _ => {
            let cast = col.cast(&DataType::String)?;
            cast.str()?
                .into_iter()
                .map(|v| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string))
                .collect()
        }
    };

    Ok(values)
}
