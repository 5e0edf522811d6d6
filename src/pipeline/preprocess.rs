//! Imputation, one-hot encoding and normalization
//!
//! `FeatureEncoder` turns raw rows into dense numeric vectors: numeric
//! columns first (imputed), then one indicator per category of each
//! categorical column (imputed, sorted vocabulary). `Scaler` rescales the
//! encoded columns. Both are fitted on training rows only and serialized
//! with the model artifact.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::config::{CategoricalImputation, NormalizeMethod, NumericImputation};
use super::dataset::{RawDataset, RawRow};
use super::error::ModelError;

/// Fitted imputer and one-hot encoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    pub numeric_names: Vec<String>,
    pub categorical_names: Vec<String>,
    /// Fill value per numeric column
    pub numeric_fill: Vec<f64>,
    /// Fill value per categorical column
    pub categorical_fill: Vec<String>,
    /// Sorted categories per categorical column
    pub vocabularies: Vec<Vec<String>>,
}

impl FeatureEncoder {
    pub fn fit(
        data: &RawDataset,
        numeric_imputation: NumericImputation,
        categorical_imputation: &CategoricalImputation,
    ) -> Result<Self, ModelError> {
        if data.is_empty() {
            return Err(ModelError::FitError(
                "cannot fit feature encoder on zero rows".to_string(),
            ));
        }

        let numeric_fill = (0..data.numeric_names.len())
            .map(|col| {
                let observed: Vec<f64> = data.rows.iter().filter_map(|r| r.numeric[col]).collect();
                numeric_fill_value(&observed, numeric_imputation)
            })
            .collect();

        let mut categorical_fill = Vec::with_capacity(data.categorical_names.len());
        let mut vocabularies = Vec::with_capacity(data.categorical_names.len());

        for (col, name) in data.categorical_names.iter().enumerate() {
            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for row in &data.rows {
                if let Some(value) = &row.categorical[col] {
                    *counts.entry(value.as_str()).or_default() += 1;
                }
            }

            let fill = match categorical_imputation {
                CategoricalImputation::Constant(value) => value.clone(),
                CategoricalImputation::Mode => counts
                    .iter()
                    // BTreeMap iterates in key order, so ties go to the smallest key
                    .fold(None::<(&str, usize)>, |best, (&k, &n)| match best {
                        Some((_, best_n)) if best_n >= n => best,
                        _ => Some((k, n)),
                    })
                    .map(|(k, _)| k.to_string())
                    .ok_or_else(|| {
                        ModelError::FitError(format!(
                            "categorical feature '{}' has no observed values",
                            name
                        ))
                    })?,
            };

            let mut vocabulary: Vec<String> = counts.keys().map(|k| k.to_string()).collect();
            if !vocabulary.contains(&fill) {
                vocabulary.push(fill.clone());
                vocabulary.sort();
            }

            categorical_fill.push(fill);
            vocabularies.push(vocabulary);
        }

        Ok(Self {
            numeric_names: data.numeric_names.clone(),
            categorical_names: data.categorical_names.clone(),
            numeric_fill,
            categorical_fill,
            vocabularies,
        })
    }

    /// Width of an encoded row
    pub fn n_outputs(&self) -> usize {
        self.numeric_names.len() + self.vocabularies.iter().map(Vec::len).sum::<usize>()
    }

    /// Names of the encoded columns, e.g. `Contract_One year`
    pub fn output_names(&self) -> Vec<String> {
        let mut names = self.numeric_names.clone();
        for (name, vocab) in self.categorical_names.iter().zip(&self.vocabularies) {
            names.extend(vocab.iter().map(|v| format!("{}_{}", name, v)));
        }
        names
    }

    /// Encode one raw row; unknown categories are an error
    pub fn transform_row(&self, row: &RawRow) -> Result<Vec<f64>, ModelError> {
        let mut out = Vec::with_capacity(self.n_outputs());

        for (value, fill) in row.numeric.iter().zip(&self.numeric_fill) {
            out.push(value.unwrap_or(*fill));
        }

        for (col, vocab) in self.vocabularies.iter().enumerate() {
            let value = row.categorical[col]
                .as_deref()
                .unwrap_or(&self.categorical_fill[col]);
            let hit = vocab.binary_search_by(|v| v.as_str().cmp(value)).map_err(|_| {
                ModelError::UnknownCategory {
                    feature: self.categorical_names[col].clone(),
                    value: value.to_string(),
                }
            })?;
            out.extend((0..vocab.len()).map(|i| if i == hit { 1.0 } else { 0.0 }));
        }

        Ok(out)
    }

    pub fn transform(&self, data: &RawDataset) -> Result<Vec<Vec<f64>>, ModelError> {
        data.rows.iter().map(|r| self.transform_row(r)).collect()
    }
}

fn numeric_fill_value(observed: &[f64], strategy: NumericImputation) -> f64 {
    if observed.is_empty() {
        return 0.0;
    }
    match strategy {
        NumericImputation::Mean => observed.iter().sum::<f64>() / observed.len() as f64,
        NumericImputation::Median => {
            let mut sorted = observed.to_vec();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let mid = sorted.len() / 2;
            if sorted.len() % 2 == 0 {
                (sorted[mid - 1] + sorted[mid]) / 2.0
            } else {
                sorted[mid]
            }
        }
        NumericImputation::Zero => 0.0,
    }
}

/// Fitted per-column rescaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub method: NormalizeMethod,
    /// Subtracted from each column (mean or minimum)
    pub offset: Vec<f64>,
    /// Each column is divided by this (std or range); never zero
    pub scale: Vec<f64>,
}

impl Scaler {
    pub fn fit(x: &[Vec<f64>], method: NormalizeMethod) -> Self {
        let width = x.first().map_or(0, Vec::len);
        let n = x.len().max(1) as f64;
        let mut offset = Vec::with_capacity(width);
        let mut scale = Vec::with_capacity(width);

        for col in 0..width {
            let values = x.iter().map(|r| r[col]);
            let (o, s) = match method {
                NormalizeMethod::Zscore => {
                    let mean = values.clone().sum::<f64>() / n;
                    let var = values.map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                    (mean, var.sqrt())
                }
                NormalizeMethod::Minmax => {
                    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                        (lo.min(v), hi.max(v))
                    });
                    (min, max - min)
                }
            };
            offset.push(o);
            // Constant columns pass through centred
            scale.push(if s > 1e-12 { s } else { 1.0 });
        }

        Self {
            method,
            offset,
            scale,
        }
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.offset.iter().zip(&self.scale))
            .map(|(v, (o, s))| (v - o) / s)
            .collect()
    }

    pub fn transform(&self, x: &[Vec<f64>]) -> Vec<Vec<f64>> {
        x.iter().map(|r| self.transform_row(r)).collect()
    }
}
