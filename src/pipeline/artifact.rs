//! Versioned model artifact and the prediction entry point
//!
//! A `ChurnPipeline` is written once by the trainer and read once at
//! startup by the predictor. It carries everything prediction needs (the
//! feature schema, fitted preprocessing, estimator and label mapping) plus
//! the metadata the summary reports.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::config::PipelineConfig;
use super::dataset::{raw_row_from_features, FeatureRow};
use super::error::ModelError;
use super::fitted::FittedPipeline;
use super::metrics::{BinaryMetrics, DECISION_THRESHOLD};
use super::models::{Algorithm, Hyperparams};
use super::schema::CustomerRecord;
use super::search::{LeaderboardEntry, SelectionStep};
use super::target::TargetMapping;

/// Bumped whenever the serialized layout changes
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

const ARTIFACT_EXTENSION: &str = "json";

/// A single prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Positive or negative target label, e.g. "Yes"
    pub label: String,
    /// Probability of the positive class
    pub score: f64,
    pub churn: bool,
}

/// Anything that can score a prediction record
pub trait ChurnModel {
    fn predict(&self, row: &FeatureRow) -> Result<Prediction, ModelError>;

    fn algorithm_name(&self) -> &str;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurnPipeline {
    pub format_version: u32,
    pub crate_version: String,
    /// RFC 3339 timestamp of the training run
    pub created_at: String,
    pub algorithm: Algorithm,
    pub hyperparams: Hyperparams,
    pub mapping: TargetMapping,
    /// Mean cross-validated metrics of the kept configuration
    pub cv_metrics: BinaryMetrics,
    pub selected_by: SelectionStep,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub config: PipelineConfig,
    pub fitted: FittedPipeline,
}

impl ChurnPipeline {
    pub fn new(
        fitted: FittedPipeline,
        hyperparams: Hyperparams,
        config: PipelineConfig,
        mapping: TargetMapping,
        cv_metrics: BinaryMetrics,
        selected_by: SelectionStep,
        leaderboard: Vec<LeaderboardEntry>,
    ) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: chrono::Local::now().to_rfc3339(),
            algorithm: fitted.estimator.algorithm(),
            hyperparams,
            mapping,
            cv_metrics,
            selected_by,
            leaderboard,
            config,
            fitted,
        }
    }

    /// Cross-validated F1 of the kept configuration
    pub fn cv_f1(&self) -> f64 {
        self.cv_metrics.f1
    }

    /// `models/churn_model` becomes `models/churn_model.json`; a path that
    /// already ends in `.json` is used as is.
    pub fn artifact_path(base: &Path) -> PathBuf {
        match base.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case(ARTIFACT_EXTENSION) => base.to_path_buf(),
            _ => {
                let mut name = base.as_os_str().to_owned();
                name.push(".");
                name.push(ARTIFACT_EXTENSION);
                PathBuf::from(name)
            }
        }
    }

    /// Write the artifact as pretty JSON, creating parent directories.
    pub fn save(&self, base: &Path) -> Result<PathBuf> {
        let path = Self::artifact_path(base);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize model")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write model artifact: {}", path.display()))?;
        Ok(path)
    }

    /// Read an artifact, rejecting other format versions before decoding the rest.
    pub fn load(base: &Path) -> Result<Self> {
        let path = Self::artifact_path(base);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read model artifact: {}", path.display()))?;

        let value: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("Model artifact is not valid JSON: {}", path.display()))?;
        let found = value
            .get("format_version")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;
        if found != ARTIFACT_FORMAT_VERSION {
            return Err(ModelError::IncompatibleArtifact {
                found,
                expected: ARTIFACT_FORMAT_VERSION,
            }
            .into());
        }

        serde_json::from_value(value)
            .with_context(|| format!("Failed to decode model artifact: {}", path.display()))
    }

    /// Score a typed customer record.
    pub fn predict_record(&self, record: &CustomerRecord) -> Result<Prediction, ModelError> {
        self.predict(&record.to_feature_row())
    }
}

impl ChurnModel for ChurnPipeline {
    fn predict(&self, row: &FeatureRow) -> Result<Prediction, ModelError> {
        let raw = raw_row_from_features(
            row,
            &self.fitted.encoder.numeric_names,
            &self.fitted.encoder.categorical_names,
        )?;
        let score = self.fitted.predict_proba_row(&raw)?;
        let churn = score >= DECISION_THRESHOLD;
        Ok(Prediction {
            label: self.mapping.label_for(churn).to_string(),
            score,
            churn,
        })
    }

    fn algorithm_name(&self) -> &str {
        self.algorithm.name()
    }
}


/// Small pipeline over the full churn schema for handler and form tests
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::pipeline::dataset::{RawDataset, RawRow};
    use crate::pipeline::schema::{
        Contract, PaymentMethod, YesNo, CATEGORICAL_FEATURES, NUMERIC_FEATURES,
    };

    pub(crate) fn churn_pipeline() -> ChurnPipeline {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..240usize {
            let tenure = (i % 72) as f64;
            let monthly = 20.0 + (i % 50) as f64 * 2.0;
            let contract = Contract::ALL[i % 3];
            let churn = tenure < 18.0 && contract == Contract::MonthToMonth;
            rows.push(RawRow {
                numeric: vec![Some(tenure), Some(monthly), Some(tenure * monthly)],
                categorical: vec![
                    Some(YesNo::ALL[i % 2].as_str().to_string()),
                    Some(contract.as_str().to_string()),
                    Some(YesNo::ALL[(i / 2) % 2].as_str().to_string()),
                    Some(PaymentMethod::ALL[i % 4].as_str().to_string()),
                ],
            });
            labels.push(u8::from(churn));
        }
        let data = RawDataset {
            numeric_names: NUMERIC_FEATURES.iter().map(|s| s.to_string()).collect(),
            categorical_names: CATEGORICAL_FEATURES.iter().map(|s| s.to_string()).collect(),
            rows,
            labels,
        };

        let config = PipelineConfig::default();
        let params = Hyperparams::default_for(Algorithm::Lr);
        let fitted = FittedPipeline::fit(&data, &params, &config, config.session_id)
            .expect("fixture pipeline fits");
        ChurnPipeline::new(
            fitted,
            params,
            config,
            TargetMapping::new("Yes".to_string(), "No".to_string()),
            BinaryMetrics::default(),
            SelectionStep::Compare,
            Vec::new(),
        )
    }
}
