//! Training pipeline configuration
//!
//! The whole preprocessing and model-search setup is declared here as data.
//! `PipelineConfig::default()` is the churn preset; a JSON file can override
//! any subset of its fields.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::error::ModelError;
use super::metrics::Metric;
use super::models::Algorithm;
use super::schema;

/// How numeric columns are rescaled before fitting an estimator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeMethod {
    /// Subtract the mean, divide by the standard deviation
    #[default]
    Zscore,
    /// Rescale to the [0, 1] range observed during fitting
    Minmax,
}

/// Fill strategy for missing numeric values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericImputation {
    #[default]
    Mean,
    Median,
    Zero,
}

/// Fill strategy for missing categorical values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoricalImputation {
    /// Most frequent category observed during fitting
    #[default]
    Mode,
    /// A fixed category; it becomes part of the learned vocabulary
    Constant(String),
}

/// Class-imbalance correction applied to training folds only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum ImbalanceMethod {
    /// Synthetic minority oversampling
    Smote { k_neighbors: usize },
    /// Duplicate random minority rows until the classes balance
    Random,
}

impl Default for ImbalanceMethod {
    fn default() -> Self {
        ImbalanceMethod::Smote { k_neighbors: 5 }
    }
}

/// Cross-validation split strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoldStrategy {
    /// Folds preserve the class proportions of the training split
    #[default]
    Stratifiedkfold,
    /// Contiguous folds with no class balancing
    Kfold,
}

/// Complete preprocessing and training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Target column name
    pub target: String,
    /// Target value treated as the positive (churn) class
    pub positive_label: String,
    /// Target value treated as the negative class
    pub negative_label: String,
    /// Identifier column dropped before any processing
    pub id_column: Option<String>,
    /// Text columns coerced to numbers, unparsable values become missing
    pub coerce_numeric: Vec<String>,
    /// Seed for every random step
    pub session_id: u64,
    /// Share of rows used for model search; the rest is a stratified holdout
    pub train_size: f64,
    pub normalize: bool,
    pub normalize_method: NormalizeMethod,
    pub remove_outliers: bool,
    /// Share of training rows removed as outliers
    pub outliers_threshold: f64,
    pub categorical_features: Vec<String>,
    pub numeric_features: Vec<String>,
    pub numeric_imputation: NumericImputation,
    pub categorical_imputation: CategoricalImputation,
    pub fix_imbalance: bool,
    pub fix_imbalance_method: ImbalanceMethod,
    pub fold: usize,
    pub fold_strategy: FoldStrategy,
    /// Metric ranking the compared candidates
    pub sort: Metric,
    /// Metric optimized while tuning
    pub optimize: Metric,
    /// Random-search iterations in the tuning step
    pub tune_iterations: usize,
    /// Keep the untuned model if tuning does not improve the metric
    pub choose_better: bool,
    /// Restrict the candidate catalog (None = every algorithm)
    pub include: Option<Vec<Algorithm>>,
    /// Print per-fold score tables while searching
    pub verbose: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target: schema::TARGET.to_string(),
            positive_label: schema::POSITIVE_LABEL.to_string(),
            negative_label: schema::NEGATIVE_LABEL.to_string(),
            id_column: Some(schema::ID_COLUMN.to_string()),
            coerce_numeric: vec![schema::TOTAL_CHARGES.to_string()],
            session_id: 42,
            train_size: 0.7,
            normalize: true,
            normalize_method: NormalizeMethod::Zscore,
            remove_outliers: true,
            outliers_threshold: 0.05,
            categorical_features: schema::CATEGORICAL_FEATURES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            numeric_features: schema::NUMERIC_FEATURES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            numeric_imputation: NumericImputation::Mean,
            categorical_imputation: CategoricalImputation::Mode,
            fix_imbalance: true,
            fix_imbalance_method: ImbalanceMethod::default(),
            fold: 5,
            fold_strategy: FoldStrategy::Stratifiedkfold,
            sort: Metric::F1,
            optimize: Metric::F1,
            tune_iterations: 10,
            choose_better: true,
            include: None,
            verbose: false,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file. Missing keys keep their preset values.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: PipelineConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Check the configuration for inconsistencies before any data is touched.
    pub fn validate(&self) -> Result<(), ModelError> {
        let invalid = |msg: String| Err(ModelError::InvalidConfig(msg));

        if self.target.trim().is_empty() {
            return invalid("target column name is empty".to_string());
        }
        if self.positive_label == self.negative_label {
            return invalid(format!(
                "positive and negative labels are both '{}'",
                self.positive_label
            ));
        }
        if self.fold < 2 {
            return invalid(format!("fold must be at least 2, got {}", self.fold));
        }
        if !(self.train_size > 0.0 && self.train_size < 1.0) {
            return invalid(format!(
                "train_size must be between 0 and 1 (exclusive), got {}",
                self.train_size
            ));
        }
        if !(0.0..0.5).contains(&self.outliers_threshold) {
            return invalid(format!(
                "outliers_threshold must be in [0, 0.5), got {}",
                self.outliers_threshold
            ));
        }
        if self.categorical_features.is_empty() && self.numeric_features.is_empty() {
            return invalid("no feature columns configured".to_string());
        }
        if let ImbalanceMethod::Smote { k_neighbors: 0 } = self.fix_imbalance_method {
            return invalid("SMOTE k_neighbors must be at least 1".to_string());
        }
        if let Some(include) = &self.include {
            if include.is_empty() {
                return invalid("include lists no algorithms".to_string());
            }
        }

        let mut seen = HashSet::new();
        for feature in self.numeric_features.iter().chain(&self.categorical_features) {
            if feature == &self.target {
                return invalid(format!("target '{}' is also listed as a feature", feature));
            }
            if Some(feature) == self.id_column.as_ref() {
                return invalid(format!("identifier '{}' is also listed as a feature", feature));
            }
            if !seen.insert(feature.as_str()) {
                return invalid(format!("feature '{}' is listed more than once", feature));
            }
        }

        Ok(())
    }

    /// Candidate algorithms in catalog order
    pub fn candidates(&self) -> Vec<Algorithm> {
        match &self.include {
            Some(list) => Algorithm::ALL
                .iter()
                .copied()
                .filter(|a| list.contains(a))
                .collect(),
            None => Algorithm::ALL.to_vec(),
        }
    }

    /// Human-readable cross-validation description, e.g. "5-Fold Stratified"
    pub fn describe_cv(&self) -> String {
        match self.fold_strategy {
            FoldStrategy::Stratifiedkfold => format!("{}-Fold Stratified", self.fold),
            FoldStrategy::Kfold => format!("{}-Fold", self.fold),
        }
    }

    /// Human-readable imbalance handling description, e.g. "SMOTE"
    pub fn describe_imbalance(&self) -> String {
        if !self.fix_imbalance {
            return "None".to_string();
        }
        match self.fix_imbalance_method {
            ImbalanceMethod::Smote { .. } => "SMOTE".to_string(),
            ImbalanceMethod::Random => "Random Oversampling".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_churn_preset() {
        let config = PipelineConfig::default();
        assert_eq!(config.target, "Churn");
        assert_eq!(config.session_id, 42);
        assert_eq!(config.fold, 5);
        assert_eq!(config.sort, Metric::F1);
        assert!(config.normalize && config.remove_outliers && config.fix_imbalance);
        assert_eq!(
            config.categorical_features,
            vec!["PhoneService", "Contract", "PaperlessBilling", "PaymentMethod"]
        );
        assert_eq!(
            config.numeric_features,
            vec!["tenure", "MonthlyCharges", "TotalCharges"]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_describe_helpers() {
        let config = PipelineConfig::default();
        assert_eq!(config.describe_cv(), "5-Fold Stratified");
        assert_eq!(config.describe_imbalance(), "SMOTE");

        let plain = PipelineConfig {
            fold_strategy: FoldStrategy::Kfold,
            fold: 3,
            fix_imbalance: false,
            ..PipelineConfig::default()
        };
        assert_eq!(plain.describe_cv(), "3-Fold");
        assert_eq!(plain.describe_imbalance(), "None");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "fold": 3, "fix_imbalance_method": { "method": "smote", "k_neighbors": 3 } }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.fold, 3);
        assert_eq!(
            config.fix_imbalance_method,
            ImbalanceMethod::Smote { k_neighbors: 3 }
        );
        assert_eq!(config.target, "Churn");
        assert_eq!(config.tune_iterations, 10);
    }

    #[test]
    fn test_validate_rejects_single_fold() {
        let config = PipelineConfig {
            fold: 1,
            ..PipelineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ModelError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_overlapping_features() {
        let mut config = PipelineConfig::default();
        config.categorical_features.push("tenure".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_validate_rejects_target_as_feature() {
        let mut config = PipelineConfig::default();
        config.numeric_features.push("Churn".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_train_size() {
        let config = PipelineConfig {
            train_size: 1.0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_candidates_respect_include_order() {
        let config = PipelineConfig {
            include: Some(vec![Algorithm::Rf, Algorithm::Lr]),
            ..PipelineConfig::default()
        };
        assert_eq!(config.candidates(), vec![Algorithm::Lr, Algorithm::Rf]);
        assert_eq!(PipelineConfig::default().candidates().len(), Algorithm::ALL.len());
    }
}
