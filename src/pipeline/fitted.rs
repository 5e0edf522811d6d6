//! One fitted preprocessing chain plus estimator
//!
//! Fitting runs, in order: imputation and one-hot encoding, outlier
//! removal, normalization, then class rebalancing, and finally the
//! estimator. Outlier removal and rebalancing only shape the rows the
//! estimator learns from; prediction applies the encoder and scaler alone.

use serde::{Deserialize, Serialize};

use super::config::PipelineConfig;
use super::dataset::{RawDataset, RawRow};
use super::error::ModelError;
use super::models::{Estimator, Hyperparams};
use super::outliers::inlier_indices;
use super::preprocess::{FeatureEncoder, Scaler};
use super::smote::resample;

/// Offsets keep the random steps of one fit independent of each other
const OUTLIER_SEED_OFFSET: u64 = 1;
const RESAMPLE_SEED_OFFSET: u64 = 2;
const ESTIMATOR_SEED_OFFSET: u64 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedPipeline {
    pub encoder: FeatureEncoder,
    pub scaler: Option<Scaler>,
    pub estimator: Estimator,
    /// Rows the estimator saw after outlier removal and rebalancing
    pub fitted_rows: usize,
}

impl FittedPipeline {
    pub fn fit(
        data: &RawDataset,
        params: &Hyperparams,
        config: &PipelineConfig,
        seed: u64,
    ) -> Result<Self, ModelError> {
        let encoder =
            FeatureEncoder::fit(data, config.numeric_imputation, &config.categorical_imputation)?;
        let mut x = encoder.transform(data)?;
        let mut y = data.labels.clone();

        if config.remove_outliers {
            let kept = inlier_indices(
                &x,
                config.outliers_threshold,
                seed.wrapping_add(OUTLIER_SEED_OFFSET),
            );
            x = kept.iter().map(|&i| x[i].clone()).collect();
            y = kept.iter().map(|&i| y[i]).collect();
        }

        let scaler = config
            .normalize
            .then(|| Scaler::fit(&x, config.normalize_method));
        if let Some(scaler) = &scaler {
            x = scaler.transform(&x);
        }

        if config.fix_imbalance {
            (x, y) = resample(
                x,
                y,
                &config.fix_imbalance_method,
                seed.wrapping_add(RESAMPLE_SEED_OFFSET),
            );
        }

        let estimator = Estimator::fit(params, &x, &y, seed.wrapping_add(ESTIMATOR_SEED_OFFSET))?;

        Ok(Self {
            encoder,
            scaler,
            estimator,
            fitted_rows: x.len(),
        })
    }

    fn encode(&self, row: &RawRow) -> Result<Vec<f64>, ModelError> {
        let encoded = self.encoder.transform_row(row)?;
        Ok(match &self.scaler {
            Some(scaler) => scaler.transform_row(&encoded),
            None => encoded,
        })
    }

    /// Positive-class probability of one raw row
    pub fn predict_proba_row(&self, row: &RawRow) -> Result<f64, ModelError> {
        Ok(self.estimator.predict_proba(&self.encode(row)?))
    }

    pub fn predict_proba(&self, data: &RawDataset) -> Result<Vec<f64>, ModelError> {
        data.rows.iter().map(|r| self.predict_proba_row(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::models::Algorithm;

    fn churn_like(n: usize) -> RawDataset {
        let contracts = ["Month-to-month", "One year", "Two year"];
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..n {
            let tenure = (i % 72) as f64;
            let contract = contracts[i % 3];
            // Short-tenure monthly customers churn
            let churn = u8::from(tenure < 20.0 && contract == "Month-to-month");
            rows.push(RawRow {
                numeric: vec![Some(tenure), if i % 17 == 0 { None } else { Some(50.0 + (i % 9) as f64) }],
                categorical: vec![Some(contract.to_string())],
            });
            labels.push(churn);
        }
        RawDataset {
            numeric_names: vec!["tenure".to_string(), "MonthlyCharges".to_string()],
            categorical_names: vec!["Contract".to_string()],
            rows,
            labels,
        }
    }

    #[test]
    fn test_fit_applies_every_step() {
        let data = churn_like(300);
        let config = PipelineConfig::default();
        let fitted =
            FittedPipeline::fit(&data, &Hyperparams::default_for(Algorithm::Lr), &config, 42).unwrap();

        assert_eq!(fitted.encoder.n_outputs(), 5);
        assert!(fitted.scaler.is_some());
        // 5% outliers removed, then the minority is oversampled to parity
        let (neg, _) = data.class_counts();
        assert!(fitted.fitted_rows > data.len());
        assert!(fitted.fitted_rows <= 2 * neg);
    }

    #[test]
    fn test_predictions_follow_the_pattern() {
        let data = churn_like(300);
        let fitted = FittedPipeline::fit(
            &data,
            &Hyperparams::default_for(Algorithm::Dt),
            &PipelineConfig::default(),
            42,
        )
        .unwrap();

        let churner = RawRow {
            numeric: vec![Some(3.0), Some(55.0)],
            categorical: vec![Some("Month-to-month".to_string())],
        };
        let loyal = RawRow {
            numeric: vec![Some(60.0), Some(55.0)],
            categorical: vec![Some("Two year".to_string())],
        };
        assert!(fitted.predict_proba_row(&churner).unwrap() >= 0.5);
        assert!(fitted.predict_proba_row(&loyal).unwrap() < 0.5);
    }

    #[test]
    fn test_plain_config_skips_optional_steps() {
        let data = churn_like(120);
        let config = PipelineConfig {
            normalize: false,
            remove_outliers: false,
            fix_imbalance: false,
            ..PipelineConfig::default()
        };
        let fitted =
            FittedPipeline::fit(&data, &Hyperparams::default_for(Algorithm::Nb), &config, 1).unwrap();
        assert!(fitted.scaler.is_none());
        assert_eq!(fitted.fitted_rows, data.len());
    }

    #[test]
    fn test_unknown_category_at_prediction() {
        let data = churn_like(120);
        let fitted = FittedPipeline::fit(
            &data,
            &Hyperparams::default_for(Algorithm::Lr),
            &PipelineConfig::default(),
            1,
        )
        .unwrap();
        let row = RawRow {
            numeric: vec![Some(1.0), Some(1.0)],
            categorical: vec![Some("Weekly".to_string())],
        };
        assert!(matches!(
            fitted.predict_proba_row(&row),
            Err(ModelError::UnknownCategory { .. })
        ));
    }
}
