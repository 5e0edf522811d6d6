//! Cross-validated model comparison, tuning and finalization
//!
//! The search works on the stratified training split only. Every candidate
//! is scored with the same folds; within a fold the whole preprocessing
//! chain is fitted on the training rows, so outlier removal and
//! rebalancing never touch validation rows. Folds run in parallel with
//! per-fold seeds, which keeps results identical to a sequential run.

use std::time::Instant;

use anyhow::Result;
use indicatif::ProgressBar;
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::artifact::ChurnPipeline;
use super::config::PipelineConfig;
use super::cv::{make_folds, stratified_split, Fold};
use super::dataset::{extract_dataset, RawDataset};
use super::error::ModelError;
use super::fitted::FittedPipeline;
use super::metrics::BinaryMetrics;
use super::models::{Algorithm, Hyperparams};
use super::target::{ensure_binary_target, TargetMapping};
use crate::utils::progress::{create_progress_bar, finish_with_success, finish_with_warning};

/// Seed offset between folds
const FOLD_SEED_STRIDE: u64 = 1_000;
/// Seed offset for the tuning sampler
const TUNE_SEED_OFFSET: u64 = 7;

fn fold_seed(session_id: u64, fold: usize) -> u64 {
    session_id.wrapping_add(FOLD_SEED_STRIDE * (fold as u64 + 1))
}

/// Per-fold scores of one configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvScores {
    pub folds: Vec<BinaryMetrics>,
    pub mean: BinaryMetrics,
    pub std: BinaryMetrics,
}

impl CvScores {
    pub fn from_folds(folds: Vec<BinaryMetrics>) -> Self {
        let (mean, std) = BinaryMetrics::mean_and_std(&folds);
        Self { folds, mean, std }
    }
}

/// One row of the comparison leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub algorithm: Algorithm,
    pub scores: CvScores,
    /// Wall time of the whole cross-validation
    pub seconds: f64,
}

impl LeaderboardEntry {
    pub fn name(&self) -> &'static str {
        self.algorithm.name()
    }
}

/// Ranked candidates plus the ones that failed
#[derive(Debug, Clone)]
pub struct Comparison {
    pub leaderboard: Vec<LeaderboardEntry>,
    pub failures: Vec<(Algorithm, ModelError)>,
}

/// Which step produced the model that was kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionStep {
    Compare,
    Tune,
}

/// Result of tuning the leaderboard winner
#[derive(Debug, Clone)]
pub struct TuneOutcome {
    pub params: Hyperparams,
    pub scores: CvScores,
    pub step: SelectionStep,
    /// Best sampled configuration, whether or not it was kept
    pub best_tuned: Option<(Hyperparams, CvScores)>,
    pub iterations_scored: usize,
}

/// Holdout predictions of the selected configuration
#[derive(Debug, Clone, Default)]
pub struct HoldoutEvaluation {
    pub labels: Vec<u8>,
    pub scores: Vec<f64>,
    pub metrics: BinaryMetrics,
}

/// Everything a training run produces
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub pipeline: ChurnPipeline,
    pub comparison: Comparison,
    pub tune: TuneOutcome,
    pub holdout: HoldoutEvaluation,
    /// Rows whose target matched neither label
    pub ignored_rows: usize,
    pub train_rows: usize,
    pub holdout_rows: usize,
}

/// Score one configuration on precomputed folds.
pub fn cross_validate(
    data: &RawDataset,
    folds: &[Fold],
    params: &Hyperparams,
    config: &PipelineConfig,
) -> Result<CvScores, ModelError> {
    let fold_scores = folds
        .par_iter()
        .enumerate()
        .map(|(i, fold)| {
            let train = data.subset(&fold.train);
            let validation = data.subset(&fold.validation);
            let fitted = FittedPipeline::fit(&train, params, config, fold_seed(config.session_id, i))?;
            let proba = fitted.predict_proba(&validation)?;
            Ok(BinaryMetrics::score(&validation.labels, &proba))
        })
        .collect::<Result<Vec<_>, ModelError>>()?;

    Ok(CvScores::from_folds(fold_scores))
}

/// Evaluate every candidate with its default hyperparameters and rank by
/// `config.sort`. Ties keep catalog order. Candidates that fail in any fold
/// are reported in `failures`.
pub fn compare_models(
    data: &RawDataset,
    folds: &[Fold],
    config: &PipelineConfig,
    progress: &ProgressBar,
) -> Result<Comparison, ModelError> {
    let mut leaderboard = Vec::new();
    let mut failures = Vec::new();

    for algorithm in config.candidates() {
        progress.set_message(format!("Comparing {}", algorithm.name()));
        let start = Instant::now();
        match cross_validate(data, folds, &Hyperparams::default_for(algorithm), config) {
            Ok(scores) => {
                tracing::debug!(
                    algorithm = algorithm.id(),
                    f1 = scores.mean.f1,
                    "candidate scored"
                );
                leaderboard.push(LeaderboardEntry {
                    algorithm,
                    scores,
                    seconds: start.elapsed().as_secs_f64(),
                });
            }
            Err(e) => {
                tracing::warn!(algorithm = algorithm.id(), error = %e, "candidate dropped");
                failures.push((algorithm, e));
            }
        }
        progress.inc(1);
    }

    if leaderboard.is_empty() {
        let reasons = failures
            .iter()
            .map(|(a, e)| format!("{}: {}", a.id(), e))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ModelError::NoCandidateFit(reasons));
    }

    // Stable sort: equal scores keep catalog order
    let metric = config.sort;
    leaderboard.sort_by(|a, b| {
        b.scores
            .mean
            .get(metric)
            .partial_cmp(&a.scores.mean.get(metric))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(Comparison {
        leaderboard,
        failures,
    })
}

/// Seeded random search over the winner's hyperparameter space.
///
/// With `choose_better`, the tuned configuration is kept only when its
/// `optimize` score is at least the untuned score. A sample identical to
/// the default parameters never counts as a tuning step.
pub fn tune_model(
    data: &RawDataset,
    folds: &[Fold],
    winner: &LeaderboardEntry,
    config: &PipelineConfig,
    progress: &ProgressBar,
) -> TuneOutcome {
    let metric = config.optimize;
    let mut rng = StdRng::seed_from_u64(config.session_id.wrapping_add(TUNE_SEED_OFFSET));
    let mut best_tuned: Option<(Hyperparams, CvScores)> = None;
    let mut iterations_scored = 0;

    for _ in 0..config.tune_iterations {
        let params = Hyperparams::sample(winner.algorithm, &mut rng);
        match cross_validate(data, folds, &params, config) {
            Ok(scores) => {
                iterations_scored += 1;
                let better = best_tuned
                    .as_ref()
                    .map_or(true, |(_, best)| scores.mean.get(metric) > best.mean.get(metric));
                if better {
                    best_tuned = Some((params, scores));
                }
            }
            Err(e) => tracing::warn!(error = %e, "tuning sample skipped"),
        }
        progress.inc(1);
    }

    let base = (
        Hyperparams::default_for(winner.algorithm),
        winner.scores.clone(),
    );

    let keep_tuned = match &best_tuned {
        // Sampling only reproduced the defaults
        Some((tuned_params, _)) if *tuned_params == base.0 => false,
        Some((_, tuned)) if config.choose_better => {
            tuned.mean.get(metric) >= base.1.mean.get(metric)
        }
        Some(_) => true,
        None => false,
    };

    let (params, scores, step) = match (&best_tuned, keep_tuned) {
        (Some((p, s)), true) => (p.clone(), s.clone(), SelectionStep::Tune),
        _ => (base.0, base.1, SelectionStep::Compare),
    };

    TuneOutcome {
        params,
        scores,
        step,
        best_tuned,
        iterations_scored,
    }
}

/// Refit the chosen configuration on every row.
pub fn finalize_model(
    data: &RawDataset,
    params: &Hyperparams,
    config: &PipelineConfig,
) -> Result<FittedPipeline, ModelError> {
    FittedPipeline::fit(data, params, config, config.session_id)
}

/// Fit the chosen configuration on the training split and score the holdout.
pub fn evaluate_holdout(
    train: &RawDataset,
    holdout: &RawDataset,
    params: &Hyperparams,
    config: &PipelineConfig,
) -> Result<HoldoutEvaluation, ModelError> {
    if holdout.is_empty() {
        return Ok(HoldoutEvaluation::default());
    }
    let fitted = FittedPipeline::fit(train, params, config, config.session_id)?;
    let scores = fitted.predict_proba(holdout)?;
    let metrics = BinaryMetrics::score(&holdout.labels, &scores);
    Ok(HoldoutEvaluation {
        labels: holdout.labels.clone(),
        scores,
        metrics,
    })
}

/// Turns a cleaned dataset into a selected, finalized pipeline
pub trait ModelTrainer {
    fn fit_and_select(&self, df: &DataFrame, config: &PipelineConfig) -> Result<TrainingOutcome>;
}

/// Compare, tune and finalize over the configured candidate catalog
#[derive(Debug, Clone, Default)]
pub struct AutoMlTrainer {
    /// Draw progress bars on the terminal
    pub show_progress: bool,
}

impl AutoMlTrainer {
    pub fn new(show_progress: bool) -> Self {
        Self { show_progress }
    }

    fn progress(&self, len: u64, message: &str) -> ProgressBar {
        if self.show_progress {
            create_progress_bar(len, message)
        } else {
            ProgressBar::hidden()
        }
    }
}

impl ModelTrainer for AutoMlTrainer {
    fn fit_and_select(&self, df: &DataFrame, config: &PipelineConfig) -> Result<TrainingOutcome> {
        config.validate()?;

        let mapping = TargetMapping::new(config.positive_label.clone(), config.negative_label.clone());
        ensure_binary_target(df, &config.target, &mapping)?;

        let (data, ignored_rows) = extract_dataset(df, config)?;
        let (neg, pos) = data.class_counts();
        if neg == 0 || pos == 0 {
            return Err(ModelError::SingleClass {
                column: config.target.clone(),
                found: 1,
                positive: config.positive_label.clone(),
                negative: config.negative_label.clone(),
            }
            .into());
        }

        let (train_idx, holdout_idx) =
            stratified_split(&data.labels, config.train_size, config.session_id);
        let train = data.subset(&train_idx);
        let holdout = data.subset(&holdout_idx);
        let folds = make_folds(&train.labels, config.fold, config.fold_strategy)?;

        let candidates = config.candidates();
        let pb = self.progress(candidates.len() as u64, "Comparing models");
        let comparison = compare_models(&train, &folds, config, &pb)?;
        if comparison.failures.is_empty() {
            finish_with_success(&pb, &format!("Compared {} models", candidates.len()));
        } else {
            finish_with_warning(
                &pb,
                &format!(
                    "Compared {} models, {} failed",
                    candidates.len(),
                    comparison.failures.len()
                ),
            );
        }

        let winner = &comparison.leaderboard[0];
        let pb = self.progress(config.tune_iterations as u64, "Tuning");
        pb.set_message(format!("Tuning {}", winner.name()));
        let tune = tune_model(&train, &folds, winner, config, &pb);
        finish_with_success(
            &pb,
            &format!(
                "Tuned {} ({} of {} samples scored)",
                winner.name(),
                tune.iterations_scored,
                config.tune_iterations
            ),
        );

        let holdout_eval = evaluate_holdout(&train, &holdout, &tune.params, config)?;
        let fitted = finalize_model(&data, &tune.params, config)?;

        let pipeline = ChurnPipeline::new(
            fitted,
            tune.params.clone(),
            config.clone(),
            mapping,
            tune.scores.mean,
            tune.step,
            comparison.leaderboard.clone(),
        );

        Ok(TrainingOutcome {
            pipeline,
            comparison,
            tune,
            holdout: holdout_eval,
            ignored_rows,
            train_rows: train.len(),
            holdout_rows: holdout.len(),
        })
    }
}
