//! End-to-end training, persistence and prediction tests

mod common;

use churnwise::pipeline::cv::make_folds;
use churnwise::pipeline::dataset::extract_dataset;
use churnwise::pipeline::models::{Algorithm, Hyperparams};
use churnwise::pipeline::schema::{Contract, PaymentMethod, YesNo};
use churnwise::pipeline::search::{cross_validate, tune_model, LeaderboardEntry, SelectionStep};
use churnwise::pipeline::{
    clean_dataset, AutoMlTrainer, ChurnModel, ChurnPipeline, CustomerRecord, ModelError,
    ModelTrainer, PipelineConfig,
};
use common::{churn_frame, fast_config};
use indicatif::ProgressBar;
use polars::prelude::*;

fn train(rows: usize, config: &PipelineConfig) -> churnwise::pipeline::TrainingOutcome {
    let (df, _) = clean_dataset(churn_frame(rows, 11, 40), config).unwrap();
    AutoMlTrainer::new(false).fit_and_select(&df, config).unwrap()
}

fn scenario_one() -> CustomerRecord {
    CustomerRecord {
        tenure: 12,
        monthly_charges: 70.0,
        total_charges: 840.0,
        phone_service: YesNo::Yes,
        contract: Contract::MonthToMonth,
        paperless_billing: YesNo::Yes,
        payment_method: PaymentMethod::ElectronicCheck,
    }
}

#[test]
fn test_training_selects_and_reports_kept_step() {
    let config = fast_config();
    let outcome = train(500, &config);

    assert_eq!(outcome.comparison.leaderboard.len(), 3);
    assert!(outcome.train_rows > outcome.holdout_rows);

    let winner = &outcome.comparison.leaderboard[0];
    let reported = outcome.pipeline.cv_f1();
    assert_eq!(reported, outcome.tune.scores.mean.f1);
    match outcome.tune.step {
        SelectionStep::Compare => {
            assert_eq!(outcome.pipeline.algorithm, winner.algorithm);
            assert_eq!(reported, winner.scores.mean.f1);
        }
        SelectionStep::Tune => {
            assert!(reported >= winner.scores.mean.f1);
        }
    }
    assert_eq!(outcome.pipeline.algorithm_name(), winner.algorithm.name());
    assert_eq!(outcome.pipeline.selected_by, outcome.tune.step);
}

#[test]
fn test_training_is_reproducible() {
    let config = fast_config();
    let a = train(300, &config);
    let b = train(300, &config);
    let scores = |o: &churnwise::pipeline::TrainingOutcome| {
        o.comparison
            .leaderboard
            .iter()
            .map(|e| (e.algorithm, e.scores.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(scores(&a), scores(&b));
    assert_eq!(
        a.pipeline.predict_record(&scenario_one()).unwrap(),
        b.pipeline.predict_record(&scenario_one()).unwrap()
    );
}

#[test]
fn test_save_load_gives_identical_predictions() {
    let outcome = train(300, &fast_config());
    let dir = tempfile::TempDir::new().unwrap();
    let saved = outcome.pipeline.save(&dir.path().join("churn_model")).unwrap();
    let loaded = ChurnPipeline::load(&saved).unwrap();

    let records = [
        scenario_one(),
        CustomerRecord::default(),
        CustomerRecord {
            tenure: 70,
            monthly_charges: 25.0,
            total_charges: 1750.0,
            contract: Contract::TwoYear,
            payment_method: PaymentMethod::CreditCard,
            ..CustomerRecord::default()
        },
    ];
    for record in &records {
        assert_eq!(
            outcome.pipeline.predict_record(record).unwrap(),
            loaded.predict_record(record).unwrap()
        );
    }
}

#[test]
fn test_choose_better_keeps_stronger_untuned_model() {
    let base_config = fast_config();
    let (df, _) = clean_dataset(churn_frame(300, 11, 0), &base_config).unwrap();
    let (data, _) = extract_dataset(&df, &base_config).unwrap();
    let folds = make_folds(&data.labels, base_config.fold, base_config.fold_strategy).unwrap();

    let defaults = Hyperparams::default_for(Algorithm::Lr);
    let mut winner = LeaderboardEntry {
        algorithm: Algorithm::Lr,
        scores: cross_validate(&data, &folds, &defaults, &base_config).unwrap(),
        seconds: 0.0,
    };
    // No sampled configuration can reach an F1 above 1
    winner.scores.mean.f1 = 2.0;

    let kept = tune_model(&data, &folds, &winner, &base_config, &ProgressBar::hidden());
    assert_eq!(kept.step, SelectionStep::Compare);
    assert_eq!(kept.params, defaults);
    assert_eq!(kept.scores.mean.f1, 2.0);
    assert!(kept.best_tuned.is_some());

    let forced = PipelineConfig {
        choose_better: false,
        ..base_config.clone()
    };
    let tuned = tune_model(&data, &folds, &winner, &forced, &ProgressBar::hidden());
    assert_eq!(tuned.step, SelectionStep::Tune);
    assert_ne!(tuned.params, defaults);
    assert!(tuned.scores.mean.f1 <= 1.0);
    assert_eq!(&tuned.scores, &tuned.best_tuned.as_ref().unwrap().1);
}

#[test]
fn test_scenario_one_yields_one_label() {
    let outcome = train(300, &fast_config());
    let prediction = outcome.pipeline.predict_record(&scenario_one()).unwrap();
    assert!(prediction.label == "Yes" || prediction.label == "No");
    assert_eq!(prediction.churn, prediction.label == "Yes");
}

#[test]
fn test_new_customer_with_zero_charges_predicts() {
    let outcome = train(300, &fast_config());
    let record = CustomerRecord {
        tenure: 0,
        total_charges: 0.0,
        monthly_charges: 45.0,
        ..CustomerRecord::default()
    };
    assert!(outcome.pipeline.predict_record(&record).is_ok());
}

#[test]
fn test_single_class_target_fails() {
    let config = fast_config();
    let (df, _) = clean_dataset(churn_frame(120, 3, 0), &config).unwrap();
    let only_no = df
        .lazy()
        .filter(col("Churn").eq(lit("No")))
        .collect()
        .unwrap();

    let err = AutoMlTrainer::new(false)
        .fit_and_select(&only_no, &config)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ModelError>(),
        Some(ModelError::SingleClass { .. })
    ));
}

#[test]
fn test_unknown_algorithm_id() {
    let err = "xgboost"
        .parse::<churnwise::pipeline::models::Algorithm>()
        .unwrap_err();
    assert_eq!(err, ModelError::UnknownAlgorithm("xgboost".to_string()));
}
