//! `churnwise train`: load, clean, search, evaluate, persist

use std::time::Instant;

use anyhow::Result;
use console::style;
use tracing::info;

use super::args::TrainArgs;
use crate::pipeline::missing::{analyze_missing_values, features_needing_imputation};
use crate::pipeline::search::SelectionStep;
use crate::pipeline::loader::estimated_memory_mb;
use crate::pipeline::target::{count_mapped_records, TargetMapping};
use crate::pipeline::{
    clean_dataset, load_dataset, AutoMlTrainer, ChurnModel, ChurnPipeline, ModelTrainer,
    PipelineConfig, TrainingOutcome,
};
use crate::report::{
    display_fold_scores, display_leaderboard, package_evaluation, EvaluationReport, ModelSummary,
    RunOverview,
};
use crate::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config, print_count,
    print_info, print_step_header, print_step_time, print_success, print_warning,
};

/// Merge the config file (or the churn preset) with command-line overrides.
pub fn resolve_config(args: &TrainArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.session_id = seed;
    }
    if let Some(folds) = args.folds {
        config.fold = folds;
    }
    if let Some(n_iter) = args.n_iter {
        config.tune_iterations = n_iter;
    }
    if !args.include.is_empty() {
        config.include = Some(args.include.clone());
    }
    config.verbose |= args.verbose;
    config.validate()?;
    Ok(config)
}

pub fn run_train(args: &TrainArgs) -> Result<()> {
    let config = resolve_config(args)?;
    let model_path = ChurnPipeline::artifact_path(&args.output);

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&args.input, &model_path, &config);

    // Step 1: load
    print_step_header(1, "Load Dataset");
    let step_start = Instant::now();
    let spinner = create_spinner("Reading dataset...");
    let df = load_dataset(&args.input, args.infer_schema_length, &config.coerce_numeric)?;
    finish_with_success(&spinner, "Dataset loaded");
    println!("      Rows: {}", df.height());
    println!("      Columns: {}", df.width());
    println!("      Estimated memory: {:.2} MB", estimated_memory_mb(&df));
    print_step_time(step_start.elapsed());

    // Step 2: clean
    print_step_header(2, "Clean Dataset");
    let step_start = Instant::now();
    let (df, cleaning) = clean_dataset(df, &config)?;
    if let Some(id) = &cleaning.dropped_id_column {
        print_info(&format!("Dropped identifier column '{}'", id));
    }
    for (column, coerced) in &cleaning.coerced_to_missing {
        print_count(
            &format!("non-numeric '{}' value(s)", column),
            *coerced,
            Some("(left for imputation)"),
        );
    }
    if cleaning.missing_target_rows > 0 {
        print_warning(&format!(
            "Dropped {} row(s) without a '{}' value",
            cleaning.missing_target_rows, config.target
        ));
    }
    let features: Vec<String> = config
        .numeric_features
        .iter()
        .chain(&config.categorical_features)
        .cloned()
        .collect();
    let missing_ratios = analyze_missing_values(&df)?;
    for (feature, nulls) in features_needing_imputation(&df, &features) {
        let ratio = missing_ratios
            .iter()
            .find(|(column, _)| *column == feature)
            .map_or(0.0, |(_, r)| *r);
        print_info(&format!(
            "{} missing value(s) ({:.2}%) in '{}' will be imputed",
            nulls,
            ratio * 100.0,
            feature
        ));
    }
    let mapping = TargetMapping::new(config.positive_label.clone(), config.negative_label.clone());
    let (positives, negatives, ignored) = count_mapped_records(&df, &config.target, &mapping)?;
    print_info(&format!(
        "Target classes: {}={}, {}={}",
        mapping.positive, positives, mapping.negative, negatives
    ));
    if ignored > 0 {
        print_warning(&format!(
            "{} row(s) match neither '{}' nor '{}' and are ignored",
            ignored, mapping.positive, mapping.negative
        ));
    }
    print_success(&format!("{} rows ready for training", cleaning.rows_out));
    print_step_time(step_start.elapsed());

    // Step 3: model search
    print_step_header(3, "Compare, Tune and Finalize");
    let step_start = Instant::now();
    let trainer = AutoMlTrainer::new(true);
    let outcome = trainer.fit_and_select(&df, &config)?;
    for (algorithm, err) in &outcome.comparison.failures {
        print_warning(&format!("{} dropped: {}", algorithm.name(), err));
    }
    display_leaderboard(&outcome.comparison.leaderboard, config.sort);
    if config.verbose {
        display_search_details(&outcome);
    }
    print_success(&format!(
        "Selected {} ({})",
        outcome.pipeline.algorithm_name(),
        match outcome.tune.step {
            SelectionStep::Tune => "tuned",
            SelectionStep::Compare => "untuned",
        }
    ));
    print_step_time(step_start.elapsed());

    // Step 4: evaluate and persist
    print_step_header(4, "Evaluate and Save");
    let evaluation = EvaluationReport::new(outcome.pipeline.algorithm_name(), &outcome.holdout);
    if outcome.holdout_rows > 0 {
        evaluation.display();
    }
    let saved = outcome.pipeline.save(&args.output)?;
    info!(path = %saved.display(), "Model artifact written");
    print_success(&format!("Model saved to {}", saved.display()));

    if args.no_report {
        print_info("Evaluation bundle skipped (--no-report)");
    } else if outcome.holdout_rows == 0 {
        print_warning("Holdout split is empty; no evaluation bundle written");
    } else {
        let bundle = package_evaluation(&evaluation, &args.report_dir)?;
        print_success(&format!("Evaluation bundle saved to {}", bundle.display()));
    }

    RunOverview::new(&cleaning, &outcome).display();
    print_completion();
    ModelSummary::from_outcome(&outcome, &config, &saved).display();
    Ok(())
}

fn display_search_details(outcome: &TrainingOutcome) {
    let encoded = outcome.pipeline.fitted.encoder.output_names();
    print_info(&format!("Encoded features ({}): {}", encoded.len(), encoded.join(", ")));
    for entry in &outcome.comparison.leaderboard {
        display_fold_scores(&format!("{} (default parameters)", entry.name()), &entry.scores);
    }
    match &outcome.tune.best_tuned {
        Some((_, scores)) => display_fold_scores(
            &format!("{} (best tuned sample)", outcome.pipeline.algorithm_name()),
            scores,
        ),
        None => println!(
            "\n    {}",
            style("No tuning sample could be scored").yellow()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::{Cli, Commands};
    use crate::pipeline::models::Algorithm;
    use clap::Parser;

    fn train_args(extra: &[&str]) -> TrainArgs {
        let mut argv = vec!["churnwise", "train", "-i", "churn.csv"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Train(args) => args,
            _ => panic!("expected train"),
        }
    }

    #[test]
    fn test_overrides_apply_on_preset() {
        let config =
            resolve_config(&train_args(&["--seed", "7", "--folds", "3", "--include", "lr,dt"]))
                .unwrap();
        assert_eq!(config.session_id, 7);
        assert_eq!(config.fold, 3);
        assert_eq!(config.include, Some(vec![Algorithm::Lr, Algorithm::Dt]));
        assert_eq!(config.target, "Churn");
    }

    #[test]
    fn test_config_file_then_overrides() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(&path, r#"{ "fold": 4, "tune_iterations": 2 }"#).unwrap();
        let path_str = path.to_str().unwrap().to_string();

        let config = resolve_config(&train_args(&["--config", &path_str, "--n-iter", "6"])).unwrap();
        assert_eq!(config.fold, 4);
        assert_eq!(config.tune_iterations, 6);
    }

    #[test]
    fn test_invalid_override_rejected() {
        assert!(resolve_config(&train_args(&["--folds", "1"])).is_err());
    }
}
