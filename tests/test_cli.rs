//! Tests for the churnwise binary

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use common::{write_churn_csv, write_config};

fn churnwise() -> Command {
    Command::cargo_bin("churnwise").unwrap()
}

#[test]
fn test_help_lists_subcommands() {
    churnwise()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("train"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("predict"));
}

#[test]
fn test_missing_input_fails() {
    churnwise()
        .args(["train", "-i", "/nonexistent/churn.csv", "--no-report"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_missing_model_fails_startup() {
    let dir = TempDir::new().unwrap();
    churnwise()
        .args(["serve", "-m"])
        .arg(dir.path().join("absent"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.json"));
}

#[test]
fn test_single_class_training_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("churn.csv");
    let csv = common::churn_csv(60, 9, 0)
        .replace(",Yes\n", ",No\n");
    std::fs::write(&path, csv).unwrap();

    churnwise()
        .args(["train", "--no-report", "-i"])
        .arg(&path)
        .arg("-o")
        .arg(dir.path().join("model"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("distinct class"));
}

#[test]
fn test_train_then_predict() {
    let (dir, csv) = write_churn_csv(300, 21, 30);
    let config = write_config(
        dir.path(),
        r#"{ "include": ["lr", "dummy"], "fold": 3, "tune_iterations": 1 }"#,
    );
    let model = dir.path().join("models").join("churn_model");
    let reports = dir.path().join("reports");

    churnwise()
        .args(["train", "-i"])
        .arg(&csv)
        .arg("--config")
        .arg(&config)
        .arg("-o")
        .arg(&model)
        .arg("--report-dir")
        .arg(&reports)
        .assert()
        .success()
        .stdout(predicate::str::contains("================ MODEL SUMMARY ================"))
        .stdout(predicate::str::contains("✅ CV Strategy: 3-Fold Stratified"))
        .stdout(predicate::str::contains("✅ Imbalance Handling: SMOTE"))
        .stdout(predicate::str::contains("churn_model.json"));

    assert!(dir.path().join("models/churn_model.json").exists());
    assert!(reports.join("churn_model_evaluation.zip").exists());

    churnwise()
        .args(["predict", "-m"])
        .arg(&model)
        .args([
            "--tenure",
            "0",
            "--monthly-charges",
            "55",
            "--total-charges",
            "0",
            "--phone-service",
            "Yes",
            "--contract",
            "Month-to-month",
            "--paperless-billing",
            "No",
            "--payment-method",
            "Mailed check",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("likely to churn"));
}
