//! Shared test utilities and fixture generators

#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use churnwise::pipeline::models::Algorithm;
use churnwise::pipeline::PipelineConfig;
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

pub const HEADER: &str = "customerID,gender,tenure,PhoneService,Contract,PaperlessBilling,\
PaymentMethod,MonthlyCharges,TotalCharges,Churn";

const CONTRACTS: [&str; 3] = ["Month-to-month", "One year", "Two year"];
const METHODS: [&str; 4] = [
    "Electronic check",
    "Mailed check",
    "Bank transfer (automatic)",
    "Credit card (automatic)",
];

/// Generate a churn CSV with a learnable signal.
///
/// Short-tenure month-to-month customers paying by electronic check churn
/// most. New customers (tenure 0) have a blank `TotalCharges`, and every
/// `missing_target_every`-th row has no `Churn` value (0 disables that).
pub fn churn_csv(rows: usize, seed: u64, missing_target_every: usize) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = String::from(HEADER);
    out.push('\n');

    for i in 0..rows {
        let contract = CONTRACTS[rng.gen_range(0..3)];
        let method = METHODS[rng.gen_range(0..4)];
        let tenure: u32 = if i % 25 == 0 { 0 } else { rng.gen_range(1..=72) };
        let phone = if rng.gen_bool(0.9) { "Yes" } else { "No" };
        let paperless = if rng.gen_bool(0.6) { "Yes" } else { "No" };
        let gender = if rng.gen_bool(0.5) { "Male" } else { "Female" };
        let monthly: f64 = rng.gen_range(18.0..118.0);
        let total = if tenure == 0 {
            " ".to_string()
        } else {
            format!("{:.2}", monthly * f64::from(tenure))
        };

        let mut risk = match contract {
            "Month-to-month" => 0.45,
            "One year" => 0.12,
            _ => 0.03,
        };
        if tenure < 12 {
            risk += 0.2;
        }
        if method == "Electronic check" {
            risk += 0.1;
        }
        if monthly > 80.0 {
            risk += 0.05;
        }
        let churn = if missing_target_every > 0 && i % missing_target_every == missing_target_every - 1 {
            ""
        } else if rng.gen_bool(f64::min(risk, 0.95)) {
            "Yes"
        } else {
            "No"
        };

        let _ = writeln!(
            out,
            "{:04}-CUST,{},{},{},{},{},{},{:.2},{},{}",
            i, gender, tenure, phone, contract, paperless, method, monthly, total, churn
        );
    }
    out
}

/// Write a churn CSV into a fresh temporary directory.
pub fn write_churn_csv(rows: usize, seed: u64, missing_target_every: usize) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("churn.csv");
    std::fs::write(&path, churn_csv(rows, seed, missing_target_every)).expect("write csv");
    (dir, path)
}

/// Raw frame as the loader would produce it
pub fn churn_frame(rows: usize, seed: u64, missing_target_every: usize) -> DataFrame {
    let (_dir, path) = write_churn_csv(rows, seed, missing_target_every);
    churnwise::pipeline::load_dataset(&path, 0, &PipelineConfig::default().coerce_numeric)
        .expect("load csv")
}

/// The churn preset with a small candidate list so tests stay quick
pub fn fast_config() -> PipelineConfig {
    PipelineConfig {
        include: Some(vec![Algorithm::Lr, Algorithm::Dt, Algorithm::Dummy]),
        fold: 3,
        tune_iterations: 2,
        ..PipelineConfig::default()
    }
}

/// Write a JSON config file next to the other test files
pub fn write_config(dir: &Path, json: &str) -> PathBuf {
    let path = dir.join("pipeline.json");
    std::fs::write(&path, json).expect("write config");
    path
}
