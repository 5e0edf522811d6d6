//! Benchmark of cross-validated candidate scoring and single fits
//!
//! Run with: cargo bench --bench search_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;
use rand::SeedableRng;

use churnwise::pipeline::config::FoldStrategy;
use churnwise::pipeline::cv::make_folds;
use churnwise::pipeline::dataset::{RawDataset, RawRow};
use churnwise::pipeline::fitted::FittedPipeline;
use churnwise::pipeline::models::{Algorithm, Hyperparams};
use churnwise::pipeline::search::cross_validate;
use churnwise::pipeline::PipelineConfig;

const CONTRACTS: [&str; 3] = ["Month-to-month", "One year", "Two year"];

/// Generate churn-like raw rows with roughly 27% positives
fn generate_dataset(n_rows: usize, seed: u64) -> RawDataset {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(n_rows);
    let mut labels = Vec::with_capacity(n_rows);

    for _ in 0..n_rows {
        let tenure = rng.gen_range(0..72) as f64;
        let monthly = rng.gen_range(18.0..118.0);
        let contract = CONTRACTS[rng.gen_range(0..3)];
        let risk = match contract {
            "Month-to-month" => 0.42,
            "One year" => 0.11,
            _ => 0.03,
        } + if tenure < 12.0 { 0.15 } else { 0.0 };

        rows.push(RawRow {
            numeric: vec![Some(tenure), Some(monthly), Some(tenure * monthly)],
            categorical: vec![Some(contract.to_string())],
        });
        labels.push(u8::from(rng.gen_bool(risk)));
    }

    RawDataset {
        numeric_names: vec![
            "tenure".to_string(),
            "MonthlyCharges".to_string(),
            "TotalCharges".to_string(),
        ],
        categorical_names: vec!["Contract".to_string()],
        rows,
        labels,
    }
}

/// Five-fold scoring of one candidate, the unit of work in compare and tune
fn benchmark_cross_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("cross_validate");
    group.sample_size(10);
    let config = PipelineConfig::default();

    for n_rows in [500, 2_000] {
        let data = generate_dataset(n_rows, 42);
        let folds = make_folds(&data.labels, 5, FoldStrategy::Stratifiedkfold)
            .expect("benchmark folds");
        group.throughput(Throughput::Elements(n_rows as u64));

        for algorithm in [Algorithm::Lr, Algorithm::Dt, Algorithm::Rf, Algorithm::Knn] {
            let params = Hyperparams::default_for(algorithm);
            group.bench_with_input(
                BenchmarkId::new(algorithm.id(), n_rows),
                &data,
                |b, data| {
                    b.iter(|| {
                        let _ = cross_validate(
                            black_box(data),
                            black_box(&folds),
                            black_box(&params),
                            black_box(&config),
                        );
                    });
                },
            );
        }
    }

    group.finish();
}

/// Cost of the optional preprocessing steps on a single fit
fn benchmark_preprocessing_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("preprocessing_steps");
    group.sample_size(20);
    let data = generate_dataset(2_000, 7);
    let params = Hyperparams::default_for(Algorithm::Lr);

    let variants = [
        ("none", false, false),
        ("outliers", true, false),
        ("smote", false, true),
        ("outliers+smote", true, true),
    ];
    for (name, remove_outliers, fix_imbalance) in variants {
        let config = PipelineConfig {
            remove_outliers,
            fix_imbalance,
            ..PipelineConfig::default()
        };
        group.bench_function(name, |b| {
            b.iter(|| {
                let _ = FittedPipeline::fit(
                    black_box(&data),
                    black_box(&params),
                    black_box(&config),
                    black_box(42),
                );
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_cross_validate, benchmark_preprocessing_steps);
criterion_main!(benches);
