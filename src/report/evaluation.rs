//! Holdout evaluation: confusion matrix, ROC and precision-recall curves
//!
//! The curves are exported as CSV next to a JSON summary and bundled into a
//! single zip archive.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;
use serde::Serialize;

use crate::pipeline::metrics::{
    average_precision, precision_recall_curve, roc_curve, BinaryMetrics, ConfusionMatrix,
    CurvePoint, DECISION_THRESHOLD,
};
use crate::pipeline::search::HoldoutEvaluation;

pub const EVALUATION_BUNDLE: &str = "churn_model_evaluation.zip";

/// Holdout evaluation of the selected configuration
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub algorithm: String,
    pub generated_at: String,
    pub holdout_rows: usize,
    pub decision_threshold: f64,
    pub metrics: BinaryMetrics,
    pub confusion_matrix: ConfusionMatrix,
    pub roc_auc: f64,
    pub average_precision: f64,
    #[serde(skip)]
    pub roc: Vec<CurvePoint>,
    #[serde(skip)]
    pub pr: Vec<CurvePoint>,
}

impl EvaluationReport {
    pub fn new(algorithm: &str, holdout: &HoldoutEvaluation) -> Self {
        let predicted: Vec<u8> = holdout
            .scores
            .iter()
            .map(|&p| u8::from(p >= DECISION_THRESHOLD))
            .collect();
        let pr = precision_recall_curve(&holdout.labels, &holdout.scores);

        Self {
            algorithm: algorithm.to_string(),
            generated_at: Local::now().to_rfc3339(),
            holdout_rows: holdout.labels.len(),
            decision_threshold: DECISION_THRESHOLD,
            metrics: holdout.metrics,
            confusion_matrix: ConfusionMatrix::from_predictions(&holdout.labels, &predicted),
            roc_auc: holdout.metrics.auc,
            average_precision: average_precision(&pr),
            roc: roc_curve(&holdout.labels, &holdout.scores),
            pr,
        }
    }

    pub fn confusion_table(&self) -> Table {
        let cm = &self.confusion_matrix;
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Actual \\ Predicted").add_attribute(Attribute::Bold),
            Cell::new("No churn").add_attribute(Attribute::Bold),
            Cell::new("Churn").add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("No churn"),
            Cell::new(cm.true_negatives).fg(Color::Green),
            Cell::new(cm.false_positives).fg(Color::Red),
        ]);
        table.add_row(vec![
            Cell::new("Churn"),
            Cell::new(cm.false_negatives).fg(Color::Red),
            Cell::new(cm.true_positives).fg(Color::Green),
        ]);
        table
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("🧪").cyan(),
            style(format!("HOLDOUT EVALUATION ({} rows)", self.holdout_rows))
                .white()
                .bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();
        for line in self.confusion_table().to_string().lines() {
            println!("    {}", line);
        }
        println!();
        println!(
            "    ROC AUC: {}   Average precision: {}   F1: {}",
            style(format!("{:.4}", self.roc_auc)).cyan(),
            style(format!("{:.4}", self.average_precision)).cyan(),
            style(format!("{:.4}", self.metrics.f1)).cyan()
        );
    }
}

/// CSV text of a curve with the given axis names
pub fn curve_csv(points: &[CurvePoint], x_name: &str, y_name: &str) -> String {
    let mut out = format!("threshold,{},{}\n", x_name, y_name);
    for p in points {
        let threshold = if p.threshold.is_infinite() {
            "inf".to_string()
        } else {
            format!("{:.6}", p.threshold)
        };
        out.push_str(&format!("{},{:.6},{:.6}\n", threshold, p.x, p.y));
    }
    out
}

/// Write `evaluation.json`, `roc_curve.csv` and `pr_curve.csv` into one zip
/// archive under `report_dir`. Returns the archive path.
pub fn package_evaluation(report: &EvaluationReport, report_dir: &Path) -> Result<PathBuf> {
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    std::fs::create_dir_all(report_dir)
        .with_context(|| format!("Failed to create report directory: {}", report_dir.display()))?;
    let zip_path = report_dir.join(EVALUATION_BUNDLE);

    let zip_file = std::fs::File::create(&zip_path)
        .with_context(|| format!("Failed to create zip file: {}", zip_path.display()))?;
    let mut zip = ZipWriter::new(zip_file);
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    let json = serde_json::to_string_pretty(report)
        .context("Failed to serialize evaluation report to JSON")?;
    let entries = [
        ("evaluation.json", json),
        ("roc_curve.csv", curve_csv(&report.roc, "fpr", "tpr")),
        ("pr_curve.csv", curve_csv(&report.pr, "recall", "precision")),
    ];

    for (name, content) in entries {
        zip.start_file(name, options)
            .with_context(|| format!("Failed to add {} to zip", name))?;
        zip.write_all(content.as_bytes())?;
    }

    zip.finish().context("Failed to finalize zip file")?;
    Ok(zip_path)
}
