//! Training run summary

use std::path::{Path, PathBuf};

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::{ChurnModel, CleaningReport, PipelineConfig, TrainingOutcome};
use crate::pipeline::search::SelectionStep;

const HEADER: &str = "================ MODEL SUMMARY ================";
const FOOTER: &str = "================================================";

/// The fixed-format block printed after a successful training run
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSummary {
    pub algorithm: String,
    pub cv_f1: f64,
    pub cv_strategy: String,
    pub imbalance_handling: String,
    pub model_path: PathBuf,
}

impl ModelSummary {
    pub fn from_outcome(outcome: &TrainingOutcome, config: &PipelineConfig, model_path: &Path) -> Self {
        Self {
            algorithm: outcome.pipeline.algorithm_name().to_string(),
            cv_f1: outcome.pipeline.cv_f1(),
            cv_strategy: config.describe_cv(),
            imbalance_handling: config.describe_imbalance(),
            model_path: model_path.to_path_buf(),
        }
    }

    /// Plain text of the block, one line per entry
    pub fn render(&self) -> String {
        [
            HEADER.to_string(),
            format!("✅ Final algorithm used: {}", self.algorithm),
            format!("✅ Cross-validated F1-score: {:.4}", self.cv_f1),
            format!("✅ CV Strategy: {}", self.cv_strategy),
            format!("✅ Imbalance Handling: {}", self.imbalance_handling),
            format!("✅ Model saved at: {}", self.model_path.display()),
            FOOTER.to_string(),
        ]
        .join("\n")
    }

    pub fn display(&self) {
        println!();
        println!("{}", self.render());
    }
}

/// Overview table of what the run did before the summary block
#[derive(Debug, Default)]
pub struct RunOverview {
    pub rows_loaded: usize,
    pub rows_after_cleaning: usize,
    pub missing_target_rows: usize,
    pub coerced_values: usize,
    pub ignored_label_rows: usize,
    pub train_rows: usize,
    pub holdout_rows: usize,
    pub candidates_scored: usize,
    pub candidates_failed: usize,
    pub selected_by: Option<SelectionStep>,
}

impl RunOverview {
    pub fn new(cleaning: &CleaningReport, outcome: &TrainingOutcome) -> Self {
        Self {
            rows_loaded: cleaning.rows_in,
            rows_after_cleaning: cleaning.rows_out,
            missing_target_rows: cleaning.missing_target_rows,
            coerced_values: cleaning.coerced_to_missing.iter().map(|(_, n)| n).sum(),
            ignored_label_rows: outcome.ignored_rows,
            train_rows: outcome.train_rows,
            holdout_rows: outcome.holdout_rows,
            candidates_scored: outcome.comparison.leaderboard.len(),
            candidates_failed: outcome.comparison.failures.len(),
            selected_by: Some(outcome.tune.step),
        }
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("TRAINING OVERVIEW").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Step").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        let warn_if = |n: usize| if n > 0 { Color::Yellow } else { Color::White };

        table.add_row(vec![Cell::new("📁 Rows loaded"), Cell::new(self.rows_loaded)]);
        table.add_row(vec![
            Cell::new("🗑️  Dropped (missing target)"),
            Cell::new(self.missing_target_rows).fg(warn_if(self.missing_target_rows)),
        ]);
        table.add_row(vec![
            Cell::new("🔢 Values coerced to missing"),
            Cell::new(self.coerced_values).fg(warn_if(self.coerced_values)),
        ]);
        table.add_row(vec![
            Cell::new("❓ Unmapped target labels"),
            Cell::new(self.ignored_label_rows).fg(warn_if(self.ignored_label_rows)),
        ]);
        table.add_row(vec![
            Cell::new("🎯 Train / holdout rows"),
            Cell::new(format!("{} / {}", self.train_rows, self.holdout_rows)),
        ]);
        table.add_row(vec![
            Cell::new("🏁 Candidates scored"),
            Cell::new(self.candidates_scored).fg(Color::Green),
        ]);
        table.add_row(vec![
            Cell::new("⚠️  Candidates dropped"),
            Cell::new(self.candidates_failed).fg(if self.candidates_failed > 0 {
                Color::Red
            } else {
                Color::White
            }),
        ]);
        if let Some(step) = self.selected_by {
            let kept = match step {
                SelectionStep::Compare => "untuned (compare)",
                SelectionStep::Tune => "tuned",
            };
            table.add_row(vec![
                Cell::new("✅ Kept model"),
                Cell::new(kept).fg(Color::Green).add_attribute(Attribute::Bold),
            ]);
        }

        for line in table.to_string().lines() {
            println!("    {}", line);
        }
    }
}
