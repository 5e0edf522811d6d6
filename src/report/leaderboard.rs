//! Leaderboard and per-fold score tables

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::metrics::{BinaryMetrics, Metric};
use crate::pipeline::search::{CvScores, LeaderboardEntry};

fn metric_cells(m: &BinaryMetrics) -> Vec<Cell> {
    Metric::ALL
        .iter()
        .map(|&metric| Cell::new(format!("{:.4}", m.get(metric))))
        .collect()
}

fn header(first: &[&str]) -> Vec<Cell> {
    first
        .iter()
        .map(|h| Cell::new(*h).add_attribute(Attribute::Bold))
        .chain(
            Metric::ALL
                .iter()
                .map(|m| Cell::new(m.label()).add_attribute(Attribute::Bold)),
        )
        .collect()
}

/// Mean CV scores of every compared candidate, best first
pub fn leaderboard_table(entries: &[LeaderboardEntry], sort: Metric) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    let mut head = header(&["#", "Model"]);
    head.push(Cell::new("TT (Sec)").add_attribute(Attribute::Bold));
    table.set_header(head);

    for (rank, entry) in entries.iter().enumerate() {
        let mut row = vec![Cell::new(rank + 1), Cell::new(entry.name())];
        let mut cells = metric_cells(&entry.scores.mean);
        if rank == 0 {
            let idx = Metric::ALL.iter().position(|m| *m == sort).unwrap_or(0);
            cells[idx] = Cell::new(format!("{:.4}", entry.scores.mean.get(sort)))
                .fg(Color::Green)
                .add_attribute(Attribute::Bold);
            row[1] = Cell::new(entry.name()).fg(Color::Green);
        }
        row.extend(cells);
        row.push(Cell::new(format!("{:.2}", entry.seconds)));
        table.add_row(row);
    }
    table
}

/// Per-fold scores with mean and std rows
pub fn fold_table(scores: &CvScores) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(header(&["Fold"]));

    for (i, fold) in scores.folds.iter().enumerate() {
        let mut row = vec![Cell::new(i)];
        row.extend(metric_cells(fold));
        table.add_row(row);
    }
    let mut mean = vec![Cell::new("Mean").add_attribute(Attribute::Bold)];
    mean.extend(metric_cells(&scores.mean));
    table.add_row(mean);
    let mut std = vec![Cell::new("Std").add_attribute(Attribute::Dim)];
    std.extend(metric_cells(&scores.std));
    table.add_row(std);
    table
}

pub fn display_leaderboard(entries: &[LeaderboardEntry], sort: Metric) {
    println!();
    println!(
        "    {} {}",
        style("🏆").cyan(),
        style(format!("MODEL COMPARISON (sorted by {})", sort.label()))
            .white()
            .bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
    println!();
    for line in leaderboard_table(entries, sort).to_string().lines() {
        println!("    {}", line);
    }
}

pub fn display_fold_scores(title: &str, scores: &CvScores) {
    println!();
    println!("    {}", style(title).white().bold());
    for line in fold_table(scores).to_string().lines() {
        println!("    {}", line);
    }
}
