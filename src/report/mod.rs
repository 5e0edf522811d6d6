//! Report module - leaderboard, holdout evaluation and the run summary

pub mod evaluation;
pub mod leaderboard;
pub mod summary;

pub use evaluation::{package_evaluation, EvaluationReport};
pub use leaderboard::{display_fold_scores, display_leaderboard};
pub use summary::{ModelSummary, RunOverview};
