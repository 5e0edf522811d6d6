//! CLI module - argument parsing, subcommands and interactive prompts

pub mod args;
pub mod predict;
pub mod prompts;
pub mod serve;
pub mod train;

pub use args::{Cli, Commands, PredictArgs, TrainArgs};
pub use predict::run_predict;
pub use serve::run_serve;
pub use train::run_train;
