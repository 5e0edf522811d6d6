//! Terminal helpers shared by the subcommands

pub mod progress;
pub mod styling;

pub use progress::{create_progress_bar, create_spinner, finish_with_success, finish_with_warning};
pub use styling::*;
