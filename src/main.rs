//! Churnwise: customer churn CLI
//!
//! `train` builds and saves the model, `serve` runs the web form and
//! `predict` scores customers from the terminal.

use std::process::ExitCode;

use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

use churnwise::cli::{run_predict, run_serve, run_train, Cli, Commands};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("churnwise=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Train(args) => run_train(args),
        Commands::Serve { model, addr } => run_serve(model, addr),
        Commands::Predict(args) => run_predict(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), err);
            ExitCode::FAILURE
        }
    }
}
