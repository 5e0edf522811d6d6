//! `churnwise serve`: load the model once, then run the web form

use std::path::Path;

use anyhow::{Context, Result};

use crate::pipeline::ChurnPipeline;
use crate::server::run_server;

pub fn run_serve(model: &Path, addr: &str) -> Result<()> {
    // Load before starting the runtime so a bad artifact aborts startup
    let pipeline = ChurnPipeline::load(model)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(run_server(pipeline, addr))
}
