//! `churnwise predict`: the terminal prediction form

use anyhow::{Context, Result};
use console::style;

use super::args::PredictArgs;
use super::prompts::{confirm_predict_another, prompt_customer_record};
use crate::pipeline::{ChurnModel, ChurnPipeline, CustomerRecord, Prediction};
use crate::server::form::{CHURN_MESSAGE, NO_CHURN_MESSAGE};
use crate::utils::print_info;

/// The one line shown for a prediction
pub fn prediction_message(prediction: &Prediction) -> &'static str {
    if prediction.churn {
        CHURN_MESSAGE
    } else {
        NO_CHURN_MESSAGE
    }
}

fn print_prediction(prediction: &Prediction) {
    let message = prediction_message(prediction);
    let styled = if prediction.churn {
        style(format!("✗ {}", message)).red().bold()
    } else {
        style(format!("✓ {}", message)).green().bold()
    };
    println!();
    println!("    {}", styled);
    println!(
        "      {}",
        style(format!("Churn = {} (score {:.3})", prediction.label, prediction.score)).dim()
    );
    println!();
}

fn predict_one(pipeline: &ChurnPipeline, record: &CustomerRecord) -> Result<()> {
    let prediction = pipeline
        .predict_record(record)
        .context("Prediction failed")?;
    print_prediction(&prediction);
    Ok(())
}

pub fn run_predict(args: &PredictArgs) -> Result<()> {
    let pipeline = ChurnPipeline::load(&args.model)?;
    print_info(&format!("Loaded {} model", pipeline.algorithm_name()));

    if let Some(record) = args.complete_record() {
        return predict_one(&pipeline, &record);
    }

    let mut initial = args.initial_record();
    loop {
        let record = prompt_customer_record(&initial)?;
        // A failed prediction is reported and the form stays open
        if let Err(err) = predict_one(&pipeline, &record) {
            println!("    {} {:#}", style("✗").red().bold(), err);
        }
        if !confirm_predict_another()? {
            break;
        }
        initial = record;
    }
    Ok(())
}
