//! Command-line argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::pipeline::models::Algorithm;
use crate::pipeline::schema::{Contract, CustomerRecord, PaymentMethod, YesNo};

/// Churnwise - train, persist and serve a customer churn classifier
#[derive(Parser, Debug)]
#[command(name = "churnwise")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clean the dataset, compare and tune candidate models, save the best one
    Train(TrainArgs),

    /// Serve the web prediction form
    Serve {
        /// Model artifact written by `train` (".json" is appended if missing)
        #[arg(short, long, default_value = "models/churn_model")]
        model: PathBuf,

        /// Listen address
        #[arg(long, default_value = crate::server::DEFAULT_ADDR)]
        addr: String,
    },

    /// Predict from the terminal. Prompts for any field not given as a flag.
    Predict(PredictArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Input dataset (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// JSON pipeline configuration. Keys that are left out keep the churn preset.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Seed for every random step (overrides the config's session_id)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of cross-validation folds (overrides the config)
    #[arg(long)]
    pub folds: Option<usize>,

    /// Random-search iterations in the tuning step (overrides the config)
    #[arg(long)]
    pub n_iter: Option<usize>,

    /// Restrict the compared algorithms (comma-separated ids, e.g. lr,rf,ada)
    #[arg(long, value_delimiter = ',')]
    pub include: Vec<Algorithm>,

    /// Model artifact path; ".json" is appended if missing
    #[arg(short, long, default_value = "models/churn_model")]
    pub output: PathBuf,

    /// Directory for the holdout evaluation bundle
    #[arg(long, default_value = "reports")]
    pub report_dir: PathBuf,

    /// Skip writing the holdout evaluation bundle
    #[arg(long, default_value = "false")]
    pub no_report: bool,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan.
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,

    /// Print per-fold scores of the compared and tuned models
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Model artifact written by `train` (".json" is appended if missing)
    #[arg(short, long, default_value = "models/churn_model")]
    pub model: PathBuf,

    /// Months with the company
    #[arg(long)]
    pub tenure: Option<u32>,

    #[arg(long, value_parser = non_negative_amount)]
    pub monthly_charges: Option<f64>,

    #[arg(long, value_parser = non_negative_amount)]
    pub total_charges: Option<f64>,

    /// Yes or No
    #[arg(long)]
    pub phone_service: Option<YesNo>,

    /// Month-to-month, One year or Two year
    #[arg(long)]
    pub contract: Option<Contract>,

    /// Yes or No
    #[arg(long)]
    pub paperless_billing: Option<YesNo>,

    /// Electronic check, Mailed check, Bank transfer (automatic) or Credit card (automatic)
    #[arg(long)]
    pub payment_method: Option<PaymentMethod>,
}

impl PredictArgs {
    /// The record when every field was given on the command line
    pub fn complete_record(&self) -> Option<CustomerRecord> {
        Some(CustomerRecord {
            tenure: self.tenure?,
            monthly_charges: self.monthly_charges?,
            total_charges: self.total_charges?,
            phone_service: self.phone_service?,
            contract: self.contract?,
            paperless_billing: self.paperless_billing?,
            payment_method: self.payment_method?,
        })
    }

    /// Starting values for the interactive form, taken from any given flags
    pub fn initial_record(&self) -> CustomerRecord {
        let defaults = CustomerRecord::default();
        CustomerRecord {
            tenure: self.tenure.unwrap_or(defaults.tenure),
            monthly_charges: self.monthly_charges.unwrap_or(defaults.monthly_charges),
            total_charges: self.total_charges.unwrap_or(defaults.total_charges),
            phone_service: self.phone_service.unwrap_or(defaults.phone_service),
            contract: self.contract.unwrap_or(defaults.contract),
            paperless_billing: self.paperless_billing.unwrap_or(defaults.paperless_billing),
            payment_method: self.payment_method.unwrap_or(defaults.payment_method),
        }
    }
}

/// Validator for currency amounts
fn non_negative_amount(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if !value.is_finite() || value < 0.0 {
        Err(format!("amount must be 0 or more, got {}", value))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_defaults() {
        let cli = Cli::parse_from(["churnwise", "train", "-i", "churn.csv"]);
        let Commands::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(args.output, PathBuf::from("models/churn_model"));
        assert_eq!(args.report_dir, PathBuf::from("reports"));
        assert_eq!(args.infer_schema_length, 10000);
        assert!(args.include.is_empty());
        assert!(!args.no_report);
    }

    #[test]
    fn test_include_list_parses_ids() {
        let cli = Cli::parse_from(["churnwise", "train", "-i", "x.csv", "--include", "lr,RF"]);
        let Commands::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(args.include, vec![Algorithm::Lr, Algorithm::Rf]);
    }

    #[test]
    fn test_unknown_include_rejected() {
        let result = Cli::try_parse_from(["churnwise", "train", "-i", "x.csv", "--include", "xgb"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_serve_default_addr() {
        let cli = Cli::parse_from(["churnwise", "serve"]);
        let Commands::Serve { addr, model } = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(addr, "127.0.0.1:8501");
        assert_eq!(model, PathBuf::from("models/churn_model"));
    }

    #[test]
    fn test_predict_complete_record() {
        let cli = Cli::parse_from([
            "churnwise",
            "predict",
            "--tenure",
            "0",
            "--monthly-charges",
            "29.85",
            "--total-charges",
            "0",
            "--phone-service",
            "no",
            "--contract",
            "Month-to-month",
            "--paperless-billing",
            "Yes",
            "--payment-method",
            "Electronic check",
        ]);
        let Commands::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        let record = args.complete_record().unwrap();
        assert_eq!(record.tenure, 0);
        assert_eq!(record.phone_service, YesNo::No);
        assert_eq!(record.total_charges, 0.0);
    }

    #[test]
    fn test_predict_partial_flags_need_prompts() {
        let cli = Cli::parse_from(["churnwise", "predict", "--tenure", "5"]);
        let Commands::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        assert!(args.complete_record().is_none());
        assert_eq!(args.initial_record().tenure, 5);
    }

    #[test]
    fn test_negative_amount_rejected() {
        let result = Cli::try_parse_from(["churnwise", "predict", "--monthly-charges", "-1"]);
        assert!(result.is_err());
        assert!(non_negative_amount("12.5").is_ok());
    }
}
