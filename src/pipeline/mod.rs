//! Pipeline module - cleaning, model search and the persisted churn model

pub mod artifact;
pub mod cleaning;
pub mod config;
pub mod cv;
pub mod dataset;
pub mod error;
pub mod fitted;
pub mod loader;
pub mod metrics;
pub mod missing;
pub mod models;
pub mod outliers;
pub mod preprocess;
pub mod schema;
pub mod search;
pub mod smote;
pub mod target;

pub use artifact::{ChurnModel, ChurnPipeline, Prediction, ARTIFACT_FORMAT_VERSION};
pub use cleaning::{clean_dataset, CleaningReport};
pub use config::PipelineConfig;
pub use dataset::{FeatureRow, FeatureValue};
pub use error::ModelError;
pub use loader::load_dataset;
pub use missing::analyze_missing_values;
pub use schema::CustomerRecord;
pub use search::{AutoMlTrainer, ModelTrainer, TrainingOutcome};
pub use target::TargetMapping;
