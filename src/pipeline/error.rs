//! Error types for model training and inference.
//!
//! `ModelError` covers the failure modes of the churn pipeline itself. IO and
//! parsing failures around it are reported through `anyhow` with context, the
//! same way the rest of the crate does.

use thiserror::Error;

/// Errors raised while fitting, selecting, persisting or applying a churn model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// The cleaned target column does not contain both labels.
    #[error(
        "Target column '{column}' has {found} distinct class(es) after cleaning; \
         model search needs both '{positive}' and '{negative}'"
    )]
    SingleClass {
        column: String,
        found: usize,
        positive: String,
        negative: String,
    },

    /// A class has fewer rows than the cross-validation strategy requires.
    #[error("Insufficient data: class '{class}' has {actual} row(s), need at least {required}")]
    InsufficientData {
        class: String,
        required: usize,
        actual: usize,
    },

    /// Every candidate in the catalog failed to fit.
    #[error("No candidate model could be fitted: {0}")]
    NoCandidateFit(String),

    /// An algorithm id that is not part of the catalog.
    #[error("Unknown algorithm '{0}'. Known ids: lr, knn, nb, dt, rf, et, ridge, lda, ada, dummy")]
    UnknownAlgorithm(String),

    /// A single estimator failed to fit.
    #[error("Model fitting failed: {0}")]
    FitError(String),

    /// The configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A prediction record lacks a feature the pipeline was trained on.
    #[error("Missing feature '{0}' in prediction record")]
    MissingFeature(String),

    /// A categorical value never seen during training.
    #[error("Unknown value '{value}' for categorical feature '{feature}'")]
    UnknownCategory { feature: String, value: String },

    /// A feature value of the wrong kind (text for a numeric feature).
    #[error("Feature '{feature}' expects a {expected} value")]
    TypeMismatch {
        feature: String,
        expected: &'static str,
    },

    /// The artifact was written by an incompatible format version.
    #[error("Incompatible model artifact: format version {found}, this build reads version {expected}")]
    IncompatibleArtifact { found: u32, expected: u32 },
}
