//! Churnwise: customer churn classification
//!
//! A library for cleaning a telecom churn dataset, searching for the best
//! classifier with cross-validation, persisting the fitted pipeline, and
//! serving predictions from a web or terminal form.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod server;
pub mod utils;
