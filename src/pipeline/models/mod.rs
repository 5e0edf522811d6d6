//! Candidate estimator catalog
//!
//! Every estimator is a binary classifier over dense, already-preprocessed
//! rows. It returns the probability of the positive class. `Algorithm` names
//! the catalog entries, `Hyperparams` carries one configuration of any of
//! them, and `Estimator` holds a fitted model. All three serialize into the
//! model artifact.

pub mod boosting;
pub mod dummy;
pub mod forest;
pub mod knn;
pub mod lda;
pub mod linear;
pub mod logistic;
pub mod naive_bayes;
pub mod ridge;
pub mod tree;

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::error::ModelError;

pub use boosting::{AdaBoost, AdaBoostParams};
pub use dummy::{DummyClassifier, DummyParams};
pub use forest::{ExtraTrees, ForestParams, RandomForest};
pub use knn::{KNearestNeighbors, KnnParams, KnnWeights};
pub use lda::{LdaParams, LinearDiscriminant};
pub use logistic::{LogisticParams, LogisticRegression};
pub use naive_bayes::{GaussianNaiveBayes, NaiveBayesParams};
pub use ridge::{RidgeClassifier, RidgeParams};
pub use tree::{DecisionTree, MaxFeatures, TreeParams};

/// A binary classifier fitted on dense rows with 0/1 labels
pub trait Classifier: Sized {
    type Params;

    fn fit(params: &Self::Params, x: &[Vec<f64>], y: &[u8], seed: u64) -> Result<Self, ModelError>;

    /// Probability that `row` belongs to the positive class
    fn predict_proba(&self, row: &[f64]) -> f64;
}

/// Logistic function
pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Reject empty or single-class training data before fitting
pub(crate) fn check_training_data(x: &[Vec<f64>], y: &[u8]) -> Result<(), ModelError> {
    if x.is_empty() || x.len() != y.len() {
        return Err(ModelError::FitError(format!(
            "expected matching non-empty rows and labels, got {} rows and {} labels",
            x.len(),
            y.len()
        )));
    }
    let positives = y.iter().filter(|&&l| l == 1).count();
    if positives == 0 || positives == y.len() {
        return Err(ModelError::FitError(
            "training fold contains a single class".to_string(),
        ));
    }
    Ok(())
}

/// Catalog entries, in the order candidates are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Lr,
    Knn,
    Nb,
    Dt,
    Rf,
    Et,
    Ridge,
    Lda,
    Ada,
    Dummy,
}

impl Algorithm {
    pub const ALL: [Algorithm; 10] = [
        Algorithm::Lr,
        Algorithm::Knn,
        Algorithm::Nb,
        Algorithm::Dt,
        Algorithm::Rf,
        Algorithm::Et,
        Algorithm::Ridge,
        Algorithm::Lda,
        Algorithm::Ada,
        Algorithm::Dummy,
    ];

    /// Short id used in configs and on the command line
    pub fn id(&self) -> &'static str {
        match self {
            Algorithm::Lr => "lr",
            Algorithm::Knn => "knn",
            Algorithm::Nb => "nb",
            Algorithm::Dt => "dt",
            Algorithm::Rf => "rf",
            Algorithm::Et => "et",
            Algorithm::Ridge => "ridge",
            Algorithm::Lda => "lda",
            Algorithm::Ada => "ada",
            Algorithm::Dummy => "dummy",
        }
    }

    /// Estimator name as reported in the summary
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Lr => "LogisticRegression",
            Algorithm::Knn => "KNeighborsClassifier",
            Algorithm::Nb => "GaussianNB",
            Algorithm::Dt => "DecisionTreeClassifier",
            Algorithm::Rf => "RandomForestClassifier",
            Algorithm::Et => "ExtraTreesClassifier",
            Algorithm::Ridge => "RidgeClassifier",
            Algorithm::Lda => "LinearDiscriminantAnalysis",
            Algorithm::Ada => "AdaBoostClassifier",
            Algorithm::Dummy => "DummyClassifier",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Algorithm {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Algorithm::ALL
            .iter()
            .copied()
            .find(|a| a.id() == needle)
            .ok_or_else(|| ModelError::UnknownAlgorithm(s.to_string()))
    }
}

/// One hyperparameter configuration of a catalog algorithm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "lowercase")]
pub enum Hyperparams {
    Lr(LogisticParams),
    Knn(KnnParams),
    Nb(NaiveBayesParams),
    Dt(TreeParams),
    Rf(ForestParams),
    Et(ForestParams),
    Ridge(RidgeParams),
    Lda(LdaParams),
    Ada(AdaBoostParams),
    Dummy(DummyParams),
}

impl Hyperparams {
    /// Library defaults for `algorithm`
    pub fn default_for(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Lr => Hyperparams::Lr(LogisticParams::default()),
            Algorithm::Knn => Hyperparams::Knn(KnnParams::default()),
            Algorithm::Nb => Hyperparams::Nb(NaiveBayesParams::default()),
            Algorithm::Dt => Hyperparams::Dt(TreeParams::default()),
            Algorithm::Rf => Hyperparams::Rf(ForestParams::default()),
            Algorithm::Et => Hyperparams::Et(ForestParams::default()),
            Algorithm::Ridge => Hyperparams::Ridge(RidgeParams::default()),
            Algorithm::Lda => Hyperparams::Lda(LdaParams::default()),
            Algorithm::Ada => Hyperparams::Ada(AdaBoostParams::default()),
            Algorithm::Dummy => Hyperparams::Dummy(DummyParams::default()),
        }
    }

    /// Draw a random configuration from `algorithm`'s search space
    pub fn sample(algorithm: Algorithm, rng: &mut StdRng) -> Self {
        match algorithm {
            Algorithm::Lr => Hyperparams::Lr(LogisticParams::sample(rng)),
            Algorithm::Knn => Hyperparams::Knn(KnnParams::sample(rng)),
            Algorithm::Nb => Hyperparams::Nb(NaiveBayesParams::sample(rng)),
            Algorithm::Dt => Hyperparams::Dt(TreeParams::sample(rng)),
            Algorithm::Rf => Hyperparams::Rf(ForestParams::sample(rng)),
            Algorithm::Et => Hyperparams::Et(ForestParams::sample(rng)),
            Algorithm::Ridge => Hyperparams::Ridge(RidgeParams::sample(rng)),
            Algorithm::Lda => Hyperparams::Lda(LdaParams::sample(rng)),
            Algorithm::Ada => Hyperparams::Ada(AdaBoostParams::sample(rng)),
            Algorithm::Dummy => Hyperparams::Dummy(DummyParams::sample(rng)),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            Hyperparams::Lr(_) => Algorithm::Lr,
            Hyperparams::Knn(_) => Algorithm::Knn,
            Hyperparams::Nb(_) => Algorithm::Nb,
            Hyperparams::Dt(_) => Algorithm::Dt,
            Hyperparams::Rf(_) => Algorithm::Rf,
            Hyperparams::Et(_) => Algorithm::Et,
            Hyperparams::Ridge(_) => Algorithm::Ridge,
            Hyperparams::Lda(_) => Algorithm::Lda,
            Hyperparams::Ada(_) => Algorithm::Ada,
            Hyperparams::Dummy(_) => Algorithm::Dummy,
        }
    }
}

/// A fitted catalog estimator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "algorithm", content = "state", rename_all = "lowercase")]
pub enum Estimator {
    Lr(LogisticRegression),
    Knn(KNearestNeighbors),
    Nb(GaussianNaiveBayes),
    Dt(DecisionTree),
    Rf(RandomForest),
    Et(ExtraTrees),
    Ridge(RidgeClassifier),
    Lda(LinearDiscriminant),
    Ada(AdaBoost),
    Dummy(DummyClassifier),
}

impl Estimator {
    pub fn fit(
        params: &Hyperparams,
        x: &[Vec<f64>],
        y: &[u8],
        seed: u64,
    ) -> Result<Self, ModelError> {
        check_training_data(x, y)?;
        Ok(match params {
            Hyperparams::Lr(p) => Estimator::Lr(LogisticRegression::fit(p, x, y, seed)?),
            Hyperparams::Knn(p) => Estimator::Knn(KNearestNeighbors::fit(p, x, y, seed)?),
            Hyperparams::Nb(p) => Estimator::Nb(GaussianNaiveBayes::fit(p, x, y, seed)?),
            Hyperparams::Dt(p) => Estimator::Dt(DecisionTree::fit(p, x, y, seed)?),
            Hyperparams::Rf(p) => Estimator::Rf(RandomForest::fit(p, x, y, seed)?),
            Hyperparams::Et(p) => Estimator::Et(ExtraTrees::fit(p, x, y, seed)?),
            Hyperparams::Ridge(p) => Estimator::Ridge(RidgeClassifier::fit(p, x, y, seed)?),
            Hyperparams::Lda(p) => Estimator::Lda(LinearDiscriminant::fit(p, x, y, seed)?),
            Hyperparams::Ada(p) => Estimator::Ada(AdaBoost::fit(p, x, y, seed)?),
            Hyperparams::Dummy(p) => Estimator::Dummy(DummyClassifier::fit(p, x, y, seed)?),
        })
    }

    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        match self {
            Estimator::Lr(m) => m.predict_proba(row),
            Estimator::Knn(m) => m.predict_proba(row),
            Estimator::Nb(m) => m.predict_proba(row),
            Estimator::Dt(m) => m.predict_proba(row),
            Estimator::Rf(m) => m.predict_proba(row),
            Estimator::Et(m) => m.predict_proba(row),
            Estimator::Ridge(m) => m.predict_proba(row),
            Estimator::Lda(m) => m.predict_proba(row),
            Estimator::Ada(m) => m.predict_proba(row),
            Estimator::Dummy(m) => m.predict_proba(row),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            Estimator::Lr(_) => Algorithm::Lr,
            Estimator::Knn(_) => Algorithm::Knn,
            Estimator::Nb(_) => Algorithm::Nb,
            Estimator::Dt(_) => Algorithm::Dt,
            Estimator::Rf(_) => Algorithm::Rf,
            Estimator::Et(_) => Algorithm::Et,
            Estimator::Ridge(_) => Algorithm::Ridge,
            Estimator::Lda(_) => Algorithm::Lda,
            Estimator::Ada(_) => Algorithm::Ada,
            Estimator::Dummy(_) => Algorithm::Dummy,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_data {
    /// Two noisy, linearly separable clusters: label 1 when x0 + x1 > 0
    pub fn separable(n: usize) -> (Vec<Vec<f64>>, Vec<u8>) {
        let mut x = Vec::with_capacity(n);
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            let a = ((i * 37) % 101) as f64 / 50.0 - 1.0;
            let b = ((i * 53) % 97) as f64 / 48.0 - 1.0;
            let label = u8::from(a + b > 0.0);
            let shift = if label == 1 { 0.5 } else { -0.5 };
            x.push(vec![a + shift, b + shift]);
            y.push(label);
        }
        (x, y)
    }

    /// Share of rows classified correctly at the 0.5 threshold
    pub fn accuracy(proba: impl Fn(&[f64]) -> f64, x: &[Vec<f64>], y: &[u8]) -> f64 {
        let correct = x
            .iter()
            .zip(y)
            .filter(|(row, label)| u8::from(proba(row) >= 0.5) == **label)
            .count();
        correct as f64 / x.len() as f64
    }
}
