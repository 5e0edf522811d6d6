//! Binary classification metrics and evaluation curves

use serde::{Deserialize, Serialize};

/// Decision threshold on the positive-class probability
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Metrics that can rank candidates or drive tuning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Accuracy,
    #[serde(rename = "AUC")]
    Auc,
    Recall,
    #[serde(rename = "Prec.")]
    Precision,
    #[default]
    F1,
    Kappa,
    #[serde(rename = "MCC")]
    Mcc,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::Accuracy,
        Metric::Auc,
        Metric::Recall,
        Metric::Precision,
        Metric::F1,
        Metric::Kappa,
        Metric::Mcc,
    ];

    /// Column header used in leaderboards
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Accuracy => "Accuracy",
            Metric::Auc => "AUC",
            Metric::Recall => "Recall",
            Metric::Precision => "Prec.",
            Metric::F1 => "F1",
            Metric::Kappa => "Kappa",
            Metric::Mcc => "MCC",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().trim_end_matches('.') {
            "accuracy" | "acc" => Ok(Metric::Accuracy),
            "auc" => Ok(Metric::Auc),
            "recall" => Ok(Metric::Recall),
            "precision" | "prec" => Ok(Metric::Precision),
            "f1" => Ok(Metric::F1),
            "kappa" => Ok(Metric::Kappa),
            "mcc" => Ok(Metric::Mcc),
            _ => Err(format!(
                "Unknown metric: '{}'. Use accuracy, auc, recall, precision, f1, kappa or mcc.",
                s
            )),
        }
    }
}

/// Counts of a binary confusion matrix (positive class = 1)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_positives: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(y_true: &[u8], y_pred: &[u8]) -> Self {
        let mut cm = ConfusionMatrix::default();
        for (&t, &p) in y_true.iter().zip(y_pred) {
            match (t, p) {
                (1, 1) => cm.true_positives += 1,
                (1, _) => cm.false_negatives += 1,
                (_, 1) => cm.false_positives += 1,
                _ => cm.true_negatives += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.true_negatives + self.false_positives + self.false_negatives + self.true_positives
    }
}

/// Scores of one evaluation (a fold, a mean, or a holdout set)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BinaryMetrics {
    pub accuracy: f64,
    pub auc: f64,
    pub recall: f64,
    pub precision: f64,
    pub f1: f64,
    pub kappa: f64,
    pub mcc: f64,
}

impl BinaryMetrics {
    /// Score positive-class probabilities against true labels
    pub fn score(y_true: &[u8], proba: &[f64]) -> Self {
        let y_pred: Vec<u8> = proba
            .iter()
            .map(|&p| u8::from(p >= DECISION_THRESHOLD))
            .collect();
        let cm = ConfusionMatrix::from_predictions(y_true, &y_pred);
        Self::from_confusion(&cm, roc_auc(y_true, proba))
    }

    pub fn from_confusion(cm: &ConfusionMatrix, auc: f64) -> Self {
        let tp = cm.true_positives as f64;
        let tn = cm.true_negatives as f64;
        let fp = cm.false_positives as f64;
        let fn_ = cm.false_negatives as f64;
        let n = cm.total() as f64;

        let ratio = |num: f64, den: f64| if den > 0.0 { num / den } else { 0.0 };

        let accuracy = ratio(tp + tn, n);
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = ratio(2.0 * precision * recall, precision + recall);

        // Cohen's kappa against chance agreement
        let expected = if n > 0.0 {
            ((tp + fp) * (tp + fn_) + (tn + fn_) * (tn + fp)) / (n * n)
        } else {
            0.0
        };
        let kappa = ratio(accuracy - expected, 1.0 - expected);

        let mcc_den = ((tp + fp) * (tp + fn_) * (tn + fp) * (tn + fn_)).sqrt();
        let mcc = ratio(tp * tn - fp * fn_, mcc_den);

        Self {
            accuracy,
            auc,
            recall,
            precision,
            f1,
            kappa,
            mcc,
        }
    }

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Accuracy => self.accuracy,
            Metric::Auc => self.auc,
            Metric::Recall => self.recall,
            Metric::Precision => self.precision,
            Metric::F1 => self.f1,
            Metric::Kappa => self.kappa,
            Metric::Mcc => self.mcc,
        }
    }

    fn map(values: &[BinaryMetrics], f: impl Fn(&[f64]) -> f64) -> BinaryMetrics {
        let column = |m: Metric| -> Vec<f64> { values.iter().map(|v| v.get(m)).collect() };
        BinaryMetrics {
            accuracy: f(&column(Metric::Accuracy)),
            auc: f(&column(Metric::Auc)),
            recall: f(&column(Metric::Recall)),
            precision: f(&column(Metric::Precision)),
            f1: f(&column(Metric::F1)),
            kappa: f(&column(Metric::Kappa)),
            mcc: f(&column(Metric::Mcc)),
        }
    }

    /// Per-metric mean and (population) standard deviation across folds
    pub fn mean_and_std(folds: &[BinaryMetrics]) -> (BinaryMetrics, BinaryMetrics) {
        let mean = |xs: &[f64]| {
            if xs.is_empty() {
                0.0
            } else {
                xs.iter().sum::<f64>() / xs.len() as f64
            }
        };
        let std = |xs: &[f64]| {
            if xs.is_empty() {
                return 0.0;
            }
            let m = mean(xs);
            (xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64).sqrt()
        };
        (Self::map(folds, &mean), Self::map(folds, &std))
    }
}

/// A point on an evaluation curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub threshold: f64,
    pub x: f64,
    pub y: f64,
}

/// Sort (score, label) pairs by descending score
fn sorted_by_score_desc(y_true: &[u8], scores: &[f64]) -> Vec<(f64, u8)> {
    let mut pairs: Vec<(f64, u8)> = scores.iter().copied().zip(y_true.iter().copied()).collect();
    pairs.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    pairs
}

/// Walk distinct thresholds from high to low, yielding cumulative (tp, fp)
fn cumulative_counts(pairs: &[(f64, u8)]) -> Vec<(f64, f64, f64)> {
    let mut points = Vec::new();
    let (mut tp, mut fp) = (0.0, 0.0);
    let mut i = 0;
    while i < pairs.len() {
        let threshold = pairs[i].0;
        while i < pairs.len() && (pairs[i].0 - threshold).abs() < 1e-12 {
            if pairs[i].1 == 1 {
                tp += 1.0;
            } else {
                fp += 1.0;
            }
            i += 1;
        }
        points.push((threshold, tp, fp));
    }
    points
}

/// ROC curve: x = false positive rate, y = true positive rate
pub fn roc_curve(y_true: &[u8], scores: &[f64]) -> Vec<CurvePoint> {
    let positives = y_true.iter().filter(|&&y| y == 1).count() as f64;
    let negatives = y_true.len() as f64 - positives;
    if positives == 0.0 || negatives == 0.0 {
        return Vec::new();
    }

    let pairs = sorted_by_score_desc(y_true, scores);
    let mut curve = vec![CurvePoint {
        threshold: f64::INFINITY,
        x: 0.0,
        y: 0.0,
    }];
    curve.extend(
        cumulative_counts(&pairs)
            .into_iter()
            .map(|(threshold, tp, fp)| CurvePoint {
                threshold,
                x: fp / negatives,
                y: tp / positives,
            }),
    );
    curve
}

/// Area under the ROC curve via the Mann-Whitney U statistic (ties count half)
pub fn roc_auc(y_true: &[u8], scores: &[f64]) -> f64 {
    let mut pairs: Vec<(f64, u8)> = scores.iter().copied().zip(y_true.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let total_pos = pairs.iter().filter(|(_, t)| *t == 1).count() as f64;
    let total_neg = pairs.len() as f64 - total_pos;
    if total_pos == 0.0 || total_neg == 0.0 {
        return 0.5;
    }

    let n = pairs.len();
    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < n {
        let current = pairs[i].0;
        let mut j = i;
        while j < n && (pairs[j].0 - current).abs() < 1e-12 {
            j += 1;
        }
        // 1-based average rank of the tie group
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        let group_pos = pairs[i..j].iter().filter(|(_, t)| *t == 1).count() as f64;
        rank_sum_pos += avg_rank * group_pos;
        i = j;
    }

    let u = rank_sum_pos - total_pos * (total_pos + 1.0) / 2.0;
    (u / (total_pos * total_neg)).clamp(0.0, 1.0)
}

/// Precision-recall curve: x = recall, y = precision
pub fn precision_recall_curve(y_true: &[u8], scores: &[f64]) -> Vec<CurvePoint> {
    let positives = y_true.iter().filter(|&&y| y == 1).count() as f64;
    if positives == 0.0 {
        return Vec::new();
    }

    let pairs = sorted_by_score_desc(y_true, scores);
    let mut curve = vec![CurvePoint {
        threshold: f64::INFINITY,
        x: 0.0,
        y: 1.0,
    }];
    curve.extend(
        cumulative_counts(&pairs)
            .into_iter()
            .map(|(threshold, tp, fp)| CurvePoint {
                threshold,
                x: tp / positives,
                y: tp / (tp + fp),
            }),
    );
    curve
}

/// Average precision: sum of precision weighted by recall increments
pub fn average_precision(curve: &[CurvePoint]) -> f64 {
    curve
        .windows(2)
        .map(|w| (w[1].x - w[0].x) * w[1].y)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions() {
        let y = [0, 0, 1, 1];
        let p = [0.1, 0.2, 0.8, 0.9];
        let m = BinaryMetrics::score(&y, &p);
        assert_eq!(m.accuracy, 1.0);
        assert_eq!(m.f1, 1.0);
        assert_eq!(m.auc, 1.0);
        assert!((m.kappa - 1.0).abs() < 1e-12);
        assert!((m.mcc - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_f1_known_values() {
        // tp=2, fp=1, fn=1, tn=1
        let y = [1, 1, 1, 0, 0];
        let p = [0.9, 0.8, 0.1, 0.7, 0.2];
        let m = BinaryMetrics::score(&y, &p);
        assert!((m.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.f1 - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_positive_predictions_gives_zero_f1() {
        let y = [1, 0, 0];
        let p = [0.1, 0.2, 0.3];
        let m = BinaryMetrics::score(&y, &p);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.f1, 0.0);
        assert_eq!(m.mcc, 0.0);
    }

    #[test]
    fn test_auc_with_ties() {
        let y = [0, 1, 0, 1];
        let p = [0.5, 0.5, 0.5, 0.5];
        assert!((roc_auc(&y, &p) - 0.5).abs() < 1e-12);

        let y = [0, 0, 1, 1];
        let p = [0.1, 0.4, 0.35, 0.8];
        assert!((roc_auc(&y, &p) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_roc_curve_endpoints() {
        let y = [0, 0, 1, 1];
        let p = [0.1, 0.4, 0.35, 0.8];
        let curve = roc_curve(&y, &p);
        let first = curve.first().unwrap();
        let last = curve.last().unwrap();
        assert_eq!((first.x, first.y), (0.0, 0.0));
        assert_eq!((last.x, last.y), (1.0, 1.0));
    }

    #[test]
    fn test_average_precision_perfect() {
        let y = [0, 0, 1, 1];
        let p = [0.1, 0.2, 0.8, 0.9];
        let curve = precision_recall_curve(&y, &p);
        assert!((average_precision(&curve) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_mean_and_std() {
        let a = BinaryMetrics {
            f1: 0.5,
            ..Default::default()
        };
        let b = BinaryMetrics {
            f1: 0.7,
            ..Default::default()
        };
        let (mean, std) = BinaryMetrics::mean_and_std(&[a, b]);
        assert!((mean.f1 - 0.6).abs() < 1e-12);
        assert!((std.f1 - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("F1".parse::<Metric>().unwrap(), Metric::F1);
        assert_eq!("Prec.".parse::<Metric>().unwrap(), Metric::Precision);
        assert!("logloss".parse::<Metric>().is_err());
        assert_eq!(serde_json::to_value(Metric::Auc).unwrap(), "AUC");
    }
}
