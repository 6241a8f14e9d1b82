// ============================================================
// Layer 3 — Metrics Record
// ============================================================
// Classification metrics for one epoch over one data split.
//
// Averaging follows the usual scikit-learn conventions:
//   - exactly two classes → "binary": precision/recall/F1 of
//     class index 1 (the sarcastic class)
//   - otherwise → "weighted": per-class scores averaged with
//     weights equal to each class's support in the targets
// Any 0/0 division yields 0.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub loss:      f64,
    pub accuracy:  f64,
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
}

impl MetricsRecord {
    /// Score `predictions` against `targets` (class indices).
    pub fn from_predictions(
        loss:        f64,
        targets:     &[usize],
        predictions: &[usize],
        num_classes: usize,
    ) -> Self {
        debug_assert_eq!(targets.len(), predictions.len());
        let total = targets.len();
        if total == 0 {
            return Self::empty();
        }

        let correct = targets.iter().zip(predictions).filter(|(t, p)| t == p).count();
        let accuracy = correct as f64 / total as f64;

        let (precision, recall, f1) = if num_classes == 2 {
            class_scores(targets, predictions, 1)
        } else {
            weighted_scores(targets, predictions, num_classes)
        };

        Self { loss, accuracy, precision, recall, f1 }
    }

    /// Record for a split with no batches at all.
    pub fn empty() -> Self {
        Self { loss: f64::NAN, accuracy: 0.0, precision: 0.0, recall: 0.0, f1: 0.0 }
    }

    pub fn summary(&self) -> String {
        format!(
            "loss: {:.3}, acc: {:.3}, p: {:.3}, r: {:.3}, f1: {:.3}",
            self.loss, self.accuracy, self.precision, self.recall, self.f1
        )
    }
}

/// Training and validation metrics for one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochReport {
    pub epoch: usize,
    pub train: MetricsRecord,
    pub valid: MetricsRecord,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn harmonic(p: f64, r: f64) -> f64 {
    if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
}

fn class_scores(targets: &[usize], predictions: &[usize], class: usize) -> (f64, f64, f64) {
    let mut tp = 0usize;
    let mut predicted = 0usize;
    let mut actual = 0usize;
    for (&t, &p) in targets.iter().zip(predictions) {
        if p == class { predicted += 1; }
        if t == class { actual += 1; }
        if p == class && t == class { tp += 1; }
    }
    let precision = ratio(tp, predicted);
    let recall    = ratio(tp, actual);
    (precision, recall, harmonic(precision, recall))
}

fn weighted_scores(targets: &[usize], predictions: &[usize], num_classes: usize) -> (f64, f64, f64) {
    let classes = targets
        .iter()
        .chain(predictions)
        .map(|&c| c + 1)
        .max()
        .unwrap_or(0)
        .max(num_classes);

    let total = targets.len() as f64;
    let (mut p_sum, mut r_sum, mut f_sum) = (0.0, 0.0, 0.0);
    for class in 0..classes {
        let support = targets.iter().filter(|&&t| t == class).count();
        if support == 0 {
            continue;
        }
        let (p, r, f) = class_scores(targets, predictions, class);
        let w = support as f64;
        p_sum += p * w;
        r_sum += r * w;
        f_sum += f * w;
    }
    (p_sum / total, r_sum / total, f_sum / total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_binary_scores_positive_class() {
        // tp=2, fp=1, fn=1
        let targets = [1, 1, 1, 0, 0];
        let preds   = [1, 1, 0, 1, 0];
        let m = MetricsRecord::from_predictions(0.5, &targets, &preds, 2);
        assert!(close(m.accuracy, 0.6));
        assert!(close(m.precision, 2.0 / 3.0));
        assert!(close(m.recall, 2.0 / 3.0));
        assert!(close(m.f1, 2.0 / 3.0));
        assert!(close(m.loss, 0.5));
    }

    #[test]
    fn test_binary_zero_division_is_zero() {
        let m = MetricsRecord::from_predictions(0.0, &[0, 0, 1], &[0, 0, 0], 2);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1, 0.0);
    }

    #[test]
    fn test_weighted_average_uses_support() {
        // class 0: support 2, p=1, r=0.5, f=2/3
        // class 1: support 1, p=0.5, r=1, f=2/3
        // class 2: support 1, p=1, r=1, f=1
        let targets = [0, 0, 1, 2];
        let preds   = [0, 1, 1, 2];
        let m = MetricsRecord::from_predictions(1.0, &targets, &preds, 3);
        assert!(close(m.precision, (2.0 * 1.0 + 0.5 + 1.0) / 4.0));
        assert!(close(m.recall, (2.0 * 0.5 + 1.0 + 1.0) / 4.0));
        assert!(close(m.f1, (2.0 * (2.0 / 3.0) + 2.0 / 3.0 + 1.0) / 4.0));
        assert!(close(m.accuracy, 0.75));
    }

    #[test]
    fn test_empty_split() {
        let m = MetricsRecord::from_predictions(0.0, &[], &[], 2);
        assert!(m.loss.is_nan());
        assert_eq!(m.f1, 0.0);
    }
}
