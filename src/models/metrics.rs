// Classification diagnostics: accuracy and averaged F1.

use std::collections::BTreeSet;

/// Fraction of positions where prediction and truth agree.
pub fn accuracy<T: PartialEq>(y_true: &[T], y_pred: &[T]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

/// Micro-averaged F1 from pooled counts over all labels.
pub fn f1_micro<T: PartialEq>(y_true: &[T], y_pred: &[T]) -> f64 {
    let tp = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count() as f64;
    let fp = y_pred.len() as f64 - tp;
    let fn_ = y_true.len() as f64 - tp;
    f1(tp, fp, fn_)
}

/// Unweighted mean of per-class F1 over every label seen in truth or prediction.
pub fn f1_macro<T: Ord>(y_true: &[T], y_pred: &[T]) -> f64 {
    let labels: BTreeSet<&T> = y_true.iter().chain(y_pred).collect();
    if labels.is_empty() {
        return 0.0;
    }
    let total: f64 = labels
        .iter()
        .map(|label| {
            let tp = y_true
                .iter()
                .zip(y_pred)
                .filter(|(t, p)| t == label && p == label)
                .count() as f64;
            let fp = y_pred.iter().filter(|p| p == label).count() as f64 - tp;
            let fn_ = y_true.iter().filter(|t| t == label).count() as f64 - tp;
            f1(tp, fp, fn_)
        })
        .sum();
    total / labels.len() as f64
}

fn f1(tp: f64, fp: f64, fn_: f64) -> f64 {
    let denom = 2.0 * tp + fp + fn_;
    if denom == 0.0 {
        0.0
    } else {
        2.0 * tp / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy() {
        assert!((accuracy(&[1, 2, 3, 4], &[1, 2, 0, 4]) - 0.75).abs() < 1e-12);
        assert_eq!(accuracy::<i32>(&[], &[]), 0.0);
    }

    #[test]
    fn test_micro_equals_accuracy_single_label() {
        let t = ["a", "b", "c", "a"];
        let p = ["a", "c", "c", "b"];
        assert!((f1_micro(&t, &p) - accuracy(&t, &p)).abs() < 1e-12);
    }

    #[test]
    fn test_macro() {
        // a: tp=1 fp=0 fn=1 -> 2/3 ; b: tp=1 fp=1 fn=0 -> 2/3
        let t = ["a", "a", "b"];
        let p = ["a", "b", "b"];
        assert!((f1_macro(&t, &p) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_macro_counts_predicted_only_labels() {
        // "z" is never true: its F1 is 0 and drags the mean down
        let t = ["a", "a"];
        let p = ["a", "z"];
        // a: tp=1 fp=0 fn=1 -> 2/3 ; z: 0
        assert!((f1_macro(&t, &p) - 1.0 / 3.0).abs() < 1e-12);
    }
}
