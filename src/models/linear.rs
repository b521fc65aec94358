// Linear classifier trait and the fitted model shared by all policies.
//
// A fitted model exposes its coefficients and intercepts so the attribution
// engine can split every decision score into per-feature contributions:
//
//   decision(x) = sum_j x[j] * coef[j] + intercept
//
// Binary models keep a single coefficient row whose positive side is
// classes[1]; multiclass models keep one row per class.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use ndarray::{Array1, Array2};
use sprs::{CsMat, CsVecView};

use super::logistic::LogisticRegression;
use super::svm::LinearSvm;
use crate::corpus::Category;
use crate::features::Norm;

/// Which linear classifier the attribution engine trains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifierPolicy {
    /// Margin-based separation (squared hinge loss)
    #[default]
    LinearSvm,
    /// Probabilistic (logistic / softmax) regression
    LogisticRegression,
}

impl ClassifierPolicy {
    /// Build the classifier with its default hyperparameters.
    pub fn classifier(&self) -> Box<dyn LinearClassifier> {
        match self {
            ClassifierPolicy::LinearSvm => Box::new(LinearSvm::default()),
            ClassifierPolicy::LogisticRegression => Box::new(LogisticRegression::default()),
        }
    }

    /// Post-idf renormalization each classifier is trained with.
    pub fn renorm(&self) -> Norm {
        match self {
            ClassifierPolicy::LinearSvm => Norm::Length,
            ClassifierPolicy::LogisticRegression => Norm::Max,
        }
    }
}

impl FromStr for ClassifierPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "svm" | "linearsvm" | "linear-svm" => Ok(ClassifierPolicy::LinearSvm),
            "logreg" | "logistic" | "logistic-regression" => {
                Ok(ClassifierPolicy::LogisticRegression)
            }
            other => anyhow::bail!("Unknown classifier {other:?} (expected \"svm\" or \"logreg\")"),
        }
    }
}

impl fmt::Display for ClassifierPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierPolicy::LinearSvm => write!(f, "svm"),
            ClassifierPolicy::LogisticRegression => write!(f, "logreg"),
        }
    }
}

/// Trait for training a linear classifier on a sparse feature matrix.
pub trait LinearClassifier {
    /// Fit on the rows of `x` with one label per row.
    fn fit(&self, x: &CsMat<f64>, labels: &[Category]) -> Result<LinearModel>;
}

/// A fitted linear model.
#[derive(Debug, Clone)]
pub struct LinearModel {
    /// Sorted class labels
    pub classes: Vec<Category>,
    /// One row for binary problems, one row per class otherwise
    pub coef: Array2<f64>,
    pub intercept: Array1<f64>,
}

impl LinearModel {
    pub fn is_binary(&self) -> bool {
        self.classes.len() == 2
    }

    pub fn n_features(&self) -> usize {
        self.coef.ncols()
    }

    pub fn class_index(&self, class: &Category) -> Option<usize> {
        self.classes.iter().position(|c| c == class)
    }

    /// Raw score of coefficient row `r` for a sparse input.
    pub fn row_score(&self, r: usize, x: &CsVecView<'_, f64>) -> f64 {
        x.iter().map(|(j, &v)| v * self.coef[[r, j]]).sum::<f64>() + self.intercept[r]
    }

    /// Raw decision scores: one value for binary models, one per class otherwise.
    pub fn decision_function(&self, x: &CsVecView<'_, f64>) -> Vec<f64> {
        (0..self.coef.nrows()).map(|r| self.row_score(r, x)).collect()
    }

    /// Coefficient row and sign that express "evidence for class `k`".
    ///
    /// Binary models only have the positive class's row, so evidence for the
    /// negative class is the same row with the sign flipped.
    pub fn class_row(&self, k: usize) -> (usize, f64) {
        if self.is_binary() {
            (0, if k == 1 { 1.0 } else { -1.0 })
        } else {
            (k, 1.0)
        }
    }

    /// Decision score oriented toward class `k`.
    pub fn class_score(&self, decision: &[f64], k: usize) -> f64 {
        let (r, sign) = self.class_row(k);
        sign * decision[r]
    }

    /// Index of the predicted class for a decision vector.
    pub fn predict_index(&self, decision: &[f64]) -> usize {
        if self.is_binary() {
            usize::from(decision[0] > 0.0)
        } else {
            decision
                .iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |best, (k, &s)| if s > best.1 { (k, s) } else { best })
                .0
        }
    }

    pub fn predict(&self, x: &CsVecView<'_, f64>) -> &Category {
        let decision = self.decision_function(x);
        &self.classes[self.predict_index(&decision)]
    }
}

/// Map labels to indices into the sorted set of classes.
///
/// Fails when there is nothing to discriminate (fewer than two classes).
pub fn encode_labels(labels: &[Category]) -> Result<(Vec<Category>, Vec<usize>)> {
    let classes: Vec<Category> = labels
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if classes.len() < 2 {
        anyhow::bail!(
            "Classifier needs at least two classes to discriminate, got {}",
            classes.len()
        );
    }
    let y = labels
        .iter()
        .map(|l| classes.iter().position(|c| c == l).unwrap_or(0))
        .collect();
    Ok((classes, y))
}

/// Class-balanced sample weights: n_samples / (n_classes * count(class)).
pub fn balanced_class_weights(y: &[usize], n_classes: usize) -> Vec<f64> {
    let mut counts = vec![0usize; n_classes];
    for &k in y {
        counts[k] += 1;
    }
    counts
        .iter()
        .map(|&c| {
            if c == 0 {
                0.0
            } else {
                y.len() as f64 / (n_classes as f64 * c as f64)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn cats(labels: &[&str]) -> Vec<Category> {
        labels.iter().map(|l| Category::from(*l)).collect()
    }

    #[test]
    fn test_encode_labels_sorted() {
        let (classes, y) = encode_labels(&cats(&["b", "a", "b", "c"])).unwrap();
        assert_eq!(classes, cats(&["a", "b", "c"]));
        assert_eq!(y, vec![1, 0, 1, 2]);
    }

    #[test]
    fn test_encode_labels_single_class_fails() {
        assert!(encode_labels(&cats(&["a", "a"])).is_err());
        assert!(encode_labels(&[]).is_err());
    }

    #[test]
    fn test_balanced_weights() {
        let w = balanced_class_weights(&[0, 0, 0, 1], 2);
        assert!((w[0] - 4.0 / 6.0).abs() < 1e-12);
        assert!((w[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_binary_orientation() {
        let model = LinearModel {
            classes: cats(&["neg", "pos"]),
            coef: array![[1.0, -1.0]],
            intercept: array![0.5],
        };
        assert_eq!(model.predict_index(&[0.3]), 1);
        assert_eq!(model.predict_index(&[-0.3]), 0);
        assert!((model.class_score(&[0.3], 0) + 0.3).abs() < 1e-12);
        assert_eq!(model.class_row(1), (0, 1.0));
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("svm".parse::<ClassifierPolicy>().unwrap(), ClassifierPolicy::LinearSvm);
        assert_eq!(
            "LogReg".parse::<ClassifierPolicy>().unwrap(),
            ClassifierPolicy::LogisticRegression
        );
        assert!("forest".parse::<ClassifierPolicy>().is_err());
    }
}
