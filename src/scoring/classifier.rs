// Classifier-attribution engine.
//
// A linear classifier's decision score is a sum over features:
//
//   decision(x) = sum_j x[j] * coef[j] + intercept
//
// Spreading the intercept evenly over all F features gives every feature an
// additive contribution x[j] * coef[j] + intercept / F, and the contributions
// of a document add up to its decision score exactly. Contributions of the
// held-out visualization documents are summed per TRUE category and scaled
// per category to a max |score| of 1 for the word clouds. Per-document
// explanations instead frame each document by its PREDICTED class.

use std::collections::HashSet;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::Array2;
use serde::Serialize;
use sprs::CsVecView;
use tracing::{info, warn};

use super::{CategoryScores, WordScores};
use crate::corpus::{validate_alignment, Category, DocCategories, TextDict};
use crate::features::matrix::features_to_matrix;
use crate::features::traits::FeatureProvider;
use crate::features::transform::FeatureTransform;
use crate::features::FeatureConfig;
use crate::models::linear::{ClassifierPolicy, LinearModel};
use crate::models::metrics;

/// One document's decision score split over the features.
///
/// Features with a zero value only receive the intercept share, so they are
/// not stored individually.
#[derive(Debug, Clone)]
pub struct Attribution {
    /// (feature index, x[j] * coef[j]) for every non-zero feature
    pub terms: Vec<(usize, f64)>,
    /// intercept / F, added to every feature
    pub intercept_share: f64,
}

impl Attribution {
    /// Contribution of every feature, zero-valued ones included.
    pub fn to_dense(&self, n_features: usize) -> Vec<f64> {
        let mut dense = vec![self.intercept_share; n_features];
        for &(j, t) in &self.terms {
            dense[j] += t;
        }
        dense
    }

    /// Sum of all contributions; equals the oriented decision score.
    pub fn total(&self, n_features: usize) -> f64 {
        self.terms.iter().map(|(_, t)| t).sum::<f64>() + self.intercept_share * n_features as f64
    }
}

/// Split the decision score of `x`, oriented toward class `k`, over the features.
///
/// Binary models share one coefficient row, so evidence for the negative
/// class is the same contribution with its sign flipped.
pub fn attribute(model: &LinearModel, x: &CsVecView<'_, f64>, k: usize) -> Attribution {
    let (r, sign) = model.class_row(k);
    let n_features = model.n_features().max(1) as f64;
    Attribution {
        terms: x
            .iter()
            .map(|(j, &v)| (j, sign * v * model.coef[[r, j]]))
            .collect(),
        intercept_share: sign * model.intercept[r] / n_features,
    }
}

/// Classification diagnostics on the visualization documents.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifierReport {
    pub n_train: usize,
    pub n_test: usize,
    pub accuracy: f64,
    /// Only reported for more than two classes
    pub f1_micro: Option<f64>,
    pub f1_macro: Option<f64>,
}

/// Why the classifier predicted what it did for one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentExplanation {
    pub doc_id: String,
    pub true_class: Category,
    pub predicted_class: Category,
    /// Decision score oriented toward the true class
    pub true_score: f64,
    /// Decision score oriented toward the predicted class
    pub predicted_score: f64,
    /// Contribution toward the predicted class of every word in the document
    pub scores: WordScores,
    pub correct: bool,
}

/// Output of the classifier-attribution engine.
#[derive(Debug, Clone)]
pub struct ClassifierResult {
    pub category_scores: CategoryScores,
    pub report: ClassifierReport,
    /// Filled only when explanations were requested
    pub explanations: Vec<DocumentExplanation>,
}

/// Run the classifier-attribution engine.
///
/// The classifier is trained on every document outside `visualize_ids` and
/// attributions are computed for the `visualize_ids`. If the visualization
/// ids cover the whole corpus there is nothing left to hold out, so the
/// model is trained on all documents and the report is in-sample.
///
/// With `explain` the features skip bigram identification (explanations are
/// rendered word by word) and a [`DocumentExplanation`] is returned for every
/// visualization document.
pub fn classifier_scores(
    texts: &TextDict,
    doccats: &DocCategories,
    visualize_ids: &[String],
    policy: ClassifierPolicy,
    explain: bool,
) -> Result<ClassifierResult> {
    validate_alignment(texts, doccats)?;
    if visualize_ids.is_empty() {
        anyhow::bail!("No documents to attribute: the visualization set is empty");
    }
    if let Some(unknown) = visualize_ids.iter().find(|id| !texts.contains_key(*id)) {
        anyhow::bail!("Visualization id {unknown:?} is not part of the corpus");
    }

    let held_out: HashSet<&str> = visualize_ids.iter().map(String::as_str).collect();
    let mut train_ids: Vec<String> = texts
        .keys()
        .filter(|id| !held_out.contains(id.as_str()))
        .cloned()
        .collect();
    if train_ids.is_empty() {
        warn!(
            documents = texts.len(),
            "Every document is a visualization id, training on all of them (in-sample report)"
        );
        train_ids = texts.keys().cloned().collect();
    }

    let transform = FeatureTransform::new(FeatureConfig::classifier(policy.renorm(), !explain))?;
    let docfeats = transform.texts_to_features(texts, Some(train_ids.as_slice()))?;

    let train = features_to_matrix(&docfeats, &train_ids, None)?;
    let y_train: Vec<Category> = train_ids.iter().map(|id| doccats[id].clone()).collect();
    info!(
        classifier = %policy,
        documents = train_ids.len(),
        features = train.n_features(),
        "Training classifier"
    );
    let model = policy.classifier().fit(&train.matrix, &y_train)?;
    let feature_names = train.feature_names;
    drop(train.matrix);

    let test = features_to_matrix(&docfeats, visualize_ids, Some(feature_names.as_slice()))?;
    let n_features = feature_names.len();
    let n_classes = model.classes.len();

    let mut collected = Array2::<f64>::zeros((n_features, n_classes));
    let mut intercept_totals = vec![0.0; n_classes];
    let mut y_true = Vec::with_capacity(visualize_ids.len());
    let mut y_pred = Vec::with_capacity(visualize_ids.len());
    let mut explanations = Vec::new();

    let pb = ProgressBar::new(visualize_ids.len() as u64);
    pb.set_style(ProgressStyle::default_bar().template("  Attributing [{bar:30}] {pos}/{len} ({eta})")?);

    for (i, doc_id) in visualize_ids.iter().enumerate() {
        pb.inc(1);
        let Some(row) = test.row(i) else {
            pb.abandon();
            anyhow::bail!("Feature matrix has no row for visualization document {doc_id:?}");
        };
        let true_class = &doccats[doc_id];
        let decision = model.decision_function(&row);
        let pred_k = model.predict_index(&decision);
        y_true.push(true_class.clone());
        y_pred.push(model.classes[pred_k].clone());

        let Some(true_k) = model.class_index(true_class) else {
            warn!(doc_id = %doc_id, category = %true_class, "Category was not seen in training, skipping attribution");
            continue;
        };

        let attribution = attribute(&model, &row, true_k);
        for &(j, t) in &attribution.terms {
            collected[[j, true_k]] += t;
        }
        intercept_totals[true_k] += attribution.intercept_share;

        if explain {
            let framing = attribute(&model, &row, pred_k);
            let scores: WordScores = framing
                .terms
                .iter()
                .map(|&(j, t)| (feature_names[j].clone(), t + framing.intercept_share))
                .collect();
            explanations.push(DocumentExplanation {
                doc_id: doc_id.clone(),
                true_class: true_class.clone(),
                predicted_class: model.classes[pred_k].clone(),
                true_score: model.class_score(&decision, true_k),
                predicted_score: model.class_score(&decision, pred_k),
                scores,
                correct: true_k == pred_k,
            });
        }
    }
    pb.finish_and_clear();

    let report = ClassifierReport {
        n_train: train_ids.len(),
        n_test: y_true.len(),
        accuracy: metrics::accuracy(&y_true, &y_pred),
        f1_micro: (n_classes > 2).then(|| metrics::f1_micro(&y_true, &y_pred)),
        f1_macro: (n_classes > 2).then(|| metrics::f1_macro(&y_true, &y_pred)),
    };
    match (report.f1_micro, report.f1_macro) {
        (Some(f1_micro), Some(f1_macro)) => info!(
            accuracy = report.accuracy,
            f1_micro,
            f1_macro,
            "Classifier evaluated"
        ),
        _ => info!(accuracy = report.accuracy, "Classifier evaluated"),
    }

    let mut category_scores = CategoryScores::new();
    for (k, class) in model.classes.iter().enumerate() {
        let mut column: Vec<f64> = collected
            .column(k)
            .iter()
            .map(|v| v + intercept_totals[k])
            .collect();
        normalize_max_abs(&mut column);
        let scores: WordScores = feature_names.iter().cloned().zip(column).collect();
        category_scores.insert(class.clone(), scores);
    }

    Ok(ClassifierResult {
        category_scores,
        report,
        explanations,
    })
}

/// Divide by the largest absolute value. All-zero columns stay zero.
fn normalize_max_abs(values: &mut [f64]) {
    let max_abs = values.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    if max_abs > 0.0 {
        for v in values.iter_mut() {
            *v /= max_abs;
        }
    }
}
