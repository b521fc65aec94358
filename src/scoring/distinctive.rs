// Distinctive-word engine.
//
// For a word w and category c:
//   tpr(w, c) = average weight of w over the documents of c (absent = 0)
//   fpr(w, c) = mean + population std of tpr(w, c') over all other c'
//
// Using mean + std for the "false positive rate" keeps a word from looking
// distinctive just because one other noisy category happens to use it a lot
// less. The final score combines tpr and fpr with one of several functions,
// all of which are >= 0 and exactly 0 when tpr is 0.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use tracing::{debug, info};

use super::CategoryScores;
use crate::corpus::{category_documents, validate_alignment, DocCategories, TextDict};
use crate::features::traits::FeatureProvider;
use crate::features::transform::FeatureTransform;
use crate::features::{DocFeatures, FeatureConfig};

/// How tpr and fpr are combined into a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistinctiveFn {
    /// Raw tpr; tracks how common a word is, not how distinctive
    Tpr,
    /// max(tpr - fpr, 0)
    Diff,
    /// Mean of tpr and the rate difference
    TprMean,
    /// tpr-weighted rate difference
    TprMult,
    /// tpr / fpr clipped to [1, 4] and rescaled to [0, 1]
    Quot,
    /// Mean of the rescaled quotient and the rate difference
    #[default]
    QuotDiff,
}

impl DistinctiveFn {
    pub const ALL: [DistinctiveFn; 6] = [
        DistinctiveFn::Tpr,
        DistinctiveFn::Diff,
        DistinctiveFn::TprMean,
        DistinctiveFn::TprMult,
        DistinctiveFn::Quot,
        DistinctiveFn::QuotDiff,
    ];

    pub fn apply(&self, tpr: f64, fpr: f64) -> f64 {
        let diff = (tpr - fpr).max(0.0);
        match self {
            DistinctiveFn::Tpr => tpr,
            DistinctiveFn::Diff => diff,
            DistinctiveFn::TprMean => 0.5 * (tpr + diff),
            DistinctiveFn::TprMult => tpr * diff,
            DistinctiveFn::Quot => quot(tpr, fpr),
            DistinctiveFn::QuotDiff => 0.5 * (quot(tpr, fpr) + diff),
        }
    }
}

fn quot(tpr: f64, fpr: f64) -> f64 {
    ((tpr / fpr.max(f64::EPSILON)).clamp(1.0, 4.0) - 1.0) / 3.0
}

impl FromStr for DistinctiveFn {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tpr" => Ok(DistinctiveFn::Tpr),
            "diff" => Ok(DistinctiveFn::Diff),
            "tprmean" => Ok(DistinctiveFn::TprMean),
            "tprmult" => Ok(DistinctiveFn::TprMult),
            "quot" => Ok(DistinctiveFn::Quot),
            "quotdiff" => Ok(DistinctiveFn::QuotDiff),
            other => anyhow::bail!(
                "Unknown distinctive score {other:?} (expected one of tpr, diff, tprmean, tprmult, quot, quotdiff)"
            ),
        }
    }
}

impl fmt::Display for DistinctiveFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DistinctiveFn::Tpr => "tpr",
            DistinctiveFn::Diff => "diff",
            DistinctiveFn::TprMean => "tprmean",
            DistinctiveFn::TprMult => "tprmult",
            DistinctiveFn::Quot => "quot",
            DistinctiveFn::QuotDiff => "quotdiff",
        };
        write!(f, "{name}")
    }
}

/// Score every word of every category from precomputed features.
///
/// A word only appears in a category's map if its tpr there is positive.
pub fn distinctive_scores_from_features(
    docfeats: &DocFeatures,
    doccats: &DocCategories,
    score_fn: DistinctiveFn,
) -> Result<CategoryScores> {
    validate_alignment(docfeats, doccats)?;
    let catdocs = category_documents(doccats);
    let categories: Vec<_> = catdocs.keys().cloned().collect();

    // tpr[word][k] for the k-th category
    let mut tpr: HashMap<&str, Vec<f64>> = HashMap::new();
    for (k, doc_ids) in catdocs.values().enumerate() {
        let n_docs = doc_ids.len() as f64;
        for doc_id in doc_ids {
            for (word, &w) in &docfeats[doc_id] {
                tpr.entry(word.as_str())
                    .or_insert_with(|| vec![0.0; categories.len()])[k] += w / n_docs;
            }
        }
    }

    let mut scores = CategoryScores::new();
    for (k, cat) in categories.iter().enumerate() {
        let cat_scores = scores.entry(cat.clone()).or_default();
        for (word, rates) in &tpr {
            let target = rates[k];
            if target <= 0.0 {
                continue;
            }
            let others: Vec<f64> = rates
                .iter()
                .enumerate()
                .filter(|&(c, _)| c != k)
                .map(|(_, &r)| r)
                .collect();
            let fpr = mean_plus_std(&others);
            cat_scores.insert((*word).to_string(), score_fn.apply(target, fpr));
        }
        debug!(category = %cat, words = cat_scores.len(), "Scored distinctive words");
    }
    Ok(scores)
}

/// Run the distinctive-word engine over a corpus.
pub fn distinctive_scores(
    texts: &TextDict,
    doccats: &DocCategories,
    score_fn: DistinctiveFn,
) -> Result<CategoryScores> {
    validate_alignment(texts, doccats)?;
    let transform = FeatureTransform::new(FeatureConfig::distinctive())?;
    let docfeats = transform.texts_to_features(texts, None)?;
    let scores = distinctive_scores_from_features(&docfeats, doccats, score_fn)?;
    info!(
        categories = scores.len(),
        score_fn = %score_fn,
        "Computed distinctive words"
    );
    Ok(scores)
}

/// Mean plus population standard deviation; 0 for an empty slice.
fn mean_plus_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    mean + var.sqrt()
}
