// TF-IDF aggregation engine.
//
// Every document's tf-idf vector is added into its category's running sum.
// Words missing from a document count as zero, so a category's score for a
// word is simply the sum of that word's weights over the category members.

use std::collections::BTreeMap;

use anyhow::Result;
use tracing::info;

use super::{CategoryScores, WordScores};
use crate::corpus::{validate_alignment, DocCategories, TextDict};
use crate::features::traits::FeatureProvider;
use crate::features::transform::FeatureTransform;
use crate::features::{DocFeatures, FeatureConfig, TermWeights};

/// Output of the TF-IDF engine.
#[derive(Debug, Clone, Default)]
pub struct TfidfResult {
    pub category_scores: CategoryScores,
    /// Per-document weights of the visualization ids, for highlighted HTML.
    /// Only filled when per-document output was requested.
    pub document_scores: BTreeMap<String, WordScores>,
}

/// Sum the feature vectors of each category's documents elementwise.
///
/// Categories without any documents don't appear in the output; a category
/// whose documents have no terms maps to an empty score set.
pub fn aggregate_features(docfeats: &DocFeatures, doccats: &DocCategories) -> Result<CategoryScores> {
    validate_alignment(docfeats, doccats)?;
    let mut scores = CategoryScores::new();
    for (doc_id, weights) in docfeats {
        let cat = &doccats[doc_id];
        let sums = scores.entry(cat.clone()).or_default();
        for (term, &w) in weights {
            *sums.entry(term.clone()).or_insert(0.0) += w;
        }
    }
    Ok(scores)
}

/// Run the TF-IDF engine over a corpus.
///
/// With `html` the features are computed without bigrams (highlighting works
/// on single words) and the weights of `visualize_ids` are returned as well.
pub fn tfidf_scores(
    texts: &TextDict,
    doccats: &DocCategories,
    visualize_ids: &[String],
    html: bool,
) -> Result<TfidfResult> {
    validate_alignment(texts, doccats)?;
    let transform = FeatureTransform::new(FeatureConfig::tfidf(!html))?;
    let docfeats = transform.texts_to_features(texts, None)?;

    let category_scores = aggregate_features(&docfeats, doccats)?;
    info!(
        documents = docfeats.len(),
        categories = category_scores.len(),
        "Aggregated tf-idf scores"
    );

    let document_scores = if html {
        visualize_ids
            .iter()
            .filter_map(|id| docfeats.get(id).map(|w| (id.clone(), sorted(w))))
            .collect()
    } else {
        BTreeMap::new()
    };

    Ok(TfidfResult {
        category_scores,
        document_scores,
    })
}

fn sorted(weights: &TermWeights) -> WordScores {
    weights.iter().map(|(t, &w)| (t.clone(), w)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Category;

    #[test]
    fn test_aggregate_sums_elementwise() {
        let docfeats: DocFeatures = [
            ("d1".to_string(), TermWeights::from([("x".to_string(), 0.5), ("y".to_string(), 0.25)])),
            ("d2".to_string(), TermWeights::from([("x".to_string(), 0.25), ("z".to_string(), 1.0)])),
        ]
        .into();
        let doccats: DocCategories = [
            ("d1".to_string(), Category::from("c")),
            ("d2".to_string(), Category::from("c")),
        ]
        .into();
        let scores = aggregate_features(&docfeats, &doccats).unwrap();
        let c = &scores[&Category::from("c")];
        assert!((c["x"] - 0.75).abs() < 1e-12);
        assert!((c["y"] - 0.25).abs() < 1e-12);
        assert!((c["z"] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_aggregate_rejects_unaligned() {
        let docfeats: DocFeatures = [("d1".to_string(), TermWeights::new())].into();
        let doccats: DocCategories = [("d2".to_string(), Category::from("c"))].into();
        assert!(aggregate_features(&docfeats, &doccats).is_err());
    }

    #[test]
    fn test_empty_document_gives_empty_scores() {
        let texts: TextDict = [("d1".to_string(), "the and of".to_string())].into();
        let doccats: DocCategories = [("d1".to_string(), Category::from("c"))].into();
        let result = tfidf_scores(&texts, &doccats, &[], false).unwrap();
        assert!(result.category_scores[&Category::from("c")].is_empty());
    }
}
