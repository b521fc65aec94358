// Feature extraction — raw text to sparse term weights.
//
// Every engine turns the corpus into {doc_id: {term: weight}} first, but
// each one asks for different weighting (plain max-normalized counts for the
// distinctive-word statistic, tf-idf for aggregation and classification), so
// feature vectors are computed per engine invocation and never shared.

pub mod matrix;
pub mod tokenize;
pub mod traits;
pub mod transform;

use std::collections::{BTreeMap, HashMap};

/// {term: weight} for one document. Terms are unigrams or "w1 w2" bigrams.
pub type TermWeights = HashMap<String, f64>;

/// {doc_id: {term: weight}}
pub type DocFeatures = BTreeMap<String, TermWeights>;

/// How a document's weights are scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Norm {
    /// Leave weights as they are
    None,
    /// Divide by the largest weight in the document
    Max,
    /// Divide by the L2 length of the document's weight vector
    Length,
}

/// Feature extraction settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureConfig {
    /// Normalization of the raw term counts
    pub norm: Norm,
    /// Multiply by inverse document frequency
    pub weight: bool,
    /// Normalization applied after idf weighting
    pub renorm: Norm,
    /// Emit frequently co-occurring word pairs as extra "w1 w2" terms
    pub identify_bigrams: bool,
    /// Collapse every digit run to "0"
    pub norm_num: bool,
    /// Drop English stop words
    pub remove_stopwords: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            norm: Norm::Max,
            weight: true,
            renorm: Norm::Length,
            identify_bigrams: false,
            norm_num: false,
            remove_stopwords: true,
        }
    }
}

impl FeatureConfig {
    /// Tf-idf weights summed per category. Bigrams only when no per-word
    /// highlighting has to be rendered.
    pub fn tfidf(identify_bigrams: bool) -> Self {
        Self {
            identify_bigrams,
            ..Self::default()
        }
    }

    /// Average max-normalized term counts, no idf.
    pub fn distinctive() -> Self {
        Self {
            weight: false,
            renorm: Norm::None,
            identify_bigrams: true,
            ..Self::default()
        }
    }

    /// Classifier inputs; the renormalization depends on the classifier.
    pub fn classifier(renorm: Norm, identify_bigrams: bool) -> Self {
        Self {
            renorm,
            identify_bigrams,
            ..Self::default()
        }
    }

    /// Inputs of the clustering fallback.
    pub fn clustering() -> Self {
        Self::default()
    }
}

/// Scale `weights` in place according to `norm`. All-zero vectors are left alone.
pub fn normalize(weights: &mut TermWeights, norm: Norm) {
    let divisor = match norm {
        Norm::None => return,
        Norm::Max => weights.values().copied().fold(0.0, f64::max),
        Norm::Length => weights.values().map(|w| w * w).sum::<f64>().sqrt(),
    };
    if divisor > 0.0 {
        for w in weights.values_mut() {
            *w /= divisor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights() -> TermWeights {
        [("a".to_string(), 3.0), ("b".to_string(), 4.0)].into()
    }

    #[test]
    fn test_normalize_max() {
        let mut w = weights();
        normalize(&mut w, Norm::Max);
        assert!((w["a"] - 0.75).abs() < 1e-12);
        assert!((w["b"] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_length() {
        let mut w = weights();
        normalize(&mut w, Norm::Length);
        assert!((w["a"] - 0.6).abs() < 1e-12);
        assert!((w["b"] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_zero_vector_untouched() {
        let mut w: TermWeights = [("a".to_string(), 0.0)].into();
        normalize(&mut w, Norm::Length);
        assert_eq!(w["a"], 0.0);
    }
}
