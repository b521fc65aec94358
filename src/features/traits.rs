// Feature provider trait — the seam between raw text and the engines.
//
// The engines only need {doc_id: {term: weight}}; how the weights come about
// (tokenizer, weighting scheme) stays behind this trait.

use anyhow::Result;

use super::DocFeatures;
use crate::corpus::TextDict;

/// Trait for turning documents into sparse term weights.
pub trait FeatureProvider {
    /// Compute term weights for every document in `texts`.
    ///
    /// Corpus statistics (idf, bigram identification) are fitted on
    /// `fit_ids` only when given, on all documents otherwise.
    fn texts_to_features(&self, texts: &TextDict, fit_ids: Option<&[String]>)
        -> Result<DocFeatures>;
}
