// Full analysis of a dataset: sample -> (cluster) -> score -> query.
//
// 1. Bound the corpus with the subset selector
// 2. If every document has the same label, replace the labels by clusters
//    and drop the noise bucket
// 3. Score with tf-idf and distinctive words; the classifier only runs when
//    real labels exist (clusters are by construction easy to separate)
// 4. Optionally count query occurrences per category

use anyhow::Result;
use tracing::{info, warn};

use crate::cluster::{cluster_texts, needs_clustering, ClusterAssignment};
use crate::config::Config;
use crate::corpus::subset::{select_subset, Subset};
use crate::corpus::{category_count, drop_noise, validate_alignment, DocCategories, TextDict};
use crate::query::{check_occurrences, Occurrences, Query};
use crate::scoring::classifier::{classifier_scores, ClassifierResult};
use crate::scoring::distinctive::distinctive_scores;
use crate::scoring::tfidf::{tfidf_scores, TfidfResult};
use crate::scoring::CategoryScores;

/// The corpus the engines work on.
#[derive(Debug, Clone)]
pub struct PreparedCorpus {
    pub subset: Subset,
    /// Set when the labels came from the clustering fallback
    pub clusters: Option<ClusterAssignment>,
}

impl PreparedCorpus {
    /// Whether the categories are real labels rather than clusters.
    pub fn has_labels(&self) -> bool {
        self.clusters.is_none()
    }
}

/// Sample the corpus and fall back to clustering when it is unlabelled.
pub fn prepare_corpus(
    texts: &TextDict,
    doccats: &DocCategories,
    must_include: &[String],
    config: &Config,
) -> Result<PreparedCorpus> {
    validate_alignment(texts, doccats)?;
    let mut subset = select_subset(texts, doccats, must_include)?;
    if !needs_clustering(&subset.doccats) {
        return Ok(PreparedCorpus {
            subset,
            clusters: None,
        });
    }

    info!(documents = subset.texts.len(), "Single category, clustering documents");
    let assignment = cluster_texts(&subset.texts, config.cluster)?;
    subset.doccats = assignment.to_categories();
    let dropped = drop_noise(&mut subset.texts, &mut subset.doccats);
    if subset.texts.is_empty() {
        anyhow::bail!(
            "Clustering assigned all {dropped} documents to noise; try a larger TEXTCATVIS_CLUSTER_EPS"
        );
    }
    subset.visualize_ids.retain(|id| subset.texts.contains_key(id));
    if dropped > 0 {
        warn!(dropped, "Dropped noise documents before scoring");
    }

    Ok(PreparedCorpus {
        subset,
        clusters: Some(assignment),
    })
}

/// Everything the analysis produced.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub prepared: PreparedCorpus,
    pub tfidf: TfidfResult,
    pub distinctive: CategoryScores,
    /// Only run when the corpus has real labels and more than one of them
    pub classifier: Option<ClassifierResult>,
    pub occurrences: Option<Occurrences>,
}

/// Run every engine on a prepared corpus.
pub fn run_analysis(prepared: PreparedCorpus, config: &Config, queries: &[Query]) -> Result<Analysis> {
    let subset = &prepared.subset;

    // Word clouds only: bigrams are allowed, no per-document pages
    let tfidf = tfidf_scores(&subset.texts, &subset.doccats, &subset.visualize_ids, false)?;
    let distinctive = distinctive_scores(&subset.texts, &subset.doccats, config.distinctive)?;

    let classifier = if prepared.has_labels() && category_count(&subset.doccats) > 1 {
        Some(classifier_scores(
            &subset.texts,
            &subset.doccats,
            &subset.visualize_ids,
            config.classifier,
            false,
        )?)
    } else {
        info!("Skipping the classifier: no real categories to discriminate");
        None
    };

    let occurrences = if queries.is_empty() {
        None
    } else {
        Some(check_occurrences(&subset.texts, &subset.doccats, queries)?)
    };

    Ok(Analysis {
        prepared,
        tfidf,
        distinctive,
        classifier,
        occurrences,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Category;

    #[test]
    fn test_labelled_corpus_skips_clustering() {
        let texts: TextDict = [("a", "brain tumor"), ("b", "rain weather")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let cats: DocCategories = [("a", "med"), ("b", "other")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), Category::from(v)))
            .collect();
        let prepared = prepare_corpus(&texts, &cats, &[], &Config::default()).unwrap();
        assert!(prepared.has_labels());
        assert_eq!(prepared.subset.texts.len(), 2);
    }
}
