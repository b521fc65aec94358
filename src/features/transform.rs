// Default feature provider: counts, optional bigrams, idf weighting.
//
// Pipeline per document:
//   tokens -> term counts (+ identified bigrams) -> norm -> idf -> renorm
//
// The idf is the smoothed variant ln((1 + N) / (1 + df)) + 1, so every
// weight stays strictly positive and terms never seen while fitting still
// get a finite weight.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use tracing::debug;

use super::tokenize::Tokenizer;
use super::traits::FeatureProvider;
use super::{normalize, DocFeatures, FeatureConfig, TermWeights};
use crate::corpus::TextDict;

/// A bigram needs to show up in at least this many fit documents.
const BIGRAM_MIN_DOCS: usize = 2;

/// ...and account for at least this share of its rarer word's occurrences.
const BIGRAM_MIN_SHARE: f64 = 0.5;

pub struct FeatureTransform {
    config: FeatureConfig,
    tokenizer: Tokenizer,
}

impl FeatureTransform {
    pub fn new(config: FeatureConfig) -> Result<Self> {
        let tokenizer = Tokenizer::new(config.norm_num, config.remove_stopwords)?;
        Ok(Self { config, tokenizer })
    }
}

impl FeatureProvider for FeatureTransform {
    fn texts_to_features(
        &self,
        texts: &TextDict,
        fit_ids: Option<&[String]>,
    ) -> Result<DocFeatures> {
        let fit_ids: Vec<&String> = match fit_ids {
            Some(ids) => {
                if let Some(unknown) = ids.iter().find(|id| !texts.contains_key(*id)) {
                    anyhow::bail!("Cannot fit features on unknown document {unknown:?}");
                }
                ids.iter().collect()
            }
            None => texts.keys().collect(),
        };

        let streams: HashMap<&String, Vec<Option<String>>> = texts
            .iter()
            .map(|(id, text)| (id, self.tokenizer.tokens_with_gaps(text)))
            .collect();

        let bigrams = if self.config.identify_bigrams {
            let fit_streams: Vec<&Vec<Option<String>>> =
                fit_ids.iter().filter_map(|id| streams.get(*id)).collect();
            identify_bigrams(&fit_streams)
        } else {
            HashSet::new()
        };

        let mut docfeats: DocFeatures = streams
            .iter()
            .map(|(id, stream)| {
                let mut counts = term_counts(stream, &bigrams);
                normalize(&mut counts, self.config.norm);
                ((*id).clone(), counts)
            })
            .collect();

        if self.config.weight {
            let n_fit = fit_ids.len() as f64;
            let mut doc_freq: HashMap<&str, usize> = HashMap::new();
            for id in &fit_ids {
                if let Some(weights) = docfeats.get(*id) {
                    for term in weights.keys() {
                        *doc_freq.entry(term.as_str()).or_insert(0) += 1;
                    }
                }
            }
            let idf: HashMap<String, f64> = doc_freq
                .into_iter()
                .map(|(term, df)| {
                    (term.to_string(), ((1.0 + n_fit) / (1.0 + df as f64)).ln() + 1.0)
                })
                .collect();
            let unseen_idf = (1.0 + n_fit).ln() + 1.0;
            for weights in docfeats.values_mut() {
                for (term, w) in weights.iter_mut() {
                    *w *= idf.get(term).copied().unwrap_or(unseen_idf);
                }
            }
        }

        for weights in docfeats.values_mut() {
            normalize(weights, self.config.renorm);
        }

        debug!(
            documents = docfeats.len(),
            bigrams = bigrams.len(),
            "Computed document features"
        );

        Ok(docfeats)
    }
}

/// Raw counts of unigrams plus identified bigrams.
fn term_counts(stream: &[Option<String>], bigrams: &HashSet<String>) -> TermWeights {
    let mut counts = TermWeights::new();
    for token in stream.iter().flatten() {
        *counts.entry(token.clone()).or_insert(0.0) += 1.0;
    }
    if !bigrams.is_empty() {
        for pair in stream.windows(2) {
            if let [Some(a), Some(b)] = pair {
                let bigram = format!("{a} {b}");
                if bigrams.contains(&bigram) {
                    *counts.entry(bigram).or_insert(0.0) += 1.0;
                }
            }
        }
    }
    counts
}

/// Find word pairs that behave like a single term across the fit documents.
fn identify_bigrams(streams: &[&Vec<Option<String>>]) -> HashSet<String> {
    let mut word_occurrences: HashMap<&str, usize> = HashMap::new();
    let mut pair_occurrences: HashMap<(&str, &str), usize> = HashMap::new();
    let mut pair_docs: HashMap<(&str, &str), usize> = HashMap::new();

    for stream in streams {
        let mut seen_in_doc: HashSet<(&str, &str)> = HashSet::new();
        for token in stream.iter().flatten() {
            *word_occurrences.entry(token.as_str()).or_insert(0) += 1;
        }
        for pair in stream.windows(2) {
            if let [Some(a), Some(b)] = pair {
                let key = (a.as_str(), b.as_str());
                *pair_occurrences.entry(key).or_insert(0) += 1;
                if seen_in_doc.insert(key) {
                    *pair_docs.entry(key).or_insert(0) += 1;
                }
            }
        }
    }

    pair_docs
        .into_iter()
        .filter(|(_, docs)| *docs >= BIGRAM_MIN_DOCS)
        .filter(|((a, b), _)| a != b)
        .filter(|(key, _)| {
            let rarer = word_occurrences[key.0].min(word_occurrences[key.1]) as f64;
            pair_occurrences[key] as f64 >= BIGRAM_MIN_SHARE * rarer
        })
        .map(|((a, b), _)| format!("{a} {b}"))
        .collect()
}
