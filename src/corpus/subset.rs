// Subset selection — bounds the cost of every downstream engine.
//
// Large corpora are sampled down to at most MAX_DOCUMENTS documents. The
// sample is deterministic: ids are sorted before a shuffle seeded with a
// fixed value, so the same corpus always yields the same subset regardless
// of how the caller's maps were populated.
//
// The selector also fixes the "visualization ids": documents that must
// survive sampling because something will be rendered for each of them
// (highlighted HTML, classifier attributions).

use std::collections::HashSet;

use anyhow::Result;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use super::{DocCategories, TextDict};

/// Hard cap on the number of documents passed to any engine.
pub const MAX_DOCUMENTS: usize = 10_000;

/// How many random documents are picked for visualization when the caller
/// doesn't name any.
pub const DEFAULT_VISUALIZE_COUNT: usize = 1_000;

/// Above this many visualization ids a warning is logged.
const VISUALIZE_WARN_THRESHOLD: usize = 1_000;

/// Above this many visualization ids the request is truncated.
const VISUALIZE_HARD_LIMIT: usize = 10_000;

/// Size the visualization ids are truncated to past the hard limit.
const VISUALIZE_TRUNCATE_TO: usize = 5_000;

const SHUFFLE_SEED: u64 = 42;

/// The (possibly reduced) corpus handed to the engines.
#[derive(Debug, Clone)]
pub struct Subset {
    pub texts: TextDict,
    pub doccats: DocCategories,
    /// Ids that must be rendered; always contained in `texts`.
    pub visualize_ids: Vec<String>,
}

/// Select at most MAX_DOCUMENTS documents, always keeping `must_include`.
///
/// An empty `must_include` picks DEFAULT_VISUALIZE_COUNT random documents as
/// the visualization ids. Every id in `must_include` has to exist in `texts`.
pub fn select_subset(
    texts: &TextDict,
    doccats: &DocCategories,
    must_include: &[String],
) -> Result<Subset> {
    check_same_ids(texts, doccats)?;

    let mut seen = HashSet::new();
    let mut visualize_ids: Vec<String> = Vec::with_capacity(must_include.len());
    for id in must_include {
        if !texts.contains_key(id) {
            anyhow::bail!("Requested visualization id {id:?} is not part of the corpus");
        }
        if seen.insert(id.as_str()) {
            visualize_ids.push(id.clone());
        }
    }

    // BTreeMap keys are already sorted, which removes any dependence on the
    // caller's insertion order before shuffling.
    let mut doc_ids: Vec<String> = texts.keys().cloned().collect();
    let mut rng = ChaCha8Rng::seed_from_u64(SHUFFLE_SEED);
    doc_ids.shuffle(&mut rng);

    if visualize_ids.is_empty() {
        visualize_ids = doc_ids.iter().take(DEFAULT_VISUALIZE_COUNT).cloned().collect();
    } else if visualize_ids.len() > VISUALIZE_WARN_THRESHOLD {
        warn!(
            count = visualize_ids.len(),
            "Creating visualizations for more than {VISUALIZE_WARN_THRESHOLD} documents can be slow"
        );
        if visualize_ids.len() > VISUALIZE_HARD_LIMIT {
            warn!(
                count = visualize_ids.len(),
                kept = VISUALIZE_TRUNCATE_TO,
                "Too many visualization ids requested, truncating"
            );
            visualize_ids.truncate(VISUALIZE_TRUNCATE_TO);
        }
    }

    if doc_ids.len() <= MAX_DOCUMENTS {
        return Ok(Subset {
            texts: texts.clone(),
            doccats: doccats.clone(),
            visualize_ids,
        });
    }

    // Exactly MAX_DOCUMENTS ids end up selected (visualization ids included)
    // without shuffling much more than MAX_DOCUMENTS candidates.
    let keep: HashSet<&str> = visualize_ids.iter().map(String::as_str).collect();
    let window = (MAX_DOCUMENTS + visualize_ids.len()).min(doc_ids.len());
    let mut pool: Vec<String> = doc_ids[..window]
        .iter()
        .filter(|id| !keep.contains(id.as_str()))
        .cloned()
        .collect();
    pool.shuffle(&mut rng);
    pool.truncate(MAX_DOCUMENTS.saturating_sub(visualize_ids.len()));

    let sub_texts: TextDict = pool
        .iter()
        .chain(visualize_ids.iter())
        .map(|id| (id.clone(), texts[id].clone()))
        .collect();
    let sub_cats: DocCategories = sub_texts
        .keys()
        .map(|id| (id.clone(), doccats[id].clone()))
        .collect();

    info!(
        total = texts.len(),
        selected = sub_texts.len(),
        visualize = visualize_ids.len(),
        "Sampled corpus subset"
    );

    Ok(Subset {
        texts: sub_texts,
        doccats: sub_cats,
        visualize_ids,
    })
}

/// The selector accepts an empty corpus but not a misaligned one.
fn check_same_ids(texts: &TextDict, doccats: &DocCategories) -> Result<()> {
    if texts.len() != doccats.len() || texts.keys().any(|id| !doccats.contains_key(id)) {
        anyhow::bail!(
            "Text and category maps cover different documents ({} texts, {} categorized)",
            texts.len(),
            doccats.len()
        );
    }
    Ok(())
}
