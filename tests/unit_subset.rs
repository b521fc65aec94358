// Unit tests for the subset selector.
//
// Property tests over the corpus sizes around the MAX_DOCUMENTS cap and
// visualization-id counts around the warning and truncation thresholds,
// plus determinism of the sample.

use proptest::prelude::*;
use textcatvis::corpus::subset::{select_subset, DEFAULT_VISUALIZE_COUNT, MAX_DOCUMENTS};
use textcatvis::corpus::{Category, DocCategories, TextDict};

fn corpus(n: usize) -> (TextDict, DocCategories) {
    let texts: TextDict = (0..n)
        .map(|i| (format!("doc{i:05}"), format!("text {i}")))
        .collect();
    let cats: DocCategories = (0..n)
        .map(|i| (format!("doc{i:05}"), Category::from(if i % 3 == 0 { "a" } else { "b" })))
        .collect();
    (texts, cats)
}

/// `m` ids spread over the corpus, starting at `offset`.
fn must_include(n: usize, m: usize, offset: usize) -> Vec<String> {
    let m = m.min(n);
    if m == 0 {
        return Vec::new();
    }
    let step = n / m;
    (0..m)
        .map(|k| format!("doc{:05}", (offset + k * step) % n))
        .collect()
}

// ============================================================
// Size cap and must-include preservation
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn subset_never_exceeds_cap_and_keeps_must_include(
        n in prop::sample::select(vec![0usize, 10_000, 10_001, 50_000]),
        m in prop::sample::select(vec![0usize, 500, 1_500, 12_000]),
        offset in 0usize..1_000,
    ) {
        let (texts, cats) = corpus(n);
        let must = must_include(n, m, offset);
        let subset = select_subset(&texts, &cats, &must).unwrap();

        prop_assert!(subset.texts.len() <= MAX_DOCUMENTS);
        prop_assert_eq!(subset.texts.len(), subset.doccats.len());
        prop_assert_eq!(subset.texts.len(), n.min(MAX_DOCUMENTS));

        for id in &subset.visualize_ids {
            prop_assert!(subset.texts.contains_key(id));
        }
        if must.is_empty() {
            prop_assert_eq!(subset.visualize_ids.len(), n.min(DEFAULT_VISUALIZE_COUNT));
        } else if must.len() <= 10_000 {
            prop_assert_eq!(&subset.visualize_ids, &must);
        } else {
            // oversized requests are cut down to their first 5000 ids
            prop_assert_eq!(&subset.visualize_ids[..], &must[..5_000]);
        }
    }
}

// ============================================================
// Determinism
// ============================================================

#[test]
fn subset_is_deterministic() {
    let (texts, cats) = corpus(12_345);
    let must = must_include(12_345, 50, 7);
    let first = select_subset(&texts, &cats, &must).unwrap();
    let second = select_subset(&texts, &cats, &must).unwrap();
    assert_eq!(first.visualize_ids, second.visualize_ids);
    assert_eq!(
        first.texts.keys().collect::<Vec<_>>(),
        second.texts.keys().collect::<Vec<_>>()
    );
}

#[test]
fn default_visualization_ids_are_repeatable() {
    let (texts, cats) = corpus(3_000);
    let a = select_subset(&texts, &cats, &[]).unwrap();
    let b = select_subset(&texts, &cats, &[]).unwrap();
    assert_eq!(a.visualize_ids.len(), DEFAULT_VISUALIZE_COUNT);
    assert_eq!(a.visualize_ids, b.visualize_ids);
}
