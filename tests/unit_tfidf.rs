// Unit tests for the TF-IDF aggregation engine.

use textcatvis::corpus::{Category, DocCategories, TextDict};
use textcatvis::features::traits::FeatureProvider;
use textcatvis::features::transform::FeatureTransform;
use textcatvis::features::FeatureConfig;
use textcatvis::scoring::tfidf::{aggregate_features, tfidf_scores};

fn corpus(docs: &[(&str, &str, &str)]) -> (TextDict, DocCategories) {
    let texts = docs
        .iter()
        .map(|(id, text, _)| (id.to_string(), text.to_string()))
        .collect();
    let cats = docs
        .iter()
        .map(|(id, _, cat)| (id.to_string(), Category::from(*cat)))
        .collect();
    (texts, cats)
}

// ============================================================
// Elementwise sum
// ============================================================

#[test]
fn two_documents_one_category_sum_elementwise() {
    let (texts, cats) = corpus(&[("d1", "brain tumor tumor", "c"), ("d2", "tumor surgery", "c")]);
    let ft = FeatureTransform::new(FeatureConfig::tfidf(false)).unwrap();
    let docfeats = ft.texts_to_features(&texts, None).unwrap();
    let scores = aggregate_features(&docfeats, &cats).unwrap();
    let c = &scores[&Category::from("c")];

    for word in ["brain", "tumor", "surgery"] {
        let expected: f64 = docfeats.values().filter_map(|w| w.get(word)).sum();
        assert!((c[word] - expected).abs() < 1e-12, "{word}");
    }
    assert_eq!(c.len(), 3);
}

#[test]
fn engine_matches_manual_aggregation() {
    let (texts, cats) = corpus(&[
        ("a", "brain tumor", "x"),
        ("b", "weather rain", "y"),
        ("c", "brain weather", "y"),
    ]);
    let result = tfidf_scores(&texts, &cats, &[], false).unwrap();
    let ft = FeatureTransform::new(FeatureConfig::tfidf(true)).unwrap();
    let manual = aggregate_features(&ft.texts_to_features(&texts, None).unwrap(), &cats).unwrap();
    assert_eq!(result.category_scores.len(), manual.len());
    for (cat, words) in &manual {
        for (word, score) in words {
            assert!((result.category_scores[cat][word] - score).abs() < 1e-12);
        }
    }
}

// ============================================================
// Per-document output
// ============================================================

#[test]
fn html_mode_returns_visualized_documents_only() {
    let (texts, cats) = corpus(&[
        ("a", "brain tumor", "x"),
        ("b", "brain tumor", "x"),
        ("c", "weather rain", "y"),
    ]);
    let vis = vec!["a".to_string()];
    let result = tfidf_scores(&texts, &cats, &vis, true).unwrap();
    assert_eq!(result.document_scores.len(), 1);
    let a = &result.document_scores["a"];
    // no bigrams when highlighting single words
    assert!(a.keys().all(|t| !t.contains(' ')));
    // length-renormalized
    let norm: f64 = a.values().map(|w| w * w).sum::<f64>().sqrt();
    assert!((norm - 1.0).abs() < 1e-12);

    let without_html = tfidf_scores(&texts, &cats, &vis, false).unwrap();
    assert!(without_html.document_scores.is_empty());
    assert!(without_html.category_scores[&Category::from("x")].contains_key("brain tumor"));
}

#[test]
fn accented_words_are_scored_whole() {
    let (texts, cats) = corpus(&[("a", "Zürich café", "swiss"), ("b", "Köln dom", "german")]);
    let result = tfidf_scores(&texts, &cats, &[], false).unwrap();
    let swiss = &result.category_scores[&Category::from("swiss")];
    assert!(swiss["zürich"] > 0.0);
    assert!(swiss["café"] > 0.0);
    assert!(!swiss.contains_key("rich"));
    assert!(!swiss.contains_key("caf"));
}
