// Word-relevance engines.
//
// Each engine turns a categorized corpus into {category: {word: score}}:
//   - tfidf:       per-category sums of tf-idf weights
//   - distinctive: how characteristic a word's average weight is of one
//                  category compared to all the others
//   - classifier:  per-word contributions to a linear classifier's decision
//
// Scores are produced once and handed to rendering; nothing mutates them.

pub mod classifier;
pub mod distinctive;
pub mod tfidf;

use std::collections::BTreeMap;

use crate::corpus::Category;

/// {word: score} for one category or document. Positive scores speak for
/// the category, negative ones (classifier engine only) against it.
pub type WordScores = BTreeMap<String, f64>;

/// {category: {word: score}}
pub type CategoryScores = BTreeMap<Category, WordScores>;

/// The `n` highest scoring words, best first. Ties break alphabetically.
pub fn top_words(scores: &WordScores, n: usize) -> Vec<(&str, f64)> {
    let mut ranked: Vec<(&str, f64)> = scores.iter().map(|(w, &s)| (w.as_str(), s)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(n);
    ranked
}

/// The `n` lowest scoring words that are strictly negative, most negative first.
pub fn bottom_words(scores: &WordScores, n: usize) -> Vec<(&str, f64)> {
    let mut ranked: Vec<(&str, f64)> = scores
        .iter()
        .filter(|(_, &s)| s < 0.0)
        .map(|(w, &s)| (w.as_str(), s))
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores() -> WordScores {
        [("a", 0.5), ("b", -1.0), ("c", 2.0), ("d", 0.5), ("e", -0.2)]
            .into_iter()
            .map(|(w, s)| (w.to_string(), s))
            .collect()
    }

    #[test]
    fn test_top_words_order() {
        let s = scores();
        let top = top_words(&s, 3);
        assert_eq!(top, vec![("c", 2.0), ("a", 0.5), ("d", 0.5)]);
    }

    #[test]
    fn test_bottom_words_only_negative() {
        let s = scores();
        assert_eq!(bottom_words(&s, 10), vec![("b", -1.0), ("e", -0.2)]);
    }
}
