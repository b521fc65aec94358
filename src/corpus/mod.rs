// Corpus types — documents, category assignments, and boundary validation.
//
// A corpus is a pair of maps keyed by document id: the raw text of every
// document and the single category each document belongs to. Both maps are
// BTreeMaps so every downstream iteration order is deterministic.

pub mod loader;
pub mod subset;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Cluster id assigned by the clustering fallback to unclustered documents.
pub const NOISE_CLUSTER: i32 = -1;

/// {doc_id: raw text}
pub type TextDict = BTreeMap<String, String>;

/// {doc_id: category}
pub type DocCategories = BTreeMap<String, Category>;

/// A document's category: either a real label (e.g. a dataset subfolder)
/// or a pseudo-label produced by the clustering fallback.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Category {
    Label(String),
    Cluster(i32),
}

impl Category {
    /// Whether this is the clustering fallback's noise bucket.
    pub fn is_noise(&self) -> bool {
        matches!(self, Category::Cluster(NOISE_CLUSTER))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Label(label) => write!(f, "{label}"),
            Category::Cluster(id) => write!(f, "cluster_{id}"),
        }
    }
}

impl From<&str> for Category {
    fn from(label: &str) -> Self {
        Category::Label(label.to_string())
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        Category::Label(label)
    }
}

impl From<i32> for Category {
    fn from(id: i32) -> Self {
        Category::Cluster(id)
    }
}

/// Invert the category assignment: {category: [doc_ids]}, ids in sorted order.
pub fn category_documents(doccats: &DocCategories) -> BTreeMap<Category, Vec<String>> {
    let mut catdocs: BTreeMap<Category, Vec<String>> = BTreeMap::new();
    for (doc_id, cat) in doccats {
        catdocs.entry(cat.clone()).or_default().push(doc_id.clone());
    }
    catdocs
}

/// Number of distinct categories in the assignment.
pub fn category_count(doccats: &DocCategories) -> usize {
    doccats.values().collect::<BTreeSet<_>>().len()
}

/// Reject corpora whose text and category maps don't cover the same ids.
///
/// Every document needs exactly one category and every categorized id needs
/// its text.
pub fn validate_alignment<V>(docs: &BTreeMap<String, V>, doccats: &DocCategories) -> Result<()> {
    if docs.is_empty() {
        anyhow::bail!("Corpus is empty, nothing to score");
    }
    if let Some(missing) = docs.keys().find(|id| !doccats.contains_key(*id)) {
        anyhow::bail!("Document {missing:?} has no category assignment");
    }
    if let Some(missing) = doccats.keys().find(|id| !docs.contains_key(*id)) {
        anyhow::bail!("Category assignment references unknown document {missing:?}");
    }
    Ok(())
}

/// Drop documents in the noise bucket from both maps.
///
/// Returns the number of documents removed.
pub fn drop_noise(texts: &mut TextDict, doccats: &mut DocCategories) -> usize {
    let noisy: Vec<String> = doccats
        .iter()
        .filter(|(_, cat)| cat.is_noise())
        .map(|(id, _)| id.clone())
        .collect();
    for id in &noisy {
        texts.remove(id);
        doccats.remove(id);
    }
    noisy.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> (TextDict, DocCategories) {
        let texts: TextDict = [("a", "x"), ("b", "y"), ("c", "z")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let cats: DocCategories = [("a", "one"), ("b", "one"), ("c", "two")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), Category::from(v)))
            .collect();
        (texts, cats)
    }

    #[test]
    fn test_category_documents_inverts() {
        let (_, cats) = corpus();
        let inverted = category_documents(&cats);
        assert_eq!(inverted[&Category::from("one")], vec!["a", "b"]);
        assert_eq!(inverted[&Category::from("two")], vec!["c"]);
        assert_eq!(category_count(&cats), 2);
    }

    #[test]
    fn test_validate_alignment_rejects_missing_category() {
        let (texts, mut cats) = corpus();
        cats.remove("b");
        let err = validate_alignment(&texts, &cats).unwrap_err();
        assert!(err.to_string().contains("\"b\""));
    }

    #[test]
    fn test_validate_alignment_rejects_unknown_document() {
        let (texts, mut cats) = corpus();
        cats.insert("zzz".to_string(), Category::from("two"));
        assert!(validate_alignment(&texts, &cats).is_err());
    }

    #[test]
    fn test_drop_noise() {
        let (mut texts, mut cats) = corpus();
        cats.insert("a".to_string(), Category::Cluster(NOISE_CLUSTER));
        assert_eq!(drop_noise(&mut texts, &mut cats), 1);
        assert!(!texts.contains_key("a"));
        assert!(validate_alignment(&texts, &cats).is_ok());
    }

    #[test]
    fn test_display() {
        assert_eq!(Category::from("sports").to_string(), "sports");
        assert_eq!(Category::Cluster(3).to_string(), "cluster_3");
        assert!(Category::Cluster(-1).is_noise());
        assert!(!Category::Cluster(0).is_noise());
    }
}
