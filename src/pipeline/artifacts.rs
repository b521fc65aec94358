// Writing rendered results to disk.
//
// Layout under the results directory:
//   <dataset>_wc_<method>/<category>.html    one word cloud per category
//   <dataset>_wc_<method>/scores.json        the raw {category: {word: score}}
//   <dataset>_html_<method>/<doc>.html       highlighted documents

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::corpus::{DocCategories, TextDict};
use crate::output::html::scores_to_html;
use crate::output::wordcloud::{render_wordcloud_html, select_cloud_words};
use crate::output::{sanitize_file_name, write_json};
use crate::scoring::classifier::DocumentExplanation;
use crate::scoring::{CategoryScores, WordScores};

/// Dataset name used in artifact directories: the last path component.
pub fn dataset_name(path: &Path) -> String {
    path.components()
        .next_back()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .filter(|name| !name.is_empty() && name != "." && name != "/")
        .unwrap_or_else(|| "dataset".to_string())
}

pub fn wordcloud_dir(results_dir: &Path, dataset: &str, method: &str) -> PathBuf {
    results_dir.join(format!("{dataset}_wc_{method}"))
}

pub fn html_dir(results_dir: &Path, dataset: &str, method: &str) -> PathBuf {
    results_dir.join(format!("{dataset}_html_{method}"))
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

/// Write one word cloud per category plus the raw scores as JSON.
///
/// Returns the number of clouds written.
pub fn write_wordclouds(scores: &CategoryScores, dir: &Path, method: &str) -> Result<usize> {
    create_dir(dir)?;
    for (cat, words) in scores {
        let cloud = select_cloud_words(words);
        let title = format!("{cat} ({method})");
        let path = dir.join(format!("{}.html", sanitize_file_name(&cat.to_string())));
        write_file(&path, &render_wordcloud_html(&title, &cloud))?;
        debug!(category = %cat, words = cloud.len(), path = %path.display(), "Wrote word cloud");
    }
    write_json(scores, &dir.join("scores.json"))?;
    Ok(scores.len())
}

/// Write highlighted tf-idf pages for the documents in `document_scores`.
pub fn write_tfidf_pages(
    texts: &TextDict,
    doccats: &DocCategories,
    document_scores: &BTreeMap<String, WordScores>,
    dir: &Path,
) -> Result<usize> {
    create_dir(dir)?;
    for (doc_id, scores) in document_scores {
        let (Some(text), Some(cat)) = (texts.get(doc_id), doccats.get(doc_id)) else {
            anyhow::bail!("No text or category for highlighted document {doc_id:?}");
        };
        let metainf = format!("{doc_id}\nTrue Class: {cat}\n");
        let html = scores_to_html(text, scores, &metainf, false)?;
        let name = sanitize_file_name(&format!("{doc_id}_{cat}"));
        write_file(&dir.join(format!("{name}.html")), &html)?;
    }
    Ok(document_scores.len())
}

/// Write highlighted classifier explanations, prefixed `correct_` or `error_`.
pub fn write_explanation_pages(
    texts: &TextDict,
    explanations: &[DocumentExplanation],
    dir: &Path,
) -> Result<usize> {
    create_dir(dir)?;
    for e in explanations {
        let Some(text) = texts.get(&e.doc_id) else {
            anyhow::bail!("No text for explained document {:?}", e.doc_id);
        };
        let metainf = format!(
            "{}\nTrue Class: {}  (Score: {:.4})\nPredicted Class: {}  (Score: {:.4})",
            e.doc_id, e.true_class, e.true_score, e.predicted_class, e.predicted_score
        );
        let html = scores_to_html(text, &e.scores, &metainf, false)?;
        let outcome = if e.correct { "correct" } else { "error" };
        let name = sanitize_file_name(&format!("{outcome}_{}_{}", e.doc_id, e.true_class));
        write_file(&dir.join(format!("{name}.html")), &html)?;
    }
    Ok(explanations.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_name() {
        assert_eq!(dataset_name(Path::new("/data/news/")), "news");
        assert_eq!(dataset_name(Path::new("corpus")), "corpus");
        assert_eq!(dataset_name(Path::new("/")), "dataset");
    }

    #[test]
    fn test_result_dirs() {
        let root = Path::new("results");
        assert_eq!(wordcloud_dir(root, "news", "tfidf"), root.join("news_wc_tfidf"));
        assert_eq!(html_dir(root, "news", "clf"), root.join("news_html_clf"));
    }
}
