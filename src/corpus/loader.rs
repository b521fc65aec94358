// Dataset loading from a folder of text files.
//
// Layout: one subdirectory per category, each holding `.txt` documents.
// Unlabeled documents may sit directly in the dataset folder; they get the
// category ".". Document ids are `<category> <file stem>` for labeled files
// and the bare file stem for unlabeled ones.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::{Category, DocCategories, TextDict};

/// Category given to documents found directly in the dataset folder.
pub const UNLABELED: &str = ".";

/// Load a text categorization dataset from `path`.
pub fn load_data(path: &Path) -> Result<(TextDict, DocCategories)> {
    if !path.is_dir() {
        anyhow::bail!("Dataset path {} is not a directory", path.display());
    }

    let mut texts = TextDict::new();
    let mut doccats = DocCategories::new();

    for (stem, text) in read_txt_files(path)? {
        doccats.insert(stem.clone(), Category::from(UNLABELED));
        texts.insert(stem, text);
    }

    let mut subdirs: Vec<_> = fs::read_dir(path)
        .with_context(|| format!("Failed to read dataset directory {}", path.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_dir())
        .collect();
    subdirs.sort();

    for dir in subdirs {
        let Some(cat) = dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if cat.starts_with('.') {
            continue;
        }
        let files = read_txt_files(&dir)?;
        debug!(category = cat, documents = files.len(), "Loaded category folder");
        for (stem, text) in files {
            let doc_id = format!("{cat} {stem}");
            doccats.insert(doc_id.clone(), Category::from(cat));
            texts.insert(doc_id, text);
        }
    }

    if texts.is_empty() {
        anyhow::bail!("No .txt documents found under {}", path.display());
    }

    info!(
        documents = texts.len(),
        categories = super::category_count(&doccats),
        "Loaded dataset"
    );

    Ok((texts, doccats))
}

/// Read every `.txt` file directly inside `dir` as (file stem, contents).
fn read_txt_files(dir: &Path) -> Result<Vec<(String, String)>> {
    let mut files = Vec::new();
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?;
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("txt") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read document {}", path.display()))?;
        files.push((stem.to_string(), text));
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_labeled_and_unlabeled() {
        let root = std::env::temp_dir().join(format!("textcatvis_loader_{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(root.join("medical")).unwrap();
        fs::create_dir_all(root.join(".hidden")).unwrap();
        fs::write(root.join("medical").join("d1.txt"), "brain tumor").unwrap();
        fs::write(root.join("medical").join("notes.md"), "ignored").unwrap();
        fs::write(root.join(".hidden").join("x.txt"), "ignored").unwrap();
        fs::write(root.join("loose.txt"), "weather").unwrap();

        let (texts, cats) = load_data(&root).unwrap();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts["medical d1"], "brain tumor");
        assert_eq!(cats["medical d1"], Category::from("medical"));
        assert_eq!(cats["loose"], Category::from(UNLABELED));

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_load_missing_dir_fails() {
        let missing = std::env::temp_dir().join("textcatvis_definitely_missing_dir");
        assert!(load_data(&missing).is_err());
    }
}
