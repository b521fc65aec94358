// Output formatting — terminal display and rendered artifacts.

pub mod html;
pub mod terminal;
pub mod wordcloud;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::scoring::{CategoryScores, WordScores};

/// Make a document or category name safe to use as a file name.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ' ' | '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect()
}

/// Escape the characters that are special in HTML text and attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// An RGB colour on a white-to-dark ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Light and dark ends of the green (positive) and red (negative) ramps.
const GREENS: (Rgb, Rgb) = (Rgb(247, 252, 245), Rgb(0, 68, 27));
const REDS: (Rgb, Rgb) = (Rgb(255, 245, 240), Rgb(103, 0, 13));

impl Rgb {
    /// Colour of a signed score: green for >= 0, red below, darker with
    /// larger `intensity` (clamped to [0, 1]).
    pub fn for_score(score: f64, intensity: f64) -> Self {
        let (light, dark) = if score < 0.0 { REDS } else { GREENS };
        let t = if intensity.is_finite() { intensity.clamp(0.0, 1.0) } else { 0.0 };
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(mix(light.0, dark.0), mix(light.1, dark.1), mix(light.2, dark.2))
    }
}

/// Write {category: {word: score}} as pretty-printed JSON.
pub fn write_json(scores: &CategoryScores, path: &Path) -> Result<()> {
    let by_name: BTreeMap<String, &WordScores> =
        scores.iter().map(|(cat, words)| (cat.to_string(), words)).collect();
    let json = serde_json::to_string_pretty(&by_name)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Category;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("sci/med doc 1"), "sci_med_doc_1");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_color_ramps() {
        assert_eq!(Rgb::for_score(1.0, 0.0), GREENS.0);
        assert_eq!(Rgb::for_score(1.0, 1.0), GREENS.1);
        assert_eq!(Rgb::for_score(-1.0, 2.0), REDS.1);
    }

    #[test]
    fn test_write_json_uses_category_names() {
        let mut scores = CategoryScores::new();
        scores.insert(Category::Cluster(2), [("brain".to_string(), 0.5)].into());
        let path = std::env::temp_dir().join("textcatvis_write_json_test.json");
        write_json(&scores, &path).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["cluster_2"]["brain"], 0.5);
        let _ = fs::remove_file(&path);
    }
}
