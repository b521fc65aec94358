// Highlighted-text HTML for a single document.
//
// Every word of the raw text gets a background colour from its score:
// green for positive, red for negative, scaled by |score| / max |score|.
// Words without a score stay plain unless OOV highlighting is on, in which
// case they are marked yellow.

use anyhow::Result;

use super::{escape_html, Rgb};
use crate::features::tokenize::Tokenizer;
use crate::scoring::WordScores;

/// Render `text` with every scored word highlighted.
///
/// Scores are looked up by the lowercased word. `metainf` is printed above
/// the text (e.g. the true and predicted class).
pub fn scores_to_html(
    text: &str,
    scores: &WordScores,
    metainf: &str,
    highlight_oov: bool,
) -> Result<String> {
    let tokenizer = Tokenizer::new(false, false)?;
    let max_abs = scores.values().fold(0.0f64, |m, s| m.max(s.abs()));

    let mut html =
        String::from("<body><div style=\"white-space: pre-wrap; font-family: monospace;\">");
    if !metainf.is_empty() {
        html.push_str(&escape_html(metainf));
        html.push_str("\n\n");
    }

    let mut cursor = 0;
    for (start, raw, word) in tokenizer.word_spans(text) {
        html.push_str(&escape_html(&text[cursor..start]));
        cursor = start + raw.len();

        let (Rgb(r, g, b), alpha) = match scores.get(&word) {
            Some(&score) => {
                let intensity = if max_abs > 0.0 { score.abs() / max_abs } else { 0.0 };
                (Rgb::for_score(score, intensity), 0.5)
            }
            None if highlight_oov => (Rgb(255, 255, 0), 0.3),
            None => (Rgb(255, 255, 0), 0.0),
        };
        html.push_str(&format!(
            "<span style=\"background-color: rgba({r}, {g}, {b}, {alpha:.1})\">{}</span>",
            escape_html(raw)
        ));
    }
    html.push_str(&escape_html(&text[cursor..]));
    html.push_str("</div></body>");
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores() -> WordScores {
        [("brain".to_string(), 1.0), ("rain".to_string(), -0.5)].into()
    }

    #[test]
    fn test_keeps_text_between_words() {
        let html = scores_to_html("Brain, rain & sun.", &scores(), "", false).unwrap();
        assert!(html.contains(">Brain</span>, <span"));
        assert!(html.contains(" &amp; "));
        assert!(html.ends_with(".</div></body>"));
    }

    #[test]
    fn test_colours_by_sign() {
        let html = scores_to_html("brain rain", &scores(), "", false).unwrap();
        // strongest positive word gets the darkest green
        assert!(html.contains("rgba(0, 68, 27, 0.5)\">brain"));
        // half-strength negative word is a mid red
        assert!(html.contains("rgba(179, 123, 127, 0.5)\">rain"));
    }

    #[test]
    fn test_oov_highlighting() {
        let plain = scores_to_html("sun", &scores(), "", false).unwrap();
        assert!(plain.contains("rgba(255, 255, 0, 0.0)"));
        let marked = scores_to_html("sun", &scores(), "doc 1", true).unwrap();
        assert!(marked.contains("rgba(255, 255, 0, 0.3)"));
        assert!(marked.contains("doc 1\n\n"));
    }

    #[test]
    fn test_accented_word_highlighted_whole() {
        let scores: WordScores = [("café".to_string(), 1.0)].into();
        let html = scores_to_html("Ein Café.", &scores, "", false).unwrap();
        assert!(html.contains("rgba(0, 68, 27, 0.5)\">Café</span>."));
    }
}
