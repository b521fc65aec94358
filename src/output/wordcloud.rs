// Word clouds rendered as HTML.
//
// A cloud shows the 160 most positive and the 40 most negative words of a
// score map, sized by |score|. Colours come from the scores passed in: each
// sign gets its own ramp, stretched over the range of the selected words so
// that even closely scored words are told apart.

use super::{escape_html, Rgb};
use crate::scoring::{bottom_words, top_words, WordScores};

pub const MAX_POSITIVE_WORDS: usize = 160;
pub const MAX_NEGATIVE_WORDS: usize = 40;

const MIN_FONT_PX: f64 = 12.0;
const MAX_FONT_PX: f64 = 72.0;

/// One word of a cloud.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudWord {
    pub word: String,
    pub score: f64,
    /// Relative size, |score|
    pub weight: f64,
    pub color: Rgb,
}

/// Pick the words of a cloud and colour them.
///
/// Only strictly positive words count as positive; zero-scored words never
/// make it into a cloud.
pub fn select_cloud_words(scores: &WordScores) -> Vec<CloudWord> {
    let positive: Vec<(&str, f64)> = top_words(scores, MAX_POSITIVE_WORDS)
        .into_iter()
        .filter(|(_, s)| *s > 0.0)
        .collect();
    let negative = bottom_words(scores, MAX_NEGATIVE_WORDS);

    let mut words = Vec::with_capacity(positive.len() + negative.len());
    for group in [positive, negative] {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        // The strongest word maps to the dark end, the weakest one to the middle.
        let hi = first.1.abs();
        let lo = 2.0 * last.1.abs() - hi;
        for &(word, score) in &group {
            let intensity = if hi > lo { (score.abs() - lo) / (hi - lo) } else { 1.0 };
            words.push(CloudWord {
                word: word.to_string(),
                score,
                weight: score.abs(),
                color: Rgb::for_score(score, intensity),
            });
        }
    }
    words
}

/// Render a cloud as a standalone HTML page.
pub fn render_wordcloud_html(title: &str, words: &[CloudWord]) -> String {
    let max_weight = words.iter().fold(0.0f64, |m, w| m.max(w.weight));
    let mut html = format!(
        "<html><head><meta charset=\"utf-8\"><title>{}</title></head>\n\
         <body style=\"background: white;\">\n<h2>{}</h2>\n\
         <div style=\"display: flex; flex-wrap: wrap; align-items: center; \
         justify-content: center; max-width: 900px;\">\n",
        escape_html(title),
        escape_html(title)
    );
    for w in words {
        let size = if max_weight > 0.0 {
            MIN_FONT_PX + (MAX_FONT_PX - MIN_FONT_PX) * w.weight / max_weight
        } else {
            MIN_FONT_PX
        };
        let Rgb(r, g, b) = w.color;
        html.push_str(&format!(
            "<span title=\"{:.4}\" style=\"font-size: {size:.0}px; color: rgb({r}, {g}, {b}); \
             margin: 0 6px;\">{}</span>\n",
            w.score,
            escape_html(&w.word)
        ));
    }
    html.push_str("</div>\n</body></html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caps_positive_and_negative_words() {
        let mut scores = WordScores::new();
        for i in 0..300 {
            scores.insert(format!("pos{i}"), 1.0 + i as f64);
            scores.insert(format!("neg{i}"), -1.0 - i as f64);
        }
        scores.insert("zero".to_string(), 0.0);
        let words = select_cloud_words(&scores);
        assert_eq!(words.iter().filter(|w| w.score > 0.0).count(), MAX_POSITIVE_WORDS);
        assert_eq!(words.iter().filter(|w| w.score < 0.0).count(), MAX_NEGATIVE_WORDS);
        assert!(words.iter().all(|w| w.word != "zero"));
        assert_eq!(words[0].word, "pos299");
    }

    #[test]
    fn test_colour_ramp_spans_selection() {
        let scores: WordScores = [
            ("a".to_string(), 1.0),
            ("b".to_string(), 0.5),
            ("c".to_string(), -0.2),
        ]
        .into();
        let words = select_cloud_words(&scores);
        // strongest positive word is darkest, weakest sits mid-ramp
        assert_eq!(words[0].color, Rgb::for_score(1.0, 1.0));
        assert_eq!(words[1].color, Rgb::for_score(1.0, 0.5));
        // a lone negative word is fully coloured
        assert_eq!(words[2].color, Rgb::for_score(-1.0, 1.0));
    }

    #[test]
    fn test_render_sizes_and_escapes() {
        let words = vec![
            CloudWord { word: "<b>".into(), score: 2.0, weight: 2.0, color: Rgb(0, 0, 0) },
            CloudWord { word: "x".into(), score: -1.0, weight: 1.0, color: Rgb(1, 2, 3) },
        ];
        let html = render_wordcloud_html("cat", &words);
        assert!(html.contains("font-size: 72px"));
        assert!(html.contains("font-size: 42px"));
        assert!(html.contains("&lt;b&gt;"));
        assert!(html.contains("rgb(1, 2, 3)"));
    }
}
