// Tokenization — lowercased word tokens with stop-word gaps.
//
// Stop words are not simply deleted: they leave a gap in the token stream so
// that bigram identification never pairs two words that weren't adjacent in
// the input text.

use std::collections::HashSet;

use anyhow::{Context, Result};
use regex::Regex;
use stop_words::{get, LANGUAGE};

/// Word pattern shared by tokenization and HTML highlighting.
pub const WORD_PATTERN: &str = r"[\w-]+";

pub struct Tokenizer {
    word_re: Regex,
    digits_re: Regex,
    stop_words: HashSet<String>,
    norm_num: bool,
}

impl Tokenizer {
    pub fn new(norm_num: bool, remove_stopwords: bool) -> Result<Self> {
        let word_re = Regex::new(WORD_PATTERN).context("Invalid word pattern")?;
        let digits_re = Regex::new(r"[0-9]+").context("Invalid digit pattern")?;
        let stop_words = if remove_stopwords {
            get(LANGUAGE::English).into_iter().collect()
        } else {
            HashSet::new()
        };
        Ok(Self {
            word_re,
            digits_re,
            stop_words,
            norm_num,
        })
    }

    /// Lowercase a single word and apply number normalization.
    pub fn preprocess_word(&self, word: &str) -> String {
        let lower = word.to_lowercase();
        if self.norm_num {
            self.digits_re.replace_all(&lower, "0").into_owned()
        } else {
            lower
        }
    }

    /// Token stream of `text`; `None` marks a removed stop word.
    pub fn tokens_with_gaps(&self, text: &str) -> Vec<Option<String>> {
        self.word_re
            .find_iter(text)
            .map(|m| {
                let word = self.preprocess_word(m.as_str());
                if word.chars().all(|c| c == '-') || self.stop_words.contains(&word) {
                    None
                } else {
                    Some(word)
                }
            })
            .collect()
    }

    /// Every word span in `text` with its preprocessed form, in order.
    pub fn word_spans<'t>(&self, text: &'t str) -> Vec<(usize, &'t str, String)> {
        self.word_re
            .find_iter(text)
            .map(|m| (m.start(), m.as_str(), self.preprocess_word(m.as_str())))
            .collect()
    }
}
