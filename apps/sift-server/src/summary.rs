//! Document summarization for `POST /extract`

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref SENTENCE_END: Regex = Regex::new(r"[.!?]+(\s+|$)").unwrap();
    static ref WORD: Regex = Regex::new(r"[A-Za-z][A-Za-z']*").unwrap();
}

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "been", "but", "by", "for", "from", "had", "has",
    "have", "he", "her", "his", "i", "if", "in", "into", "is", "it", "its", "of", "on", "or",
    "our", "she", "so", "that", "the", "their", "them", "then", "there", "these", "they", "this",
    "to", "was", "we", "were", "which", "will", "with", "you", "your",
];

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Document has no text to summarize")]
    NoText,
}

/// Turns extracted document text into a short summary
pub trait Summarizer: Send + Sync {
    fn summarize(&self, text: &str) -> Result<String, SummaryError>;
}

/// Extractive summary: keeps the sentences whose words are most frequent
/// across the document, in their original order
#[derive(Debug, Clone)]
pub struct FrequencySummarizer {
    max_sentences: usize,
}

impl FrequencySummarizer {
    pub fn new(max_sentences: usize) -> Self {
        Self {
            max_sentences: max_sentences.max(1),
        }
    }
}

impl Default for FrequencySummarizer {
    fn default() -> Self {
        Self::new(3)
    }
}

fn sentences(text: &str) -> Vec<String> {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END.find_iter(&flat) {
        let sentence = flat[start..m.end()].trim();
        if !sentence.is_empty() {
            out.push(sentence.to_string());
        }
        start = m.end();
    }
    let tail = flat[start..].trim();
    if !tail.is_empty() {
        out.push(tail.to_string());
    }
    out
}

fn content_words(sentence: &str, stopwords: &HashSet<&str>) -> Vec<String> {
    WORD.find_iter(sentence)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| !stopwords.contains(w.as_str()))
        .collect()
}

impl Summarizer for FrequencySummarizer {
    fn summarize(&self, text: &str) -> Result<String, SummaryError> {
        let sentences = sentences(text);
        if sentences.is_empty() {
            return Err(SummaryError::NoText);
        }
        if sentences.len() <= self.max_sentences {
            return Ok(sentences.join(" "));
        }

        let stopwords: HashSet<&str> = STOPWORDS.iter().copied().collect();
        let words: Vec<Vec<String>> = sentences
            .iter()
            .map(|s| content_words(s, &stopwords))
            .collect();

        let mut frequency: HashMap<&str, usize> = HashMap::new();
        for word in words.iter().flatten() {
            *frequency.entry(word.as_str()).or_insert(0) += 1;
        }

        let mut scored: Vec<(usize, f64)> = words
            .iter()
            .enumerate()
            .map(|(i, ws)| {
                let total: usize = ws.iter().map(|w| frequency[w.as_str()]).sum();
                let score = if ws.is_empty() {
                    0.0
                } else {
                    total as f64 / ws.len() as f64
                };
                (i, score)
            })
            .collect();

        // Highest score first; earlier sentence wins a tie
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut keep: Vec<usize> = scored
            .into_iter()
            .take(self.max_sentences)
            .map(|(i, _)| i)
            .collect();
        keep.sort_unstable();

        Ok(keep
            .into_iter()
            .map(|i| sentences[i].as_str())
            .collect::<Vec<_>>()
            .join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_short_text_is_returned_whole() {
        let summarizer = FrequencySummarizer::new(3);
        assert_eq!(
            summarizer.summarize("One.  Two!\nThree?").unwrap(),
            "One. Two! Three?"
        );
        assert!(matches!(summarizer.summarize(" \n "), Err(SummaryError::NoText)));
    }

    #[test]
    fn test_keeps_most_representative_sentences_in_order() {
        let text = "Rust compiles fast code. The weather was nice. \
                    Rust code is safe code. Lunch was late.";
        let summary = FrequencySummarizer::new(2).summarize(text).unwrap();
        assert_eq!(summary, "Rust compiles fast code. Rust code is safe code.");
    }

    #[test]
    fn test_sentence_splitting() {
        assert_eq!(
            sentences("First one. Second\none... third"),
            vec!["First one.", "Second one...", "third"]
        );
    }

    proptest! {
        /// Summary never has more sentences than requested
        #[test]
        fn summary_is_bounded(text in "([a-z]{1,8} ){1,6}\\.( [a-z]{1,8}){0,6}\\.", n in 1usize..4) {
            let summary = FrequencySummarizer::new(n).summarize(&text).unwrap();
            prop_assert!(sentences(&summary).len() <= n.max(1));
        }
    }
}
