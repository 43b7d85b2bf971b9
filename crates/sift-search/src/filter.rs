//! Content filtering over extracted text
//!
//! Three strategies, selected by [`SearchMode`]:
//! - `TermMatch`: keep whole lines containing the term or a synonym
//! - `WordLength`: pull out every word of exactly N characters
//! - `Numeric`: pull out every run of digits

use lazy_static::lazy_static;
use regex::Regex;
use sift_types::{FilteredResult, SearchMode, SearchSpec};

use crate::error::SearchError;

lazy_static! {
    static ref NUMBER_TOKEN: Regex = Regex::new(r"\b[0-9]+\b").unwrap();
}

/// Decides whether a line is kept in `TermMatch` mode
pub trait LineMatcher {
    fn matches(&self, line: &str) -> bool;
}

/// Case-insensitive substring match against the term and its synonyms.
///
/// Substring, not whole-word: "cat" keeps a line containing "concatenate".
/// Lexicon lemmas spell spaces as `_`, so `motor_vehicle` matches
/// "motor vehicle".
#[derive(Debug, Clone)]
pub struct SubstringMatcher {
    needles: Vec<String>,
}

impl SubstringMatcher {
    pub fn new(spec: &SearchSpec) -> Self {
        let mut needles = vec![spec.corrected_term.to_lowercase()];
        needles.extend(
            spec.synonyms
                .iter()
                .map(|s| s.replace('_', " ").to_lowercase())
                .filter(|s| !s.trim().is_empty()),
        );
        needles.dedup();
        Self { needles }
    }
}

impl LineMatcher for SubstringMatcher {
    fn matches(&self, line: &str) -> bool {
        let line = line.to_lowercase();
        self.needles.iter().any(|needle| line.contains(needle.as_str()))
    }
}

/// Apply the strategy selected by `spec.mode`
pub fn filter(text: &str, spec: &SearchSpec) -> Result<FilteredResult, SearchError> {
    match spec.mode {
        SearchMode::TermMatch => Ok(filter_lines(text, &SubstringMatcher::new(spec))),
        SearchMode::WordLength => {
            let length = parse_length(&spec.corrected_term)?;
            words_of_length(text, length)
        }
        SearchMode::Numeric => Ok(numeric_tokens(text)),
    }
}

/// Lines kept by `matcher`, in their original order
pub fn filter_lines<M: LineMatcher + ?Sized>(text: &str, matcher: &M) -> FilteredResult {
    if text.is_empty() {
        return FilteredResult::default();
    }
    FilteredResult::new(
        text.split('\n')
            .filter(|line| matcher.matches(line))
            .map(str::to_string)
            .collect(),
    )
}

/// Parse the word-length term; zero and non-numbers are caller errors
pub fn parse_length(term: &str) -> Result<usize, SearchError> {
    match term.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(SearchError::InvalidLengthTerm(term.to_string())),
    }
}

/// Every word of exactly `length` characters, in order of appearance
pub fn words_of_length(text: &str, length: usize) -> Result<FilteredResult, SearchError> {
    let pattern = Regex::new(&format!(r"\b\w{{{}}}\b", length))
        .map_err(|_| SearchError::InvalidLengthTerm(length.to_string()))?;
    Ok(FilteredResult::new(
        pattern
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect(),
    ))
}

/// Every maximal run of ASCII digits, in order, duplicates kept
pub fn numeric_tokens(text: &str) -> FilteredResult {
    FilteredResult::new(
        NUMBER_TOKEN
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect(),
    )
}
