//! Two-stage spelling normalization
//!
//! Stage 1 is a word-frequency language model in the style of Norvig's
//! corrector: a word it does not know is replaced by the most frequent known
//! word one edit away, or failing that two edits away.
//!
//! Stage 2 looks the Stage-1 word up in a SymSpell dictionary (max edit
//! distance 2, prefix length 7) and takes the top `Closest` suggestion.
//!
//! Only purely alphabetic words are touched. Numbers, codes and punctuation
//! pass through unchanged so that `"5"` still means five in word-length
//! mode.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

use symspell::{AsciiStringStrategy, SymSpell, SymSpellBuilder, Verbosity};
use tracing::{debug, warn};

use crate::error::SearchError;

pub const MAX_EDIT_DISTANCE: i64 = 2;
pub const PREFIX_LENGTH: i64 = 7;

const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz";

/// Longer words are not corrected by Stage 1 at all
const MAX_CORRECTION_LEN: usize = 32;
/// Longer words only get edit-distance-1 candidates
const MAX_SECOND_EDIT_LEN: usize = 12;

/// Parse a `word count` line; a bare word counts once
fn parse_frequency_line(line: &str) -> Option<(String, u64)> {
    let mut parts = line.split_whitespace();
    let word = parts.next()?;
    if word.starts_with('#') {
        return None;
    }
    let count = parts.next().and_then(|c| c.parse().ok()).unwrap_or(1);
    Some((word.to_lowercase(), count))
}

/// Word frequencies used by Stage 1
#[derive(Debug, Clone, Default)]
pub struct LanguageModel {
    counts: HashMap<String, u64>,
}

impl LanguageModel {
    pub fn from_frequency_list(text: &str) -> Self {
        let mut counts = HashMap::new();
        for (word, count) in text.lines().filter_map(parse_frequency_line) {
            *counts.entry(word).or_insert(0) += count;
        }
        Self { counts }
    }

    pub fn load(path: &Path) -> Result<Self, SearchError> {
        let text = fs::read_to_string(path).map_err(|source| SearchError::ResourceIo {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_frequency_list(&text))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn is_known(&self, word: &str) -> bool {
        self.counts.contains_key(word)
    }

    /// Most probable spelling of a lowercase word; unchanged when already
    /// known or when nothing within two edits is known
    pub fn correct(&self, word: &str) -> String {
        let len = word.chars().count();
        if self.counts.is_empty() || self.is_known(word) || len > MAX_CORRECTION_LEN {
            return word.to_string();
        }

        let first = edits1(word);
        if let Some(best) = self.most_frequent(first.iter()) {
            return best;
        }
        if len > MAX_SECOND_EDIT_LEN {
            return word.to_string();
        }

        let second: HashSet<String> = first.iter().flat_map(|w| edits1(w)).collect();
        self.most_frequent(second.iter())
            .unwrap_or_else(|| word.to_string())
    }

    /// Highest count wins; equal counts fall back to alphabetical order
    fn most_frequent<'a>(&self, candidates: impl Iterator<Item = &'a String>) -> Option<String> {
        candidates
            .filter_map(|w| self.counts.get(w).map(|&count| (count, w)))
            .max_by(|(ca, wa), (cb, wb)| ca.cmp(cb).then_with(|| wb.cmp(wa)))
            .map(|(_, w)| w.clone())
    }
}

/// All strings one deletion, transposition, replacement or insertion away
fn edits1(word: &str) -> HashSet<String> {
    let chars: Vec<char> = word.chars().collect();
    let mut out = HashSet::new();

    for i in 0..=chars.len() {
        let (left, right) = chars.split_at(i);
        let left: String = left.iter().collect();

        if !right.is_empty() {
            out.insert(format!("{}{}", left, right[1..].iter().collect::<String>()));
        }
        if right.len() > 1 {
            out.insert(format!(
                "{}{}{}{}",
                left,
                right[1],
                right[0],
                right[2..].iter().collect::<String>()
            ));
        }
        for c in ALPHABET.chars() {
            if !right.is_empty() {
                out.insert(format!(
                    "{}{}{}",
                    left,
                    c,
                    right[1..].iter().collect::<String>()
                ));
            }
            out.insert(format!("{}{}{}", left, c, right.iter().collect::<String>()));
        }
    }

    out
}

/// SymSpell index used by Stage 2
pub struct EditDistanceDictionary {
    inner: SymSpell<AsciiStringStrategy>,
    words: usize,
}

impl fmt::Debug for EditDistanceDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditDistanceDictionary")
            .field("words", &self.words)
            .finish()
    }
}

impl EditDistanceDictionary {
    /// Build from `word count` lines (the SymSpell frequency-dictionary format)
    pub fn from_frequency_list(text: &str) -> Result<Self, SearchError> {
        let mut inner: SymSpell<AsciiStringStrategy> = SymSpellBuilder::default()
            .max_dictionary_edit_distance(MAX_EDIT_DISTANCE)
            .prefix_length(PREFIX_LENGTH)
            .count_threshold(1)
            .build()
            .map_err(|e| SearchError::DictionaryUnavailable(e.to_string()))?;

        let mut words = 0;
        for line in text.lines() {
            let Some((word, count)) = parse_frequency_line(line) else {
                continue;
            };
            if inner.load_dictionary_line(&format!("{} {}", word, count), 0, 1, " ") {
                words += 1;
            }
        }

        if words == 0 {
            return Err(SearchError::DictionaryUnavailable(
                "dictionary has no entries".to_string(),
            ));
        }

        Ok(Self { inner, words })
    }

    pub fn load(path: &Path) -> Result<Self, SearchError> {
        let text = fs::read_to_string(path).map_err(|e| {
            SearchError::DictionaryUnavailable(format!("{}: {}", path.display(), e))
        })?;
        Self::from_frequency_list(&text)
    }

    pub fn len(&self) -> usize {
        self.words
    }

    pub fn is_empty(&self) -> bool {
        self.words == 0
    }

    /// Top-ranked suggestion within the edit bound
    pub fn closest(&self, word: &str) -> Option<String> {
        self.inner
            .lookup(word, Verbosity::Closest, MAX_EDIT_DISTANCE)
            .into_iter()
            .next()
            .map(|s| s.term)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.inner
            .lookup(word, Verbosity::Top, 0)
            .iter()
            .any(|s| s.distance == 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaseShape {
    Lower,
    Capitalized,
    Upper,
}

impl CaseShape {
    fn of(word: &str) -> Self {
        let mut chars = word.chars();
        let first_upper = chars.next().is_some_and(char::is_uppercase);
        let rest: Vec<char> = chars.collect();
        if first_upper && !rest.is_empty() && rest.iter().all(|c| c.is_uppercase()) {
            CaseShape::Upper
        } else if first_upper {
            CaseShape::Capitalized
        } else {
            CaseShape::Lower
        }
    }

    fn apply(self, lower: &str) -> String {
        match self {
            CaseShape::Lower => lower.to_string(),
            CaseShape::Upper => lower.to_uppercase(),
            CaseShape::Capitalized => {
                let mut chars = lower.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }
}

/// Corrects search terms; built once and shared read-only
#[derive(Debug, Default)]
pub struct SpellingNormalizer {
    model: LanguageModel,
    dictionary: Option<EditDistanceDictionary>,
}

impl SpellingNormalizer {
    pub fn new(model: LanguageModel, dictionary: Option<EditDistanceDictionary>) -> Self {
        if dictionary.is_none() {
            warn!("Spelling dictionary unavailable, using language-model correction only");
        }
        Self { model, dictionary }
    }

    pub fn has_dictionary(&self) -> bool {
        self.dictionary.is_some()
    }

    /// Correct every alphabetic word of `term`; whitespace collapses to
    /// single spaces
    pub fn normalize(&self, term: &str) -> String {
        let corrected: Vec<String> = term
            .split_whitespace()
            .map(|word| self.normalize_word(word))
            .collect();
        let out = corrected.join(" ");
        if out != term {
            debug!("Normalized '{}' -> '{}'", term, out);
        }
        out
    }

    fn normalize_word(&self, word: &str) -> String {
        if !word.chars().all(char::is_alphabetic) {
            return word.to_string();
        }

        let shape = CaseShape::of(word);
        let lower = word.to_lowercase();

        let stage1 = match &self.dictionary {
            // A word the dictionary already knows is never rewritten by the model
            Some(dictionary) if dictionary.contains(&lower) => lower,
            _ => self.model.correct(&lower),
        };

        let stage2 = match &self.dictionary {
            Some(dictionary) => dictionary.closest(&stage1).unwrap_or(stage1),
            None => stage1,
        };

        shape.apply(&stage2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const FREQUENCIES: &str = "\
the 23135851162
quick 55382800
brown 42318220
fox 17544420
jumps 2933700
over 1202934000
lazy 22237236
dog 105062424
spelling 9930348
correction 8950860
report 202536324
invoice 27400000
total 344012000
";

    fn normalizer() -> SpellingNormalizer {
        SpellingNormalizer::new(
            LanguageModel::from_frequency_list(FREQUENCIES),
            Some(EditDistanceDictionary::from_frequency_list(FREQUENCIES).unwrap()),
        )
    }

    #[test]
    fn test_language_model_fixes_single_edit() {
        let model = LanguageModel::from_frequency_list(FREQUENCIES);
        assert_eq!(model.correct("quikc"), "quick");
        assert_eq!(model.correct("repot"), "report");
        assert_eq!(model.correct("fox"), "fox");
    }

    #[test]
    fn test_language_model_two_edits() {
        let model = LanguageModel::from_frequency_list(FREQUENCIES);
        assert_eq!(model.correct("spelign"), "spelling");
    }

    #[test]
    fn test_long_words_only_get_single_edits() {
        let model = LanguageModel::from_frequency_list("internationalization 100\n");
        assert_eq!(model.correct("internationalizatoin"), "internationalization");
        assert_eq!(model.correct("internationalizatxxn"), "internationalizatxxn");
    }

    #[test]
    fn test_very_long_token_is_left_alone() {
        let model = LanguageModel::from_frequency_list(FREQUENCIES);
        let token = "a".repeat(5_000);
        assert_eq!(model.correct(&token), token);
    }

    #[test]
    fn test_language_model_leaves_unknowable_words() {
        let model = LanguageModel::from_frequency_list(FREQUENCIES);
        assert_eq!(model.correct("xylophone"), "xylophone");
        assert_eq!(LanguageModel::default().correct("qwrt"), "qwrt");
    }

    #[test]
    fn test_language_model_tie_breaks_alphabetically() {
        let model = LanguageModel::from_frequency_list("cat 10\ncar 10\n");
        assert_eq!(model.correct("cax"), "car");
    }

    #[test]
    fn test_normalize_corrects_each_word() {
        assert_eq!(normalizer().normalize("quikc  brwn fox"), "quick brown fox");
    }

    #[test]
    fn test_normalize_keeps_case_shape() {
        let n = normalizer();
        assert_eq!(n.normalize("Invoce"), "Invoice");
        assert_eq!(n.normalize("TOTL"), "TOTAL");
    }

    #[test]
    fn test_numbers_pass_through() {
        let n = normalizer();
        assert_eq!(n.normalize("5"), "5");
        assert_eq!(n.normalize("A7 2024"), "A7 2024");
    }

    #[test]
    fn test_dictionary_only_stage() {
        let n = SpellingNormalizer::new(
            LanguageModel::default(),
            Some(EditDistanceDictionary::from_frequency_list(FREQUENCIES).unwrap()),
        );
        assert_eq!(n.normalize("lazzy"), "lazy");
    }

    #[test]
    fn test_missing_dictionary_degrades_to_stage_one() {
        let n = SpellingNormalizer::new(LanguageModel::from_frequency_list(FREQUENCIES), None);
        assert!(!n.has_dictionary());
        assert_eq!(n.normalize("quikc"), "quick");
    }

    #[test]
    fn test_missing_dictionary_file_is_unavailable() {
        let result = EditDistanceDictionary::load(Path::new("/nonexistent/dictionary.txt"));
        assert!(matches!(result, Err(SearchError::DictionaryUnavailable(_))));
    }

    #[test]
    fn test_empty_dictionary_is_unavailable() {
        assert!(EditDistanceDictionary::from_frequency_list("# comment only\n").is_err());
    }

    #[test]
    fn test_empty_term() {
        assert_eq!(normalizer().normalize(""), "");
        assert_eq!(normalizer().normalize("   "), "");
    }

    #[test]
    fn test_edits1_size() {
        // n deletions, n-1 transpositions, 26n replacements, 26(n+1) insertions
        assert!(edits1("ab").len() <= 2 + 1 + 52 + 78);
        assert!(edits1("ab").contains("ba"));
        assert!(edits1("ab").contains("a"));
        assert!(edits1("ab").contains("abc"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// normalize(normalize(t)) == normalize(t)
        #[test]
        fn normalize_is_idempotent(term in "[A-Za-z0-9]{0,8}( [A-Za-z]{1,8}){0,2}") {
            let n = normalizer();
            let once = n.normalize(&term);
            let twice = n.normalize(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn stage_one_only_is_idempotent(term in "[a-z]{1,7}") {
            let n = SpellingNormalizer::new(LanguageModel::from_frequency_list(FREQUENCIES), None);
            let once = n.normalize(&term);
            prop_assert_eq!(n.normalize(&once), once);
        }
    }
}
