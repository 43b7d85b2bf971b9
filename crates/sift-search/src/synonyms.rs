//! Sense-group synonym lexicon
//!
//! File format: one sense group per line, lemmas separated by commas.
//! Blank lines and lines starting with `#` are ignored. Multi-word lemmas
//! use `_` for spaces, as WordNet does.
//!
//! ```text
//! car, auto, automobile, machine, motorcar
//! car, railcar, railway_car, railroad_car
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use crate::error::SearchError;

#[derive(Debug, Clone, Default)]
pub struct SynonymLexicon {
    groups: Vec<Vec<String>>,
    /// lowercase lemma -> indices into `groups`
    index: HashMap<String, Vec<usize>>,
}

impl SynonymLexicon {
    pub fn parse(text: &str) -> Self {
        let mut lexicon = Self::default();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let lemmas: Vec<String> = line
                .split(',')
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect();
            if !lemmas.is_empty() {
                lexicon.add_group(lemmas);
            }
        }
        lexicon
    }

    pub fn load(path: &Path) -> Result<Self, SearchError> {
        let text = fs::read_to_string(path).map_err(|source| SearchError::ResourceIo {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    fn add_group(&mut self, lemmas: Vec<String>) {
        let id = self.groups.len();
        for lemma in &lemmas {
            let ids = self.index.entry(lemma.to_lowercase()).or_default();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        self.groups.push(lemmas);
    }

    /// Number of sense groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Every lemma of every sense group containing `term`, the term itself
    /// included. Lookup is case-insensitive; spaces also match `_`.
    pub fn expand(&self, term: &str) -> BTreeSet<String> {
        let key = term.trim().to_lowercase();
        if key.is_empty() {
            return BTreeSet::new();
        }

        let ids = self
            .index
            .get(&key)
            .or_else(|| self.index.get(&key.replace(' ', "_")));

        ids.into_iter()
            .flatten()
            .flat_map(|&id| self.groups[id].iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const LEXICON: &str = "\
# nouns
car, auto, automobile, machine, motorcar
car, railcar, railway_car, railroad_car
motor_vehicle, automotive_vehicle

fast, quick, speedy
";

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_expand_unions_sense_groups() {
        let lexicon = SynonymLexicon::parse(LEXICON);
        assert_eq!(
            lexicon.expand("car"),
            set(&[
                "auto",
                "automobile",
                "car",
                "machine",
                "motorcar",
                "railcar",
                "railroad_car",
                "railway_car"
            ])
        );
    }

    #[test]
    fn test_expand_is_case_insensitive() {
        let lexicon = SynonymLexicon::parse(LEXICON);
        assert_eq!(lexicon.expand("QUICK"), set(&["fast", "quick", "speedy"]));
    }

    #[test]
    fn test_expand_multi_word_term() {
        let lexicon = SynonymLexicon::parse(LEXICON);
        assert_eq!(
            lexicon.expand("motor vehicle"),
            set(&["automotive_vehicle", "motor_vehicle"])
        );
    }

    #[test]
    fn test_unknown_and_empty_terms() {
        let lexicon = SynonymLexicon::parse(LEXICON);
        assert!(lexicon.expand("xyzzy").is_empty());
        assert!(lexicon.expand("").is_empty());
    }

    #[test]
    fn test_comments_and_blanks_skipped() {
        let lexicon = SynonymLexicon::parse(LEXICON);
        assert_eq!(lexicon.len(), 4);
        assert!(lexicon.expand("# nouns").is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LEXICON.as_bytes()).unwrap();
        let lexicon = SynonymLexicon::load(file.path()).unwrap();
        assert!(lexicon.expand("speedy").contains("fast"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = SynonymLexicon::load(Path::new("/nonexistent/lexicon.txt"));
        assert!(matches!(result, Err(SearchError::ResourceIo { .. })));
    }
}
