//! Read-only search resources, loaded once at startup
//!
//! Missing or unreadable files never stop the server: each one degrades to
//! an empty resource with a warning, and spelling correction falls back to
//! whatever stage is still available.

use std::path::PathBuf;

use sift_types::{SearchMode, SearchSpec};
use tracing::{info, warn};

use crate::error::SearchError;
use crate::filter::parse_length;
use crate::spelling::{EditDistanceDictionary, LanguageModel, SpellingNormalizer};
use crate::synonyms::SynonymLexicon;

/// Where the resource files live
#[derive(Debug, Clone, Default)]
pub struct ResourcePaths {
    /// SymSpell frequency dictionary (`word count` per line)
    pub dictionary: Option<PathBuf>,
    /// Word-frequency list for the first correction stage; defaults to the
    /// dictionary file
    pub language_model: Option<PathBuf>,
    /// Sense-group lexicon
    pub lexicon: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct SearchResources {
    normalizer: SpellingNormalizer,
    lexicon: SynonymLexicon,
}

impl SearchResources {
    pub fn new(normalizer: SpellingNormalizer, lexicon: SynonymLexicon) -> Self {
        Self { normalizer, lexicon }
    }

    pub fn load(paths: &ResourcePaths) -> Self {
        let dictionary = match &paths.dictionary {
            Some(path) => match EditDistanceDictionary::load(path) {
                Ok(dictionary) => {
                    info!("Loaded spelling dictionary: {} words", dictionary.len());
                    Some(dictionary)
                }
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            },
            None => None,
        };

        let model_path = paths.language_model.as_ref().or(paths.dictionary.as_ref());
        let model = match model_path {
            Some(path) => LanguageModel::load(path).unwrap_or_else(|e| {
                warn!("Language model unavailable: {}", e);
                LanguageModel::default()
            }),
            None => LanguageModel::default(),
        };

        let lexicon = match &paths.lexicon {
            Some(path) => SynonymLexicon::load(path).unwrap_or_else(|e| {
                warn!("Synonym lexicon unavailable: {}", e);
                SynonymLexicon::default()
            }),
            None => SynonymLexicon::default(),
        };

        info!(
            "Search resources ready: model={} words, lexicon={} groups",
            model.len(),
            lexicon.len()
        );

        Self::new(SpellingNormalizer::new(model, dictionary), lexicon)
    }

    pub fn normalizer(&self) -> &SpellingNormalizer {
        &self.normalizer
    }

    pub fn lexicon(&self) -> &SynonymLexicon {
        &self.lexicon
    }

    /// Turn a user's raw term into a search spec: correct spelling, then
    /// expand synonyms in `TermMatch` mode. Word-length terms are checked
    /// here so bad input fails before any filtering.
    pub fn refine(&self, raw_term: &str, mode: SearchMode) -> Result<SearchSpec, SearchError> {
        let corrected_term = self.normalizer.normalize(raw_term);

        let synonyms = match mode {
            SearchMode::TermMatch if !corrected_term.is_empty() => {
                self.lexicon.expand(&corrected_term)
            }
            SearchMode::WordLength => {
                parse_length(&corrected_term)?;
                Default::default()
            }
            _ => Default::default(),
        };

        Ok(SearchSpec {
            raw_term: raw_term.to_string(),
            corrected_term,
            synonyms,
            mode,
        })
    }
}
