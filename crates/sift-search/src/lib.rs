//! Search-term refinement and content filtering
//!
//! - [`spelling`]: two-stage spelling normalization (frequency model, then
//!   SymSpell edit-distance lookup)
//! - [`synonyms`]: sense-group synonym expansion
//! - [`filter`]: the three filtering strategies over extracted text
//! - [`resources`]: the immutable resources above, loaded once and shared

pub mod error;
pub mod filter;
pub mod resources;
pub mod spelling;
pub mod synonyms;

pub use error::SearchError;
pub use filter::{filter, LineMatcher, SubstringMatcher};
pub use resources::{ResourcePaths, SearchResources};
pub use spelling::{EditDistanceDictionary, LanguageModel, SpellingNormalizer};
pub use synonyms::SynonymLexicon;
