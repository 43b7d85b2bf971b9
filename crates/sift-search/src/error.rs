use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("word_length search needs a positive whole number, got '{0}'")]
    InvalidLengthTerm(String),

    #[error("Spelling dictionary unavailable: {0}")]
    DictionaryUnavailable(String),

    #[error("Failed to read {path}: {source}")]
    ResourceIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
