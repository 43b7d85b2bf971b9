use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to build PDF: {0}")]
    Pdf(String),

    #[error("Failed to package DOCX: {0}")]
    Docx(String),

    #[error("Failed to encode image: {0}")]
    Image(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
