use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a mode or format name is not recognized
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Encoding of an image recovered from a PDF page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Jpeg2000,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Jpeg2000 => "jp2",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Jpeg2000 => "image/jp2",
        }
    }

    /// Guess the format from a file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "jp2" | "jpx" => Some(ImageFormat::Jpeg2000),
            _ => None,
        }
    }
}

/// An image recovered from a page and persisted to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    /// 1-based page number
    pub page_index: u32,
    /// 1-based position of the image among the page's images
    pub sequence_in_page: u32,
    pub format: ImageFormat,
    pub path: PathBuf,
}

impl ImageAsset {
    /// File stem shared by every asset of the same page/sequence: `page3_img1`
    pub fn file_stem(page_index: u32, sequence_in_page: u32) -> String {
        format!("page{}_img{}", page_index, sequence_in_page)
    }

    pub fn file_name(page_index: u32, sequence_in_page: u32, format: ImageFormat) -> String {
        format!(
            "{}.{}",
            Self::file_stem(page_index, sequence_in_page),
            format.extension()
        )
    }
}

/// Recoverable problems hit while extracting a single page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageWarning {
    /// Resource dictionary or XObject table missing or malformed
    Structure { page: u32, reason: String },
    /// An image could not be decoded or written
    ImageIo {
        page: u32,
        sequence: u32,
        reason: String,
    },
    /// The page's content stream could not be turned into text
    Text { page: u32, reason: String },
}

impl fmt::Display for PageWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageWarning::Structure { page, reason } => {
                write!(f, "page {}: structure: {}", page, reason)
            }
            PageWarning::ImageIo {
                page,
                sequence,
                reason,
            } => write!(f, "page {} image {}: {}", page, sequence, reason),
            PageWarning::Text { page, reason } => write!(f, "page {}: text: {}", page, reason),
        }
    }
}

/// Text and images pulled out of one uploaded PDF
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub raw_text: String,
    pub images: Vec<ImageAsset>,
    pub page_count: u32,
    pub warnings: Vec<PageWarning>,
}

impl ExtractedDocument {
    pub fn has_text(&self) -> bool {
        !self.raw_text.trim().is_empty()
    }
}

/// Filtering strategy selected by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    TermMatch,
    WordLength,
    Numeric,
}

impl SearchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchMode::TermMatch => "term_match",
            SearchMode::WordLength => "word_length",
            SearchMode::Numeric => "numeric",
        }
    }
}

impl FromStr for SearchMode {
    type Err = UnknownVariant;

    /// Blank input selects `TermMatch`; `numbers` is accepted as an alias of `numeric`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "term_match" | "term" => Ok(SearchMode::TermMatch),
            "word_length" => Ok(SearchMode::WordLength),
            "numeric" | "numbers" => Ok(SearchMode::Numeric),
            other => Err(UnknownVariant {
                kind: "search mode",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A refined search request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSpec {
    pub raw_term: String,
    /// Always derived from `raw_term`
    pub corrected_term: String,
    /// Empty unless `mode` is `TermMatch`
    pub synonyms: BTreeSet<String>,
    pub mode: SearchMode,
}

impl SearchSpec {
    /// Spec for a term that needs no refinement (e.g. already corrected upstream)
    pub fn literal(term: impl Into<String>, mode: SearchMode) -> Self {
        let term = term.into();
        Self {
            raw_term: term.clone(),
            corrected_term: term,
            synonyms: BTreeSet::new(),
            mode,
        }
    }

    pub fn with_synonyms<I, S>(mut self, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.synonyms = synonyms.into_iter().map(Into::into).collect();
        self
    }
}

/// Lines (or tokens) that survived filtering, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilteredResult {
    lines: Vec<String>,
}

impl FilteredResult {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Split newline-joined text back into lines; empty text has no lines
    pub fn from_text(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }
        Self {
            lines: text.split('\n').map(str::to_string).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Output document flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Pdf,
    Docx,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Pdf => "pdf",
            ReportFormat::Docx => "docx",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ReportFormat::Pdf => "application/pdf",
            ReportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// `extracted_<original-name>.<ext>`, with the upload's own extension dropped
    pub fn output_file_name(self, original_name: &str) -> String {
        let stem = Path::new(original_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("document");
        format!("extracted_{}.{}", stem, self.extension())
    }
}

/// A generated report on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportArtifact {
    pub format: ReportFormat,
    pub content: FilteredResult,
    /// Images that actually made it into the report
    pub images: Vec<ImageAsset>,
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_image_file_name() {
        assert_eq!(
            ImageAsset::file_name(3, 2, ImageFormat::Jpeg),
            "page3_img2.jpeg"
        );
        assert_eq!(ImageAsset::file_stem(1, 1), "page1_img1");
    }

    #[test]
    fn test_image_format_from_extension() {
        assert_eq!(ImageFormat::from_extension("JPG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("png"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension("gif"), None);
    }

    #[test]
    fn test_search_mode_parsing() {
        assert_eq!("".parse::<SearchMode>().unwrap(), SearchMode::TermMatch);
        assert_eq!(
            "Word_Length".parse::<SearchMode>().unwrap(),
            SearchMode::WordLength
        );
        assert_eq!("numbers".parse::<SearchMode>().unwrap(), SearchMode::Numeric);
        assert!("regex".parse::<SearchMode>().is_err());
    }

    #[test]
    fn test_search_mode_serde_names() {
        let json = serde_json::to_string(&SearchMode::WordLength).unwrap();
        assert_eq!(json, "\"word_length\"");
    }

    #[test]
    fn test_filtered_result_from_empty_text_has_no_lines() {
        let result = FilteredResult::from_text("");
        assert!(result.is_empty());
        assert_eq!(result.to_text(), "");
    }

    #[test]
    fn test_filtered_result_keeps_blank_lines() {
        let result = FilteredResult::from_text("a\n\nb");
        assert_eq!(result.lines(), &["a", "", "b"]);
        assert_eq!(result.to_text(), "a\n\nb");
    }

    #[test]
    fn test_report_format_file_name() {
        assert_eq!(
            ReportFormat::Pdf.output_file_name("paper.pdf"),
            "extracted_paper.pdf"
        );
        assert_eq!(
            ReportFormat::Docx.output_file_name("../notes.v2.pdf"),
            "extracted_notes.v2.docx"
        );
        assert_eq!(ReportFormat::Docx.extension(), "docx");
    }

    #[test]
    fn test_page_warning_display() {
        let warning = PageWarning::Structure {
            page: 4,
            reason: "no Resources".into(),
        };
        assert_eq!(warning.to_string(), "page 4: structure: no Resources");
    }
}
