//! PDF text and image extraction
//!
//! This crate opens uploaded PDFs with lopdf and produces an
//! [`ExtractedDocument`]:
//!
//! - `text`: page-by-page plain text, concatenated in document order
//! - `images`: embedded image XObjects written to `page{p}_img{s}.{ext}`
//!
//! Page-level problems never abort the document. They are collected as
//! [`PageWarning`]s on the result; only a document that cannot be opened at
//! all is an error.

mod decode;
pub mod error;
pub mod images;
mod resources;
pub mod text;

use std::fs;
use std::path::{Path, PathBuf};

use lopdf::Document;
use sift_types::{ExtractedDocument, PageWarning};
use tracing::{debug, info, warn};

pub use error::ExtractError;
pub use images::PageOutcome;

fn load(bytes: &[u8]) -> Result<Document, ExtractError> {
    Document::load_mem(bytes).map_err(|e| ExtractError::DocumentParse(e.to_string()))
}

/// Plain text of every page, without touching the filesystem
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let doc = load(bytes)?;
    let mut warnings = Vec::new();
    let text = document_text(&doc, bytes, &mut warnings);
    for warning in &warnings {
        warn!("{}", warning);
    }
    Ok(text)
}

/// Per-page text, falling back to a whole-document pass when the pages
/// yield nothing
fn document_text(doc: &Document, bytes: &[u8], warnings: &mut Vec<PageWarning>) -> String {
    let pages = doc.get_pages();
    let raw_text = text::extract_pages(doc, &pages, warnings);
    if raw_text.trim().is_empty() && !pages.is_empty() {
        if let Some(fallback) = text::extract_whole_document(bytes) {
            debug!("Per-page text was empty, using whole-document pass");
            return fallback;
        }
    }
    raw_text
}

/// Extracts text and images, writing images below a fixed directory
#[derive(Debug, Clone)]
pub struct PdfExtractor {
    images_dir: PathBuf,
}

impl PdfExtractor {
    pub fn new(images_dir: impl Into<PathBuf>) -> Self {
        Self {
            images_dir: images_dir.into(),
        }
    }

    /// Extract from a persisted upload
    pub fn extract_file(&self, path: &Path) -> Result<ExtractedDocument, ExtractError> {
        let bytes = fs::read(path)?;
        self.extract(&bytes)
    }

    /// Extract text and images from PDF bytes
    pub fn extract(&self, bytes: &[u8]) -> Result<ExtractedDocument, ExtractError> {
        let doc = load(bytes)?;
        let pages = doc.get_pages();
        let page_count = pages.len() as u32;
        debug!("Opened PDF with {} pages", page_count);

        let mut warnings: Vec<PageWarning> = Vec::new();

        let raw_text = document_text(&doc, bytes, &mut warnings);

        fs::create_dir_all(&self.images_dir)?;

        let mut images = Vec::new();
        for (&page_num, &page_id) in &pages {
            match images::extract_page_images(&doc, page_num, page_id, &self.images_dir) {
                PageOutcome::Images {
                    images: page_images,
                    warnings: page_warnings,
                } => {
                    images.extend(page_images);
                    warnings.extend(page_warnings);
                }
                PageOutcome::Skipped(warning) => {
                    warn!("Skipping images on {}", warning);
                    warnings.push(warning);
                }
            }
        }

        info!(
            "Extracted {} chars and {} images from {} pages ({} warnings)",
            raw_text.len(),
            images.len(),
            page_count,
            warnings.len()
        );

        Ok(ExtractedDocument {
            raw_text,
            images,
            page_count,
            warnings,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{build_pdf, PageImages};
    use super::*;
    use pretty_assertions::assert_eq;
    use sift_types::ImageFormat;

    #[test]
    fn test_garbage_is_a_document_error() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = PdfExtractor::new(dir.path());
        let result = extractor.extract(b"this is not a pdf");
        assert!(matches!(result, Err(ExtractError::DocumentParse(_))));
    }

    #[test]
    fn test_page_count() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = build_pdf(vec![
            (vec!["one"], PageImages::None),
            (vec!["two"], PageImages::None),
            (vec!["three"], PageImages::None),
        ]);
        let doc = PdfExtractor::new(dir.path()).extract(&pdf).unwrap();
        assert_eq!(doc.page_count, 3);
    }

    #[test]
    fn test_text_follows_page_order() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = build_pdf(vec![
            (vec!["Alpha line"], PageImages::None),
            (vec!["Beta line"], PageImages::None),
        ]);
        let doc = PdfExtractor::new(dir.path()).extract(&pdf).unwrap();

        assert_eq!(doc.page_count, 2);
        let alpha = doc.raw_text.find("Alpha line").expect("page 1 text");
        let beta = doc.raw_text.find("Beta line").expect("page 2 text");
        assert!(alpha < beta);
        assert!(doc.has_text());
    }

    #[test]
    fn test_images_are_named_by_page_and_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = build_pdf(vec![
            (vec!["no images here"], PageImages::None),
            (vec!["raw"], PageImages::Rgb(2, 1, vec![255, 0, 0, 0, 0, 255])),
            (vec!["jpeg"], PageImages::Jpeg(vec![0xFF, 0xD8, 0xFF, 0xD9])),
        ]);
        let doc = PdfExtractor::new(dir.path()).extract(&pdf).unwrap();

        assert_eq!(doc.images.len(), 2);
        assert_eq!(doc.images[0].page_index, 2);
        assert_eq!(doc.images[0].sequence_in_page, 1);
        assert_eq!(doc.images[0].format, ImageFormat::Png);
        assert_eq!(doc.images[1].page_index, 3);
        assert_eq!(doc.images[1].format, ImageFormat::Jpeg);

        assert!(dir.path().join("page2_img1.png").exists());
        let jpeg = std::fs::read(dir.path().join("page3_img1.jpeg")).unwrap();
        assert_eq!(jpeg, vec![0xFF, 0xD8, 0xFF, 0xD9]);
    }

    #[test]
    fn test_flate_image_is_extracted_as_png() {
        let dir = tempfile::tempdir().unwrap();
        let samples: Vec<u8> = (0..24).map(|i| (i * 10) as u8).collect();
        let pdf = build_pdf(vec![(
            vec!["compressed picture"],
            PageImages::FlateRgb(4, 2, samples.clone()),
        )]);
        let doc = PdfExtractor::new(dir.path()).extract(&pdf).unwrap();

        assert!(doc.warnings.is_empty(), "{:?}", doc.warnings);
        assert_eq!(doc.images.len(), 1);
        assert_eq!(doc.images[0].format, ImageFormat::Png);

        let file = std::fs::File::open(dir.path().join("page1_img1.png")).unwrap();
        let mut reader = png::Decoder::new(file).read_info().unwrap();
        let mut pixels = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut pixels).unwrap();
        assert_eq!((info.width, info.height), (4, 2));
        pixels.truncate(info.buffer_size());
        assert_eq!(pixels, samples);
    }

    #[test]
    fn test_broken_pages_do_not_abort_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = build_pdf(vec![
            (vec!["first"], PageImages::NoResources),
            (vec!["second"], PageImages::Dangling),
            (vec!["third"], PageImages::Jpeg(vec![0xFF, 0xD8, 0xFF, 0xD9])),
        ]);
        let doc = PdfExtractor::new(dir.path()).extract(&pdf).unwrap();

        assert_eq!(doc.images.len(), 1);
        assert_eq!(doc.images[0].page_index, 3);
        assert!(doc
            .warnings
            .iter()
            .any(|w| matches!(w, PageWarning::Structure { page: 1, .. })));
        assert!(doc
            .warnings
            .iter()
            .any(|w| matches!(w, PageWarning::Structure { page: 2, .. })));
    }

    #[test]
    fn test_extract_text_only() {
        let pdf = build_pdf(vec![
            (vec!["Summary source"], PageImages::Rgb(1, 1, vec![0, 0, 0])),
        ]);
        let text = extract_text(&pdf).unwrap();
        assert!(text.contains("Summary source"));
        assert!(matches!(
            extract_text(b"%PDF-garbage"),
            Err(ExtractError::DocumentParse(_))
        ));
    }

    #[test]
    fn test_extract_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = build_pdf(vec![(vec!["on disk"], PageImages::None)]);
        let upload = dir.path().join("upload.pdf");
        std::fs::write(&upload, &pdf).unwrap();

        let doc = PdfExtractor::new(dir.path().join("images"))
            .extract_file(&upload)
            .unwrap();
        assert!(doc.raw_text.contains("on disk"));
        assert!(dir.path().join("images").is_dir());
    }
}
