//! Report generation
//!
//! Turns a [`FilteredResult`] plus the extracted images into a downloadable
//! document: a PDF laid out with lopdf, or a DOCX package built with
//! docx-rs. PDF output is byte-for-byte deterministic for the same input.
//!
//! Images that cannot be read back are left out of the report and reported
//! as [`ReportWarning`]s; they never fail the report itself.
//!
//! Reports are written to a temporary file next to the destination and
//! renamed into place, so a reader of `output_path` never sees a partial
//! file even when the same name is generated concurrently.

mod docx;
pub mod error;
mod media;
mod metrics;
mod pdf;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use sift_types::{FilteredResult, ImageAsset, ReportArtifact, ReportFormat};
use thiserror::Error;
use tracing::{info, warn};

pub use error::ReportError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportWarning {
    #[error("image {} unreadable: {}", .path.display(), .reason)]
    ImageUnreadable { path: PathBuf, reason: String },
}

/// An encoded report held in memory
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub bytes: Vec<u8>,
    /// Images actually embedded, in report order
    pub images: Vec<ImageAsset>,
    pub warnings: Vec<ReportWarning>,
}

/// Encode a report without touching the output directory
pub fn render(
    format: ReportFormat,
    content: &FilteredResult,
    images: &[ImageAsset],
) -> Result<RenderedReport, ReportError> {
    let (loaded, warnings) = media::load_images(images);
    for warning in &warnings {
        warn!("Skipping {}", warning);
    }

    let bytes = match format {
        ReportFormat::Pdf => pdf::render(content, &loaded)?,
        ReportFormat::Docx => docx::render(content, &loaded)?,
    };

    Ok(RenderedReport {
        bytes,
        images: loaded.into_iter().map(|image| image.asset).collect(),
        warnings,
    })
}

impl RenderedReport {
    /// Atomically write the report to `output_path`
    pub fn persist(
        &self,
        format: ReportFormat,
        content: &FilteredResult,
        output_path: &Path,
    ) -> Result<ReportArtifact, ReportError> {
        let parent = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let mut staged = tempfile::Builder::new()
            .prefix(".report-")
            .tempfile_in(parent)?;
        staged.write_all(&self.bytes)?;
        staged.as_file().sync_all()?;
        staged.persist(output_path).map_err(|e| e.error)?;

        info!(
            "Wrote {} report: {} lines, {} images, {} bytes -> {}",
            format.extension(),
            content.len(),
            self.images.len(),
            self.bytes.len(),
            output_path.display()
        );

        Ok(ReportArtifact {
            format,
            content: content.clone(),
            images: self.images.clone(),
            path: output_path.to_path_buf(),
        })
    }
}

/// Render a report and write it to `output_path`
pub fn generate(
    format: ReportFormat,
    content: &FilteredResult,
    images: &[ImageAsset],
    output_path: &Path,
) -> Result<ReportArtifact, ReportError> {
    render(format, content, images)?.persist(format, content, output_path)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use sift_types::{ImageAsset, ImageFormat};

    /// Write a small solid PNG and describe it as an extracted asset
    pub fn png_asset(dir: &Path, page: u32, seq: u32, width: u32, height: u32) -> ImageAsset {
        let path = dir.join(ImageAsset::file_name(page, seq, ImageFormat::Png));
        image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]))
            .save(&path)
            .unwrap();
        ImageAsset {
            page_index: page,
            sequence_in_page: seq,
            format: ImageFormat::Png,
            path,
        }
    }

    pub fn missing_asset(dir: &Path) -> ImageAsset {
        ImageAsset {
            page_index: 9,
            sequence_in_page: 1,
            format: ImageFormat::Jpeg,
            path: dir.join("page9_img1.jpeg"),
        }
    }
}
