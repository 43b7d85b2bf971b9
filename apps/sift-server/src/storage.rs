//! Upload and image file handling

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use sift_types::{ImageAsset, ImageFormat};
use tempfile::NamedTempFile;

use crate::error::ServerError;

/// Working directories, created at startup
#[derive(Debug, Clone)]
pub struct Directories {
    pub uploads: PathBuf,
    pub outputs: PathBuf,
    pub images: PathBuf,
}

impl Directories {
    pub fn create_all(&self) -> io::Result<()> {
        for dir in [&self.uploads, &self.outputs, &self.images] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// Persist an upload; the file is removed when the handle drops
pub fn save_upload(dir: &Path, bytes: &[u8]) -> io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(".pdf")
        .tempfile_in(dir)?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}

/// Name of an extracted image relative to the images directory, with `/`
/// separators
pub fn image_name(images_dir: &Path, asset: &ImageAsset) -> String {
    let relative = asset.path.strip_prefix(images_dir).unwrap_or(&asset.path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Turn a client-supplied image name back into an asset. The name must be
/// relative and stay inside `images_dir`, and the file name must follow the
/// `page{p}_img{s}.{ext}` scheme.
pub fn resolve_image(images_dir: &Path, name: &str) -> Result<ImageAsset, ServerError> {
    let invalid = || ServerError::InvalidRequest(format!("Invalid image name '{}'", name));

    let relative = Path::new(name);
    if name.is_empty()
        || !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
    {
        return Err(invalid());
    }

    let file_name = relative
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(invalid)?;
    let (page_index, sequence_in_page, format) = parse_image_file_name(file_name).ok_or_else(invalid)?;

    Ok(ImageAsset {
        page_index,
        sequence_in_page,
        format,
        path: images_dir.join(relative),
    })
}

fn parse_image_file_name(file_name: &str) -> Option<(u32, u32, ImageFormat)> {
    let (stem, extension) = file_name.rsplit_once('.')?;
    let format = ImageFormat::from_extension(extension)?;
    let (page, seq) = stem.strip_prefix("page")?.split_once("_img")?;
    Some((page.parse().ok()?, seq.parse().ok()?, format))
}
