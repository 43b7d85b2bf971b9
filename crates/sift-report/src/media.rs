use std::fs;
use std::io::Cursor;

use image::{ImageFormat, RgbImage};
use sift_types::ImageAsset;
use tracing::debug;

use crate::error::ReportError;
use crate::ReportWarning;

/// An extracted image, read back and decoded
pub(crate) struct LoadedImage {
    pub asset: ImageAsset,
    pub pixels: RgbImage,
}

impl LoadedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// The decoded pixels re-encoded as PNG, whatever the source format
    pub fn png_bytes(&self) -> Result<Vec<u8>, ReportError> {
        let mut out = Cursor::new(Vec::new());
        self.pixels
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|e| ReportError::Image(e.to_string()))?;
        Ok(out.into_inner())
    }
}

/// Read every image in (page, sequence) order; unreadable ones become
/// warnings
pub(crate) fn load_images(images: &[ImageAsset]) -> (Vec<LoadedImage>, Vec<ReportWarning>) {
    let mut ordered: Vec<&ImageAsset> = images.iter().collect();
    ordered.sort_by_key(|asset| (asset.page_index, asset.sequence_in_page));

    let mut loaded = Vec::with_capacity(ordered.len());
    let mut warnings = Vec::new();

    for asset in ordered {
        match load(asset) {
            Ok(image) => {
                debug!(
                    "Loaded {} ({}x{})",
                    asset.path.display(),
                    image.width(),
                    image.height()
                );
                loaded.push(image);
            }
            Err(reason) => warnings.push(ReportWarning::ImageUnreadable {
                path: asset.path.clone(),
                reason,
            }),
        }
    }

    (loaded, warnings)
}

fn load(asset: &ImageAsset) -> Result<LoadedImage, String> {
    let encoded = fs::read(&asset.path).map_err(|e| e.to_string())?;
    let pixels = image::load_from_memory(&encoded)
        .map_err(|e| e.to_string())?
        .to_rgb8();
    if pixels.width() == 0 || pixels.height() == 0 {
        return Err("image has no pixels".to_string());
    }
    Ok(LoadedImage {
        asset: asset.clone(),
        pixels,
    })
}
