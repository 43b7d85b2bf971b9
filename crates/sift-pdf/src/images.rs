//! Embedded image recovery
//!
//! Walks each page's `/XObject` table, keeps entries whose `/Subtype` is
//! `/Image` and writes them out:
//!
//! - `DCTDecode` streams are already JPEG files and are written verbatim
//! - `JPXDecode` streams are written verbatim as JPEG 2000
//! - Flate-compressed or unfiltered 8-bit Gray/RGB samples become PNG, after
//!   undoing any TIFF or PNG predictor
//!
//! Anything else (CMYK, indexed palettes, CCITT, JBIG2, ...) is reported as
//! a warning for that image only.

use std::fs;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use sift_types::{ImageAsset, ImageFormat, PageWarning};
use tracing::{debug, warn};

use crate::decode::{inflate, unpredict, DecodeParams};
use crate::resources::{dict_integer, filter_names, page_resources, resolve};

/// Result of inspecting one page for images
#[derive(Debug)]
pub enum PageOutcome {
    /// The page was readable; some individual images may still have failed
    Images {
        images: Vec<ImageAsset>,
        warnings: Vec<PageWarning>,
    },
    /// The page's resources could not be inspected at all
    Skipped(PageWarning),
}

/// Extract every image XObject on a page into `images_dir`
pub fn extract_page_images(
    doc: &Document,
    page_num: u32,
    page_id: ObjectId,
    images_dir: &Path,
) -> PageOutcome {
    let structure = |reason: String| PageWarning::Structure {
        page: page_num,
        reason,
    };

    let resources = match page_resources(doc, page_id) {
        Ok(resources) => resources,
        Err(reason) => return PageOutcome::Skipped(structure(reason)),
    };

    let xobjects = match resources.get(b"XObject") {
        Ok(obj) => match resolve(doc, obj).and_then(|o| {
            o.as_dict()
                .map_err(|_| "XObject is not a dictionary".to_string())
        }) {
            Ok(dict) => dict,
            Err(reason) => return PageOutcome::Skipped(structure(reason)),
        },
        Err(_) => {
            debug!("Page {} has no XObjects", page_num);
            return PageOutcome::Images {
                images: Vec::new(),
                warnings: Vec::new(),
            };
        }
    };

    let mut images = Vec::new();
    let mut warnings = Vec::new();
    let mut sequence = 0u32;

    for (name, entry) in xobjects.iter() {
        let name = String::from_utf8_lossy(name);
        let stream = match resolve(doc, entry) {
            Ok(Object::Stream(stream)) => stream,
            Ok(_) => {
                debug!("Page {}: XObject /{} is not a stream", page_num, name);
                continue;
            }
            Err(reason) => {
                warnings.push(structure(format!("XObject /{}: {}", name, reason)));
                continue;
            }
        };

        if !is_image(doc, &stream.dict) {
            continue;
        }

        sequence += 1;
        match write_image(doc, stream, page_num, sequence, images_dir) {
            Ok(asset) => {
                debug!("Wrote {}", asset.path.display());
                images.push(asset);
            }
            Err(reason) => {
                warn!("Page {} image {} skipped: {}", page_num, sequence, reason);
                warnings.push(PageWarning::ImageIo {
                    page: page_num,
                    sequence,
                    reason,
                });
            }
        }
    }

    PageOutcome::Images { images, warnings }
}

fn is_image(doc: &Document, dict: &Dictionary) -> bool {
    dict.get(b"Subtype")
        .ok()
        .and_then(|s| resolve(doc, s).ok())
        .and_then(|s| s.as_name().ok())
        == Some(b"Image".as_slice())
}

fn write_image(
    doc: &Document,
    stream: &Stream,
    page_num: u32,
    sequence: u32,
    images_dir: &Path,
) -> Result<ImageAsset, String> {
    let (format, bytes) = encode_image(doc, stream)?;
    let path = images_dir.join(ImageAsset::file_name(page_num, sequence, format));
    fs::write(&path, bytes).map_err(|e| format!("write {}: {}", path.display(), e))?;

    Ok(ImageAsset {
        page_index: page_num,
        sequence_in_page: sequence,
        format,
        path,
    })
}

/// Turn an image stream into the bytes of a standalone image file
pub fn encode_image(doc: &Document, stream: &Stream) -> Result<(ImageFormat, Vec<u8>), String> {
    let filters = filter_names(doc, &stream.dict);

    match filters.as_slice() {
        [only] if only.as_slice() == b"DCTDecode" => {
            return Ok((ImageFormat::Jpeg, stream.content.clone()))
        }
        [only] if only.as_slice() == b"JPXDecode" => {
            return Ok((ImageFormat::Jpeg2000, stream.content.clone()))
        }
        _ => {}
    }

    let width = dict_integer(doc, &stream.dict, b"Width").ok_or("missing Width")?;
    let height = dict_integer(doc, &stream.dict, b"Height").ok_or("missing Height")?;
    let bits = dict_integer(doc, &stream.dict, b"BitsPerComponent").unwrap_or(8);
    if bits != 8 {
        return Err(format!("unsupported BitsPerComponent {}", bits));
    }
    let channels = color_channels(doc, &stream.dict)?;

    let (width, height) = match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(format!("invalid dimensions {}x{}", width, height)),
    };

    let samples = match filters.as_slice() {
        [] => stream.content.clone(),
        [only] if only.as_slice() == b"FlateDecode" => {
            let params =
                DecodeParams::from_stream(doc, &stream.dict, width as usize, channels as usize);
            let inflated = inflate(&stream.content, params.encoded_len(height as usize))?;
            unpredict(inflated, &params)?
        }
        other => {
            let names: Vec<String> = other
                .iter()
                .map(|n| String::from_utf8_lossy(n).into_owned())
                .collect();
            return Err(format!("unsupported filter chain [{}]", names.join(", ")));
        }
    };

    let png = encode_png(width, height, channels, &samples)?;
    Ok((ImageFormat::Png, png))
}

/// Component count of the image color space; only Gray and RGB are supported
fn color_channels(doc: &Document, dict: &Dictionary) -> Result<u8, String> {
    let space = dict
        .get(b"ColorSpace")
        .map_err(|_| "missing ColorSpace".to_string())
        .and_then(|cs| resolve(doc, cs))?;

    match space {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" => Ok(1),
            b"DeviceRGB" | b"CalRGB" => Ok(3),
            other => Err(format!(
                "unsupported ColorSpace {}",
                String::from_utf8_lossy(other)
            )),
        },
        // [/ICCBased <stream>] carries its component count in /N
        Object::Array(items) => {
            let family = items
                .first()
                .and_then(|f| f.as_name().ok())
                .unwrap_or_default();
            if family != b"ICCBased" {
                return Err(format!(
                    "unsupported ColorSpace {}",
                    String::from_utf8_lossy(family)
                ));
            }
            let profile = items
                .get(1)
                .ok_or("ICCBased without profile")
                .and_then(|p| resolve(doc, p).map_err(|_| "ICCBased profile unreadable"))?
                .as_stream()
                .map_err(|_| "ICCBased profile is not a stream".to_string())?;
            match dict_integer(doc, &profile.dict, b"N") {
                Some(1) => Ok(1),
                Some(3) => Ok(3),
                other => Err(format!("unsupported ICC component count {:?}", other)),
            }
        }
        _ => Err("malformed ColorSpace".to_string()),
    }
}

fn encode_png(width: u32, height: u32, channels: u8, samples: &[u8]) -> Result<Vec<u8>, String> {
    let expected = width as usize * height as usize * channels as usize;
    if samples.len() < expected {
        return Err(format!(
            "sample data too short: {} bytes for {}x{}x{}",
            samples.len(),
            width,
            height,
            channels
        ));
    }

    let color = if channels == 1 {
        png::ColorType::Grayscale
    } else {
        png::ColorType::Rgb
    };

    let mut out = Vec::new();
    let mut encoder = png::Encoder::new(&mut out, width, height);
    encoder.set_color(color);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder
        .write_header()
        .map_err(|e| format!("PNG header: {}", e))?;
    writer
        .write_image_data(&samples[..expected])
        .map_err(|e| format!("PNG data: {}", e))?;
    writer.finish().map_err(|e| format!("PNG finish: {}", e))?;

    Ok(out)
}
