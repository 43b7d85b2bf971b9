//! A4 PDF report laid out with lopdf
//!
//! Text flows top to bottom in Helvetica 12pt, one 10mm cell per wrapped
//! line, breaking to a new page at the 15mm bottom margin. Each image then
//! gets a page of its own, 180mm wide at the top-left margin.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use sift_types::FilteredResult;

use crate::error::ReportError;
use crate::media::LoadedImage;
use crate::metrics::{to_win_ansi, wrap};

const MM: f32 = 72.0 / 25.4;

const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 10.0 * MM;
const BOTTOM_MARGIN: f32 = 15.0 * MM;
const LINE_HEIGHT: f32 = 10.0 * MM;
/// Horizontal inset of text inside its cell
const CELL_PADDING: f32 = 1.0 * MM;
const FONT_SIZE: f32 = 12.0;
const IMAGE_WIDTH: f32 = 180.0 * MM;

const TEXT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN - 2.0 * CELL_PADDING;

pub(crate) fn render(
    content: &FilteredResult,
    images: &[LoadedImage],
) -> Result<Vec<u8>, ReportError> {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut page_ids = Vec::new();
    for operations in layout_text(content) {
        page_ids.push(add_page(&mut doc, pages_id, operations)?);
    }

    let mut xobjects = Dictionary::new();
    for (i, image) in images.iter().enumerate() {
        let name = format!("Im{}", i + 1);
        let image_id = doc.add_object(image_xobject(image)?);
        xobjects.set(name.clone(), image_id);
        page_ids.push(add_page(&mut doc, pages_id, place_image(&name, image))?);
    }

    let mut resources = dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    };
    if !images.is_empty() {
        resources.set("XObject", xobjects);
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Count" => page_ids.len() as i64,
        "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
        "Resources" => resources,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| ReportError::Pdf(format!("Save failed: {}", e)))?;
    Ok(buffer)
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    operations: Vec<Operation>,
) -> Result<ObjectId, ReportError> {
    let content = Content { operations }
        .encode()
        .map_err(|e| ReportError::Pdf(format!("Content encoding failed: {}", e)))?;
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    }))
}

/// Content operations for each text page; always at least one page
fn layout_text(content: &FilteredResult) -> Vec<Vec<Operation>> {
    let mut pages: Vec<Vec<Operation>> = vec![Vec::new()];
    let mut top = MARGIN;

    for line in content.lines() {
        for segment in wrap(&to_win_ansi(line), TEXT_WIDTH, FONT_SIZE) {
            if top + LINE_HEIGHT > PAGE_HEIGHT - BOTTOM_MARGIN {
                pages.push(Vec::new());
                top = MARGIN;
            }
            if !segment.is_empty() {
                // Baseline sits mid-cell, nudged down by 0.3em
                let baseline = PAGE_HEIGHT - (top + LINE_HEIGHT / 2.0 + 0.3 * FONT_SIZE);
                if let Some(page) = pages.last_mut() {
                    page.extend(text_cell(segment, MARGIN + CELL_PADDING, baseline));
                }
            }
            top += LINE_HEIGHT;
        }
    }

    pages
}

fn text_cell(text: Vec<u8>, x: f32, baseline: f32) -> [Operation; 5] {
    [
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
        Operation::new("Td", vec![x.into(), baseline.into()]),
        Operation::new(
            "Tj",
            vec![Object::String(text, lopdf::StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
    ]
}

/// Draw `name` 180mm wide from the top-left margin, shrunk to fit the page
/// height if it is very tall
fn place_image(name: &str, image: &LoadedImage) -> Vec<Operation> {
    let aspect = image.height() as f32 / image.width() as f32;
    let max_height = PAGE_HEIGHT - 2.0 * MARGIN;

    let (mut width, mut height) = (IMAGE_WIDTH, IMAGE_WIDTH * aspect);
    if height > max_height {
        height = max_height;
        width = max_height / aspect;
    }
    let bottom = PAGE_HEIGHT - MARGIN - height;

    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                width.into(),
                0.into(),
                0.into(),
                height.into(),
                MARGIN.into(),
                bottom.into(),
            ],
        ),
        Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

fn image_xobject(image: &LoadedImage) -> Result<Stream, ReportError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(image.pixels.as_raw())?;
    let data = encoder.finish()?;

    Ok(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width() as i64,
            "Height" => image.height() as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        data,
    ))
}
