//! DOCX report built with docx-rs
//!
//! A `Title` paragraph, one paragraph per content line, then every image on
//! its own page as an inline picture 6 inches wide.

use std::io::Cursor;

use docx_rs::{BreakType, Docx, PageMargin, Paragraph, Pic, Run, Style, StyleType};
use sift_types::FilteredResult;

use crate::error::ReportError;
use crate::media::LoadedImage;

const TITLE: &str = "Extracted Report";

/// 6 inches in English Metric Units
const IMAGE_WIDTH_EMU: u32 = 5_486_400;

/// A4 portrait in twentieths of a point
const A4_TWIPS: (u32, u32) = (11_906, 16_838);
const MARGIN_TWIPS: i32 = 1_440;

pub(crate) fn render(
    content: &FilteredResult,
    images: &[LoadedImage],
) -> Result<Vec<u8>, ReportError> {
    let mut docx = Docx::new()
        .page_size(A4_TWIPS.0, A4_TWIPS.1)
        .page_margin(
            PageMargin::new()
                .top(MARGIN_TWIPS)
                .right(MARGIN_TWIPS)
                .bottom(MARGIN_TWIPS)
                .left(MARGIN_TWIPS),
        )
        .add_style(
            Style::new("Title", StyleType::Paragraph)
                .name("Title")
                .size(56),
        )
        .add_paragraph(
            Paragraph::new()
                .style("Title")
                .add_run(Run::new().add_text(TITLE)),
        );

    for line in content.lines() {
        docx = docx.add_paragraph(paragraph(line));
    }

    for image in images {
        let (cx, cy) = picture_size(image);
        let pic = Pic::new(&image.png_bytes()?).size(cx, cy);
        docx = docx
            .add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)))
            .add_paragraph(Paragraph::new().add_run(Run::new().add_image(pic)));
    }

    let mut out = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut out)
        .map_err(|e| ReportError::Docx(e.to_string()))?;
    Ok(out.into_inner())
}

fn paragraph(line: &str) -> Paragraph {
    let text = xml_text(line);
    if text.is_empty() {
        return Paragraph::new();
    }
    Paragraph::new().add_run(Run::new().add_text(text))
}

/// Drop characters XML 1.0 cannot carry
fn xml_text(line: &str) -> String {
    line.chars()
        .filter(|&c| {
            matches!(c, '\t' | '\n' | '\r')
                || (c >= '\u{20}' && c != '\u{FFFE}' && c != '\u{FFFF}')
        })
        .collect()
}

/// Extent in EMU: fixed width, height keeps the aspect ratio
fn picture_size(image: &LoadedImage) -> (u32, u32) {
    let cy = IMAGE_WIDTH_EMU as u64 * image.height() as u64 / image.width() as u64;
    (IMAGE_WIDTH_EMU, u32::try_from(cy).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::load_images;
    use crate::test_support::png_asset;
    use pretty_assertions::assert_eq;
    use std::io::Read;
    use zip::ZipArchive;

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut xml = String::new();
        part.read_to_string(&mut xml).unwrap();
        xml
    }

    fn part_names(bytes: &[u8]) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        archive.file_names().map(str::to_string).collect()
    }

    /// Text of every `<w:t>` run, in document order
    fn runs(xml: &str) -> Vec<String> {
        xml.split("<w:t")
            .skip(1)
            .filter_map(|rest| {
                let start = rest.find('>')? + 1;
                let end = rest.find("</w:t>")?;
                Some(rest[start..end].to_string())
            })
            .collect()
    }

    #[test]
    fn test_package_has_document_and_styles() {
        let bytes = render(&FilteredResult::default(), &[]).unwrap();
        let names = part_names(&bytes);
        for part in ["[Content_Types].xml", "word/document.xml", "word/styles.xml"] {
            assert!(names.iter().any(|n| n == part), "missing {}", part);
        }
        let styles = read_part(&bytes, "word/styles.xml");
        assert!(styles.contains("w:styleId=\"Title\""));
    }

    #[test]
    fn test_title_then_one_paragraph_per_line() {
        let content = FilteredResult::from_text("first\n\nthird");
        let xml = read_part(&render(&content, &[]).unwrap(), "word/document.xml");

        assert_eq!(runs(&xml), vec!["Extracted Report", "first", "third"]);
        assert!(xml.contains("w:val=\"Title\""));
        // Title, two text lines and the empty line between them
        assert_eq!(xml.matches("</w:p>").count() + xml.matches("<w:p />").count(), 4);
    }

    #[test]
    fn test_text_is_escaped_and_cleaned() {
        let content = FilteredResult::from_text("a < b & c\u{1}");
        let xml = read_part(&render(&content, &[]).unwrap(), "word/document.xml");
        assert!(xml.contains("a &lt; b &amp; c"));
        assert!(!xml.contains('\u{1}'));
    }

    #[test]
    fn test_images_follow_page_breaks() {
        let dir = tempfile::tempdir().unwrap();
        let (images, _) = load_images(&[
            png_asset(dir.path(), 1, 1, 4, 2),
            png_asset(dir.path(), 1, 2, 2, 2),
        ]);
        let bytes = render(&FilteredResult::from_text("text"), &images).unwrap();

        let media = part_names(&bytes)
            .into_iter()
            .filter(|n| n.starts_with("word/media/"))
            .count();
        assert_eq!(media, 2);

        let xml = read_part(&bytes, "word/document.xml");
        assert_eq!(xml.matches("w:type=\"page\"").count(), 2);
        assert!(xml.contains("cx=\"5486400\" cy=\"2743200\""));
        assert!(xml.contains("cx=\"5486400\" cy=\"5486400\""));
        let text = xml.find(">text<").unwrap();
        let first_break = xml.find("w:type=\"page\"").unwrap();
        assert!(text < first_break);
    }

    #[test]
    fn test_picture_size_keeps_aspect() {
        let dir = tempfile::tempdir().unwrap();
        let (images, _) = load_images(&[png_asset(dir.path(), 1, 1, 10, 5)]);
        assert_eq!(picture_size(&images[0]), (5_486_400, 2_743_200));
    }
}
