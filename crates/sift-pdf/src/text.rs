//! Page text extraction

use std::collections::BTreeMap;

use lopdf::{Document, ObjectId};
use sift_types::PageWarning;
use tracing::{debug, warn};

/// Concatenate the text of every page in document order.
///
/// Each page's own line breaks are kept. A page boundary always starts a new
/// line so the last line of one page never merges with the first line of the
/// next. Pages that fail contribute nothing and leave a warning.
pub fn extract_pages(
    doc: &Document,
    pages: &BTreeMap<u32, ObjectId>,
    warnings: &mut Vec<PageWarning>,
) -> String {
    let mut page_texts = Vec::with_capacity(pages.len());

    for &page_num in pages.keys() {
        match doc.extract_text(&[page_num]) {
            Ok(text) => page_texts.push(text),
            Err(e) => {
                warn!("Page {} text unreadable: {}", page_num, e);
                warnings.push(PageWarning::Text {
                    page: page_num,
                    reason: e.to_string(),
                });
                page_texts.push(String::new());
            }
        }
    }

    join_pages(&page_texts)
}

/// Join per-page text, inserting a line break at page boundaries when the
/// previous page did not end with one
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    let mut out = String::new();
    for page in pages {
        let page = page.as_ref();
        if page.is_empty() {
            continue;
        }
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(page);
    }
    out
}

/// Whole-document pass with pdf-extract, which understands more font
/// encodings than lopdf's per-page extractor
pub fn extract_whole_document(bytes: &[u8]) -> Option<String> {
    match pdf_extract::extract_text_from_mem(bytes) {
        Ok(text) if !text.trim().is_empty() => Some(text),
        Ok(_) => None,
        Err(e) => {
            debug!("pdf-extract fallback failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{build_pdf, PageImages};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_join_pages_breaks_between_pages() {
        assert_eq!(join_pages(&["one", "two\n", "three"]), "one\ntwo\nthree");
    }

    #[test]
    fn test_join_pages_skips_empty_pages() {
        assert_eq!(join_pages(&["", "a\n", "", "b"]), "a\nb");
        assert_eq!(join_pages::<&str>(&[]), "");
    }

    #[test]
    fn test_extract_pages_reads_every_page() {
        let pdf = build_pdf(vec![
            (vec!["first page", "second line"], PageImages::None),
            (vec!["last page"], PageImages::None),
        ]);
        let doc = Document::load_mem(&pdf).unwrap();
        let mut warnings = Vec::new();
        let text = extract_pages(&doc, &doc.get_pages(), &mut warnings);

        assert!(warnings.is_empty());
        assert!(text.contains("first page"));
        assert!(text.contains("last page"));
    }

    #[test]
    fn test_empty_document_has_no_text() {
        let pdf = build_pdf(vec![(vec![], PageImages::None)]);
        let doc = Document::load_mem(&pdf).unwrap();
        let mut warnings = Vec::new();
        let text = extract_pages(&doc, &doc.get_pages(), &mut warnings);
        assert!(text.trim().is_empty());
    }

    proptest! {
        /// Joining never reorders or drops page content
        #[test]
        fn join_preserves_page_order(pages in proptest::collection::vec("[a-z ]{0,12}", 0..6)) {
            let joined = join_pages(&pages);
            let mut cursor = 0;
            for page in pages.iter().filter(|p| !p.is_empty()) {
                let found = joined[cursor..].find(page.as_str());
                prop_assert!(found.is_some(), "page {:?} missing from {:?}", page, joined);
                cursor += found.unwrap() + page.len();
            }
        }
    }
}
