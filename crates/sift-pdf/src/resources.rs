//! Lookup helpers for page resource dictionaries

use lopdf::{Dictionary, Document, Object, ObjectId};

/// Page trees deeper than this are treated as malformed
const MAX_TREE_DEPTH: usize = 32;

/// Follow a reference if `obj` is one
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object, String> {
    match obj {
        Object::Reference(id) => doc
            .get_object(*id)
            .map_err(|e| format!("object {} {} R: {}", id.0, id.1, e)),
        other => Ok(other),
    }
}

/// The page's `/Resources`, inherited from the nearest ancestor when the page
/// itself has none
pub(crate) fn page_resources(doc: &Document, page_id: ObjectId) -> Result<&Dictionary, String> {
    let mut node = doc
        .get_dictionary(page_id)
        .map_err(|e| format!("page object unreadable: {}", e))?;

    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(resources) = node.get(b"Resources") {
            return resolve(doc, resources)?
                .as_dict()
                .map_err(|_| "Resources is not a dictionary".to_string());
        }

        let parent = match node.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => parent,
            Err(_) => return Err("no Resources on page or its ancestors".to_string()),
        };
        node = doc
            .get_dictionary(parent)
            .map_err(|e| format!("parent node unreadable: {}", e))?;
    }

    Err("page tree too deep".to_string())
}

/// Integer entry of a dictionary, following references
pub(crate) fn dict_integer(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<i64> {
    dict.get(key)
        .ok()
        .and_then(|obj| resolve(doc, obj).ok())
        .and_then(|obj| obj.as_i64().ok())
}

/// Names listed under `/Filter`, which may be a single name or an array
pub(crate) fn filter_names(doc: &Document, dict: &Dictionary) -> Vec<Vec<u8>> {
    let Some(filter) = dict.get(b"Filter").ok().and_then(|f| resolve(doc, f).ok()) else {
        return Vec::new();
    };
    match filter {
        Object::Name(name) => vec![name.clone()],
        Object::Array(items) => items
            .iter()
            .filter_map(|item| resolve(doc, item).ok())
            .filter_map(|item| item.as_name().ok())
            .map(<[u8]>::to_vec)
            .collect(),
        _ => Vec::new(),
    }
}
