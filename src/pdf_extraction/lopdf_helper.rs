// lopdf helper - object lookups shared by extraction and highlighting
use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::types::{DocmarkError, DocumentFormat, Rect, Result};

/// US Letter, used when a page carries no usable MediaBox.
pub const LETTER: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Load a PDF from memory, mapping parser failures to a malformed-document error
pub fn load_pdf(bytes: &[u8]) -> Result<Document> {
    Document::load_mem(bytes).map_err(|e| DocmarkError::malformed(DocumentFormat::Pdf, e))
}

/// Serialize the document back to bytes
pub fn save_pdf(document: &mut Document) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    document
        .save_to(&mut out)
        .map_err(|e| DocmarkError::malformed(DocumentFormat::Pdf, e))?;
    Ok(out)
}

/// Follow references until a direct object is reached
pub fn resolve<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Object> {
    let mut current = object;
    // bounded, reference cycles are possible in broken files
    for _ in 0..16 {
        match current {
            Object::Reference(id) => current = document.get_object(*id).ok()?,
            other => return Some(other),
        }
    }
    None
}

pub fn resolve_dict<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    match resolve(document, object)? {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

pub fn dict_get<'a>(document: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().and_then(|obj| resolve(document, obj))
}

pub fn as_number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(f) => Some(*f),
        _ => None,
    }
}

// Helper to get numeric value from dictionary
pub fn get_number(document: &Document, dict: &Dictionary, key: &[u8]) -> Option<f32> {
    dict_get(document, dict, key).and_then(as_number)
}

pub fn get_name<'a>(document: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
    match dict_get(document, dict, key)? {
        Object::Name(name) => Some(name.as_slice()),
        _ => None,
    }
}

pub fn number_array(document: &Document, object: &Object) -> Vec<f32> {
    match resolve(document, object) {
        Some(Object::Array(items)) => items
            .iter()
            .filter_map(|item| resolve(document, item).and_then(as_number))
            .collect(),
        _ => Vec::new(),
    }
}

// Page attribute, inherited through the Pages tree when absent on the page
fn inherited<'a>(document: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut current = page;
    for _ in 0..32 {
        if let Some(value) = dict_get(document, current, key) {
            return Some(value);
        }
        current = dict_get(document, current, b"Parent").and_then(|p| match p {
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        })?;
    }
    None
}

/// Page MediaBox, defaulting to Letter
pub fn media_box(document: &Document, page: &Dictionary) -> Rect {
    let bounds = inherited(document, page, b"MediaBox")
        .map(|obj| number_array(document, obj))
        .unwrap_or_default();
    if bounds.len() == 4 {
        Rect::new(bounds[0], bounds[1], bounds[2], bounds[3])
    } else {
        Rect::new(LETTER[0], LETTER[1], LETTER[2], LETTER[3])
    }
}

pub fn page_resources<'a>(document: &'a Document, page: &'a Dictionary) -> Option<&'a Dictionary> {
    match inherited(document, page, b"Resources")? {
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// Stream bytes, decoded when the stream declares a filter
pub fn stream_data(stream: &lopdf::Stream) -> Option<Vec<u8>> {
    if stream.dict.has(b"Filter") {
        match stream.decompressed_content() {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::warn!("undecodable stream skipped: {}", e);
                None
            }
        }
    } else {
        Some(stream.content.clone())
    }
}

// Get content data from content object
pub fn get_content_data(document: &Document, contents: &Object) -> Vec<u8> {
    match contents {
        Object::Reference(r) => match document.get_object(*r) {
            Ok(obj) => get_content_data(document, obj),
            Err(_) => Vec::new(),
        },
        Object::Stream(stream) => stream_data(stream).unwrap_or_default(),
        Object::Array(arr) => {
            let mut data = Vec::new();
            for item in arr {
                data.extend_from_slice(&get_content_data(document, item));
                // streams in an array are concatenated as if separated by whitespace
                data.push(b'\n');
            }
            data
        }
        _ => Vec::new(),
    }
}

pub fn page_content(document: &Document, page_id: ObjectId) -> Vec<u8> {
    document
        .get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"Contents").ok())
        .map(|contents| get_content_data(document, contents))
        .unwrap_or_default()
}
