// Highlight annotations for PDF pages
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use super::lopdf_helper::{load_pdf, number_array, resolve, save_pdf};
use super::page_text::read_pages;
use crate::locate::LocateOptions;
use crate::types::{DocmarkError, DocumentFormat, HighlightOutcome, Rect, Result};

const YELLOW: [f32; 3] = [1.0, 1.0, 0.0];
// annotation flag: print
const PRINT_FLAG: i64 = 4;

/// Mark every occurrence of every sentence with a yellow highlight annotation.
///
/// Returns the input bytes unchanged when nothing matched.
pub fn highlight(bytes: &[u8], sentences: &[String], options: LocateOptions) -> Result<HighlightOutcome> {
    if sentences.is_empty() {
        return Ok(HighlightOutcome::passthrough(bytes));
    }
    let mut document = load_pdf(bytes)?;
    let pages = read_pages(&document);

    let mut marks = 0;
    for page in &pages {
        for sentence in sentences {
            let rects = page.find_rects(sentence, options);
            if rects.is_empty() {
                tracing::trace!("page {}: no match for {:?}", page.number, sentence);
                continue;
            }
            tracing::debug!("page {}: {} rect(s) for {:?}", page.number, rects.len(), sentence);
            for rect in rects {
                add_highlight(&mut document, page.page_id, rect)?;
                marks += 1;
            }
        }
    }

    if marks == 0 {
        return Ok(HighlightOutcome::passthrough(bytes));
    }
    Ok(HighlightOutcome {
        bytes: save_pdf(&mut document)?,
        marks,
    })
}

fn reals(values: &[f32]) -> Object {
    Object::Array(values.iter().map(|v| Object::Real(*v)).collect())
}

fn appearance(rect: Rect) -> Result<Stream> {
    let [r, g, b] = YELLOW;
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new("gs", vec![Object::Name(b"GS0".to_vec())]),
            Operation::new("rg", vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
            Operation::new(
                "re",
                vec![
                    Object::Real(rect.x0),
                    Object::Real(rect.y0),
                    Object::Real(rect.width()),
                    Object::Real(rect.height()),
                ],
            ),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ],
    };
    let data = content
        .encode()
        .map_err(|e| DocmarkError::malformed(DocumentFormat::Pdf, e))?;
    Ok(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => reals(&[rect.x0, rect.y0, rect.x1, rect.y1]),
            "Resources" => dictionary! {
                "ExtGState" => dictionary! {
                    "GS0" => dictionary! {
                        "Type" => "ExtGState",
                        "BM" => "Multiply",
                        "CA" => Object::Real(1.0),
                        "ca" => Object::Real(1.0),
                    },
                },
            },
        },
        data,
    ))
}

/// Create one highlight annotation and append it to the page's `/Annots`.
pub fn add_highlight(document: &mut Document, page_id: ObjectId, rect: Rect) -> Result<ObjectId> {
    let appearance_id = document.add_object(appearance(rect)?);
    let annotation: Dictionary = dictionary! {
        "Type" => "Annot",
        "Subtype" => "Highlight",
        "Rect" => reals(&[rect.x0, rect.y0, rect.x1, rect.y1]),
        "QuadPoints" => reals(&[rect.x0, rect.y1, rect.x1, rect.y1, rect.x0, rect.y0, rect.x1, rect.y0]),
        "C" => reals(&YELLOW),
        "F" => PRINT_FLAG,
        "P" => page_id,
        "AP" => dictionary! { "N" => appearance_id },
    };
    let annotation_id = document.add_object(annotation);

    let existing = document
        .get_dictionary(page_id)
        .map_err(|e| DocmarkError::malformed(DocumentFormat::Pdf, e))?
        .get(b"Annots")
        .ok()
        .cloned();

    let annots = match existing {
        Some(Object::Reference(array_id)) => {
            if let Ok(Object::Array(items)) = document.get_object_mut(array_id) {
                items.push(Object::Reference(annotation_id));
                return Ok(annotation_id);
            }
            // dangling reference, replaced by an inline array
            vec![Object::Reference(annotation_id)]
        }
        Some(Object::Array(mut items)) => {
            items.push(Object::Reference(annotation_id));
            items
        }
        _ => vec![Object::Reference(annotation_id)],
    };
    match document.get_object_mut(page_id) {
        Ok(Object::Dictionary(page)) => {
            page.set("Annots", Object::Array(annots));
            Ok(annotation_id)
        }
        _ => Err(DocmarkError::malformed(
            DocumentFormat::Pdf,
            format!("page {:?} is not a dictionary", page_id),
        )),
    }
}

/// Highlight annotations present in a PDF, as `(page number, rect)`.
pub fn read_highlights(bytes: &[u8]) -> Result<Vec<(u32, Rect)>> {
    let document = load_pdf(bytes)?;
    let mut found = Vec::new();
    for (number, page_id) in document.get_pages() {
        let annots = match document
            .get_dictionary(page_id)
            .ok()
            .and_then(|page| page.get(b"Annots").ok())
            .and_then(|annots| resolve(&document, annots))
        {
            Some(Object::Array(items)) => items.clone(),
            _ => continue,
        };
        for annot in &annots {
            let dict = match resolve(&document, annot) {
                Some(Object::Dictionary(dict)) => dict,
                _ => continue,
            };
            let is_highlight = matches!(dict.get(b"Subtype"), Ok(Object::Name(name)) if name == b"Highlight");
            if !is_highlight {
                continue;
            }
            if let Ok(rect) = dict.get(b"Rect") {
                if let [x0, y0, x1, y1] = number_array(&document, rect).as_slice() {
                    found.push((number, Rect::new(*x0, *y0, *x1, *y1)));
                }
            }
        }
    }
    Ok(found)
}
