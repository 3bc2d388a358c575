// PDF extraction module
pub mod cmap;
pub mod fonts;
pub mod glyphs;
pub mod highlight;
pub mod lopdf_helper;
pub mod page_text;
pub mod standard_fonts;

use lopdf::content::Content;
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

use crate::types::{DocmarkError, DocumentFormat, ExtractedDocument, Result, StructuralUnit};

pub use highlight::{highlight, read_highlights};
pub use page_text::{read_pages, PageUnit};

/// Separator between page texts in the flat text.
pub const PAGE_BREAK: char = '\u{000C}';

/// Extract page texts; zero bytes give an empty document.
pub fn extract(bytes: &[u8]) -> Result<ExtractedDocument> {
    if bytes.is_empty() {
        return Ok(ExtractedDocument::empty(DocumentFormat::Pdf));
    }
    let document = lopdf_helper::load_pdf(bytes)?;
    let pages = read_pages(&document);
    tracing::debug!("extracted {} page(s)", pages.len());

    let flat_text = pages
        .iter()
        .map(|page| page.text.as_str())
        .collect::<Vec<_>>()
        .join(&PAGE_BREAK.to_string());
    Ok(ExtractedDocument {
        format: DocumentFormat::Pdf,
        flat_text,
        units: pages.into_iter().map(StructuralUnit::Page).collect(),
    })
}

/// A valid one-page Letter PDF with no content.
pub fn blank_pdf() -> Result<Vec<u8>> {
    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();
    let content = Content { operations: vec![] }
        .encode()
        .map_err(|e| DocmarkError::malformed(DocumentFormat::Pdf, e))?;
    let content_id = document.add_object(Stream::new(Dictionary::new(), content));
    let [x0, y0, x1, y1] = lopdf_helper::LETTER;
    let page_id = document.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => Dictionary::new(),
        "MediaBox" => vec![Object::Real(x0), Object::Real(y0), Object::Real(x1), Object::Real(y1)],
    });
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);
    lopdf_helper::save_pdf(&mut document)
}
