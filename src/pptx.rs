// PowerPoint (PPTX) text extraction
//
// Slides are read for the summary only; presentations pass through the highlighter
// unchanged.
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use serde::Serialize;

use crate::docx::package;
use crate::types::{DocmarkError, DocumentFormat, ExtractedDocument, Result, StructuralUnit};

static SLIDE_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap_or_else(|e| panic!("slide pattern: {}", e))
});

#[derive(Debug, Clone, Serialize)]
pub struct SlideUnit {
    /// Number taken from the part name (`slide3.xml` is 3).
    pub number: u32,
    pub text: String,
}

/// Slide texts in slide order, joined with form feeds.
///
/// Presentations are never highlighted, so a package that cannot be read yields an
/// empty document instead of an error; zero bytes do the same.
pub fn extract(bytes: &[u8]) -> Result<ExtractedDocument> {
    if bytes.is_empty() {
        return Ok(ExtractedDocument::empty(DocumentFormat::Pptx));
    }
    let units = match read_slides(bytes) {
        Ok(units) => units,
        Err(e) => {
            tracing::warn!("unreadable presentation, no text extracted: {}", e);
            return Ok(ExtractedDocument::empty(DocumentFormat::Pptx));
        }
    };
    tracing::debug!("extracted {} slide(s)", units.len());

    let flat_text = units
        .iter()
        .map(|slide| slide.text.as_str())
        .collect::<Vec<_>>()
        .join("\u{000C}");
    Ok(ExtractedDocument {
        format: DocumentFormat::Pptx,
        flat_text,
        units: units.into_iter().map(StructuralUnit::Slide).collect(),
    })
}

fn read_slides(bytes: &[u8]) -> Result<Vec<SlideUnit>> {
    let mut slides: Vec<(u32, String)> = package::part_names(bytes, DocumentFormat::Pptx)?
        .into_iter()
        .filter_map(|name| {
            let number = SLIDE_PART.captures(&name)?.get(1)?.as_str().parse().ok()?;
            Some((number, name))
        })
        .collect();
    slides.sort_by_key(|(number, _)| *number);

    let mut units = Vec::with_capacity(slides.len());
    for (number, name) in slides {
        let xml = match package::read_part(bytes, &name, DocumentFormat::Pptx)? {
            Some(xml) => xml,
            None => continue,
        };
        units.push(SlideUnit {
            number,
            text: slide_text(&xml)?,
        });
    }
    Ok(units)
}

// DrawingML text: a:t runs, a:br breaks, one line per a:p
fn slide_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_paragraph = false;
    let mut in_text = false;
    loop {
        let event = reader
            .read_event()
            .map_err(|e| DocmarkError::malformed(DocumentFormat::Pptx, e))?;
        match event {
            Event::Start(e) if e.name().as_ref() == b"a:p" => {
                in_paragraph = true;
                current.clear();
            }
            Event::End(e) if e.name().as_ref() == b"a:p" => {
                in_paragraph = false;
                paragraphs.push(std::mem::take(&mut current));
            }
            Event::Empty(e) if e.name().as_ref() == b"a:br" && in_paragraph => current.push('\n'),
            Event::Start(e) if e.name().as_ref() == b"a:t" => in_text = true,
            Event::End(e) if e.name().as_ref() == b"a:t" => in_text = false,
            Event::Text(t) if in_text => match t.unescape() {
                Ok(text) => current.push_str(&text),
                Err(_) => current.push_str(&String::from_utf8_lossy(&t)),
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(paragraphs
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(body: &str) -> String {
        format!(
            r#"<p:sld xmlns:a="urn:a" xmlns:p="urn:p"><p:cSld><p:spTree><p:sp><p:txBody>{}</p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#,
            body
        )
    }

    #[test]
    fn test_slides_in_numeric_order() {
        let first = slide("<a:p><a:r><a:t>Opening slide.</a:t></a:r></a:p>");
        let tenth = slide("<a:p><a:r><a:t>Tenth</a:t></a:r><a:br/><a:r><a:t>slide &amp; end.</a:t></a:r></a:p>");
        let second = slide("<a:p><a:r><a:t>Second </a:t></a:r><a:r><a:t>slide.</a:t></a:r></a:p><a:p/>");
        let bytes = package::write_package(
            &[
                ("ppt/slides/slide10.xml", tenth.as_str()),
                ("ppt/slides/slide1.xml", first.as_str()),
                ("ppt/slides/slide2.xml", second.as_str()),
                ("ppt/slides/_rels/slide1.xml.rels", "<Relationships/>"),
            ],
            DocumentFormat::Pptx,
        )
        .unwrap();

        let doc = extract(&bytes).unwrap();
        assert_eq!(doc.units.len(), 3);
        assert_eq!(
            doc.flat_text,
            "Opening slide.\u{000C}Second slide.\u{000C}Tenth\nslide & end."
        );
    }

    #[test]
    fn test_empty_and_broken_input() {
        assert!(extract(&[]).unwrap().units.is_empty());

        let doc = extract(b"not a zip").unwrap();
        assert_eq!(doc.format, DocumentFormat::Pptx);
        assert!(doc.units.is_empty());
        assert!(doc.flat_text.is_empty());
    }

    #[test]
    fn test_malformed_slide_xml_gives_empty_document() {
        let bytes = package::write_package(
            &[("ppt/slides/slide1.xml", "<p:sld><a:p><a:t>Broken</a:p></p:sld>")],
            DocumentFormat::Pptx,
        )
        .unwrap();
        let doc = extract(&bytes).unwrap();
        assert!(doc.units.is_empty());
    }
}
