// Shared document builders for integration tests
#![allow(dead_code)]

use docmark::docx::package::{self, DOCUMENT_PART};
use docmark::DocumentFormat;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

pub const CATS_AND_DOGS: [&str; 3] = [
    "Sentence one is about cats.",
    "Sentence two is about dogs.",
    "Sentence three is about cats and dogs together.",
];

/// A Letter PDF with one page per entry, each line set in 12pt Helvetica.
pub fn pdf_with_pages(pages: &[&[&str]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("TL", vec![16.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
        ];
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                operations.push(Operation::new("T*", vec![]));
            }
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        }
        operations.push(Operation::new("ET", vec![]));
        let content = Content { operations }.encode().unwrap();
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(612), Object::Integer(792)],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// One page per sentence.
pub fn cats_and_dogs_pdf() -> Vec<u8> {
    let pages: Vec<[&str; 1]> = CATS_AND_DOGS.iter().map(|s| [*s]).collect();
    let refs: Vec<&[&str]> = pages.iter().map(|p| p.as_slice()).collect();
    pdf_with_pages(&refs)
}

/// A DOCX whose body is the given paragraphs, each a list of plain runs.
pub fn docx_with_paragraphs(paragraphs: &[&[&str]]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|runs| {
            let runs: String = runs
                .iter()
                .map(|text| format!(r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#, text))
                .collect();
            format!("<w:p>{}</w:p>", runs)
        })
        .collect();
    let document = package::document_xml(&body);
    package::write_package(&[(DOCUMENT_PART, document.as_str())], DocumentFormat::Docx).unwrap()
}

/// One paragraph per sentence.
pub fn cats_and_dogs_docx() -> Vec<u8> {
    let paragraphs: Vec<[&str; 1]> = CATS_AND_DOGS.iter().map(|s| [*s]).collect();
    let refs: Vec<&[&str]> = paragraphs.iter().map(|p| p.as_slice()).collect();
    docx_with_paragraphs(&refs)
}

/// A PPTX with one text box per slide.
pub fn pptx_with_slides(slides: &[&str]) -> Vec<u8> {
    let parts: Vec<(String, String)> = slides
        .iter()
        .enumerate()
        .map(|(i, text)| {
            (
                format!("ppt/slides/slide{}.xml", i + 1),
                format!(
                    r#"<p:sld xmlns:a="urn:a" xmlns:p="urn:p"><p:cSld><p:spTree><p:sp><p:txBody><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#,
                    text
                ),
            )
        })
        .collect();
    let refs: Vec<(&str, &str)> = parts.iter().map(|(n, c)| (n.as_str(), c.as_str())).collect();
    package::write_package(&refs, DocumentFormat::Pptx).unwrap()
}
