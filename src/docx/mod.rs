// Word (DOCX) documents: paragraph text extraction and run highlighting
pub mod highlight;
pub mod model;
pub mod package;

use serde::Serialize;

use crate::types::{DocmarkError, DocumentFormat, ExtractedDocument, Result, StructuralUnit};
use model::DocumentXml;

pub use highlight::highlight;
pub use package::blank_docx;

/// A run's text and whether it already carries a highlight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextRun {
    pub text: String,
    pub highlighted: bool,
}

/// One paragraph of the main document part, tables included.
#[derive(Debug, Clone, Serialize)]
pub struct ParagraphUnit {
    /// Position among all paragraphs of the body.
    pub index: usize,
    pub text: String,
    pub runs: Vec<TextRun>,
}

impl ParagraphUnit {
    /// Concatenated text of the highlighted runs.
    pub fn highlighted_text(&self) -> String {
        self.runs
            .iter()
            .filter(|run| run.highlighted)
            .map(|run| run.text.as_str())
            .collect()
    }
}

/// Paragraph texts joined with newlines; zero bytes give an empty document.
pub fn extract(bytes: &[u8]) -> Result<ExtractedDocument> {
    if bytes.is_empty() {
        return Ok(ExtractedDocument::empty(DocumentFormat::Docx));
    }
    let paragraphs = read_paragraphs(bytes)?;
    tracing::debug!("extracted {} paragraph(s)", paragraphs.len());
    let flat_text = paragraphs
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    Ok(ExtractedDocument {
        format: DocumentFormat::Docx,
        flat_text,
        units: paragraphs.into_iter().map(StructuralUnit::Paragraph).collect(),
    })
}

pub fn read_paragraphs(bytes: &[u8]) -> Result<Vec<ParagraphUnit>> {
    let xml = package::read_part(bytes, package::DOCUMENT_PART, DocumentFormat::Docx)?.ok_or_else(
        || DocmarkError::malformed(DocumentFormat::Docx, format!("{} is missing", package::DOCUMENT_PART)),
    )?;
    let document = DocumentXml::parse(&xml)?;
    Ok(document
        .paragraphs()
        .enumerate()
        .map(|(index, paragraph)| ParagraphUnit {
            index,
            text: paragraph.text(),
            runs: paragraph
                .runs()
                .into_iter()
                .map(|run| TextRun {
                    text: run.text(),
                    highlighted: run.is_highlighted(),
                })
                .collect(),
        })
        .collect())
}
