// Core types and errors for docmark
use serde::Serialize;
use std::fmt;

use crate::docx::ParagraphUnit;
use crate::pdf_extraction::PageUnit;
use crate::pptx::SlideUnit;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const PPTX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";
pub const OCTET_STREAM_MIME: &str = "application/octet-stream";

/// Document formats known to the router.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Pptx,
    Unsupported,
}

impl DocumentFormat {
    /// Resolve a declared extension ("pdf", ".PDF", "report.docx" style suffixes are not
    /// parsed here, pass the extension only).
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "pdf" => DocumentFormat::Pdf,
            "docx" => DocumentFormat::Docx,
            "pptx" => DocumentFormat::Pptx,
            _ => DocumentFormat::Unsupported,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => PDF_MIME,
            DocumentFormat::Docx => DOCX_MIME,
            DocumentFormat::Pptx => PPTX_MIME,
            DocumentFormat::Unsupported => OCTET_STREAM_MIME,
        }
    }

    /// Short classification used by the report templates.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "PDF document",
            DocumentFormat::Docx => "Word document",
            DocumentFormat::Pptx => "PowerPoint presentation",
            DocumentFormat::Unsupported => "document",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Pptx => "pptx",
            DocumentFormat::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

/// Axis-aligned rectangle in PDF user space (origin bottom-left).
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Bounding box of a transformed quad.
    pub fn from_corners(corners: [(f32, f32); 4]) -> Self {
        let (x, y) = corners[0];
        let mut rect = Rect::new(x, y, x, y);
        for &(x, y) in &corners[1..] {
            rect.x0 = rect.x0.min(x);
            rect.y0 = rect.y0.min(y);
            rect.x1 = rect.x1.max(x);
            rect.y1 = rect.y1.max(y);
        }
        rect
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

/// A page, paragraph or slide of the source document.
#[derive(Debug, Clone)]
pub enum StructuralUnit {
    Page(PageUnit),
    Paragraph(ParagraphUnit),
    Slide(SlideUnit),
}

impl StructuralUnit {
    pub fn text(&self) -> &str {
        match self {
            StructuralUnit::Page(page) => &page.text,
            StructuralUnit::Paragraph(paragraph) => &paragraph.text,
            StructuralUnit::Slide(slide) => &slide.text,
        }
    }
}

/// Flat text for the summarizer plus the structural index kept for re-matching.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub format: DocumentFormat,
    pub flat_text: String,
    pub units: Vec<StructuralUnit>,
}

impl ExtractedDocument {
    pub fn empty(format: DocumentFormat) -> Self {
        Self {
            format,
            flat_text: String::new(),
            units: Vec::new(),
        }
    }
}

/// Highlighted bytes plus the number of marks that went in.
#[derive(Debug, Clone)]
pub struct HighlightOutcome {
    pub bytes: Vec<u8>,
    pub marks: usize,
}

impl HighlightOutcome {
    pub fn passthrough(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            marks: 0,
        }
    }
}

// Error types
#[derive(Debug, thiserror::Error)]
pub enum DocmarkError {
    #[error("malformed {format} document: {reason}")]
    MalformedDocument {
        format: DocumentFormat,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocmarkError {
    pub fn malformed(format: DocumentFormat, reason: impl fmt::Display) -> Self {
        DocmarkError::MalformedDocument {
            format,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DocmarkError>;
