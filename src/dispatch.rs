// Format routing: extension to extractor, highlighter and MIME type
use crate::locate::LocateOptions;
use crate::types::{DocumentFormat, ExtractedDocument, HighlightOutcome, Result, OCTET_STREAM_MIME};
use crate::{docx, pdf_extraction, pptx};

pub type Extractor = fn(&[u8]) -> Result<ExtractedDocument>;
pub type Highlighter = fn(&[u8], &[String], LocateOptions) -> Result<HighlightOutcome>;
pub type BlankDocument = fn() -> Result<Vec<u8>>;

/// Everything the pipeline needs to handle one format.
#[derive(Clone, Copy)]
pub struct Route {
    pub format: DocumentFormat,
    pub extract: Extractor,
    pub highlight: Highlighter,
    /// Generator for a valid empty document, for formats that can be highlighted.
    pub blank: Option<BlankDocument>,
    pub mime_type: &'static str,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("format", &self.format)
            .field("mime_type", &self.mime_type)
            .field("blank", &self.blank.is_some())
            .finish()
    }
}

/// Route for a declared extension. Unknown extensions get the pass-through route.
pub fn route(extension: &str) -> Route {
    route_for(DocumentFormat::from_extension(extension))
}

pub fn route_for(format: DocumentFormat) -> Route {
    match format {
        DocumentFormat::Pdf => Route {
            format,
            extract: pdf_extraction::extract,
            highlight: pdf_extraction::highlight,
            blank: Some(pdf_extraction::blank_pdf),
            mime_type: format.mime_type(),
        },
        DocumentFormat::Docx => Route {
            format,
            extract: docx::extract,
            highlight: docx::highlight,
            blank: Some(docx::blank_docx),
            mime_type: format.mime_type(),
        },
        DocumentFormat::Pptx => Route {
            format,
            extract: pptx::extract,
            highlight: passthrough,
            blank: None,
            // returned untouched, so labelled as opaque bytes
            mime_type: OCTET_STREAM_MIME,
        },
        DocumentFormat::Unsupported => Route {
            format,
            extract: no_text,
            highlight: passthrough,
            blank: None,
            mime_type: format.mime_type(),
        },
    }
}

fn passthrough(bytes: &[u8], _sentences: &[String], _options: LocateOptions) -> Result<HighlightOutcome> {
    Ok(HighlightOutcome::passthrough(bytes))
}

fn no_text(_bytes: &[u8]) -> Result<ExtractedDocument> {
    Ok(ExtractedDocument::empty(DocumentFormat::Unsupported))
}
