// Request pipeline: dispatch, extract, summarize, highlight, report
use serde::Serialize;

use crate::config::Settings;
use crate::dispatch::{route, Route};
use crate::locate::LocateOptions;
use crate::nlp::{self, LanguageResources, Summary};
use crate::report::ReportBuilder;
use crate::types::{DocumentFormat, ExtractedDocument, Result};

/// Result of one request. The document bytes are left out of the JSON form.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub format: DocumentFormat,
    pub summary: Summary,
    pub report: String,
    #[serde(skip)]
    pub document: Vec<u8>,
    pub mime_type: &'static str,
    pub marks: usize,
}

pub struct Pipeline {
    settings: Settings,
    resources: &'static LanguageResources,
    report: ReportBuilder,
}

impl Pipeline {
    /// Build a pipeline over the process-wide language resources.
    pub fn new(settings: Settings) -> Self {
        let report = ReportBuilder::new(&settings.report);
        Self {
            settings,
            resources: nlp::resources(),
            report,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn locate_options(&self) -> LocateOptions {
        LocateOptions {
            extend_to_sentence: self.settings.extend_to_sentence,
        }
    }

    /// Flat text and structural units of a document, by declared extension.
    pub fn extract(&self, bytes: &[u8], extension: &str) -> Result<ExtractedDocument> {
        (route(extension).extract)(bytes)
    }

    pub fn summarize_text(&self, text: &str, sentence_count: usize) -> Summary {
        nlp::summarize(text, sentence_count, self.settings.min_text_chars, self.resources)
    }

    pub fn process(&self, bytes: &[u8], extension: &str, sentence_count: usize) -> Result<ProcessOutcome> {
        let route = route(extension);
        let source = self.source_bytes(bytes, &route)?;

        let extracted = (route.extract)(&source)?;
        let summary = self.summarize_text(&extracted.flat_text, sentence_count);
        let outcome = (route.highlight)(&source, summary.sentences(), self.locate_options())?;
        let report = self.report.build(&summary, route.format.label());

        tracing::info!(
            format = %route.format,
            units = extracted.units.len(),
            sentences = summary.sentences().len(),
            marks = outcome.marks,
            "processed document"
        );
        Ok(ProcessOutcome {
            format: route.format,
            summary,
            report,
            document: outcome.bytes,
            mime_type: route.mime_type,
            marks: outcome.marks,
        })
    }

    // Zero bytes of a highlightable format become a blank but valid document
    fn source_bytes(&self, bytes: &[u8], route: &Route) -> Result<Vec<u8>> {
        match route.blank {
            Some(blank) if bytes.is_empty() => {
                tracing::debug!("empty {} input, generating a blank document", route.format);
                blank()
            }
            _ => Ok(bytes.to_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OCTET_STREAM_MIME, PDF_MIME};

    #[test]
    fn test_zero_byte_pdf_yields_blank_document() {
        let pipeline = Pipeline::new(Settings::default());
        let outcome = pipeline.process(&[], "pdf", 3).unwrap();
        assert_eq!(outcome.summary, Summary::InsufficientText);
        assert_eq!(outcome.report, "No text found.");
        assert_eq!(outcome.mime_type, PDF_MIME);
        assert_eq!(outcome.marks, 0);
        assert!(outcome.document.starts_with(b"%PDF-"));
        assert_eq!(pipeline.extract(&outcome.document, "pdf").unwrap().units.len(), 1);
    }

    #[test]
    fn test_zero_byte_unsupported_stays_empty() {
        let pipeline = Pipeline::new(Settings::default());
        let outcome = pipeline.process(&[], "txt", 3).unwrap();
        assert!(outcome.document.is_empty());
        assert_eq!(outcome.mime_type, OCTET_STREAM_MIME);
    }

    #[test]
    fn test_outcome_json_omits_bytes() {
        let pipeline = Pipeline::new(Settings::default());
        let outcome = pipeline.process(b"plain", "txt", 1).unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["format"], "unsupported");
        assert_eq!(json["summary"]["kind"], "insufficient_text");
        assert!(json.get("document").is_none());
    }
}
