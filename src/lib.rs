// docmark - extractive summaries highlighted in place in PDF and DOCX documents
pub mod config;
pub mod dispatch;
pub mod docx;
pub mod locate;
pub mod nlp;
pub mod pdf_extraction;
pub mod pipeline;
pub mod pptx;
pub mod report;
pub mod types;

pub use config::Settings;
pub use locate::LocateOptions;
pub use nlp::Summary;
pub use pipeline::{Pipeline, ProcessOutcome};
pub use report::ReportBuilder;
pub use types::{DocmarkError, DocumentFormat, ExtractedDocument, HighlightOutcome, Rect, Result, StructuralUnit};
