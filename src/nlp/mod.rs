// Extractive summarization: sentence splitting plus LSA ranking
pub mod lsa;
pub mod resources;
pub mod sentences;

use serde::Serialize;

pub use lsa::{LsaConfig, LsaSummarizer};
pub use resources::{provision, resources, LanguageResources};
pub use sentences::SentenceTokenizer;

/// Summarizer output for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "sentences", rename_all = "snake_case")]
pub enum Summary {
    Sentences(Vec<String>),
    /// Too little text to summarize; nothing is highlighted.
    InsufficientText,
}

impl Summary {
    /// Sentences to highlight; empty for `InsufficientText`.
    pub fn sentences(&self) -> &[String] {
        match self {
            Summary::Sentences(sentences) => sentences,
            Summary::InsufficientText => &[],
        }
    }

    pub fn is_insufficient(&self) -> bool {
        matches!(self, Summary::InsufficientText)
    }
}

/// Summarize flat document text into at most `count` sentences (at least one is asked for).
///
/// Text with fewer than `min_text_chars` non-whitespace characters, or with no sentence
/// in it after heading removal, yields `InsufficientText`.
pub fn summarize(
    text: &str,
    count: usize,
    min_text_chars: usize,
    resources: &LanguageResources,
) -> Summary {
    let count = count.max(1);
    let visible = text.chars().filter(|c| !c.is_whitespace()).count();
    if visible < min_text_chars {
        tracing::debug!("{} visible chars, below {}; skipping summary", visible, min_text_chars);
        return Summary::InsufficientText;
    }

    let sentences = SentenceTokenizer::new(resources).split(text);
    if sentences.is_empty() {
        return Summary::InsufficientText;
    }
    tracing::debug!("ranking {} sentences for {}", sentences.len(), count);
    Summary::Sentences(LsaSummarizer::new(resources).select(&sentences, count))
}
