// Summary report rendering from a configurable template
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::config::ReportSettings;
use crate::nlp::Summary;

/// Shown in place of a summary when the document had too little text.
pub const NO_TEXT_MESSAGE: &str = "No text found.";

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{(label|count|summary|bullets)\}")
        .unwrap_or_else(|e| panic!("placeholder pattern: {}", e))
});

/// Fills `{label}`, `{count}`, `{summary}` and `{bullets}` in one pass, so text inside
/// the sentences is never expanded again.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    template: String,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new(&ReportSettings::default())
    }
}

impl ReportBuilder {
    pub fn new(settings: &ReportSettings) -> Self {
        Self::with_template(&settings.template)
    }

    pub fn with_template(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    pub fn build(&self, summary: &Summary, label: &str) -> String {
        let sentences = summary.sentences();
        let body = if summary.is_insufficient() {
            NO_TEXT_MESSAGE.to_string()
        } else {
            sentences.join(" ")
        };
        let bullets = if summary.is_insufficient() {
            NO_TEXT_MESSAGE.to_string()
        } else {
            sentences
                .iter()
                .map(|s| format!("- {}", s))
                .collect::<Vec<_>>()
                .join("\n")
        };

        PLACEHOLDER
            .replace_all(&self.template, |caps: &Captures| match &caps[1] {
                "label" => label.to_string(),
                "count" => sentences.len().to_string(),
                "summary" => body.clone(),
                _ => bullets.clone(),
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two() -> Summary {
        Summary::Sentences(vec![
            "Cats sleep a lot.".to_string(),
            "Dogs {label} bark.".to_string(),
        ])
    }

    #[test]
    fn test_default_template_joins_with_space() {
        let report = ReportBuilder::default().build(&two(), "PDF document");
        assert_eq!(report, "Cats sleep a lot. Dogs {label} bark.");
    }

    #[test]
    fn test_all_placeholders() {
        let builder = ReportBuilder::with_template("{label} ({count}):\n{bullets}");
        assert_eq!(
            builder.build(&two(), "Word document"),
            "Word document (2):\n- Cats sleep a lot.\n- Dogs {label} bark."
        );
    }

    #[test]
    fn test_insufficient_text_message() {
        let builder = ReportBuilder::with_template("{label}: {summary}");
        assert_eq!(
            builder.build(&Summary::InsufficientText, "document"),
            "document: No text found."
        );
        assert_eq!(
            ReportBuilder::with_template("{count}|{bullets}").build(&Summary::InsufficientText, "x"),
            "0|No text found."
        );
    }

    #[test]
    fn test_unknown_braces_left_alone() {
        let builder = ReportBuilder::with_template("{title} {summary}");
        assert_eq!(builder.build(&two(), "x"), "{title} Cats sleep a lot. Dogs {label} bark.");
    }
}
