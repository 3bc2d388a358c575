// Sentence re-location: prefix truncation and whitespace-insensitive matching
//
// Units hand in their text as a compact sequence (whitespace removed) where every char
// remembers where it came from (a glyph index for pages, a char offset for paragraphs).
// Matching runs on the compact form, so whitespace lost or invented during extraction
// never breaks a hit.

/// Fixed prefix length, in characters, searched for in every unit.
pub const PREFIX_CHARS: usize = 50;

/// Options for one highlight pass.
#[derive(Debug, Clone, Copy)]
pub struct LocateOptions {
    pub extend_to_sentence: bool,
}

impl Default for LocateOptions {
    fn default() -> Self {
        Self {
            extend_to_sentence: true,
        }
    }
}

/// A hit in compact coordinates: `start..end` indexes `CompactText::origin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Whitespace-free view of a unit's text.
#[derive(Debug, Clone, Default)]
pub struct CompactText {
    chars: Vec<char>,
    origin: Vec<usize>,
    // chars the matcher may step over (line-final hyphens)
    skippable: Vec<bool>,
}

impl CompactText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one char; whitespace is dropped.
    pub fn push(&mut self, ch: char, origin: usize) {
        self.push_with(ch, origin, false);
    }

    pub fn push_with(&mut self, ch: char, origin: usize, skippable: bool) {
        if ch.is_whitespace() || ch == '\u{00AD}' {
            return;
        }
        self.chars.push(ch);
        self.origin.push(origin);
        self.skippable.push(skippable);
    }

    pub fn from_text(text: &str) -> Self {
        let mut compact = Self::new();
        for (offset, ch) in text.chars().enumerate() {
            compact.push(ch, offset);
        }
        compact
    }

    /// Mark the last pushed char as one the matcher may skip.
    pub fn mark_last_skippable(&mut self) {
        if let Some(last) = self.skippable.last_mut() {
            *last = true;
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn origin(&self, index: usize) -> usize {
        self.origin[index]
    }

    pub fn origins(&self, span: Span) -> &[usize] {
        &self.origin[span.start..span.end]
    }

    // Match `needle` starting exactly at `at`; returns the end of the matched extent and
    // how much of the needle was consumed.
    fn match_at(&self, at: usize, needle: &[char], partial: bool) -> Option<(usize, usize)> {
        let mut h = at;
        let mut n = 0;
        let mut end = at;
        while n < needle.len() {
            if h >= self.chars.len() {
                break;
            }
            if self.chars[h] == needle[n] {
                h += 1;
                n += 1;
                end = h;
            } else if self.skippable[h] && n > 0 {
                h += 1;
            } else {
                break;
            }
        }
        if n == needle.len() || (partial && n > 0) {
            Some((end, n))
        } else {
            None
        }
    }
}

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `PREFIX_CHARS` characters of the whitespace-normalized sentence.
pub fn prefix(sentence: &str) -> String {
    normalize_whitespace(sentence)
        .chars()
        .take(PREFIX_CHARS)
        .collect()
}

fn compact_chars(text: &str) -> Vec<char> {
    text.chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{00AD}')
        .collect()
}

/// Every non-overlapping occurrence of the sentence prefix in `haystack`.
///
/// With `extend_to_sentence` a hit keeps growing past the prefix for as long as the
/// remaining sentence text matches, so the span covers as much of the sentence as the
/// unit holds.
pub fn find_spans(haystack: &CompactText, sentence: &str, options: LocateOptions) -> Vec<Span> {
    let needle = compact_chars(&prefix(sentence));
    if needle.is_empty() || haystack.len() < needle.len() {
        return Vec::new();
    }
    let full = compact_chars(sentence);

    let mut spans = Vec::new();
    let mut at = 0;
    while at + needle.len() <= haystack.len() {
        let hit = if haystack.chars[at] == needle[0] {
            haystack.match_at(at, &needle, false)
        } else {
            None
        };
        match hit {
            Some((prefix_end, _)) => {
                let mut end = prefix_end;
                if options.extend_to_sentence && full.len() > needle.len() {
                    if let Some((extended, _)) =
                        haystack.match_at(at, &full, true)
                    {
                        end = end.max(extended);
                    }
                }
                spans.push(Span { start: at, end });
                at = end;
            }
            None => at += 1,
        }
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_truncates_on_chars_not_bytes() {
        let sentence = "é".repeat(80);
        assert_eq!(prefix(&sentence).chars().count(), PREFIX_CHARS);
        assert_eq!(prefix("  short   one "), "short one");
    }

    #[test]
    fn test_whitespace_loss_still_matches() {
        let haystack = CompactText::from_text("Intro. Sentenceone is aboutcats. Outro.");
        let spans = find_spans(
            &haystack,
            "Sentence one is about cats.",
            LocateOptions::default(),
        );
        assert_eq!(spans.len(), 1);
        let origins = haystack.origins(spans[0]);
        assert_eq!(origins[0], 7);
    }

    #[test]
    fn test_prefix_only_versus_extended() {
        let body = "a".repeat(60);
        let text = format!("{} tail", body);
        let haystack = CompactText::from_text(&text);
        let sentence = format!("{} tail", body);

        let prefix_only = find_spans(
            &haystack,
            &sentence,
            LocateOptions {
                extend_to_sentence: false,
            },
        );
        assert_eq!(prefix_only, vec![Span { start: 0, end: PREFIX_CHARS }]);

        let extended = find_spans(&haystack, &sentence, LocateOptions::default());
        assert_eq!(extended, vec![Span { start: 0, end: 64 }]);
    }

    #[test]
    fn test_extension_stops_at_divergence() {
        let haystack = CompactText::from_text("The cat sat on the mat. Then left.");
        let spans = find_spans(
            &haystack,
            "The cat sat on the hat.",
            LocateOptions::default(),
        );
        // prefix is the whole sentence here, so nothing matches
        assert!(spans.is_empty());
    }

    #[test]
    fn test_every_occurrence_is_reported() {
        let haystack = CompactText::from_text("Buy now. Buy now. Buy later.");
        let spans = find_spans(&haystack, "Buy now.", LocateOptions::default());
        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn test_line_final_hyphen_is_skipped() {
        let mut haystack = CompactText::new();
        for (i, ch) in "exam-".chars().enumerate() {
            haystack.push(ch, i);
        }
        haystack.mark_last_skippable();
        for (i, ch) in "ple text".chars().enumerate() {
            haystack.push(ch, 10 + i);
        }
        let spans = find_spans(&haystack, "example text", LocateOptions::default());
        assert_eq!(spans.len(), 1);
        assert_eq!(haystack.origins(spans[0]).last(), Some(&17));
    }

    #[test]
    fn test_blank_sentence_never_matches() {
        let haystack = CompactText::from_text("anything");
        assert!(find_spans(&haystack, "   ", LocateOptions::default()).is_empty());
    }
}
