// Rule-based sentence tokenizer
use super::resources::LanguageResources;

const TERMINATORS: [char; 3] = ['.', '!', '?'];
const CLOSERS: [char; 7] = ['"', '\'', ')', ']', '\u{201D}', '\u{2019}', '}'];

pub struct SentenceTokenizer<'r> {
    resources: &'r LanguageResources,
}

impl<'r> SentenceTokenizer<'r> {
    pub fn new(resources: &'r LanguageResources) -> Self {
        Self { resources }
    }

    /// Split flat document text into sentences.
    ///
    /// Lines break on `\n`, `\r` and form feed; blank lines end a paragraph; lines written
    /// entirely in capitals are headings and are left out. Paragraph lines are joined with
    /// single spaces before splitting.
    pub fn split(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        for paragraph in paragraphs(text) {
            self.split_paragraph(&paragraph, &mut sentences);
        }
        sentences
    }

    fn split_paragraph(&self, paragraph: &str, out: &mut Vec<String>) {
        let chars: Vec<char> = paragraph.chars().collect();
        let mut start = 0;
        let mut i = 0;
        while i < chars.len() {
            if !TERMINATORS.contains(&chars[i]) {
                i += 1;
                continue;
            }
            let mut end = i + 1;
            while end < chars.len()
                && (TERMINATORS.contains(&chars[end]) || CLOSERS.contains(&chars[end]))
            {
                end += 1;
            }
            let at_boundary = end == chars.len() || chars[end].is_whitespace();
            if at_boundary && self.is_sentence_end(&chars, start, i, end) {
                push_sentence(&chars[start..end], out);
                start = end;
            }
            i = end;
        }
        if start < chars.len() {
            push_sentence(&chars[start..], out);
        }
    }

    // `dot` is the terminator position, `end` the first char after terminators/closers
    fn is_sentence_end(&self, chars: &[char], start: usize, dot: usize, end: usize) -> bool {
        if chars[dot] != '.' {
            return true;
        }
        let word_start = chars[start..dot]
            .iter()
            .rposition(|c| c.is_whitespace())
            .map(|p| start + p + 1)
            .unwrap_or(start);
        let word: String = chars[word_start..dot]
            .iter()
            .collect::<String>()
            .trim_start_matches(|c: char| !c.is_alphanumeric())
            .to_string();

        if !word.is_empty() && self.resources.is_abbreviation(&word) {
            return false;
        }
        // single initials like "J. Smith"
        if word.chars().count() == 1 && word.chars().all(char::is_alphabetic) {
            return false;
        }
        // next word starting lower case continues the sentence
        match chars[end..].iter().find(|c| !c.is_whitespace()) {
            Some(next) => !next.is_lowercase(),
            None => true,
        }
    }
}

fn push_sentence(chars: &[char], out: &mut Vec<String>) {
    let sentence: String = chars.iter().collect();
    let sentence = sentence.trim();
    if sentence.chars().any(char::is_alphanumeric) {
        out.push(sentence.to_string());
    }
}

fn is_heading(line: &str) -> bool {
    let mut letters = line.chars().filter(|c| c.is_alphabetic()).peekable();
    letters.peek().is_some() && letters.all(char::is_uppercase)
}

fn paragraphs(text: &str) -> Vec<String> {
    let text = text.replace("\r\n", "\n");
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.split(|c| c == '\n' || c == '\r' || c == '\u{000C}') {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(join_lines(&current));
                current.clear();
            }
            continue;
        }
        if is_heading(line) {
            continue;
        }
        current.push(line);
    }
    if !current.is_empty() {
        paragraphs.push(join_lines(&current));
    }
    paragraphs
}

fn join_lines(lines: &[&str]) -> String {
    crate::locate::normalize_whitespace(&lines.join(" "))
}
