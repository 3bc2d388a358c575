// Run-level highlighting for Word documents
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::collections::HashMap;
use std::ops::Range;

use super::model::{flatten, is_w, local_name, DocumentXml, Item, Node, Paragraph, Run, RunContent, XmlEvent};
use super::package::{read_part, replace_part, DOCUMENT_PART};
use crate::locate::{find_spans, CompactText, LocateOptions};
use crate::types::{DocmarkError, DocumentFormat, HighlightOutcome, Result};

pub const HIGHLIGHT_COLOR: &str = "yellow";

// rPr children that follow w:highlight in schema order
const AFTER_HIGHLIGHT: &[&[u8]] = &[
    b"u",
    b"effect",
    b"bdr",
    b"shd",
    b"fitText",
    b"vertAlign",
    b"rtl",
    b"cs",
    b"em",
    b"lang",
    b"eastAsianLayout",
    b"specVanish",
    b"oMath",
    b"rPrChange",
];

/// Highlight every occurrence of every sentence, splitting runs at match boundaries.
///
/// Returns the input bytes unchanged when nothing matched.
pub fn highlight(bytes: &[u8], sentences: &[String], options: LocateOptions) -> Result<HighlightOutcome> {
    if sentences.is_empty() {
        return Ok(HighlightOutcome::passthrough(bytes));
    }
    let xml = read_part(bytes, DOCUMENT_PART, DocumentFormat::Docx)?.ok_or_else(|| {
        DocmarkError::malformed(DocumentFormat::Docx, format!("{} is missing", DOCUMENT_PART))
    })?;
    let document = DocumentXml::parse(&xml)?;

    let mut ranges: HashMap<usize, Vec<Range<usize>>> = HashMap::new();
    let mut marks = 0;
    for (index, paragraph) in document.paragraphs().enumerate() {
        let text = paragraph.text();
        if text.trim().is_empty() {
            continue;
        }
        let compact = CompactText::from_text(&text);
        for sentence in sentences {
            let spans = find_spans(&compact, sentence, options);
            if spans.is_empty() {
                tracing::trace!("paragraph {}: no match for {:?}", index, sentence);
                continue;
            }
            for span in spans {
                let start = compact.origin(span.start);
                let end = compact.origin(span.end - 1) + 1;
                ranges.entry(index).or_default().push(start..end);
                marks += 1;
            }
        }
    }

    if marks == 0 {
        return Ok(HighlightOutcome::passthrough(bytes));
    }
    tracing::debug!("{} mark(s) across {} paragraph(s)", marks, ranges.len());
    let xml = write_document(&document, &ranges)?;
    Ok(HighlightOutcome {
        bytes: replace_part(bytes, DOCUMENT_PART, xml.as_bytes(), DocumentFormat::Docx)?,
        marks,
    })
}

fn write_error(e: impl std::fmt::Display) -> DocmarkError {
    DocmarkError::malformed(DocumentFormat::Docx, e)
}

/// Serialize the document, highlighting the given char ranges per paragraph index.
pub fn write_document(document: &DocumentXml, ranges: &HashMap<usize, Vec<Range<usize>>>) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    let mut paragraph_index = 0;
    for node in &document.nodes {
        match node {
            Node::Raw(event) => writer.write_event(event.clone()).map_err(write_error)?,
            Node::Paragraph(paragraph) => {
                let events = match ranges.get(&paragraph_index) {
                    Some(marked) => paragraph_events(paragraph, marked),
                    None => paragraph_raw(paragraph),
                };
                for event in events {
                    writer.write_event(event).map_err(write_error)?;
                }
                paragraph_index += 1;
            }
        }
    }
    let bytes = writer.into_inner();
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn paragraph_raw(paragraph: &Paragraph) -> Vec<XmlEvent> {
    let mut events = vec![paragraph.start.clone()];
    events.extend(flatten(&paragraph.items));
    events.extend(paragraph.end.iter().cloned());
    events
}

fn paragraph_events(paragraph: &Paragraph, marked: &[Range<usize>]) -> Vec<XmlEvent> {
    let mut events = vec![paragraph.start.clone()];
    let mut offset = 0;
    items_events(&paragraph.items, marked, &mut offset, &mut events);
    events.extend(paragraph.end.iter().cloned());
    events
}

fn items_events(items: &[Item], marked: &[Range<usize>], offset: &mut usize, out: &mut Vec<XmlEvent>) {
    for item in items {
        match item {
            Item::Run(run) => {
                let len = run.char_len();
                let local: Vec<Range<usize>> = marked
                    .iter()
                    .filter(|r| r.start < *offset + len && r.end > *offset)
                    .map(|r| r.start.saturating_sub(*offset)..(r.end - *offset).min(len))
                    .filter(|r| !r.is_empty())
                    .collect();
                if local.is_empty() {
                    out.extend(run.raw.iter().cloned());
                } else {
                    out.extend(split_run(run, &local));
                }
                *offset += len;
            }
            Item::Container { start, children, end } => {
                out.push(start.clone());
                items_events(children, marked, offset, out);
                out.push(end.clone());
            }
            Item::Other(events) => out.extend(events.iter().cloned()),
        }
    }
}

enum Piece {
    Text(String),
    Events(Vec<XmlEvent>),
}

/// Rewrite one run as consecutive runs so that exactly the chars inside `marked`
/// (run-local offsets) carry the highlight.
pub fn split_run(run: &Run, marked: &[Range<usize>]) -> Vec<XmlEvent> {
    let is_marked = |at: usize| marked.iter().any(|r| r.contains(&at));
    let mut segments: Vec<(bool, Vec<Piece>)> = Vec::new();
    let mut offset = 0;

    fn segment_for(segments: &mut Vec<(bool, Vec<Piece>)>, highlighted: bool) -> &mut Vec<Piece> {
        let start_new = match segments.last() {
            Some((current, _)) => *current != highlighted,
            None => true,
        };
        if start_new {
            segments.push((highlighted, Vec::new()));
        }
        let last = segments.len() - 1;
        &mut segments[last].1
    }

    for content in &run.contents {
        match content {
            RunContent::Text(text) => {
                for ch in text.chars() {
                    let pieces = segment_for(&mut segments, is_marked(offset));
                    match pieces.last_mut() {
                        Some(Piece::Text(current)) => current.push(ch),
                        _ => pieces.push(Piece::Text(ch.to_string())),
                    }
                    offset += 1;
                }
            }
            RunContent::Symbol { events, .. } => {
                segment_for(&mut segments, is_marked(offset)).push(Piece::Events(events.clone()));
                offset += 1;
            }
            RunContent::Other(events) => {
                // zero-width content stays with whatever precedes it
                let highlighted = match segments.last() {
                    Some((current, _)) => *current,
                    None => is_marked(offset),
                };
                segment_for(&mut segments, highlighted).push(Piece::Events(events.clone()));
            }
        }
    }

    let run_name = String::from_utf8_lossy(run.start.name().into_inner()).into_owned();
    let mut out = Vec::new();
    for (highlighted, pieces) in segments {
        out.push(Event::Start(run.start.clone()));
        if highlighted {
            out.extend(highlighted_props(run.props.as_deref()));
        } else if let Some(props) = &run.props {
            out.extend(props.iter().cloned());
        }
        for piece in pieces {
            match piece {
                Piece::Text(text) => out.extend(text_events(text)),
                Piece::Events(events) => out.extend(events),
            }
        }
        out.push(Event::End(BytesEnd::new(run_name.clone())));
    }
    out
}

fn text_events(text: String) -> Vec<XmlEvent> {
    let mut start = BytesStart::new("w:t");
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        start.push_attribute(("xml:space", "preserve"));
    }
    vec![
        Event::Start(start),
        Event::Text(BytesText::new(&text).into_owned()),
        Event::End(BytesEnd::new("w:t")),
    ]
}

fn highlight_event() -> XmlEvent {
    let mut start = BytesStart::new("w:highlight");
    start.push_attribute(("w:val", HIGHLIGHT_COLOR));
    Event::Empty(start)
}

/// Run properties with any existing highlight replaced by ours, in schema position.
pub fn highlighted_props(props: Option<&[XmlEvent]>) -> Vec<XmlEvent> {
    let (open, close, inner) = match props.unwrap_or(&[]) {
        [] => {
            return vec![
                Event::Start(BytesStart::new("w:rPr")),
                highlight_event(),
                Event::End(BytesEnd::new("w:rPr")),
            ]
        }
        [Event::Empty(start)] => {
            let name = String::from_utf8_lossy(start.name().into_inner()).into_owned();
            (Event::Start(start.clone()), Event::End(BytesEnd::new(name)), &[][..])
        }
        [single] => (single.clone(), Event::End(BytesEnd::new("w:rPr")), &[][..]),
        [open, inner @ .., close] => (open.clone(), close.clone(), inner),
    };

    // split the children into subtrees
    let mut children: Vec<&[XmlEvent]> = Vec::new();
    let mut i = 0;
    while i < inner.len() {
        let mut depth = 0usize;
        let begin = i;
        loop {
            match &inner[i] {
                Event::Start(_) => depth += 1,
                Event::End(_) => depth = depth.saturating_sub(1),
                _ => {}
            }
            i += 1;
            if depth == 0 || i >= inner.len() {
                break;
            }
        }
        children.push(&inner[begin..i]);
    }

    let mut out = vec![open];
    let mut inserted = false;
    for child in children {
        let name = child.first().and_then(local_name).unwrap_or_default();
        if name == b"highlight" {
            continue;
        }
        let is_element = matches!(child.first(), Some(Event::Start(_)) | Some(Event::Empty(_)));
        if !inserted && is_element && AFTER_HIGHLIGHT.iter().any(|after| is_w(name, after)) {
            out.push(highlight_event());
            inserted = true;
        }
        out.extend(child.iter().cloned());
    }
    if !inserted {
        out.push(highlight_event());
    }
    out.push(close);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(events: Vec<XmlEvent>) -> String {
        let mut writer = Writer::new(Vec::new());
        for event in events {
            writer.write_event(event).unwrap();
        }
        String::from_utf8(writer.into_inner()).unwrap()
    }

    fn first_run(xml: &str) -> Run {
        let doc = DocumentXml::parse(xml).unwrap();
        let paragraph = doc.paragraphs().next().unwrap().clone();
        paragraph.runs()[0].clone()
    }

    #[test]
    fn test_props_insert_in_schema_order() {
        let run = first_run(r#"<w:p><w:r><w:rPr><w:b/><w:u w:val="single"/><w:lang w:val="en-US"/></w:rPr><w:t>x</w:t></w:r></w:p>"#);
        let xml = render(highlighted_props(run.props.as_deref()));
        assert_eq!(
            xml,
            r#"<w:rPr><w:b/><w:highlight w:val="yellow"/><w:u w:val="single"/><w:lang w:val="en-US"/></w:rPr>"#
        );
    }

    #[test]
    fn test_existing_highlight_replaced() {
        let run = first_run(r#"<w:p><w:r><w:rPr><w:highlight w:val="green"/></w:rPr><w:t>x</w:t></w:r></w:p>"#);
        let xml = render(highlighted_props(run.props.as_deref()));
        assert_eq!(xml, r#"<w:rPr><w:highlight w:val="yellow"/></w:rPr>"#);
        assert_eq!(
            render(highlighted_props(None)),
            r#"<w:rPr><w:highlight w:val="yellow"/></w:rPr>"#
        );
    }

    #[test]
    fn test_split_run_marks_only_the_span() {
        let run = first_run(r#"<w:p><w:r w:rsidR="00A1"><w:rPr><w:i/></w:rPr><w:t>Intro. Cats are great.</w:t></w:r></w:p>"#);
        let xml = render(split_run(&run, &[7..22]));
        assert_eq!(
            xml,
            concat!(
                r#"<w:r w:rsidR="00A1"><w:rPr><w:i/></w:rPr><w:t xml:space="preserve">Intro. </w:t></w:r>"#,
                r#"<w:r w:rsidR="00A1"><w:rPr><w:i/><w:highlight w:val="yellow"/></w:rPr><w:t>Cats are great.</w:t></w:r>"#,
            )
        );
    }

    #[test]
    fn test_drawing_stays_in_place() {
        let run = first_run(r#"<w:p><w:r><w:t>ab</w:t><w:drawing><wp:inline/></w:drawing><w:t>cd</w:t></w:r></w:p>"#);
        let xml = render(split_run(&run, &[1..3]));
        assert_eq!(
            xml,
            concat!(
                r#"<w:r><w:t>a</w:t></w:r>"#,
                r#"<w:r><w:rPr><w:highlight w:val="yellow"/></w:rPr><w:t>b</w:t><w:drawing><wp:inline/></w:drawing><w:t>c</w:t></w:r>"#,
                r#"<w:r><w:t>d</w:t></w:r>"#,
            )
        );
    }

    #[test]
    fn test_ranges_cross_hyperlink_runs() {
        let xml = r#"<w:document><w:body><w:p><w:r><w:t>One two </w:t></w:r><w:hyperlink><w:r><w:t>three</w:t></w:r></w:hyperlink></w:p><w:p><w:r><w:t>untouched &amp; kept</w:t></w:r></w:p></w:body></w:document>"#;
        let doc = DocumentXml::parse(xml).unwrap();
        let mut ranges = HashMap::new();
        ranges.insert(0, vec![4..13]);
        let out = write_document(&doc, &ranges).unwrap();
        assert!(out.contains(concat!(
            r#"<w:r><w:t xml:space="preserve">One </w:t></w:r>"#,
            r#"<w:r><w:rPr><w:highlight w:val="yellow"/></w:rPr><w:t xml:space="preserve">two </w:t></w:r>"#,
        )));
        assert!(out.contains(r#"<w:hyperlink><w:r><w:rPr><w:highlight w:val="yellow"/></w:rPr><w:t>three</w:t></w:r></w:hyperlink>"#));
        assert!(out.contains(r#"<w:p><w:r><w:t>untouched &amp; kept</w:t></w:r></w:p>"#));

        let reread = DocumentXml::parse(&out).unwrap();
        let texts: Vec<String> = reread.paragraphs().map(|p| p.text()).collect();
        assert_eq!(texts, vec!["One two three", "untouched & kept"]);
    }
}
