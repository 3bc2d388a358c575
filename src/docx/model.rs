// WordprocessingML paragraph model over quick-xml events
//
// The main part is kept as a flat event list. Only `w:p` subtrees are parsed into
// paragraphs, runs and run content; everything else is carried as raw events and
// written back byte-for-byte.
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::types::{DocmarkError, DocumentFormat, Result};

pub type XmlEvent = Event<'static>;

// Paragraph children whose runs count toward the paragraph text
const RUN_CONTAINERS: &[&[u8]] = &[
    b"hyperlink",
    b"ins",
    b"moveTo",
    b"smartTag",
    b"fldSimple",
    b"customXml",
    b"sdt",
    b"sdtContent",
];

/// `name` is `local` in the `w:` prefix or unprefixed.
pub fn is_w(name: &[u8], local: &[u8]) -> bool {
    name == local || (name.len() == local.len() + 2 && name.starts_with(b"w:") && &name[2..] == local)
}

pub fn local_name(event: &XmlEvent) -> Option<&[u8]> {
    match event {
        Event::Start(start) | Event::Empty(start) => Some(strip_prefix(start.name().into_inner())),
        Event::End(end) => Some(strip_prefix(end.name().into_inner())),
        _ => None,
    }
}

fn strip_prefix(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(colon) => &name[colon + 1..],
        None => name,
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Raw(XmlEvent),
    Paragraph(Paragraph),
}

#[derive(Debug, Clone)]
pub struct Paragraph {
    pub start: XmlEvent,
    pub items: Vec<Item>,
    /// `None` for `<w:p/>`.
    pub end: Option<XmlEvent>,
}

#[derive(Debug, Clone)]
pub enum Item {
    Run(Run),
    Container {
        start: XmlEvent,
        children: Vec<Item>,
        end: XmlEvent,
    },
    Other(Vec<XmlEvent>),
}

#[derive(Debug, Clone)]
pub struct Run {
    pub start: BytesStart<'static>,
    /// `w:rPr` subtree, when present.
    pub props: Option<Vec<XmlEvent>>,
    pub contents: Vec<RunContent>,
    /// The run exactly as read.
    pub raw: Vec<XmlEvent>,
}

#[derive(Debug, Clone)]
pub enum RunContent {
    Text(String),
    /// Tabs, breaks and non-breaking hyphens: one character of text each.
    Symbol { ch: char, events: Vec<XmlEvent> },
    /// Drawings, fields, footnote references: no text.
    Other(Vec<XmlEvent>),
}

impl RunContent {
    fn char_len(&self) -> usize {
        match self {
            RunContent::Text(text) => text.chars().count(),
            RunContent::Symbol { .. } => 1,
            RunContent::Other(_) => 0,
        }
    }
}

impl Run {
    pub fn text(&self) -> String {
        let mut text = String::new();
        for content in &self.contents {
            match content {
                RunContent::Text(value) => text.push_str(value),
                RunContent::Symbol { ch, .. } => text.push(*ch),
                RunContent::Other(_) => {}
            }
        }
        text
    }

    pub fn char_len(&self) -> usize {
        self.contents.iter().map(RunContent::char_len).sum()
    }

    /// Run properties already carry a highlight.
    pub fn is_highlighted(&self) -> bool {
        self.props.as_ref().map_or(false, |props| {
            props.iter().any(|event| match event {
                Event::Empty(start) | Event::Start(start) => is_w(start.name().into_inner(), b"highlight"),
                _ => false,
            })
        })
    }
}

impl Paragraph {
    /// Runs in document order, descending into hyperlinks and other containers.
    pub fn runs(&self) -> Vec<&Run> {
        fn walk<'a>(items: &'a [Item], out: &mut Vec<&'a Run>) {
            for item in items {
                match item {
                    Item::Run(run) => out.push(run),
                    Item::Container { children, .. } => walk(children, out),
                    Item::Other(_) => {}
                }
            }
        }
        let mut runs = Vec::new();
        walk(&self.items, &mut runs);
        runs
    }

    pub fn text(&self) -> String {
        self.runs().iter().map(|run| run.text()).collect()
    }
}

/// The main document part, split into raw events and paragraphs.
#[derive(Debug, Clone)]
pub struct DocumentXml {
    pub nodes: Vec<Node>,
}

impl DocumentXml {
    pub fn parse(xml: &str) -> Result<Self> {
        let events = read_events(xml)?;
        let mut cursor = Cursor { events, pos: 0 };
        let mut nodes = Vec::new();
        while let Some(event) = cursor.peek() {
            let is_paragraph = match event {
                Event::Start(start) | Event::Empty(start) => is_w(start.name().into_inner(), b"p"),
                _ => false,
            };
            if is_paragraph {
                nodes.push(Node::Paragraph(cursor.paragraph()));
            } else if let Some(event) = cursor.next() {
                nodes.push(Node::Raw(event));
            }
        }
        Ok(Self { nodes })
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Paragraph(paragraph) => Some(paragraph),
            Node::Raw(_) => None,
        })
    }
}

fn read_events(xml: &str) -> Result<Vec<XmlEvent>> {
    let mut reader = Reader::from_str(xml);
    let mut events = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(event) => events.push(event.into_owned()),
            Err(e) => {
                return Err(DocmarkError::malformed(
                    DocumentFormat::Docx,
                    format!("XML error at byte {}: {}", reader.buffer_position(), e),
                ))
            }
        }
    }
    Ok(events)
}

struct Cursor {
    events: Vec<XmlEvent>,
    pos: usize,
}

impl Cursor {
    fn peek(&self) -> Option<&XmlEvent> {
        self.events.get(self.pos)
    }

    fn next(&mut self) -> Option<XmlEvent> {
        let event = self.events.get(self.pos).cloned();
        if event.is_some() {
            self.pos += 1;
        }
        event
    }

    // The current event and, for a start tag, everything up to its end tag
    fn subtree(&mut self) -> Vec<XmlEvent> {
        let mut out = Vec::new();
        let mut depth = 0usize;
        while let Some(event) = self.next() {
            match &event {
                Event::Start(_) => depth += 1,
                Event::End(_) => depth = depth.saturating_sub(1),
                _ => {}
            }
            out.push(event);
            if depth == 0 {
                break;
            }
        }
        out
    }

    // Children of the element just opened, up to (and consuming) its end tag
    fn items(&mut self) -> (Vec<Item>, Option<XmlEvent>) {
        let mut items = Vec::new();
        while let Some(event) = self.peek() {
            match event {
                Event::End(_) => return (items, self.next()),
                Event::Start(start) if is_w(start.name().into_inner(), b"r") => {
                    items.push(Item::Run(self.run()));
                }
                Event::Empty(start) if is_w(start.name().into_inner(), b"r") => {
                    items.push(Item::Run(self.run()));
                }
                Event::Start(start)
                    if RUN_CONTAINERS
                        .iter()
                        .any(|local| is_w(start.name().into_inner(), local)) =>
                {
                    let start = self.next();
                    let (children, end) = self.items();
                    match (start, end) {
                        (Some(start), Some(end)) => items.push(Item::Container {
                            start,
                            children,
                            end,
                        }),
                        (start, _) => {
                            // unterminated container, keep what was read as-is
                            let mut events: Vec<XmlEvent> = start.into_iter().collect();
                            events.extend(flatten(&children));
                            items.push(Item::Other(events));
                        }
                    }
                }
                _ => items.push(Item::Other(self.subtree())),
            }
        }
        (items, None)
    }

    fn paragraph(&mut self) -> Paragraph {
        let start = match self.next() {
            Some(event) => event,
            None => Event::Empty(BytesStart::new("w:p")),
        };
        if let Event::Empty(_) = start {
            return Paragraph {
                start,
                items: Vec::new(),
                end: None,
            };
        }
        let (items, end) = self.items();
        Paragraph { start, items, end }
    }

    fn run(&mut self) -> Run {
        let begin = self.pos;
        let start = match self.next() {
            Some(Event::Start(start)) => start,
            Some(Event::Empty(start)) => {
                return Run {
                    start: start.clone(),
                    props: None,
                    contents: Vec::new(),
                    raw: vec![Event::Empty(start)],
                }
            }
            _ => BytesStart::new("w:r"),
        };

        let mut props = None;
        let mut contents = Vec::new();
        while let Some(event) = self.peek() {
            let name = match event {
                Event::End(_) => {
                    self.pos += 1;
                    break;
                }
                Event::Start(s) | Event::Empty(s) => s.name().into_inner().to_vec(),
                _ => Vec::new(),
            };
            if is_w(&name, b"rPr") {
                props = Some(self.subtree());
            } else if is_w(&name, b"t") {
                let events = self.subtree();
                contents.push(RunContent::Text(text_of(&events)));
            } else if is_w(&name, b"tab") || is_w(&name, b"ptab") {
                contents.push(RunContent::Symbol {
                    ch: '\t',
                    events: self.subtree(),
                });
            } else if is_w(&name, b"br") || is_w(&name, b"cr") {
                contents.push(RunContent::Symbol {
                    ch: '\n',
                    events: self.subtree(),
                });
            } else if is_w(&name, b"noBreakHyphen") {
                contents.push(RunContent::Symbol {
                    ch: '-',
                    events: self.subtree(),
                });
            } else {
                contents.push(RunContent::Other(self.subtree()));
            }
        }
        Run {
            start,
            props,
            contents,
            raw: self.events[begin..self.pos].to_vec(),
        }
    }
}

fn text_of(events: &[XmlEvent]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::Text(t) => match t.unescape() {
                Ok(value) => text.push_str(&value),
                Err(_) => text.push_str(&String::from_utf8_lossy(t)),
            },
            Event::CData(data) => text.push_str(&String::from_utf8_lossy(data)),
            _ => {}
        }
    }
    text
}

/// Events of a sequence of items, in order, as read.
pub fn flatten(items: &[Item]) -> Vec<XmlEvent> {
    let mut out = Vec::new();
    for item in items {
        match item {
            Item::Run(run) => out.extend(run.raw.iter().cloned()),
            Item::Container {
                start,
                children,
                end,
            } => {
                out.push(start.clone());
                out.extend(flatten(children));
                out.push(end.clone());
            }
            Item::Other(events) => out.extend(events.iter().cloned()),
        }
    }
    out
}
