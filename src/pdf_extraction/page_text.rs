// Page text reconstruction and geometric sentence search
use lopdf::{Document, ObjectId};

use super::glyphs::{GlyphCollector, PlacedGlyph};
use super::lopdf_helper::page_content;
use crate::locate::{find_spans, CompactText, LocateOptions};
use crate::types::Rect;

// Fractions of the font size
const LINE_SHIFT: f32 = 0.5;
const WORD_GAP: f32 = 0.15;

/// One page: its rebuilt text plus the glyphs it came from.
#[derive(Debug, Clone)]
pub struct PageUnit {
    /// 1-based page number.
    pub number: u32,
    pub page_id: ObjectId,
    pub text: String,
    pub glyphs: Vec<PlacedGlyph>,
    compact: CompactText,
    // visual line per glyph
    lines: Vec<usize>,
}

impl PageUnit {
    pub fn read(document: &Document, number: u32, page_id: ObjectId) -> Self {
        let glyphs = match document.get_dictionary(page_id) {
            Ok(page) => GlyphCollector::new(document).collect_page(page, &page_content(document, page_id)),
            Err(e) => {
                tracing::warn!("page {} is not a dictionary: {}", number, e);
                Vec::new()
            }
        };
        Self::from_glyphs(number, page_id, glyphs)
    }

    pub fn from_glyphs(number: u32, page_id: ObjectId, glyphs: Vec<PlacedGlyph>) -> Self {
        let mut text = String::new();
        let mut compact = CompactText::new();
        let mut lines = Vec::with_capacity(glyphs.len());
        let mut line = 0;
        let mut previous: Option<&PlacedGlyph> = None;

        for (index, glyph) in glyphs.iter().enumerate() {
            if let Some(prev) = previous {
                let size = prev.size.max(glyph.size).max(1.0);
                let baseline_moved = (glyph.origin.1 - prev.origin.1).abs() > LINE_SHIFT * size;
                let went_back = glyph.origin.0 < prev.origin.0 - LINE_SHIFT * size;
                if baseline_moved || went_back {
                    line += 1;
                    if prev.text.ends_with('-') {
                        compact.mark_last_skippable();
                    }
                    push_break(&mut text, '\n');
                } else if glyph.gap_before || glyph.origin.0 - prev.end_x > WORD_GAP * size {
                    push_break(&mut text, ' ');
                }
            }
            for ch in glyph.text.chars() {
                text.push(ch);
                compact.push(ch, index);
            }
            lines.push(line);
            if !glyph.text.is_empty() {
                previous = Some(glyph);
            }
        }

        Self {
            number,
            page_id,
            text: text.trim_end().to_string(),
            glyphs,
            compact,
            lines,
        }
    }

    /// Rectangles covering every occurrence of the sentence, one per visual line per hit.
    pub fn find_rects(&self, sentence: &str, options: LocateOptions) -> Vec<Rect> {
        let mut rects = Vec::new();
        for span in find_spans(&self.compact, sentence, options) {
            let mut current: Option<(usize, Rect)> = None;
            let mut last_glyph = None;
            for &glyph_index in self.compact.origins(span) {
                if last_glyph == Some(glyph_index) {
                    continue;
                }
                last_glyph = Some(glyph_index);
                let bbox = self.glyphs[glyph_index].bbox;
                let line = self.lines[glyph_index];
                current = match current {
                    Some((l, rect)) if l == line => Some((l, rect.union(&bbox))),
                    Some((_, rect)) => {
                        rects.push(rect);
                        Some((line, bbox))
                    }
                    None => Some((line, bbox)),
                };
            }
            if let Some((_, rect)) = current {
                rects.push(rect);
            }
        }
        rects
    }
}

// Whitespace never doubles up; a line break wins over a pending space
fn push_break(text: &mut String, sep: char) {
    if text.is_empty() {
        return;
    }
    if sep == '\n' && text.ends_with(' ') {
        text.pop();
    }
    if !text.ends_with(|c: char| c.is_whitespace()) {
        text.push(sep);
    }
}

/// Read every page of the document in page order.
pub fn read_pages(document: &Document) -> Vec<PageUnit> {
    document
        .get_pages()
        .into_iter()
        .map(|(number, id)| PageUnit::read(document, number, id))
        .collect()
}
