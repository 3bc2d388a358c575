// Content stream interpreter: positioned glyphs in user space
//
// Walks the page operators the way a viewer lays text out (graphics state, text
// matrices, font metrics), recursing into form XObjects. Only text is tracked; paths
// and images are ignored.
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object};
use std::collections::HashMap;
use std::rc::Rc;

use super::fonts::FontInfo;
use super::lopdf_helper::{
    as_number, dict_get, get_name, number_array, page_resources, resolve, resolve_dict, stream_data,
};
use crate::types::Rect;

const MAX_FORM_DEPTH: usize = 8;
// TJ adjustments past this many thousandths of an em read as a word gap
const TJ_GAP_THRESHOLD: f32 = 200.0;

/// Affine matrix `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix([f32; 6]);

impl Matrix {
    pub const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    pub fn translate(tx: f32, ty: f32) -> Self {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    fn from_operands(operands: &[Object]) -> Option<Self> {
        let values: Vec<f32> = operands.iter().filter_map(as_number).collect();
        match values.as_slice() {
            [a, b, c, d, e, f] => Some(Matrix([*a, *b, *c, *d, *e, *f])),
            _ => None,
        }
    }

    /// `self` applied first, then `other`.
    pub fn then(&self, other: &Matrix) -> Matrix {
        let [a1, b1, c1, d1, e1, f1] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a1 * a2 + b1 * c2,
            a1 * b2 + b1 * d2,
            c1 * a2 + d1 * c2,
            c1 * b2 + d1 * d2,
            e1 * a2 + f1 * c2 + e2,
            e1 * b2 + f1 * d2 + f2,
        ])
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.0;
        (x * a + y * c + e, x * b + y * d + f)
    }

    // length of the transformed unit y vector
    fn vertical_scale(&self) -> f32 {
        let [_, _, c, d, _, _] = self.0;
        (c * c + d * d).sqrt()
    }
}

/// A glyph placed on the page.
#[derive(Debug, Clone)]
pub struct PlacedGlyph {
    /// Decoded text; empty for codes without a Unicode mapping.
    pub text: String,
    pub bbox: Rect,
    /// Baseline start in user space.
    pub origin: (f32, f32),
    /// Baseline end in user space.
    pub end_x: f32,
    /// Font size after all scaling, in user space units.
    pub size: f32,
    /// Index of the text-showing operator that drew it.
    pub run: usize,
    /// A TJ adjustment wide enough to read as a space came right before it.
    pub gap_before: bool,
}

#[derive(Debug, Clone)]
struct TextState {
    font: Option<Rc<FontInfo>>,
    size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
    leading: f32,
    rise: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    text: TextState,
}

struct Frame<'d> {
    resources: Option<&'d Dictionary>,
    fonts: HashMap<Vec<u8>, Rc<FontInfo>>,
}

/// Collects the glyphs drawn by one page.
pub struct GlyphCollector<'d> {
    document: &'d Document,
    glyphs: Vec<PlacedGlyph>,
    runs: usize,
}

impl<'d> GlyphCollector<'d> {
    pub fn new(document: &'d Document) -> Self {
        Self {
            document,
            glyphs: Vec::new(),
            runs: 0,
        }
    }

    pub fn collect_page(mut self, page: &'d Dictionary, content: &[u8]) -> Vec<PlacedGlyph> {
        let resources = page_resources(self.document, page);
        self.run(content, resources, Matrix::IDENTITY, 0);
        self.glyphs
    }

    fn run(&mut self, content: &[u8], resources: Option<&'d Dictionary>, ctm: Matrix, depth: usize) {
        let content = match Content::decode(content) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("content stream could not be parsed, skipped: {}", e);
                return;
            }
        };

        let mut frame = Frame {
            resources,
            fonts: HashMap::new(),
        };
        let mut state = GraphicsState {
            ctm,
            text: TextState::default(),
        };
        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut tm = Matrix::IDENTITY;
        let mut tlm = Matrix::IDENTITY;

        for Operation { operator, operands } in &content.operations {
            let numbers = || -> Vec<f32> { operands.iter().filter_map(as_number).collect() };
            match operator.as_str() {
                "q" => stack.push(state.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        state = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        state.ctm = m.then(&state.ctm);
                    }
                }
                "BT" => {
                    tm = Matrix::IDENTITY;
                    tlm = Matrix::IDENTITY;
                }
                "ET" => {}
                "Tf" => {
                    if let [Object::Name(name), size, ..] = operands.as_slice() {
                        state.text.font = Some(self.font(&mut frame, name));
                        state.text.size = as_number(size).unwrap_or(0.0);
                    }
                }
                "Tc" => {
                    if let Some(v) = numbers().first() {
                        state.text.char_spacing = *v;
                    }
                }
                "Tw" => {
                    if let Some(v) = numbers().first() {
                        state.text.word_spacing = *v;
                    }
                }
                "Tz" => {
                    if let Some(v) = numbers().first() {
                        state.text.horizontal_scale = *v / 100.0;
                    }
                }
                "TL" => {
                    if let Some(v) = numbers().first() {
                        state.text.leading = *v;
                    }
                }
                "Ts" => {
                    if let Some(v) = numbers().first() {
                        state.text.rise = *v;
                    }
                }
                "Td" | "TD" => {
                    if let [tx, ty] = numbers().as_slice() {
                        if operator == "TD" {
                            state.text.leading = -ty;
                        }
                        tlm = Matrix::translate(*tx, *ty).then(&tlm);
                        tm = tlm;
                    }
                }
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        tm = m;
                        tlm = m;
                    }
                }
                "T*" => {
                    tlm = Matrix::translate(0.0, -state.text.leading).then(&tlm);
                    tm = tlm;
                }
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.show(bytes, &state, &mut tm, false);
                        self.runs += 1;
                    }
                }
                "'" => {
                    tlm = Matrix::translate(0.0, -state.text.leading).then(&tlm);
                    tm = tlm;
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.show(bytes, &state, &mut tm, false);
                        self.runs += 1;
                    }
                }
                "\"" => {
                    if let [aw, ac, Object::String(bytes, _)] = operands.as_slice() {
                        state.text.word_spacing = as_number(aw).unwrap_or(0.0);
                        state.text.char_spacing = as_number(ac).unwrap_or(0.0);
                        tlm = Matrix::translate(0.0, -state.text.leading).then(&tlm);
                        tm = tlm;
                        self.show(bytes, &state, &mut tm, false);
                        self.runs += 1;
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        self.show_array(items, &state, &mut tm);
                    }
                }
                "Do" => {
                    if let Some(Object::Name(name)) = operands.first() {
                        self.form(&frame, name, &state, depth);
                    }
                }
                _ => {}
            }
        }
    }

    fn font(&self, frame: &mut Frame<'d>, name: &[u8]) -> Rc<FontInfo> {
        if let Some(font) = frame.fonts.get(name) {
            return Rc::clone(font);
        }
        let info = frame
            .resources
            .and_then(|res| dict_get(self.document, res, b"Font"))
            .and_then(|fonts| match fonts {
                Object::Dictionary(fonts) => dict_get(self.document, fonts, name),
                _ => None,
            })
            .and_then(|font| resolve_dict(self.document, font))
            .map(|font| FontInfo::load(self.document, font))
            .unwrap_or_else(|| {
                tracing::debug!("font {} missing from resources", String::from_utf8_lossy(name));
                FontInfo::default()
            });
        let info = Rc::new(info);
        frame.fonts.insert(name.to_vec(), Rc::clone(&info));
        info
    }

    fn show_array(&mut self, items: &[Object], state: &GraphicsState, tm: &mut Matrix) {
        let scale = state.text.horizontal_scale;
        let mut gap = false;
        for item in items {
            match item {
                Object::String(bytes, _) => {
                    self.show(bytes, state, tm, gap);
                    gap = false;
                }
                other => {
                    if let Some(adjust) = as_number(other) {
                        let tx = -adjust / 1000.0 * state.text.size * scale;
                        *tm = Matrix::translate(tx, 0.0).then(tm);
                        if -adjust > TJ_GAP_THRESHOLD {
                            gap = true;
                        }
                    }
                }
            }
        }
        self.runs += 1;
    }

    fn show(&mut self, bytes: &[u8], state: &GraphicsState, tm: &mut Matrix, mut gap: bool) {
        let text = &state.text;
        let font = match &text.font {
            Some(font) => Rc::clone(font),
            None => Rc::new(FontInfo::default()),
        };
        let scale = text.horizontal_scale;
        let render = Matrix([text.size * scale, 0.0, 0.0, text.size, 0.0, text.rise]);

        for code in font.decode(bytes) {
            let device = render.then(tm).then(&state.ctm);
            let corners = [
                device.apply(0.0, font.descent),
                device.apply(code.width, font.descent),
                device.apply(0.0, font.ascent),
                device.apply(code.width, font.ascent),
            ];
            let origin = device.apply(0.0, 0.0);
            let end = device.apply(code.width, 0.0);
            self.glyphs.push(PlacedGlyph {
                text: code.text,
                bbox: Rect::from_corners(corners),
                origin,
                end_x: end.0,
                size: device.vertical_scale(),
                run: self.runs,
                gap_before: gap,
            });
            gap = false;

            let mut advance = code.width * text.size + text.char_spacing;
            if font.is_word_space(code.code) {
                advance += text.word_spacing;
            }
            *tm = Matrix::translate(advance * scale, 0.0).then(tm);
        }
    }

    fn form(&mut self, frame: &Frame<'d>, name: &[u8], state: &GraphicsState, depth: usize) {
        if depth >= MAX_FORM_DEPTH {
            tracing::warn!("form XObject nesting deeper than {}, skipped", MAX_FORM_DEPTH);
            return;
        }
        let document = self.document;
        let stream = match frame
            .resources
            .and_then(|res| dict_get(document, res, b"XObject"))
            .and_then(|xobjects| match xobjects {
                Object::Dictionary(xobjects) => xobjects.get(name).ok(),
                _ => None,
            })
            .and_then(|obj| resolve(document, obj))
        {
            Some(Object::Stream(stream)) => stream,
            _ => return,
        };
        if get_name(document, &stream.dict, b"Subtype") != Some(b"Form".as_slice()) {
            return;
        }
        let data = match stream_data(stream) {
            Some(data) => data,
            None => return,
        };
        let matrix = stream
            .dict
            .get(b"Matrix")
            .ok()
            .map(|m| number_array(document, m))
            .and_then(|values| match values.as_slice() {
                [a, b, c, d, e, f] => Some(Matrix([*a, *b, *c, *d, *e, *f])),
                _ => None,
            })
            .unwrap_or(Matrix::IDENTITY);
        let resources = dict_get(document, &stream.dict, b"Resources")
            .and_then(|res| match res {
                Object::Dictionary(dict) => Some(dict),
                _ => None,
            })
            .or(frame.resources);
        self.run(&data, resources, matrix.then(&state.ctm), depth + 1);
    }
}
