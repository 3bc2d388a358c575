// Font resources: code to text decoding and glyph widths
use lopdf::{Dictionary, Document, Object};
use std::collections::HashMap;

use super::cmap::ToUnicode;
use super::standard_fonts::StandardFont;
use super::lopdf_helper::{
    as_number, dict_get, get_name, get_number, number_array, resolve, resolve_dict, stream_data,
};

const DEFAULT_ASCENT: f32 = 0.8;
const DEFAULT_DESCENT: f32 = -0.2;
const DEFAULT_SIMPLE_WIDTH: f32 = 500.0;
const DEFAULT_CID_WIDTH: f32 = 1000.0;

/// One decoded character code.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCode {
    pub code: u32,
    pub text: String,
    /// Advance in text space units per unit of font size.
    pub width: f32,
}

#[derive(Debug, Clone)]
pub struct FontInfo {
    two_byte: bool,
    to_unicode: Option<ToUnicode>,
    differences: HashMap<u32, String>,
    first_char: u32,
    widths: Vec<f32>,
    cid_widths: HashMap<u32, f32>,
    // built-in metrics when a standard font omits /Widths
    standard: Option<StandardFont>,
    default_width: f32,
    // glyph space to text space, 0.001 except for Type3
    width_scale: f32,
    pub ascent: f32,
    pub descent: f32,
}

impl Default for FontInfo {
    fn default() -> Self {
        Self {
            two_byte: false,
            to_unicode: None,
            differences: HashMap::new(),
            first_char: 0,
            widths: Vec::new(),
            cid_widths: HashMap::new(),
            standard: None,
            default_width: DEFAULT_SIMPLE_WIDTH,
            width_scale: 0.001,
            ascent: DEFAULT_ASCENT,
            descent: DEFAULT_DESCENT,
        }
    }
}

impl FontInfo {
    pub fn load(document: &Document, font: &Dictionary) -> Self {
        let mut info = FontInfo::default();
        let subtype = get_name(document, font, b"Subtype").unwrap_or(b"Type1".as_slice());

        info.to_unicode = dict_get(document, font, b"ToUnicode").and_then(|obj| match obj {
            Object::Stream(stream) => stream_data(stream).map(|data| ToUnicode::parse(&data)),
            _ => None,
        });

        let descriptor_owner;
        if subtype == b"Type0" {
            info.two_byte = true;
            info.default_width = DEFAULT_CID_WIDTH;
            descriptor_owner = dict_get(document, font, b"DescendantFonts")
                .and_then(|obj| match obj {
                    Object::Array(items) => items.first(),
                    _ => None,
                })
                .and_then(|first| resolve_dict(document, first));
            if let Some(cid_font) = descriptor_owner {
                if let Some(dw) = get_number(document, cid_font, b"DW") {
                    info.default_width = dw;
                }
                if let Some(w) = dict_get(document, cid_font, b"W") {
                    info.cid_widths = parse_cid_widths(document, w);
                }
            }
            // a ToUnicode with one-byte codespace overrides Identity assumptions
            if let Some(1) = info.to_unicode.as_ref().and_then(ToUnicode::code_width) {
                info.two_byte = false;
            }
        } else {
            descriptor_owner = Some(font);
            info.first_char = get_number(document, font, b"FirstChar").unwrap_or(0.0) as u32;
            if let Ok(widths) = font.get(b"Widths") {
                info.widths = number_array(document, widths);
            }
            if info.widths.is_empty() && subtype != b"Type3" {
                info.standard = get_name(document, font, b"BaseFont")
                    .and_then(|name| StandardFont::from_base_font(&String::from_utf8_lossy(name)));
            }
            info.differences = parse_differences(document, font);
            if subtype == b"Type3" {
                if let Ok(matrix) = font.get(b"FontMatrix") {
                    let matrix = number_array(document, matrix);
                    if let Some(sx) = matrix.first() {
                        info.width_scale = *sx;
                    }
                }
            }
        }

        if let Some(descriptor) = descriptor_owner
            .and_then(|owner| dict_get(document, owner, b"FontDescriptor"))
            .and_then(|obj| match obj {
                Object::Dictionary(dict) => Some(dict),
                _ => None,
            })
        {
            if let Some(missing) = get_number(document, descriptor, b"MissingWidth") {
                if !info.two_byte && missing > 0.0 {
                    info.default_width = missing;
                }
            }
            match get_number(document, descriptor, b"Ascent") {
                Some(ascent) if ascent > 0.0 => info.ascent = ascent / 1000.0,
                _ => {}
            }
            match get_number(document, descriptor, b"Descent") {
                Some(descent) if descent < 0.0 => info.descent = descent / 1000.0,
                _ => {}
            }
        }
        info
    }

    /// Split a shown string into codes and decode each one.
    pub fn decode(&self, bytes: &[u8]) -> Vec<DecodedCode> {
        let step = if self.two_byte { 2 } else { 1 };
        bytes
            .chunks(step)
            .map(|chunk| {
                let code = chunk.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32);
                DecodedCode {
                    code,
                    text: expand_ligatures(&self.text_for(code)),
                    width: self.width_for(code),
                }
            })
            .collect()
    }

    /// Codes that receive word spacing (single-byte code 32 only).
    pub fn is_word_space(&self, code: u32) -> bool {
        !self.two_byte && code == 32
    }

    fn text_for(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|map| map.lookup(code)) {
            return text.to_string();
        }
        if let Some(text) = self.differences.get(&code) {
            return text.clone();
        }
        if self.two_byte {
            return char::from_u32(code)
                .filter(|c| !c.is_control())
                .map(String::from)
                .unwrap_or_default();
        }
        win_ansi(code).map(String::from).unwrap_or_default()
    }

    fn width_for(&self, code: u32) -> f32 {
        let glyph_width = if self.two_byte {
            self.cid_widths.get(&code).copied().unwrap_or(self.default_width)
        } else {
            code.checked_sub(self.first_char)
                .and_then(|i| self.widths.get(i as usize))
                .copied()
                .filter(|w| *w > 0.0)
                .or_else(|| {
                    let font = self.standard?;
                    let ch = self.text_for(code).chars().next()?;
                    Some(font.width(ch))
                })
                .unwrap_or(self.default_width)
        };
        glyph_width * self.width_scale
    }
}

// W array: `c [w1 w2 ...]` or `c_first c_last w`
fn parse_cid_widths(document: &Document, w: &Object) -> HashMap<u32, f32> {
    let mut widths = HashMap::new();
    let items = match w {
        Object::Array(items) => items,
        _ => return widths,
    };
    let mut i = 0;
    while i < items.len() {
        let first = match resolve(document, &items[i]).and_then(as_number) {
            Some(n) => n as u32,
            None => break,
        };
        match items.get(i + 1).and_then(|obj| resolve(document, obj)) {
            Some(list @ Object::Array(_)) => {
                for (offset, width) in number_array(document, list).into_iter().enumerate() {
                    widths.insert(first + offset as u32, width);
                }
                i += 2;
            }
            Some(last) => {
                let last = as_number(last).unwrap_or(first as f32) as u32;
                let width = items
                    .get(i + 2)
                    .and_then(|obj| resolve(document, obj))
                    .and_then(as_number)
                    .unwrap_or(DEFAULT_CID_WIDTH);
                for code in first..=last.min(first.saturating_add(0xFFFF)) {
                    widths.insert(code, width);
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

fn parse_differences(document: &Document, font: &Dictionary) -> HashMap<u32, String> {
    let mut map = HashMap::new();
    let encoding = match dict_get(document, font, b"Encoding") {
        Some(Object::Dictionary(dict)) => dict,
        _ => return map,
    };
    let differences = match dict_get(document, encoding, b"Differences") {
        Some(Object::Array(items)) => items,
        _ => return map,
    };
    let mut code = Some(0u32);
    for item in differences {
        match resolve(document, item) {
            Some(Object::Integer(n)) => match u32::try_from(*n) {
                Ok(n) => code = Some(n),
                Err(_) => code = None,
            },
            Some(Object::Name(name)) => {
                // names after an out-of-range start code have nowhere to go
                let current = match code {
                    Some(current) => current,
                    None => continue,
                };
                if let Some(text) = glyph_name_text(&String::from_utf8_lossy(name)) {
                    map.insert(current, text);
                }
                code = current.checked_add(1);
            }
            _ => {}
        }
    }
    map
}

/// Unicode text for a glyph name (`uniXXXX`, `uXXXX`, single letters and common names).
pub fn glyph_name_text(name: &str) -> Option<String> {
    let base = name.split('.').next().unwrap_or(name);
    if let Some(hex) = base.strip_prefix("uni") {
        if hex.is_ascii() && hex.len() >= 4 && hex.len() % 4 == 0 {
            let units: Option<Vec<u16>> = (0..hex.len())
                .step_by(4)
                .map(|i| u16::from_str_radix(&hex[i..i + 4], 16).ok())
                .collect();
            return units.map(|units| String::from_utf16_lossy(&units));
        }
    }
    if let Some(hex) = base.strip_prefix('u') {
        if hex.is_ascii() && (4..=6).contains(&hex.len()) {
            if let Some(c) = u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
                return Some(c.to_string());
            }
        }
    }
    let mut chars = base.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphabetic() {
            return Some(c.to_string());
        }
    }
    let text = match base {
        "space" | "nbspace" => " ",
        "exclam" => "!",
        "quotedbl" => "\"",
        "numbersign" => "#",
        "dollar" => "$",
        "percent" => "%",
        "ampersand" => "&",
        "quotesingle" => "'",
        "parenleft" => "(",
        "parenright" => ")",
        "asterisk" => "*",
        "plus" => "+",
        "comma" => ",",
        "hyphen" | "minus" => "-",
        "period" => ".",
        "slash" => "/",
        "zero" => "0",
        "one" => "1",
        "two" => "2",
        "three" => "3",
        "four" => "4",
        "five" => "5",
        "six" => "6",
        "seven" => "7",
        "eight" => "8",
        "nine" => "9",
        "colon" => ":",
        "semicolon" => ";",
        "less" => "<",
        "equal" => "=",
        "greater" => ">",
        "question" => "?",
        "at" => "@",
        "bracketleft" => "[",
        "backslash" => "\\",
        "bracketright" => "]",
        "underscore" => "_",
        "braceleft" => "{",
        "bar" => "|",
        "braceright" => "}",
        "quoteleft" => "\u{2018}",
        "quoteright" => "\u{2019}",
        "quotedblleft" => "\u{201C}",
        "quotedblright" => "\u{201D}",
        "endash" => "\u{2013}",
        "emdash" => "\u{2014}",
        "bullet" => "\u{2022}",
        "ellipsis" => "...",
        "fi" => "fi",
        "fl" => "fl",
        "ff" => "ff",
        "ffi" => "ffi",
        "ffl" => "ffl",
        _ => return None,
    };
    Some(text.to_string())
}

fn expand_ligatures(text: &str) -> String {
    if !text.chars().any(|c| ('\u{FB00}'..='\u{FB06}').contains(&c)) {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + 4);
    for c in text.chars() {
        match c {
            '\u{FB00}' => out.push_str("ff"),
            '\u{FB01}' => out.push_str("fi"),
            '\u{FB02}' => out.push_str("fl"),
            '\u{FB03}' => out.push_str("ffi"),
            '\u{FB04}' => out.push_str("ffl"),
            '\u{FB05}' | '\u{FB06}' => out.push_str("st"),
            other => out.push(other),
        }
    }
    out
}

// WinAnsiEncoding, with Latin-1 for the upper half outside 0x80..0xA0
fn win_ansi(code: u32) -> Option<char> {
    let c = match code {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        0x20..=0x7E | 0xA0..=0xFF => char::from_u32(code)?,
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn test_simple_font_widths_and_encoding() {
        let doc = Document::with_version("1.5");
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "FirstChar" => 65,
            "Widths" => Object::Array(vec![Object::Integer(600), Object::Integer(700)]),
            "Encoding" => dictionary! {
                "Differences" => vec![66.into(), Object::Name(b"fi".to_vec())],
            },
        };
        let info = FontInfo::load(&doc, &font);
        let codes = info.decode(b"AB\x92z");
        let texts: Vec<&str> = codes.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["A", "fi", "\u{2019}", "z"]);
        assert!((codes[0].width - 0.6).abs() < 1e-6);
        assert!((codes[1].width - 0.7).abs() < 1e-6);
        assert!((codes[3].width - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_type0_two_byte_codes() {
        let doc = Document::with_version("1.5");
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Dictionary(dictionary! {
                "Subtype" => "CIDFontType2",
                "DW" => 900,
                "W" => Object::Array(vec![
                    Object::Integer(72),
                    Object::Array(vec![Object::Integer(250)]),
                ]),
            })],
        };
        let info = FontInfo::load(&doc, &font);
        let codes = info.decode(&[0x00, 0x48, 0x00, 0x49]);
        assert_eq!(codes.len(), 2);
        assert_eq!(codes[0].text, "H");
        assert!((codes[0].width - 0.25).abs() < 1e-6);
        assert!((codes[1].width - 0.9).abs() < 1e-6);
        assert!(!info.is_word_space(32));
    }

    #[test]
    fn test_glyph_names_and_ligatures() {
        assert_eq!(glyph_name_text("uni0041").as_deref(), Some("A"));
        assert_eq!(glyph_name_text("u1F600").as_deref(), Some("\u{1F600}"));
        assert_eq!(glyph_name_text("period").as_deref(), Some("."));
        assert_eq!(glyph_name_text("g.sc").as_deref(), Some("g"));
        assert_eq!(glyph_name_text("glyph123"), None);
        assert_eq!(expand_ligatures("\u{FB01}nd"), "find");
    }

    #[test]
    fn test_non_ascii_glyph_names_are_unknown() {
        assert_eq!(glyph_name_text(&String::from_utf8_lossy(b"uniAAA\xffBB")), None);
        assert_eq!(glyph_name_text(&String::from_utf8_lossy(b"u\xff\xfe41")), None);
    }

    #[test]
    fn test_differences_survive_out_of_range_codes() {
        let doc = Document::with_version("1.5");
        let font = dictionary! {
            "Subtype" => "Type1",
            "Encoding" => dictionary! {
                "Differences" => vec![
                    Object::Integer(-5),
                    Object::Name(b"A".to_vec()),
                    Object::Integer(i64::from(u32::MAX)),
                    Object::Name(b"B".to_vec()),
                    Object::Name(b"C".to_vec()),
                    Object::Integer(0x41),
                    Object::Name(b"D".to_vec()),
                ],
            },
        };
        let info = FontInfo::load(&doc, &font);
        assert_eq!(info.differences.len(), 2);
        assert_eq!(info.differences.get(&u32::MAX).map(String::as_str), Some("B"));
        assert_eq!(info.differences.get(&0x41).map(String::as_str), Some("D"));
    }

    #[test]
    fn test_standard_font_metrics_without_widths() {
        let doc = Document::with_version("1.5");
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        };
        let codes = FontInfo::load(&doc, &font).decode(b"iM ");
        assert!((codes[0].width - 0.222).abs() < 1e-6);
        assert!((codes[1].width - 0.833).abs() < 1e-6);
        assert!((codes[2].width - 0.278).abs() < 1e-6);

        // explicit widths still win
        let font = dictionary! {
            "Subtype" => "Type1",
            "BaseFont" => "ABCDEF+Helvetica",
            "FirstChar" => 105,
            "Widths" => Object::Array(vec![Object::Integer(400)]),
        };
        let codes = FontInfo::load(&doc, &font).decode(b"iM");
        assert!((codes[0].width - 0.4).abs() < 1e-6);
        assert!((codes[1].width - 0.5).abs() < 1e-6);

        let unknown = dictionary! { "Subtype" => "Type1", "BaseFont" => "Garamond" };
        assert!((FontInfo::load(&doc, &unknown).decode(b"i")[0].width - 0.5).abs() < 1e-6);
    }
}
