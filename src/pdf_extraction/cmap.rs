// ToUnicode CMap parsing
//
// Only the parts text extraction needs: codespace ranges (to know the code width),
// bfchar and bfrange mappings. Everything else in the CMap program is skipped.
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct ToUnicode {
    map: HashMap<u32, String>,
    /// Code widths in bytes declared by codespace ranges.
    code_widths: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    Word(String),
    ArrayStart,
    ArrayEnd,
}

impl ToUnicode {
    pub fn parse(data: &[u8]) -> Self {
        let tokens = tokenize(data);
        let mut cmap = ToUnicode::default();
        let mut i = 0;
        while i < tokens.len() {
            match &tokens[i] {
                Token::Word(w) if w == "begincodespacerange" => {
                    i += 1;
                    while i + 1 < tokens.len() {
                        match (&tokens[i], &tokens[i + 1]) {
                            (Token::Hex(lo), Token::Hex(_)) => {
                                if !cmap.code_widths.contains(&lo.len()) {
                                    cmap.code_widths.push(lo.len());
                                }
                                i += 2;
                            }
                            _ => break,
                        }
                    }
                }
                Token::Word(w) if w == "beginbfchar" => {
                    i += 1;
                    while i + 1 < tokens.len() {
                        match (&tokens[i], &tokens[i + 1]) {
                            (Token::Hex(src), Token::Hex(dst)) => {
                                cmap.map.insert(code_value(src), utf16_text(dst));
                                i += 2;
                            }
                            _ => break,
                        }
                    }
                }
                Token::Word(w) if w == "beginbfrange" => {
                    i += 1;
                    i = cmap.parse_ranges(&tokens, i);
                }
                _ => i += 1,
            }
        }
        cmap.code_widths.sort_unstable();
        cmap
    }

    fn parse_ranges(&mut self, tokens: &[Token], mut i: usize) -> usize {
        while i + 2 < tokens.len() {
            let (lo, hi) = match (&tokens[i], &tokens[i + 1]) {
                (Token::Hex(lo), Token::Hex(hi)) => (code_value(lo), code_value(hi)),
                _ => break,
            };
            if hi < lo || hi - lo > 0xFFFF {
                break;
            }
            match &tokens[i + 2] {
                Token::Hex(dst) => {
                    let base = utf16_units(dst);
                    for (offset, code) in (lo..=hi).enumerate() {
                        let mut units = base.clone();
                        if let Some(last) = units.last_mut() {
                            *last = last.wrapping_add(offset as u16);
                        }
                        self.map.insert(code, String::from_utf16_lossy(&units));
                    }
                    i += 3;
                }
                Token::ArrayStart => {
                    let mut j = i + 3;
                    let mut code = lo;
                    while j < tokens.len() && tokens[j] != Token::ArrayEnd {
                        if let Token::Hex(dst) = &tokens[j] {
                            if code <= hi {
                                self.map.insert(code, utf16_text(dst));
                            }
                            code = match code.checked_add(1) {
                                Some(next) => next,
                                None => break,
                            };
                        }
                        j += 1;
                    }
                    i = j + 1;
                }
                _ => break,
            }
        }
        i
    }

    pub fn lookup(&self, code: u32) -> Option<&str> {
        self.map.get(&code).map(String::as_str)
    }

    /// Byte width of codes when every codespace range agrees on one.
    pub fn code_width(&self) -> Option<usize> {
        match self.code_widths.as_slice() {
            [single] => Some(*single),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn code_value(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32)
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [single] => *single as u16,
            _ => 0,
        })
        .collect()
}

fn utf16_text(bytes: &[u8]) -> String {
    String::from_utf16_lossy(&utf16_units(bytes))
}

fn tokenize(data: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let b = data[i];
        match b {
            b'<' if data.get(i + 1) != Some(&b'<') => {
                let end = data[i + 1..]
                    .iter()
                    .position(|&c| c == b'>')
                    .map(|p| i + 1 + p)
                    .unwrap_or(data.len());
                let digits: Vec<u8> = data[i + 1..end]
                    .iter()
                    .filter(|c| c.is_ascii_hexdigit())
                    .copied()
                    .collect();
                tokens.push(Token::Hex(hex_bytes(&digits)));
                i = end + 1;
            }
            b'[' => {
                tokens.push(Token::ArrayStart);
                i += 1;
            }
            b']' => {
                tokens.push(Token::ArrayEnd);
                i += 1;
            }
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            _ if b.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < data.len()
                    && !data[i].is_ascii_whitespace()
                    && !matches!(data[i], b'<' | b'[' | b']' | b'%')
                {
                    i += 1;
                }
                if i == start {
                    // stray delimiter such as '>' or "<<"
                    i += 1;
                    continue;
                }
                tokens.push(Token::Word(String::from_utf8_lossy(&data[start..i]).into_owned()));
            }
        }
    }
    tokens
}

fn hex_bytes(digits: &[u8]) -> Vec<u8> {
    let value = |c: u8| (c as char).to_digit(16).unwrap_or(0) as u8;
    digits
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => (value(*hi) << 4) | value(*lo),
            [hi] => value(*hi) << 4,
            _ => 0,
        })
        .collect()
}
