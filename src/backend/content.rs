//! Content-stream text extraction.
//!
//! Walks a page's content stream, tracks the text matrix together with the
//! current transformation matrix (`cm`, `q`/`Q`) and emits one
//! [`TextSpan`] per text-showing operator. Spans are then grouped into lines
//! (for plain text) or split into words (for layout boxes).

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document as LopdfDocument, Object};

use crate::error::{Error, Result};

use super::Word;

/// A run of text shown by one operator, in PDF user space (origin bottom-left).
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Advance width of the text
    pub width: f32,
    /// Effective font size in points
    pub font_size: f32,
}

impl TextSpan {
    /// Create a span, estimating its width from the font size.
    pub fn new(text: impl Into<String>, x: f32, y: f32, font_size: f32) -> Self {
        let text = text.into();
        let width = estimate_text_width(&text, font_size);
        Self {
            text,
            x,
            y,
            width,
            font_size,
        }
    }

    /// Bottom Y coordinate (approximate descender).
    pub fn bottom(&self) -> f32 {
        self.y - self.font_size * 0.2
    }

    /// Top Y coordinate (approximate ascender).
    pub fn top(&self) -> f32 {
        self.y + self.font_size * 0.8
    }
}

/// Spans sharing a baseline, sorted left to right.
#[derive(Debug, Clone)]
pub struct TextLine {
    pub spans: Vec<TextSpan>,
    /// Baseline of the first span
    pub y: f32,
}

impl TextLine {
    /// Create a line from spans, sorting them by X.
    pub fn from_spans(mut spans: Vec<TextSpan>) -> Self {
        spans.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
        let y = spans.first().map(|s| s.y).unwrap_or(0.0);
        Self { spans, y }
    }

    /// Combined text with spaces inserted at visible gaps.
    ///
    /// No space is inserted between two characters of a spaceless script
    /// (Chinese, Japanese); Hangul uses word spaces and is treated like Latin.
    pub fn text(&self) -> String {
        let mut result = String::new();

        for (i, span) in self.spans.iter().enumerate() {
            if i > 0 {
                let prev = &self.spans[i - 1];
                let gap = span.x - (prev.x + prev.width);

                let char_count = span.text.chars().count().max(1);
                let space_threshold = span.width / char_count as f32 * 0.2;

                let spaceless_join = matches!(
                    (prev.text.chars().last(), span.text.chars().next()),
                    (Some(a), Some(b)) if is_spaceless_script_char(a) && is_spaceless_script_char(b)
                );
                let has_space = prev.text.ends_with([' ', '\u{00A0}'])
                    || span.text.starts_with([' ', '\u{00A0}']);

                if gap > space_threshold && !spaceless_join && !has_space {
                    result.push(' ');
                }
            }
            result.push_str(&span.text);
        }

        result
    }
}

/// Group spans into lines top to bottom by baseline proximity.
pub fn group_spans_into_lines(mut spans: Vec<TextSpan>) -> Vec<TextLine> {
    // PDF Y grows upward: sort descending, then by X
    spans.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in spans {
        let tolerance = span.font_size * 0.3;
        match current_y {
            Some(y) if (span.y - y).abs() <= tolerance => current.push(span),
            _ => {
                if !current.is_empty() {
                    lines.push(TextLine::from_spans(std::mem::take(&mut current)));
                }
                current_y = Some(span.y);
                current.push(span);
            }
        }
    }

    if !current.is_empty() {
        lines.push(TextLine::from_spans(current));
    }

    lines
}

/// Split spans into whitespace-separated words with top-origin boxes.
///
/// Character advances are distributed evenly across each span, so word
/// boxes are as precise as the span width estimate.
pub fn spans_to_words(spans: &[TextSpan], page_height: f32) -> Vec<Word> {
    let mut words = Vec::new();

    for span in spans {
        let chars: Vec<char> = span.text.chars().collect();
        if chars.is_empty() {
            continue;
        }
        let total_units: f32 = chars.iter().map(|&c| char_width_units(c)).sum();
        let unit = if total_units > 0.0 {
            span.width / total_units
        } else {
            0.0
        };

        let top = page_height - span.top();
        let bottom = page_height - span.bottom();

        let mut cursor = span.x;
        let mut word = String::new();
        let mut word_start = cursor;

        for &c in &chars {
            let advance = char_width_units(c) * unit;
            if c.is_whitespace() {
                if !word.is_empty() {
                    words.push(Word::new(std::mem::take(&mut word), word_start, top, cursor, bottom));
                }
            } else {
                if word.is_empty() {
                    word_start = cursor;
                }
                word.push(c);
            }
            cursor += advance;
        }

        if !word.is_empty() {
            words.push(Word::new(word, word_start, top, cursor, bottom));
        }
    }

    words
}

/// Extract text spans from a decoded page content stream.
pub(crate) fn extract_spans(
    doc: &LopdfDocument,
    page: u32,
    content: &[u8],
    fonts: &BTreeMap<Vec<u8>, &Dictionary>,
) -> Result<Vec<TextSpan>> {
    let content = lopdf::content::Content::decode(content).map_err(|e| Error::PageParse {
        page,
        message: format!("content stream: {}", e),
    })?;

    let mut spans = Vec::new();
    let mut state = TextState::default();
    let mut saved_ctm = Vec::new();
    let mut in_text_block = false;

    for op in content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => saved_ctm.push(state.ctm),
            "Q" => {
                // Unbalanced Q leaves the state alone
                if let Some(ctm) = saved_ctm.pop() {
                    state.ctm = ctm;
                }
            }
            "cm" if operands.len() >= 6 => {
                state.ctm = multiply(matrix_operands(operands), state.ctm);
            }
            "BT" => {
                in_text_block = true;
                state.matrix = TextMatrix::default();
            }
            "ET" => in_text_block = false,
            "Tf" if operands.len() >= 2 => {
                if let Object::Name(name) = &operands[0] {
                    state.font = name.clone();
                }
                state.font_size = get_number(&operands[1]).unwrap_or(12.0);
            }
            "TL" if !operands.is_empty() => {
                state.leading = get_number(&operands[0]).unwrap_or(0.0);
            }
            "Td" | "TD" if operands.len() >= 2 => {
                let tx = get_number(&operands[0]).unwrap_or(0.0);
                let ty = get_number(&operands[1]).unwrap_or(0.0);
                if op.operator == "TD" {
                    state.leading = -ty;
                }
                state.matrix.move_line(tx, ty);
            }
            "Tm" if operands.len() >= 6 => {
                state.matrix.set(matrix_operands(operands));
            }
            "T*" => state.matrix.move_line(0.0, -state.leading_or_default()),
            "Tj" | "TJ" | "'" | "\"" if in_text_block => {
                if op.operator == "'" || op.operator == "\"" {
                    state.matrix.move_line(0.0, -state.leading_or_default());
                }
                let text = match op.operator.as_str() {
                    "TJ" => match operands.first() {
                        Some(Object::Array(items)) => decode_tj_array(doc, fonts, &state.font, items),
                        _ => String::new(),
                    },
                    "\"" => decode_operand(doc, fonts, &state.font, operands.get(2)),
                    _ => decode_operand(doc, fonts, &state.font, operands.first()),
                };
                if text.is_empty() {
                    continue;
                }

                let (x, y) = transform_point(state.ctm, state.matrix.position());
                let scale = matrix_scale(multiply(state.matrix.tm, state.ctm));
                let span = TextSpan::new(text, x, y, state.font_size * scale);
                // Advance in unscaled text space so the next show starts after this one
                if scale > 0.0 {
                    state.matrix.advance(span.width / scale);
                }
                if !span.text.trim().is_empty() {
                    spans.push(span);
                }
            }
            _ => {}
        }
    }

    Ok(spans)
}

fn decode_operand(
    doc: &LopdfDocument,
    fonts: &BTreeMap<Vec<u8>, &Dictionary>,
    font: &[u8],
    operand: Option<&Object>,
) -> String {
    match operand {
        Some(Object::String(bytes, _)) => decode_bytes(doc, fonts, font, bytes),
        _ => String::new(),
    }
}

/// Decode a TJ array. Large negative adjustments (thousandths of an em) mark word breaks.
fn decode_tj_array(
    doc: &LopdfDocument,
    fonts: &BTreeMap<Vec<u8>, &Dictionary>,
    font: &[u8],
    items: &[Object],
) -> String {
    const WORD_BREAK_ADJUSTMENT: f32 = 200.0;

    let mut combined = String::new();
    for item in items {
        match item {
            Object::String(bytes, _) => combined.push_str(&decode_bytes(doc, fonts, font, bytes)),
            Object::Integer(_) | Object::Real(_) => {
                let adjustment = -get_number(item).unwrap_or(0.0);
                let needs_space = adjustment > WORD_BREAK_ADJUSTMENT
                    && combined
                        .chars()
                        .last()
                        .is_some_and(|c| !c.is_whitespace() && !is_spaceless_script_char(c));
                if needs_space {
                    combined.push(' ');
                }
            }
            _ => {}
        }
    }
    combined
}

fn decode_bytes(
    doc: &LopdfDocument,
    fonts: &BTreeMap<Vec<u8>, &Dictionary>,
    font: &[u8],
    bytes: &[u8],
) -> String {
    let encoding = fonts.get(font).and_then(|f| f.get_font_encoding(doc).ok());
    match encoding {
        Some(ref enc) => LopdfDocument::decode_text(enc, bytes)
            .unwrap_or_else(|_| decode_text_simple(bytes)),
        None => decode_text_simple(bytes),
    }
}

#[derive(Debug, Clone)]
struct TextState {
    font: Vec<u8>,
    font_size: f32,
    leading: f32,
    matrix: TextMatrix,
    /// Current transformation matrix, text space to page space
    ctm: [f32; 6],
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: Vec::new(),
            font_size: 12.0,
            leading: 0.0,
            matrix: TextMatrix::default(),
            ctm: IDENTITY,
        }
    }
}

impl TextState {
    fn leading_or_default(&self) -> f32 {
        if self.leading != 0.0 {
            self.leading
        } else {
            self.font_size * 1.2
        }
    }
}

/// Text matrix and text line matrix.
#[derive(Debug, Clone)]
struct TextMatrix {
    tm: [f32; 6],
    line: [f32; 6],
}

const IDENTITY: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            tm: IDENTITY,
            line: IDENTITY,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, m: [f32; 6]) {
        self.tm = m;
        self.line = m;
    }

    /// Start a new line offset from the start of the current one.
    fn move_line(&mut self, tx: f32, ty: f32) {
        let [a, b, c, d, e, f] = self.line;
        self.line = [a, b, c, d, e + tx * a + ty * c, f + tx * b + ty * d];
        self.tm = self.line;
    }

    /// Move the text position right by `tx` text-space units.
    fn advance(&mut self, tx: f32) {
        self.tm[4] += tx * self.tm[0];
        self.tm[5] += tx * self.tm[1];
    }

    fn position(&self) -> (f32, f32) {
        (self.tm[4], self.tm[5])
    }
}

/// `m × n` for PDF's `[a b c d e f]` affine matrices.
fn multiply(m: [f32; 6], n: [f32; 6]) -> [f32; 6] {
    let [a, b, c, d, e, f] = m;
    let [na, nb, nc, nd, ne, nf] = n;
    [
        a * na + b * nc,
        a * nb + b * nd,
        c * na + d * nc,
        c * nb + d * nd,
        e * na + f * nc + ne,
        e * nb + f * nd + nf,
    ]
}

fn transform_point(m: [f32; 6], (x, y): (f32, f32)) -> (f32, f32) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

/// Horizontal scale factor of a matrix.
fn matrix_scale(m: [f32; 6]) -> f32 {
    (m[0] * m[0] + m[2] * m[2]).sqrt()
}

fn matrix_operands(operands: &[Object]) -> [f32; 6] {
    let mut m = [0.0; 6];
    for (slot, operand) in m.iter_mut().zip(operands) {
        *slot = get_number(operand).unwrap_or(0.0);
    }
    m
}

fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Width of a character in units of half an em.
fn char_width_units(c: char) -> f32 {
    if c == ' ' {
        0.5
    } else if is_full_width_char(c) {
        2.0
    } else {
        1.0
    }
}

/// Estimate the advance width of text without font metrics.
fn estimate_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_width_units).sum::<f32>() * font_size * 0.5
}

/// Characters typically drawn on a full em square (CJK ideographs, kana, Hangul).
fn is_full_width_char(c: char) -> bool {
    is_spaceless_script_char(c) || crate::extract::is_hangul(c) || ('\u{FF01}'..='\u{FF60}').contains(&c)
}

/// Check if character is from a script that doesn't use word spaces.
/// Chinese and Japanese don't use spaces between words, but Korean does.
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and Extension A
    (0x4E00..=0x9FFF).contains(&code)
    || (0x3400..=0x4DBF).contains(&code)
    // CJK Extensions B-F
    || (0x20000..=0x2EBEF).contains(&code)
    // Hiragana, Katakana
    || (0x3040..=0x30FF).contains(&code)
    // CJK Symbols and Punctuation
    || (0x3000..=0x303F).contains(&code)
}

/// Fallback decoding when the font has no usable encoding.
pub(crate) fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        // Latin-1
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
