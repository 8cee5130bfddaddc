//! Token acquisition: positioned text runs read from PDF content streams, or
//! token dumps produced by another extractor.

use std::collections::BTreeMap;
use std::path::Path;

use encoding_rs::{BIG5, UTF_16BE};
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use serde_json::Value;

use crate::error::ParseError;
use crate::model::Token;

/// A4 portrait, used when a page carries no readable `MediaBox`.
const DEFAULT_PAGE_HEIGHT: f64 = 842.0;

/// Rejects tokens the engine cannot place: non-finite coordinates or page 0.
pub(crate) fn validate_tokens(tokens: &[Token]) -> Result<(), ParseError> {
    for (index, token) in tokens.iter().enumerate() {
        if !token.x.is_finite() || !token.y.is_finite() {
            return Err(ParseError::contract(
                index,
                format!("coordinates must be finite, got x={} y={}", token.x, token.y),
            ));
        }
        if token.page_number == 0 {
            return Err(ParseError::contract(index, "page numbers are 1-based"));
        }
    }
    Ok(())
}

/// Loads a JSON array of `{text, x, y, page_number}` objects.
pub fn tokens_from_json(json: &str) -> Result<Vec<Token>, ParseError> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Array(entries) = value else {
        return Err(ParseError::contract(0, "token dump must be a JSON array"));
    };

    let tokens = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| token_from_value(index, entry))
        .collect::<Result<Vec<_>, _>>()?;
    validate_tokens(&tokens)?;
    Ok(tokens)
}

fn token_from_value(index: usize, entry: &Value) -> Result<Token, ParseError> {
    let text = entry
        .get("text")
        .and_then(Value::as_str)
        .ok_or_else(|| ParseError::contract(index, "missing string field 'text'"))?;
    let coordinate = |name: &str| {
        entry
            .get(name)
            .and_then(Value::as_f64)
            .ok_or_else(|| ParseError::contract(index, format!("field '{name}' must be a number")))
    };
    let x = coordinate("x")?;
    let y = coordinate("y")?;
    let page_number = entry
        .get("page_number")
        .and_then(Value::as_u64)
        .and_then(|page| u32::try_from(page).ok())
        .ok_or_else(|| ParseError::contract(index, "missing or invalid 'page_number'"))?;

    Ok(Token::new(text, x, y, page_number))
}

pub fn extract_tokens_from_pdf(input_pdf: &Path) -> Result<Vec<Token>, ParseError> {
    let document = Document::load(input_pdf)?;
    Ok(tokens_from_document(&document))
}

pub fn extract_tokens_from_pdf_bytes(input_pdf: &[u8]) -> Result<Vec<Token>, ParseError> {
    let document = Document::load_mem(input_pdf)?;
    Ok(tokens_from_document(&document))
}

fn tokens_from_document(document: &Document) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (page_number, page_id) in document.get_pages() {
        let before = tokens.len();
        tokens.extend(page_tokens(document, page_number, page_id));
        tracing::debug!(page_number, tokens = tokens.len() - before, "extracted page tokens");
    }
    tokens
}

fn decode_pdf_bytes(encoding: Option<&str>, bytes: &[u8]) -> String {
    let decoded = Document::decode_text(encoding, bytes);
    if !decoded.contains('\u{FFFD}') && !decoded.contains("?Identity-H Unimplemented?") {
        return decoded;
    }

    let lower = encoding.map(str::to_ascii_lowercase).unwrap_or_default();
    let has_bom = bytes.starts_with(&[0xFE, 0xFF]);
    if has_bom || lower.contains("identity-h") || lower.contains("utf16") || lower.contains("ucs2")
    {
        let payload = if has_bom { &bytes[2..] } else { bytes };
        let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(payload);
        if !had_errors && !utf16.is_empty() {
            return utf16.into_owned();
        }
    }

    if lower.contains("big5") || lower.contains("eten") || lower.contains("b5") {
        let (big5, _, had_errors) = BIG5.decode(bytes);
        if !had_errors && !big5.is_empty() {
            return big5.into_owned();
        }
    }

    decoded
}

#[allow(clippy::cast_precision_loss)]
fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

fn page_height(document: &Document, page_id: ObjectId) -> f64 {
    let mut current = document.get_dictionary(page_id).ok();
    while let Some(dictionary) = current {
        let media_box = dictionary.get(b"MediaBox").ok().and_then(|object| match object {
            Object::Reference(id) => document.get_object(*id).ok(),
            other => Some(other),
        });
        if let Some(corners) = media_box
            .and_then(|object| object.as_array().ok())
            .map(|items| items.iter().filter_map(number).collect::<Vec<_>>())
            .filter(|corners| corners.len() == 4)
        {
            return (corners[3] - corners[1]).abs();
        }

        current = dictionary
            .get(b"Parent")
            .and_then(Object::as_reference)
            .and_then(|parent| document.get_dictionary(parent))
            .ok();
    }

    DEFAULT_PAGE_HEIGHT
}

/// PDF affine matrix `[a b c d e f]`, used for both the text line matrix and
/// the current transformation matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Matrix {
    const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn from_operands(operands: &[Object]) -> Option<Self> {
        let values = operands.iter().filter_map(number).collect::<Vec<_>>();
        let [a, b, c, d, e, f] = values.as_slice() else {
            return None;
        };
        Some(Self {
            a: *a,
            b: *b,
            c: *c,
            d: *d,
            e: *e,
            f: *f,
        })
    }

    /// `self × other`: applies `self` first, then `other`.
    fn then(self, other: Self) -> Self {
        Self {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    fn translate(self, tx: f64, ty: f64) -> Self {
        Self {
            e: tx * self.a + ty * self.c + self.e,
            f: tx * self.b + ty * self.d + self.f,
            ..self
        }
    }
}

/// Text shown since the last positioning operator.
struct TextRun {
    x: f64,
    y: f64,
    text: String,
}

struct TextCursor<'a> {
    page_number: u32,
    page_height: f64,
    line: Matrix,
    ctm: Matrix,
    saved_ctm: Vec<Matrix>,
    leading: f64,
    encoding: Option<&'a str>,
    run: Option<TextRun>,
    tokens: Vec<Token>,
}

impl<'a> TextCursor<'a> {
    fn new(page_number: u32, page_height: f64) -> Self {
        Self {
            page_number,
            page_height,
            line: Matrix::IDENTITY,
            ctm: Matrix::IDENTITY,
            saved_ctm: Vec::new(),
            leading: 0.0,
            encoding: None,
            run: None,
            tokens: Vec::new(),
        }
    }

    fn flush(&mut self) {
        let Some(run) = self.run.take() else {
            return;
        };
        let text = run.text.trim();
        if text.is_empty() {
            return;
        }
        self.tokens.push(Token::new(
            text,
            run.x,
            self.page_height - run.y,
            self.page_number,
        ));
    }

    fn move_to(&mut self, line: Matrix) {
        self.flush();
        self.line = line;
    }

    fn next_line(&mut self) {
        self.move_to(self.line.translate(0.0, -self.leading));
    }

    fn show(&mut self, operands: &[Object]) {
        let (x, y) = self.ctm.apply(self.line.e, self.line.f);
        let encoding = self.encoding;
        let run = self.run.get_or_insert_with(|| TextRun {
            x,
            y,
            text: String::new(),
        });
        collect_text(&mut run.text, encoding, operands);
    }

    fn apply(&mut self, operator: &str, operands: &[Object], encodings: &BTreeMap<Vec<u8>, &'a str>) {
        let operand = |index: usize| operands.get(index).and_then(number).unwrap_or(0.0);
        match operator {
            "q" => self.saved_ctm.push(self.ctm),
            "Q" => {
                if let Some(ctm) = self.saved_ctm.pop() {
                    self.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(matrix) = Matrix::from_operands(operands) {
                    self.ctm = matrix.then(self.ctm);
                }
            }
            "BT" => self.move_to(Matrix::IDENTITY),
            "ET" => self.flush(),
            "Tm" => {
                if let Some(matrix) = Matrix::from_operands(operands) {
                    self.move_to(matrix);
                }
            }
            "Td" => self.move_to(self.line.translate(operand(0), operand(1))),
            "TD" => {
                self.leading = -operand(1);
                self.move_to(self.line.translate(operand(0), operand(1)));
            }
            "TL" => self.leading = operand(0),
            "T*" => self.next_line(),
            "Tf" => {
                self.encoding = operands
                    .first()
                    .and_then(|name| name.as_name().ok())
                    .and_then(|name| encodings.get(name).copied());
            }
            "Tj" | "TJ" => self.show(operands),
            "'" => {
                self.next_line();
                self.show(operands);
            }
            "\"" => {
                self.next_line();
                self.show(operands.get(2..).unwrap_or_default());
            }
            _ => {}
        }
    }
}

fn collect_text(text: &mut String, encoding: Option<&str>, operands: &[Object]) {
    for operand in operands {
        match operand {
            Object::String(bytes, _) => text.push_str(&decode_pdf_bytes(encoding, bytes)),
            Object::Array(items) => collect_text(text, encoding, items),
            // Wide negative kerning inside TJ reads as a word gap.
            Object::Integer(value) if *value < -100 => text.push(' '),
            Object::Real(value) if f64::from(*value) < -100.0 => text.push(' '),
            _ => {}
        }
    }
}

fn page_tokens(document: &Document, page_number: u32, page_id: ObjectId) -> Vec<Token> {
    let Some(content) = document
        .get_page_content(page_id)
        .ok()
        .and_then(|raw| Content::decode(&raw).ok())
    else {
        tracing::warn!(page_number, "page content could not be decoded");
        return Vec::new();
    };

    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<BTreeMap<Vec<u8>, &str>>();

    let mut cursor = TextCursor::new(page_number, page_height(document, page_id));
    for operation in &content.operations {
        cursor.apply(&operation.operator, &operation.operands, &encodings);
    }
    cursor.flush();
    cursor.tokens
}
