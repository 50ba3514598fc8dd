//! NumPy `.npy` array headers.
//!
//! The header is a Python dict literal. Only the handful of literal forms
//! NumPy writes there are understood: strings, booleans, integers, `None`,
//! tuples and lists.

use crate::error::{ParseError, Result};
use crate::io::{ByteCursor, Endian};
use crate::sniff::NPY_MAGIC;
use crate::types::{FormatTag, ImageInfo, SampleKind};

const MAX_HEADER_LEN: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Literal<'a> {
    Str(&'a str),
    Bool(bool),
    Int(u64),
    None,
    Seq(Vec<Literal<'a>>),
}

struct LiteralParser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> LiteralParser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn error(&self, what: &str) -> ParseError {
        ParseError::malformed(format!("npy header: {what} at column {}", self.pos))
    }

    fn skip_ws(&mut self) {
        let rest = &self.text[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.text.as_bytes().get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", byte as char)))
        }
    }

    fn dict(&mut self) -> Result<Vec<(&'a str, Literal<'a>)>> {
        self.expect(b'{')?;
        let mut entries = Vec::new();
        loop {
            if self.peek() == Some(b'}') {
                self.pos += 1;
                return Ok(entries);
            }
            let Literal::Str(key) = self.value()? else {
                return Err(self.error("non-string key"));
            };
            self.expect(b':')?;
            let value = self.value()?;
            entries.push((key, value));
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {}
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    fn seq(&mut self, close: u8) -> Result<Literal<'a>> {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok(Literal::Seq(items));
            }
            items.push(self.value()?);
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(c) if c == close => {}
                _ => return Err(self.error("unterminated sequence")),
            }
        }
    }

    fn value(&mut self) -> Result<Literal<'a>> {
        let text = self.text;
        match self.peek() {
            Some(quote @ (b'\'' | b'"')) => {
                let start = self.pos + 1;
                let len = text[start..]
                    .bytes()
                    .position(|b| b == quote)
                    .ok_or_else(|| self.error("unterminated string"))?;
                self.pos = start + len + 1;
                Ok(Literal::Str(&text[start..start + len]))
            }
            Some(b'(') => self.seq(b')'),
            Some(b'[') => self.seq(b']'),
            Some(b) if b.is_ascii_digit() => {
                let rest = &text[self.pos..];
                let len = rest.bytes().take_while(u8::is_ascii_digit).count();
                let value = rest[..len]
                    .parse::<u64>()
                    .map_err(|_| self.error("integer out of range"))?;
                // Python 2 era headers may carry `L` suffixes.
                self.pos += len + usize::from(rest[len..].starts_with('L'));
                Ok(Literal::Int(value))
            }
            Some(_) => {
                let rest = &text[self.pos..];
                for (word, literal) in [
                    ("True", Literal::Bool(true)),
                    ("False", Literal::Bool(false)),
                    ("None", Literal::None),
                ] {
                    if rest.starts_with(word) {
                        self.pos += word.len();
                        return Ok(literal);
                    }
                }
                Err(self.error("unexpected token"))
            }
            None => Err(self.error("unexpected end")),
        }
    }
}

/// `(bit depth, sample kind)` for a scalar dtype string such as `<f4`.
fn parse_dtype(descr: &str) -> Result<(u8, SampleKind)> {
    let unsupported = || ParseError::UnsupportedDType(descr.to_string());
    let body = descr
        .strip_prefix(['<', '>', '|', '='])
        .ok_or_else(unsupported)?;
    let kind = match body.as_bytes().first() {
        Some(b'u') => SampleKind::Unsigned,
        Some(b'i') => SampleKind::Signed,
        Some(b'f') => SampleKind::Float,
        _ => return Err(unsupported()),
    };
    let bytes: u8 = match &body[1..] {
        "1" if kind != SampleKind::Float => 1,
        "2" => 2,
        "4" => 4,
        "8" => 8,
        _ => return Err(unsupported()),
    };
    Ok((bytes * 8, kind))
}

fn to_u32(value: u64) -> Result<u32> {
    u32::try_from(value)
        .ok()
        .filter(|&v| v > 0)
        .ok_or_else(|| ParseError::malformed(format!("npy shape dimension {value}")))
}

pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<ImageInfo> {
    if cursor.read_array::<6>()? != *NPY_MAGIC {
        return Err(ParseError::FormatMismatch { expected: "NPY" });
    }
    let major = cursor.read_u8()?;
    let _minor = cursor.read_u8()?;
    let header_len = match major {
        1 => usize::from(cursor.read_u16(Endian::Little)?),
        2 | 3 => cursor.read_u32(Endian::Little)? as usize,
        other => {
            return Err(ParseError::malformed(format!("npy format version {other}")));
        }
    };
    if header_len > MAX_HEADER_LEN {
        return Err(ParseError::malformed(format!(
            "npy header length {header_len}"
        )));
    }

    let header = cursor.read_bytes(header_len)?;
    let text = std::str::from_utf8(header)
        .map_err(|_| ParseError::malformed("npy header is not UTF-8"))?;
    let entries = LiteralParser::new(text).dict()?;
    let field = |key: &str| entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v);

    let (bit_depth, sample_kind) = match field("descr") {
        Some(Literal::Str(descr)) => parse_dtype(descr)?,
        Some(other) => return Err(ParseError::UnsupportedDType(format!("{other:?}"))),
        None => return Err(ParseError::MissingTag("descr")),
    };

    let dims = match field("shape") {
        Some(Literal::Seq(items)) => items
            .iter()
            .map(|item| match item {
                Literal::Int(n) => Ok(*n),
                _ => Err(ParseError::malformed("npy shape holds a non-integer")),
            })
            .collect::<Result<Vec<u64>>>()?,
        Some(_) => return Err(ParseError::malformed("npy shape is not a tuple")),
        None => return Err(ParseError::MissingTag("shape")),
    };

    let [leading @ .., h, w] = dims.as_slice() else {
        return Err(ParseError::malformed(format!(
            "npy shape has {} dimension(s), need at least 2",
            dims.len()
        )));
    };
    let channels = leading
        .iter()
        .try_fold(1u64, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| ParseError::malformed("npy channel count overflows"))?;

    ImageInfo::new(
        FormatTag::TypedArray,
        to_u32(*w)?,
        to_u32(*h)?,
        to_u32(channels)?,
        bit_depth,
        sample_kind,
    )
}
