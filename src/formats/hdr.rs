//! Radiance RGBE (`.hdr`) headers.

use crate::error::{ParseError, Result};
use crate::io::ByteCursor;
use crate::types::{FormatTag, ImageInfo, Orientation, SampleKind};

const MAX_LINE_LEN: usize = 4096;
const FORMATS: [&[u8]; 2] = [b"32-bit_rle_rgbe", b"32-bit_rle_xyze"];

fn strip_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Axis {
    name: u8,
    positive: bool,
    size: u32,
}

fn parse_axis(sign: &str, size: &str) -> Option<Axis> {
    let (positive, name) = match sign.as_bytes() {
        [b'+', n @ (b'X' | b'Y')] => (true, *n),
        [b'-', n @ (b'X' | b'Y')] => (false, *n),
        _ => return None,
    };
    let size = size.parse::<u32>().ok()?;
    Some(Axis {
        name,
        positive,
        size,
    })
}

/// `(width, height, orientation)` from a resolution string such as
/// `-Y 480 +X 720`.
fn parse_resolution(line: &[u8]) -> Option<(u32, u32, Orientation)> {
    let text = std::str::from_utf8(line).ok()?;
    let fields: Vec<&str> = text.split_ascii_whitespace().collect();
    let [s1, n1, s2, n2] = fields.as_slice() else {
        return None;
    };
    let major = parse_axis(s1, n1)?;
    let minor = parse_axis(s2, n2)?;
    if major.name == minor.name {
        return None;
    }

    let orientation = match (major.name, major.positive, minor.positive) {
        (b'Y', false, true) => Orientation::TopLeft,
        (b'Y', false, false) => Orientation::TopRight,
        (b'Y', true, false) => Orientation::BottomRight,
        (b'Y', true, true) => Orientation::BottomLeft,
        (b'X', true, false) => Orientation::LeftTop,
        (b'X', false, false) => Orientation::RightTop,
        (b'X', false, true) => Orientation::RightBottom,
        _ => Orientation::LeftBottom,
    };
    let (x, y) = if major.name == b'Y' {
        (minor, major)
    } else {
        (major, minor)
    };
    Some((x.size, y.size, orientation))
}

pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<ImageInfo> {
    let magic = strip_cr(cursor.read_line(MAX_LINE_LEN)?);
    if magic != b"#?RADIANCE" && magic != b"#?RGBE" {
        return Err(ParseError::FormatMismatch {
            expected: "Radiance HDR",
        });
    }

    loop {
        let line = strip_cr(cursor.read_line(MAX_LINE_LEN)?);
        if line.is_empty() {
            break;
        }
        if let Some(format) = line.strip_prefix(b"FORMAT=") {
            if !FORMATS.contains(&format) {
                return Err(ParseError::malformed(format!(
                    "unsupported Radiance format {:?}",
                    String::from_utf8_lossy(format)
                )));
            }
        }
    }

    let line = strip_cr(cursor.read_line(MAX_LINE_LEN)?);
    let (width, height, orientation) = parse_resolution(line).ok_or_else(|| {
        ParseError::malformed(format!(
            "bad resolution line {:?}",
            String::from_utf8_lossy(line)
        ))
    })?;

    Ok(
        ImageInfo::new(FormatTag::RadianceHdr, width, height, 3, 32, SampleKind::Float)?
            .with_orientation(Some(orientation)),
    )
}
