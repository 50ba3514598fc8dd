//! Portable Float Map (`PF` colour, `Pf` greyscale).

use crate::error::{ParseError, Result};
use crate::formats::netpbm::{next_token, parse_u32};
use crate::io::ByteCursor;
use crate::types::{FormatTag, ImageInfo, SampleKind};

pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<ImageInfo> {
    let channels = match &cursor.read_array::<2>()? {
        b"PF" => 3,
        b"Pf" => 1,
        _ => return Err(ParseError::FormatMismatch { expected: "PFM" }),
    };
    if !cursor.peek(1)?[0].is_ascii_whitespace() {
        return Err(ParseError::FormatMismatch { expected: "PFM" });
    }

    let width = parse_u32(next_token(cursor)?, "width")?;
    let height = parse_u32(next_token(cursor)?, "height")?;
    let scale = parse_scale(next_token(cursor)?)?;

    // Sign of the scale only selects payload endianness.
    Ok(
        ImageInfo::new(FormatTag::PortableFloatMap, width, height, channels, 32, SampleKind::Float)?
            .with_max_value(scale.abs()),
    )
}

fn parse_scale(token: &[u8]) -> Result<f64> {
    std::str::from_utf8(token)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v != 0.0)
        .ok_or_else(|| {
            ParseError::malformed(format!(
                "invalid PFM scale {:?}",
                String::from_utf8_lossy(token)
            ))
        })
}
