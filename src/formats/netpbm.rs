//! PBM/PGM/PPM (`P1`..`P6`) headers.

use crate::error::{ParseError, Result};
use crate::io::ByteCursor;
use crate::types::{FormatTag, ImageInfo, SampleKind};

const MAX_TOKEN_LEN: usize = 20;
const MAX_COMMENT_LEN: usize = 4096;
const MAX_MAXVAL: u32 = 65535;

/// Returns the next header token, skipping `#` comments. A token ends at
/// whitespace or at a `#` that opens a comment. A whitespace delimiter is
/// consumed, so after the last header field the cursor sits on the first
/// payload byte; a `#` is left for the next call to skip.
pub(crate) fn next_token<'a>(cursor: &mut ByteCursor<'a>) -> Result<&'a [u8]> {
    loop {
        let b = cursor.peek(1)?[0];
        if b == b'#' {
            cursor.read_line(MAX_COMMENT_LEN)?;
        } else if b.is_ascii_whitespace() {
            cursor.skip(1)?;
        } else {
            break;
        }
    }

    let window = cursor.peek(cursor.remaining().min(MAX_TOKEN_LEN + 1))?;
    match window
        .iter()
        .position(|&b| b.is_ascii_whitespace() || b == b'#')
    {
        Some(len) => {
            let token = cursor.read_bytes(len)?;
            if cursor.peek(1)?[0] != b'#' {
                cursor.skip(1)?;
            }
            Ok(token)
        }
        // The token runs into end of input and may be cut short.
        None if window.len() <= MAX_TOKEN_LEN => Err(ParseError::Truncated {
            offset: cursor.position() as u64,
            needed: window.len() as u64 + 1,
            available: window.len() as u64,
        }),
        None => Err(ParseError::malformed(format!(
            "header token at offset {} exceeds {} bytes",
            cursor.position(),
            MAX_TOKEN_LEN
        ))),
    }
}

pub(crate) fn parse_u32(token: &[u8], field: &str) -> Result<u32> {
    std::str::from_utf8(token)
        .ok()
        .filter(|s| s.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(|| {
            ParseError::malformed(format!(
                "{field} is not a number: {:?}",
                String::from_utf8_lossy(token)
            ))
        })
}

pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<ImageInfo> {
    let magic = cursor.read_array::<2>()?;
    let (format, channels, has_maxval) = match &magic {
        b"P1" => (FormatTag::NetpbmText, 1, false),
        b"P2" => (FormatTag::NetpbmText, 1, true),
        b"P3" => (FormatTag::NetpbmText, 3, true),
        b"P4" => (FormatTag::NetpbmBinary, 1, false),
        b"P5" => (FormatTag::NetpbmBinary, 1, true),
        b"P6" => (FormatTag::NetpbmBinary, 3, true),
        _ => return Err(ParseError::FormatMismatch { expected: "Netpbm" }),
    };

    let delimiter = cursor.peek(1)?[0];
    if !delimiter.is_ascii_whitespace() && delimiter != b'#' {
        return Err(ParseError::FormatMismatch { expected: "Netpbm" });
    }

    let width = parse_u32(next_token(cursor)?, "width")?;
    let height = parse_u32(next_token(cursor)?, "height")?;

    let (bit_depth, maxval) = if has_maxval {
        let maxval = parse_u32(next_token(cursor)?, "maxval")?;
        if maxval == 0 || maxval > MAX_MAXVAL {
            return Err(ParseError::malformed(format!(
                "maxval {maxval} outside 1..={MAX_MAXVAL}"
            )));
        }
        (if maxval <= 255 { 8 } else { 16 }, maxval)
    } else {
        (1, 1)
    };

    Ok(
        ImageInfo::new(format, width, height, channels, bit_depth, SampleKind::Unsigned)?
            .with_max_value(f64::from(maxval)),
    )
}
