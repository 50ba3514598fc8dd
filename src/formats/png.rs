use crate::error::{ParseError, Result};
use crate::io::{ByteCursor, Endian};
use crate::sniff::PNG_SIGNATURE;
use crate::types::{FormatTag, ImageInfo, SampleKind};

pub const IHDR_CHUNK_TYPE: &[u8; 4] = b"IHDR";
pub const IHDR_LEN: u32 = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ihdr {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
    pub interlace: u8,
}

impl Ihdr {
    /// Samples per pixel for the colour type, `None` if unknown.
    pub fn channels(&self) -> Option<u32> {
        match self.color_type {
            0 => Some(1), // greyscale
            2 => Some(3), // truecolour
            3 => Some(1), // palette index
            4 => Some(2), // greyscale + alpha
            6 => Some(4), // truecolour + alpha
            _ => None,
        }
    }
}

/// Reads the IHDR chunk, which must be the first chunk after the signature.
pub fn read_ihdr(cursor: &mut ByteCursor<'_>) -> Result<Ihdr> {
    if cursor.read_array::<8>()? != PNG_SIGNATURE {
        return Err(ParseError::FormatMismatch { expected: "PNG" });
    }

    let length = cursor.read_u32(Endian::Big)?;
    let chunk_type = cursor.read_array::<4>()?;
    if &chunk_type != IHDR_CHUNK_TYPE {
        return Err(ParseError::malformed(format!(
            "first chunk is {:?}, expected IHDR",
            String::from_utf8_lossy(&chunk_type)
        )));
    }
    if length != IHDR_LEN {
        return Err(ParseError::malformed(format!(
            "IHDR length {length}, expected {IHDR_LEN}"
        )));
    }

    let mut body = cursor.sub_cursor(IHDR_LEN as usize)?;
    let width = body.read_u32(Endian::Big)?;
    let height = body.read_u32(Endian::Big)?;
    let bit_depth = body.read_u8()?;
    let color_type = body.read_u8()?;
    body.skip(2)?; // compression, filter
    let interlace = body.read_u8()?;

    Ok(Ihdr {
        width,
        height,
        bit_depth,
        color_type,
        interlace,
    })
}

pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<ImageInfo> {
    let ihdr = read_ihdr(cursor)?;

    let channels = ihdr
        .channels()
        .ok_or_else(|| ParseError::malformed(format!("unknown PNG colour type {}", ihdr.color_type)))?;
    if !matches!(ihdr.bit_depth, 1 | 2 | 4 | 8 | 16) {
        return Err(ParseError::malformed(format!(
            "invalid PNG bit depth {}",
            ihdr.bit_depth
        )));
    }

    ImageInfo::new(
        FormatTag::Png,
        ihdr.width,
        ihdr.height,
        channels,
        ihdr.bit_depth,
        SampleKind::Unsigned,
    )
}
