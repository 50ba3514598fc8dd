//! Windows bitmap headers.
//!
//! Only the 14-byte file header and the leading fields of the DIB header
//! are read. Palette images report three 8-bit channels, the shape they
//! take once expanded.

use crate::error::{ParseError, Result};
use crate::io::{ByteCursor, Endian};
use crate::types::{FormatTag, ImageInfo, Orientation, SampleKind};

const FILE_HEADER_LEN: usize = 14;
const CORE_HEADER_LEN: u32 = 12;
const MIN_INFO_HEADER_LEN: u32 = 16;

fn pixel_layout(bits_per_pixel: u16) -> Option<(u32, u8)> {
    match bits_per_pixel {
        1 => Some((1, 1)),
        2 | 4 | 8 => Some((3, 8)),
        16 => Some((4, 8)),
        24 => Some((3, 8)),
        32 => Some((4, 8)),
        _ => None,
    }
}

pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<ImageInfo> {
    if &cursor.read_array::<2>()? != b"BM" {
        return Err(ParseError::FormatMismatch { expected: "BMP" });
    }
    // file size, reserved, pixel data offset
    cursor.skip(FILE_HEADER_LEN - 2)?;

    let header_len = cursor.read_u32(Endian::Little)?;
    let (width, height, orientation) = if header_len == CORE_HEADER_LEN {
        let width = cursor.read_u16(Endian::Little)?;
        let height = cursor.read_u16(Endian::Little)?;
        (u32::from(width), u32::from(height), Orientation::BottomLeft)
    } else if header_len >= MIN_INFO_HEADER_LEN {
        let width = cursor.read_i32(Endian::Little)?;
        let height = cursor.read_i32(Endian::Little)?;
        if width < 0 {
            return Err(ParseError::malformed(format!("negative BMP width {width}")));
        }
        let orientation = if height < 0 {
            Orientation::TopLeft
        } else {
            Orientation::BottomLeft
        };
        (width as u32, height.unsigned_abs(), orientation)
    } else {
        return Err(ParseError::malformed(format!(
            "unsupported DIB header size {header_len}"
        )));
    };

    let _planes = cursor.read_u16(Endian::Little)?;
    let bits_per_pixel = cursor.read_u16(Endian::Little)?;
    let (channels, bit_depth) = pixel_layout(bits_per_pixel).ok_or_else(|| {
        ParseError::malformed(format!("unsupported BMP bits per pixel {bits_per_pixel}"))
    })?;

    Ok(
        ImageInfo::new(FormatTag::Bmp, width, height, channels, bit_depth, SampleKind::Unsigned)?
            .with_orientation(Some(orientation)),
    )
}
