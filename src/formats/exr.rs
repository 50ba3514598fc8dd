//! OpenEXR header attributes.

use tracing::debug;

use crate::error::{ParseError, Result};
use crate::io::{ByteCursor, Endian};
use crate::sniff::EXR_MAGIC;
use crate::types::{FormatTag, ImageInfo, SampleKind};

const LONG_NAMES_FLAG: u32 = 0x400;
const MAX_NAME_LEN: usize = 31;
const MAX_LONG_NAME_LEN: usize = 255;

const PIXEL_UINT: i32 = 0;
const PIXEL_HALF: i32 = 1;
const PIXEL_FLOAT: i32 = 2;

/// Reads a NUL-terminated string of at most `max` bytes, consuming the NUL.
fn read_cstr<'a>(cursor: &mut ByteCursor<'a>, max: usize) -> Result<&'a [u8]> {
    let window = cursor.peek(cursor.remaining().min(max + 1))?;
    match window.iter().position(|&b| b == 0) {
        Some(len) => {
            let s = cursor.read_bytes(len)?;
            cursor.skip(1)?;
            Ok(s)
        }
        None if window.len() <= max => Err(ParseError::Truncated {
            offset: cursor.position() as u64,
            needed: window.len() as u64 + 1,
            available: window.len() as u64,
        }),
        None => Err(ParseError::malformed(format!(
            "attribute name at offset {} exceeds {max} bytes",
            cursor.position()
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChannelList {
    count: u32,
    bit_depth: u8,
    float: bool,
}

fn read_chlist(payload: &mut ByteCursor<'_>, max_name: usize) -> Result<ChannelList> {
    let mut list = ChannelList {
        count: 0,
        bit_depth: 0,
        float: false,
    };
    loop {
        let name = read_cstr(payload, max_name)?;
        if name.is_empty() {
            return Ok(list);
        }
        let pixel_type = payload.read_i32(Endian::Little)?;
        payload.skip(12)?; // pLinear, reserved, x/y sampling

        let (bits, float) = match pixel_type {
            PIXEL_UINT => (32, false),
            PIXEL_HALF => (16, true),
            PIXEL_FLOAT => (32, true),
            other => {
                return Err(ParseError::malformed(format!(
                    "channel {:?} has pixel type {other}",
                    String::from_utf8_lossy(name)
                )));
            }
        };
        list.count += 1;
        list.bit_depth = list.bit_depth.max(bits);
        list.float |= float;
    }
}

fn read_box2i(payload: &mut ByteCursor<'_>) -> Result<(u32, u32)> {
    let xmin = i64::from(payload.read_i32(Endian::Little)?);
    let ymin = i64::from(payload.read_i32(Endian::Little)?);
    let xmax = i64::from(payload.read_i32(Endian::Little)?);
    let ymax = i64::from(payload.read_i32(Endian::Little)?);

    let extent = |min: i64, max: i64| {
        u32::try_from(max - min + 1)
            .ok()
            .filter(|&v| v > 0)
            .ok_or_else(|| ParseError::malformed(format!("dataWindow extent {min}..={max}")))
    };
    Ok((extent(xmin, xmax)?, extent(ymin, ymax)?))
}

pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<ImageInfo> {
    if cursor.read_array::<4>()? != EXR_MAGIC {
        return Err(ParseError::FormatMismatch { expected: "OpenEXR" });
    }
    let version = cursor.read_u32(Endian::Little)?;
    let max_name = if version & LONG_NAMES_FLAG != 0 {
        MAX_LONG_NAME_LEN
    } else {
        MAX_NAME_LEN
    };

    let mut channels = None;
    let mut window = None;

    while channels.is_none() || window.is_none() {
        let name = read_cstr(cursor, max_name)?;
        if name.is_empty() {
            return Err(ParseError::MissingTag(if channels.is_none() {
                "channels"
            } else {
                "dataWindow"
            }));
        }
        let _kind = read_cstr(cursor, max_name)?;
        let size = cursor.read_u32(Endian::Little)?;
        let mut payload = cursor.sub_cursor(size as usize)?;

        match name {
            b"channels" => channels = Some(read_chlist(&mut payload, max_name)?),
            b"dataWindow" => window = Some(read_box2i(&mut payload)?),
            other => debug!(name = %String::from_utf8_lossy(other), size, "skipped attribute"),
        }
    }

    let (Some(list), Some((width, height))) = (channels, window) else {
        return Err(ParseError::MissingTag("channels"));
    };
    let kind = if list.float {
        SampleKind::Float
    } else {
        SampleKind::Unsigned
    };
    ImageInfo::new(FormatTag::OpenExr, width, height, list.count, list.bit_depth, kind)
}
