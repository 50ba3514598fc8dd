//! JPEG marker walk up to the first start-of-frame segment.
//!
//! APP1 (EXIF) and APP2 (MPF) segments met on the way are read best-effort:
//! a broken one is logged and skipped, never fatal.

use tracing::debug;

use crate::error::{ParseError, Result};
use crate::formats::tiff::{self, Tiff};
use crate::io::{ByteCursor, Endian};
use crate::sniff::JPEG_SOI;
use crate::types::{FormatTag, ImageInfo, MpEntry, MultiPicture, Orientation, SampleKind};

const MARKER_PREFIX: u8 = 0xFF;
const MARKER_TEM: u8 = 0x01;
const MARKER_SOI: u8 = 0xD8;
const MARKER_EOI: u8 = 0xD9;
const MARKER_SOS: u8 = 0xDA;
const MARKER_APP1: u8 = 0xE1;
const MARKER_APP2: u8 = 0xE2;

const EXIF_ID: &[u8; 6] = b"Exif\0\0";
const MPF_ID: &[u8; 4] = b"MPF\0";

const TAG_MP_NUMBER_OF_IMAGES: u16 = 0xB001;
const TAG_MP_ENTRY: u16 = 0xB002;
const MP_ENTRY_LEN: usize = 16;

/// `C0`..`CF` except DHT (`C4`), JPG (`C8`) and DAC (`CC`).
#[inline]
pub fn is_sof_marker(marker: u8) -> bool {
    matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC)
}

#[inline]
pub fn is_standalone_marker(marker: u8) -> bool {
    matches!(marker, MARKER_TEM | 0xD0..=0xD7 | MARKER_SOI)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub marker: u8,
    pub precision: u8,
    pub height: u16,
    pub width: u16,
    pub components: u8,
}

impl FrameHeader {
    fn read(marker: u8, payload: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            marker,
            precision: payload.read_u8()?,
            height: payload.read_u16(Endian::Big)?,
            width: payload.read_u16(Endian::Big)?,
            components: payload.read_u8()?,
        })
    }

    #[inline]
    pub fn is_progressive(&self) -> bool {
        matches!(self.marker, 0xC2 | 0xC6 | 0xCA | 0xCE)
    }
}

pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<ImageInfo> {
    if cursor.read_array::<2>()? != JPEG_SOI {
        return Err(ParseError::FormatMismatch { expected: "JPEG" });
    }

    let mut orientation = None;
    let mut multi_picture = None;
    let mut segments = 0usize;

    loop {
        if cursor.remaining() == 0 {
            if segments == 0 {
                return Err(ParseError::Truncated {
                    offset: cursor.position() as u64,
                    needed: 2,
                    available: 0,
                });
            }
            return Err(ParseError::NoFrameMarker);
        }

        let prefix = cursor.read_u8()?;
        if prefix != MARKER_PREFIX {
            return Err(ParseError::malformed(format!(
                "expected marker at offset {}, found 0x{prefix:02X}",
                cursor.position() - 1
            )));
        }
        let mut marker = cursor.read_u8()?;
        while marker == MARKER_PREFIX {
            marker = cursor.read_u8()?;
        }

        if marker == MARKER_EOI || marker == MARKER_SOS {
            debug!(marker, "end of headers before any frame");
            return Err(ParseError::NoFrameMarker);
        }
        if is_standalone_marker(marker) {
            segments += 1;
            continue;
        }

        let length = cursor.read_u16(Endian::Big)?;
        if length < 2 {
            return Err(ParseError::malformed(format!(
                "segment 0x{marker:02X} declares length {length}"
            )));
        }
        let payload_start = cursor.position() as u64;
        let mut payload = cursor.sub_cursor(usize::from(length - 2))?;
        segments += 1;

        if is_sof_marker(marker) {
            let frame = FrameHeader::read(marker, &mut payload)?;
            debug!(
                marker,
                progressive = frame.is_progressive(),
                width = frame.width,
                height = frame.height,
                "found frame header"
            );
            let mut info = ImageInfo::new(
                FormatTag::Jpeg,
                u32::from(frame.width),
                u32::from(frame.height),
                u32::from(frame.components),
                frame.precision,
                SampleKind::Unsigned,
            )?
            .with_orientation(orientation);
            info.multi_picture = multi_picture;
            return Ok(info);
        }

        match marker {
            MARKER_APP1 if orientation.is_none() => {
                orientation = read_exif_orientation(payload.as_slice());
            }
            MARKER_APP2 if multi_picture.is_none() => {
                multi_picture = read_mpf(payload.as_slice(), payload_start);
            }
            _ => debug!(marker, length, "skipped segment"),
        }
    }
}

fn read_exif_orientation(payload: &[u8]) -> Option<Orientation> {
    let block = payload.strip_prefix(EXIF_ID.as_slice())?;
    match tiff::read_orientation(block) {
        Ok(orientation) => orientation,
        Err(err) => {
            debug!(%err, "ignoring unreadable EXIF segment");
            None
        }
    }
}

fn read_mpf(payload: &[u8], payload_start: u64) -> Option<MultiPicture> {
    let block = payload.strip_prefix(MPF_ID.as_slice())?;
    // MP entry offsets are relative to the MPF TIFF header.
    let base = payload_start + MPF_ID.len() as u64;
    match parse_mp_index(block, base) {
        Ok(index) => Some(index),
        Err(err) => {
            debug!(%err, "ignoring unreadable MPF segment");
            None
        }
    }
}

fn parse_mp_index(block: &[u8], base: u64) -> Result<MultiPicture> {
    let (tiff, header) = Tiff::open(block)?;
    let entries = tiff.read_ifd(header.ifd0)?;

    let entry_table =
        tiff::find_entry(&entries, TAG_MP_ENTRY).ok_or(ParseError::MissingTag("MPEntry"))?;
    let declared = match tiff::find_entry(&entries, TAG_MP_NUMBER_OF_IMAGES) {
        Some(entry) => Some(tiff.first_uint(entry)?),
        None => None,
    };

    let available = entry_table.count / MP_ENTRY_LEN as u64;
    let count = declared.map_or(available, |n| n.min(available));

    let mut cursor = ByteCursor::new(block).fork_at(entry_table.value_pos)?;
    cursor.ensure(count.saturating_mul(MP_ENTRY_LEN as u64))?;

    let endian = tiff.endian();
    let mut index = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let _attributes = cursor.read_u32(endian)?;
        let size = cursor.read_u32(endian)?;
        let offset = cursor.read_u32(endian)?;
        cursor.skip(4)?; // dependent image entries

        // The first image always starts at the file's own SOI.
        let offset = if offset == 0 {
            0
        } else {
            base + u64::from(offset)
        };
        index.push(MpEntry { offset, size });
    }

    Ok(MultiPicture { entries: index })
}
