//! TIFF structure reader (classic and BigTIFF).
//!
//! Used directly for TIFF, DNG and NEF files, and by the JPEG parser for the
//! TIFF blocks embedded in EXIF and MPF segments. Only IFD0 and, when
//! present, its SubIFDs are visited; the next-IFD chain is never followed.

use tracing::debug;

use crate::error::{ParseError, Result};
use crate::io::{ByteCursor, Endian};
use crate::types::{FormatTag, ImageInfo, Orientation, SampleKind};

pub const TIFF_MAGIC: u16 = 42;
pub const BIGTIFF_MAGIC: u16 = 43;

pub const TAG_IMAGE_WIDTH: u16 = 0x0100;
pub const TAG_IMAGE_LENGTH: u16 = 0x0101;
pub const TAG_BITS_PER_SAMPLE: u16 = 0x0102;
pub const TAG_PHOTOMETRIC: u16 = 0x0106;
pub const TAG_ORIENTATION: u16 = 0x0112;
pub const TAG_SAMPLES_PER_PIXEL: u16 = 0x0115;
pub const TAG_SUB_IFDS: u16 = 0x014A;
pub const TAG_SAMPLE_FORMAT: u16 = 0x0153;
pub const TAG_DNG_VERSION: u16 = 0xC612;

pub const PHOTOMETRIC_CFA: u16 = 32803;
pub const PHOTOMETRIC_LINEAR_RAW: u16 = 34892;

pub const TYPE_BYTE: u16 = 1;
pub const TYPE_ASCII: u16 = 2;
pub const TYPE_SHORT: u16 = 3;
pub const TYPE_LONG: u16 = 4;
pub const TYPE_RATIONAL: u16 = 5;
pub const TYPE_UNDEFINED: u16 = 7;
pub const TYPE_IFD: u16 = 13;
pub const TYPE_LONG8: u16 = 16;
pub const TYPE_IFD8: u16 = 18;

const SAMPLE_FORMAT_INT: u16 = 2;
const SAMPLE_FORMAT_FLOAT: u16 = 3;

/// Size in bytes of one value of a TIFF field type.
#[inline]
pub fn type_unit_size(field_type: u16) -> Option<u64> {
    match field_type {
        TYPE_BYTE | TYPE_ASCII | TYPE_UNDEFINED | 6 => Some(1),
        TYPE_SHORT | 8 => Some(2),
        TYPE_LONG | TYPE_IFD | 9 | 11 => Some(4),
        TYPE_RATIONAL | 10 | 12 | TYPE_LONG8 | 17 | TYPE_IFD8 => Some(8),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    pub endian: Endian,
    pub big: bool,
    pub ifd0: u64,
}

impl TiffHeader {
    pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let endian = match &cursor.read_array::<2>()? {
            b"II" => Endian::Little,
            b"MM" => Endian::Big,
            _ => return Err(ParseError::FormatMismatch { expected: "TIFF" }),
        };

        match cursor.read_u16(endian)? {
            TIFF_MAGIC => {
                let ifd0 = u64::from(cursor.read_u32(endian)?);
                Ok(Self {
                    endian,
                    big: false,
                    ifd0,
                })
            }
            BIGTIFF_MAGIC => {
                let offset_size = cursor.read_u16(endian)?;
                if offset_size != 8 {
                    return Err(ParseError::malformed(format!(
                        "BigTIFF offset size {offset_size}, expected 8"
                    )));
                }
                cursor.skip(2)?;
                let ifd0 = cursor.read_u64(endian)?;
                Ok(Self {
                    endian,
                    big: true,
                    ifd0,
                })
            }
            version => Err(ParseError::malformed(format!("TIFF version {version}"))),
        }
    }
}

/// One 12-byte (or 20-byte BigTIFF) directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfdEntry {
    pub tag: u16,
    pub field_type: u16,
    pub count: u64,
    /// Absolute position of the value bytes within the TIFF block,
    /// whether inline in the entry or out of line.
    pub value_pos: u64,
}

/// A TIFF block: its bytes (offsets are relative to their start) and the
/// header layout.
#[derive(Debug, Clone, Copy)]
pub struct Tiff<'a> {
    data: &'a [u8],
    endian: Endian,
    big: bool,
}

impl<'a> Tiff<'a> {
    pub fn new(data: &'a [u8], header: &TiffHeader) -> Self {
        Self {
            data,
            endian: header.endian,
            big: header.big,
        }
    }

    /// Parses the header at the start of `data`.
    pub fn open(data: &'a [u8]) -> Result<(Self, TiffHeader)> {
        let header = TiffHeader::parse(&mut ByteCursor::new(data))?;
        Ok((Self::new(data, &header), header))
    }

    #[inline]
    pub fn endian(&self) -> Endian {
        self.endian
    }

    fn entry_len(&self) -> u64 {
        if self.big { 20 } else { 12 }
    }

    fn inline_len(&self) -> u64 {
        if self.big { 8 } else { 4 }
    }

    pub fn read_ifd(&self, offset: u64) -> Result<Vec<IfdEntry>> {
        let mut cursor = ByteCursor::new(self.data).fork_at(offset)?;
        let count = if self.big {
            cursor.read_u64(self.endian)?
        } else {
            u64::from(cursor.read_u16(self.endian)?)
        };
        cursor.ensure(count.saturating_mul(self.entry_len()))?;

        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let tag = cursor.read_u16(self.endian)?;
            let field_type = cursor.read_u16(self.endian)?;
            let count = if self.big {
                cursor.read_u64(self.endian)?
            } else {
                u64::from(cursor.read_u32(self.endian)?)
            };

            let inline_pos = cursor.position() as u64;
            let value_offset = if self.big {
                cursor.read_u64(self.endian)?
            } else {
                u64::from(cursor.read_u32(self.endian)?)
            };

            let total = type_unit_size(field_type).map(|unit| unit.saturating_mul(count));
            let value_pos = match total {
                Some(total) if total <= self.inline_len() => inline_pos,
                _ => value_offset,
            };

            entries.push(IfdEntry {
                tag,
                field_type,
                count,
                value_pos,
            });
        }
        Ok(entries)
    }

    /// Reads up to `max` unsigned integer values of `entry`.
    pub fn uints(&self, entry: &IfdEntry, max: usize) -> Result<Vec<u64>> {
        let unit = match entry.field_type {
            TYPE_BYTE | TYPE_UNDEFINED => 1,
            TYPE_SHORT => 2,
            TYPE_LONG | TYPE_IFD => 4,
            TYPE_LONG8 | TYPE_IFD8 => 8,
            other => {
                return Err(ParseError::malformed(format!(
                    "tag 0x{:04x} has non-integer type {other}",
                    entry.tag
                )));
            }
        };

        let n = entry.count.min(max as u64);
        let mut cursor = ByteCursor::new(self.data).fork_at(entry.value_pos)?;
        cursor.ensure(n.saturating_mul(unit))?;

        (0..n)
            .map(|_| match unit {
                1 => cursor.read_u8().map(u64::from),
                2 => cursor.read_u16(self.endian).map(u64::from),
                4 => cursor.read_u32(self.endian).map(u64::from),
                _ => cursor.read_u64(self.endian),
            })
            .collect()
    }

    pub fn first_uint(&self, entry: &IfdEntry) -> Result<u64> {
        self.uints(entry, 1)?
            .first()
            .copied()
            .ok_or_else(|| ParseError::malformed(format!("tag 0x{:04x} has no values", entry.tag)))
    }
}

#[inline]
pub fn find_entry(entries: &[IfdEntry], tag: u16) -> Option<&IfdEntry> {
    entries.iter().find(|e| e.tag == tag)
}

/// The image-describing tags of one IFD.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ImageDirectory {
    width: Option<u64>,
    height: Option<u64>,
    bits_per_sample: Option<u64>,
    samples_per_pixel: Option<u64>,
    sample_format: Option<u64>,
    photometric: Option<u64>,
    orientation: Option<u64>,
    sub_ifds: Vec<u64>,
    dng: bool,
}

impl ImageDirectory {
    fn read(tiff: &Tiff<'_>, offset: u64, max_sub_ifds: usize) -> Result<Self> {
        let entries = tiff.read_ifd(offset)?;
        let value = |tag| {
            find_entry(&entries, tag)
                .map(|e| tiff.first_uint(e))
                .transpose()
        };

        let sub_ifds = match find_entry(&entries, TAG_SUB_IFDS) {
            Some(entry) => tiff.uints(entry, max_sub_ifds)?,
            None => Vec::new(),
        };

        Ok(Self {
            width: value(TAG_IMAGE_WIDTH)?,
            height: value(TAG_IMAGE_LENGTH)?,
            bits_per_sample: value(TAG_BITS_PER_SAMPLE)?,
            samples_per_pixel: value(TAG_SAMPLES_PER_PIXEL)?,
            sample_format: value(TAG_SAMPLE_FORMAT)?,
            photometric: value(TAG_PHOTOMETRIC)?,
            orientation: value(TAG_ORIENTATION)?,
            sub_ifds,
            dng: find_entry(&entries, TAG_DNG_VERSION).is_some(),
        })
    }
}

fn to_u32(value: u64, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| ParseError::malformed(format!("{field} {value} out of range")))
}

/// Parses a TIFF-based file, following at most `max_sub_ifds` SubIFDs.
pub fn parse(cursor: &mut ByteCursor<'_>, max_sub_ifds: usize) -> Result<ImageInfo> {
    let (tiff, header) = Tiff::open(cursor.as_slice())?;
    let ifd0 = ImageDirectory::read(&tiff, header.ifd0, max_sub_ifds)?;

    let mut primary = ifd0.clone();
    for &offset in &ifd0.sub_ifds {
        let sub = ImageDirectory::read(&tiff, offset, 0)?;
        debug!(offset, width = ?sub.width, "visited SubIFD");
        if sub.width.unwrap_or(0) > primary.width.unwrap_or(0) {
            primary = sub;
        }
    }

    let (width, height) = match (primary.width, primary.height) {
        (Some(w), Some(h)) => (to_u32(w, "ImageWidth")?, to_u32(h, "ImageLength")?),
        (None, Some(_)) => return Err(ParseError::MissingTag("ImageWidth")),
        (Some(_), None) => return Err(ParseError::MissingTag("ImageLength")),
        (None, None) => return Err(ParseError::MissingTag("ImageWidth and ImageLength")),
    };

    let bit_depth = primary.bits_per_sample.unwrap_or(1);
    let bit_depth = u8::try_from(bit_depth)
        .ok()
        .filter(|b| (1..=64).contains(b))
        .ok_or_else(|| ParseError::malformed(format!("BitsPerSample {bit_depth}")))?;
    let channels = to_u32(primary.samples_per_pixel.unwrap_or(1), "SamplesPerPixel")?;

    let sample_kind = match primary.sample_format.and_then(|f| u16::try_from(f).ok()) {
        Some(SAMPLE_FORMAT_FLOAT) => SampleKind::Float,
        Some(SAMPLE_FORMAT_INT) => SampleKind::Signed,
        _ => SampleKind::Unsigned,
    };

    let format = if ifd0.dng {
        FormatTag::Dng
    } else {
        FormatTag::Tiff
    };
    let orientation = ifd0
        .orientation
        .or(primary.orientation)
        .and_then(|o| u32::try_from(o).ok())
        .and_then(Orientation::from_exif);
    let cfa_raw = matches!(
        primary.photometric.and_then(|p| u16::try_from(p).ok()),
        Some(PHOTOMETRIC_CFA | PHOTOMETRIC_LINEAR_RAW)
    );

    debug!(%format, width, height, bit_depth, channels, cfa_raw, "parsed TIFF directory");

    Ok(
        ImageInfo::new(format, width, height, channels, bit_depth, sample_kind)?
            .with_orientation(orientation)
            .with_cfa_raw(cfa_raw),
    )
}

/// Orientation from the IFD0 of an EXIF TIFF block. `Ok(None)` when the tag
/// is absent or out of range.
pub(crate) fn read_orientation(block: &[u8]) -> Result<Option<Orientation>> {
    let (tiff, header) = Tiff::open(block)?;
    let entries = tiff.read_ifd(header.ifd0)?;
    match find_entry(&entries, TAG_ORIENTATION) {
        Some(entry) => {
            let value = tiff.first_uint(entry)?;
            Ok(u32::try_from(value).ok().and_then(Orientation::from_exif))
        }
        None => Ok(None),
    }
}
