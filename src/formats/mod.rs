//! Per-format header parsers.
//!
//! Every parser takes a cursor positioned at offset 0, re-validates its own
//! magic and reads only as far as the fields it reports.

pub mod bmp;
pub mod exr;
pub mod hdr;
pub mod jpeg;
pub mod netpbm;
pub mod npy;
pub mod pfm;
pub mod png;
pub mod tiff;

use crate::error::Result;
use crate::io::ByteCursor;
use crate::options::InspectOptions;
use crate::types::{FormatTag, ImageInfo};

pub type ParseFn = fn(&mut ByteCursor<'_>, &InspectOptions) -> Result<ImageInfo>;

/// The native parser for `tag`, or `None` for tags that need an external
/// collaborator (sensor RAW) or have no parser at all.
pub fn parser_for(tag: FormatTag) -> Option<ParseFn> {
    let parse: ParseFn = match tag {
        FormatTag::NetpbmText | FormatTag::NetpbmBinary => |c, _| netpbm::parse(c),
        FormatTag::PortableFloatMap => |c, _| pfm::parse(c),
        FormatTag::Png => |c, _| png::parse(c),
        FormatTag::Bmp => |c, _| bmp::parse(c),
        FormatTag::Jpeg => |c, _| jpeg::parse(c),
        FormatTag::Tiff | FormatTag::Dng => |c, o| tiff::parse(c, o.max_sub_ifds),
        FormatTag::OpenExr => |c, _| exr::parse(c),
        FormatTag::RadianceHdr => |c, _| hdr::parse(c),
        FormatTag::TypedArray => |c, _| npy::parse(c),
        FormatTag::RawSensor(_) | FormatTag::Unknown => return None,
    };
    Some(parse)
}
