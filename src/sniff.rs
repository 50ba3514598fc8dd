//! Format detection from the leading signature.
//!
//! The table is ordered: containers that share a prefix with a more generic
//! format (CR2, ORF and RW2 all look like TIFF at byte 0) are listed before
//! it, so the first hit is always the most specific one.

use crate::io::ByteCursor;
use crate::types::{FormatTag, RawKind};

/// Upper bound on the bytes the sniffer looks at.
pub const SNIFF_LEN: usize = 32;

pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
pub const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
pub const EXR_MAGIC: [u8; 4] = [0x76, 0x2F, 0x31, 0x01];
pub const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

#[derive(Debug)]
struct Signature {
    tag: FormatTag,
    /// (offset, bytes) pairs that must all match.
    parts: &'static [(usize, &'static [u8])],
    /// Requires ASCII whitespace right after the last part.
    delimited: bool,
}

const fn sig(tag: FormatTag, parts: &'static [(usize, &'static [u8])]) -> Signature {
    Signature {
        tag,
        parts,
        delimited: false,
    }
}

const fn text_sig(tag: FormatTag, magic: &'static [(usize, &'static [u8])]) -> Signature {
    Signature {
        tag,
        parts: magic,
        delimited: true,
    }
}

static SIGNATURES: &[Signature] = &[
    sig(FormatTag::RawSensor(RawKind::Raf), &[(0, b"FUJIFILMCCD-RAW ")]),
    sig(FormatTag::RawSensor(RawKind::Orf), &[(0, b"IIRO\x08\x00")]),
    sig(FormatTag::RawSensor(RawKind::Orf), &[(0, b"IIRS\x08\x00")]),
    sig(FormatTag::RawSensor(RawKind::Orf), &[(0, b"MMOR\x00\x00")]),
    sig(
        FormatTag::RawSensor(RawKind::Rw2),
        &[(0, b"IIU\x00\x18\x00\x00\x00")],
    ),
    sig(
        FormatTag::RawSensor(RawKind::Cr2),
        &[(0, b"II*\x00"), (8, b"CR\x02\x00")],
    ),
    sig(FormatTag::Tiff, &[(0, b"II*\x00")]),
    sig(FormatTag::Tiff, &[(0, b"MM\x00*")]),
    sig(FormatTag::Tiff, &[(0, b"II+\x00")]),
    sig(FormatTag::Tiff, &[(0, b"MM\x00+")]),
    sig(FormatTag::Png, &[(0, &PNG_SIGNATURE)]),
    sig(FormatTag::Jpeg, &[(0, &[0xFF, 0xD8, 0xFF])]),
    sig(FormatTag::OpenExr, &[(0, &EXR_MAGIC)]),
    sig(FormatTag::TypedArray, &[(0, NPY_MAGIC)]),
    sig(FormatTag::RadianceHdr, &[(0, b"#?RADIANCE\n")]),
    sig(FormatTag::RadianceHdr, &[(0, b"#?RGBE\n")]),
    text_sig(FormatTag::PortableFloatMap, &[(0, b"PF")]),
    text_sig(FormatTag::PortableFloatMap, &[(0, b"Pf")]),
    text_sig(FormatTag::NetpbmText, &[(0, b"P1")]),
    text_sig(FormatTag::NetpbmText, &[(0, b"P2")]),
    text_sig(FormatTag::NetpbmText, &[(0, b"P3")]),
    text_sig(FormatTag::NetpbmBinary, &[(0, b"P4")]),
    text_sig(FormatTag::NetpbmBinary, &[(0, b"P5")]),
    text_sig(FormatTag::NetpbmBinary, &[(0, b"P6")]),
    sig(FormatTag::Bmp, &[(0, b"BM")]),
];

impl Signature {
    fn matches(&self, head: &[u8]) -> bool {
        let parts_match = self.parts.iter().all(|&(offset, magic)| {
            head.get(offset..offset + magic.len())
                .is_some_and(|window| window == magic)
        });
        if !parts_match {
            return false;
        }
        if !self.delimited {
            return true;
        }
        let end = self
            .parts
            .iter()
            .map(|&(offset, magic)| offset + magic.len())
            .max()
            .unwrap_or(0);
        head.get(end).is_some_and(|b| b.is_ascii_whitespace())
    }
}

/// Classifies the source from its first [`SNIFF_LEN`] bytes.
///
/// The cursor is not moved. Returns [`FormatTag::Unknown`] when nothing in
/// the table matches.
pub fn sniff(cursor: &ByteCursor<'_>) -> FormatTag {
    let data = cursor.as_slice();
    sniff_bytes(&data[..data.len().min(SNIFF_LEN)])
}

pub fn sniff_bytes(head: &[u8]) -> FormatTag {
    let head = &head[..head.len().min(SNIFF_LEN)];
    SIGNATURES
        .iter()
        .find(|s| s.matches(head))
        .map_or(FormatTag::Unknown, |s| s.tag)
}
