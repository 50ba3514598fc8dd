//! External collaborators for formats the header parsers cannot answer
//! on their own.
//!
//! Sensor RAW containers (CR2, ORF, RW2, RAF) keep their real image
//! geometry in maker-specific structures, so they are handed to a
//! [`RawDecoder`]. Their orientation comes from an [`ExifReader`].

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::debug;

use crate::error::CollaboratorError;

/// Fallback bit depth when the decoder reports no white level.
const DEFAULT_RAW_BITS: u8 = 16;

/// Geometry reported by a RAW decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub bit_depth: u8,
}

pub trait RawDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<RawFrame, CollaboratorError>;
}

pub trait ExifReader: Send + Sync {
    /// Tag name to value, primary image only. Empty when the file has no
    /// EXIF block.
    fn read(&self, path: &Path) -> Result<BTreeMap<String, String>, CollaboratorError>;
}

/// [`RawDecoder`] backed by `rawloader`. Decodes the full sensor image.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawLoaderDecoder;

impl RawDecoder for RawLoaderDecoder {
    fn decode(&self, path: &Path) -> Result<RawFrame, CollaboratorError> {
        debug!(path = %path.display(), "decoding RAW file");
        let image =
            rawloader::decode_file(path).map_err(|e| CollaboratorError::Raw(e.to_string()))?;

        let white = image.whitelevels.iter().copied().max().unwrap_or(0);
        let bit_depth = if white == 0 {
            DEFAULT_RAW_BITS
        } else {
            (u16::BITS - white.leading_zeros()) as u8
        };

        let dim = |v: usize, what: &str| {
            u32::try_from(v).map_err(|_| CollaboratorError::Raw(format!("{what} {v} out of range")))
        };

        Ok(RawFrame {
            width: dim(image.width, "width")?,
            height: dim(image.height, "height")?,
            channels: dim(image.cpp, "channels")?,
            bit_depth,
        })
    }
}

/// [`ExifReader`] backed by `kamadak-exif`.
#[derive(Debug, Default, Clone, Copy)]
pub struct KamadakExifReader;

impl ExifReader for KamadakExifReader {
    fn read(&self, path: &Path) -> Result<BTreeMap<String, String>, CollaboratorError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let exif = match exif::Reader::new().read_from_container(&mut reader) {
            Ok(exif) => exif,
            Err(exif::Error::NotFound(_)) => return Ok(BTreeMap::new()),
            Err(exif::Error::Io(err)) => return Err(CollaboratorError::Io(err)),
            Err(err) => return Err(CollaboratorError::Exif(err.to_string())),
        };

        let tags = exif
            .fields()
            .filter(|field| field.ifd_num == exif::In::PRIMARY)
            .map(|field| {
                let value = match field.value.get_uint(0) {
                    Some(n) => n.to_string(),
                    None => field.display_value().to_string(),
                };
                (field.tag.to_string(), value)
            })
            .collect();
        Ok(tags)
    }
}
