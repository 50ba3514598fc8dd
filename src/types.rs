use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ParseError, Result};

/// Sensor RAW containers whose signatures are distinguishable from plain TIFF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawKind {
    Cr2,
    Orf,
    Rw2,
    Raf,
}

impl RawKind {
    pub fn name(&self) -> &'static str {
        match self {
            RawKind::Cr2 => "cr2",
            RawKind::Orf => "orf",
            RawKind::Rw2 => "rw2",
            RawKind::Raf => "raf",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatTag {
    /// P1, P2, P3
    NetpbmText,
    /// P4, P5, P6
    NetpbmBinary,
    PortableFloatMap,
    Png,
    Bmp,
    Jpeg,
    Tiff,
    Dng,
    OpenExr,
    RadianceHdr,
    /// NumPy `.npy`
    TypedArray,
    RawSensor(RawKind),
    Unknown,
}

impl FormatTag {
    pub fn name(&self) -> &'static str {
        match self {
            FormatTag::NetpbmText | FormatTag::NetpbmBinary => "pnm",
            FormatTag::PortableFloatMap => "pfm",
            FormatTag::Png => "png",
            FormatTag::Bmp => "bmp",
            FormatTag::Jpeg => "jpeg",
            FormatTag::Tiff => "tiff",
            FormatTag::Dng => "dng",
            FormatTag::OpenExr => "exr",
            FormatTag::RadianceHdr => "hdr",
            FormatTag::TypedArray => "npy",
            FormatTag::RawSensor(kind) => kind.name(),
            FormatTag::Unknown => "unknown",
        }
    }

    #[inline]
    pub fn is_raw_sensor(&self) -> bool {
        matches!(self, FormatTag::RawSensor(_))
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleKind {
    Unsigned,
    Signed,
    Float,
}

/// EXIF orientation: where the stored 0th row and 0th column sit visually.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    TopLeft = 1,
    TopRight = 2,
    BottomRight = 3,
    BottomLeft = 4,
    LeftTop = 5,
    RightTop = 6,
    RightBottom = 7,
    LeftBottom = 8,
}

impl Orientation {
    pub fn from_exif(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::TopLeft),
            2 => Some(Self::TopRight),
            3 => Some(Self::BottomRight),
            4 => Some(Self::BottomLeft),
            5 => Some(Self::LeftTop),
            6 => Some(Self::RightTop),
            7 => Some(Self::RightBottom),
            8 => Some(Self::LeftBottom),
            _ => None,
        }
    }

    #[inline]
    pub fn to_exif(self) -> u8 {
        self as u8
    }

    /// Counter-clockwise quarter turns that bring the image upright.
    /// Mirroring is ignored.
    pub fn rot90_ccw_steps(self) -> u8 {
        match self {
            Self::TopLeft | Self::TopRight | Self::BottomLeft => 0,
            Self::BottomRight => 2,
            Self::LeftTop | Self::LeftBottom => 1,
            Self::RightTop | Self::RightBottom => 3,
        }
    }
}

/// One entry of a JPEG Multi-Picture Format index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MpEntry {
    /// Absolute file offset of the image's SOI.
    pub offset: u64,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiPicture {
    pub entries: Vec<MpEntry>,
}

/// Normalized header metadata shared by every format parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub format: FormatTag,
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub bit_depth: u8,
    pub sample_kind: SampleKind,
    pub orientation: Option<Orientation>,
    pub max_value: f64,
    pub cfa_raw: bool,
    pub uncertain: bool,
    pub multi_picture: Option<MultiPicture>,
}

impl ImageInfo {
    /// Builds a record, refusing zero dimensions.
    pub fn new(
        format: FormatTag,
        width: u32,
        height: u32,
        channels: u32,
        bit_depth: u8,
        sample_kind: SampleKind,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ParseError::malformed(format!(
                "zero dimension ({width}x{height})"
            )));
        }
        if channels == 0 {
            return Err(ParseError::malformed("zero channels"));
        }
        if bit_depth == 0 {
            return Err(ParseError::malformed("zero bit depth"));
        }

        let max_value = match sample_kind {
            SampleKind::Float => 1.0,
            SampleKind::Unsigned => f64::from(bit_depth).exp2() - 1.0,
            SampleKind::Signed => f64::from(bit_depth - 1).exp2() - 1.0,
        };

        Ok(Self {
            format,
            width,
            height,
            channels,
            bit_depth,
            sample_kind,
            orientation: None,
            max_value,
            cfa_raw: false,
            uncertain: false,
            multi_picture: None,
        })
    }

    pub fn with_orientation(mut self, orientation: Option<Orientation>) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_max_value(mut self, max_value: f64) -> Self {
        self.max_value = max_value;
        self
    }

    pub fn with_cfa_raw(mut self, cfa_raw: bool) -> Self {
        self.cfa_raw = cfa_raw;
        self
    }

    pub fn with_uncertain(mut self, uncertain: bool) -> Self {
        self.uncertain = uncertain;
        self
    }

    /// Bytes per sample once unpacked into a byte-aligned buffer.
    pub fn byte_depth(&self) -> u8 {
        match self.bit_depth {
            0..=8 => 1,
            9..=16 => 2,
            17..=32 => 4,
            _ => 8,
        }
    }

    /// Size of the decoded pixel buffer in bytes, saturating at `u64::MAX`.
    pub fn uncompressed_size(&self) -> u64 {
        u64::from(self.width)
            .saturating_mul(u64::from(self.height))
            .saturating_mul(u64::from(self.channels))
            .saturating_mul(u64::from(self.byte_depth()))
    }

    pub fn rot90_ccw_steps(&self) -> u8 {
        self.orientation.map_or(0, Orientation::rot90_ccw_steps)
    }

    /// Width and height as the image appears once rotated upright.
    pub fn display_dimensions(&self) -> (u32, u32) {
        if self.rot90_ccw_steps() % 2 == 1 {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    pub fn num_images(&self) -> usize {
        self.multi_picture
            .as_ref()
            .map_or(1, |mp| mp.entries.len().max(1))
    }

    #[inline]
    pub fn megapixels(&self) -> f64 {
        f64::from(self.width) * f64::from(self.height) / 1_000_000.0
    }
}
