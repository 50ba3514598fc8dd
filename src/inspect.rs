use std::fmt;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::InspectError;
use crate::external::{ExifReader, KamadakExifReader, RawDecoder, RawLoaderDecoder};
use crate::formats;
use crate::io::{ByteCursor, ImageSource};
use crate::options::InspectOptions;
use crate::sniff::sniff;
use crate::types::{FormatTag, ImageInfo, Orientation, SampleKind};

const EXIF_ORIENTATION_KEY: &str = "Orientation";

/// Sniffs a source, runs the matching header parser and, for sensor RAW
/// files, consults the external collaborators.
///
/// Holds no per-call state, so one instance can serve many threads.
pub struct Inspector {
    options: InspectOptions,
    raw_decoder: Box<dyn RawDecoder>,
    exif_reader: Box<dyn ExifReader>,
}

impl fmt::Debug for Inspector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inspector")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new()
    }
}

impl Inspector {
    pub fn new() -> Self {
        Self::with_options(InspectOptions::default())
    }

    pub fn with_options(options: InspectOptions) -> Self {
        Self {
            options,
            raw_decoder: Box::new(RawLoaderDecoder),
            exif_reader: Box::new(KamadakExifReader),
        }
    }

    pub fn with_raw_decoder(mut self, decoder: impl RawDecoder + 'static) -> Self {
        self.raw_decoder = Box::new(decoder);
        self
    }

    pub fn with_exif_reader(mut self, reader: impl ExifReader + 'static) -> Self {
        self.exif_reader = Box::new(reader);
        self
    }

    pub fn options(&self) -> &InspectOptions {
        &self.options
    }

    pub fn inspect(&self, path: impl AsRef<Path>) -> Result<ImageInfo, InspectError> {
        let path = path.as_ref();
        let source = ImageSource::open(path)?;
        self.inspect_source(&source, Some(path))
    }

    /// Same as [`inspect`](Self::inspect) over an in-memory buffer. Sensor
    /// RAW data is refused, the collaborators need a file.
    pub fn inspect_bytes(&self, bytes: &[u8]) -> Result<ImageInfo, InspectError> {
        self.dispatch(bytes, None)
    }

    pub fn inspect_source(
        &self,
        source: &ImageSource,
        path: Option<&Path>,
    ) -> Result<ImageInfo, InspectError> {
        self.dispatch(source.as_bytes(), path)
    }

    fn dispatch(&self, bytes: &[u8], path: Option<&Path>) -> Result<ImageInfo, InspectError> {
        let mut cursor = ByteCursor::new(bytes);
        let tag = sniff(&cursor);
        debug!(format = %tag, len = bytes.len(), "sniffed source");

        if let FormatTag::RawSensor(_) = tag {
            return match path {
                Some(path) if self.options.decode_raw => self.inspect_raw(tag, path),
                _ => {
                    debug!(format = %tag, "RAW decoding unavailable for this source");
                    Err(InspectError::UnsupportedFormat)
                }
            };
        }

        let parse = formats::parser_for(tag).ok_or(InspectError::UnsupportedFormat)?;
        Ok(parse(&mut cursor, &self.options)?)
    }

    fn inspect_raw(&self, tag: FormatTag, path: &Path) -> Result<ImageInfo, InspectError> {
        let frame = self.raw_decoder.decode(path)?;

        let orientation = if self.options.read_exif {
            match self.exif_reader.read(path) {
                Ok(tags) => tags
                    .get(EXIF_ORIENTATION_KEY)
                    .and_then(|v| v.trim().parse::<u32>().ok())
                    .and_then(Orientation::from_exif),
                Err(err) => {
                    warn!(path = %path.display(), %err, "EXIF lookup failed");
                    None
                }
            }
        } else {
            None
        };

        let info = ImageInfo::new(
            tag,
            frame.width,
            frame.height,
            frame.channels,
            frame.bit_depth,
            SampleKind::Unsigned,
        )?
        .with_orientation(orientation)
        .with_cfa_raw(frame.channels == 1)
        // Geometry and bit depth are decoder estimates.
        .with_uncertain(true);

        debug!(format = %tag, width = info.width, height = info.height, "decoded RAW geometry");
        Ok(info)
    }
}

/// Inspects a file with a default [`Inspector`].
pub fn inspect(path: impl AsRef<Path>) -> Result<ImageInfo, InspectError> {
    Inspector::new().inspect(path)
}

/// Inspects an in-memory buffer with a default [`Inspector`].
pub fn inspect_bytes(bytes: &[u8]) -> Result<ImageInfo, InspectError> {
    Inspector::new().inspect_bytes(bytes)
}
