//! Image dimensions, channel count and bit depth from file headers.
//!
//! ```no_run
//! let info = imsize::inspect("photo.jpg")?;
//! println!("{} x {} x {}", info.width, info.height, info.channels);
//! # Ok::<(), imsize::InspectError>(())
//! ```
//!
//! Pixel data is never decoded. Sensor RAW containers are the exception and
//! go through the [`RawDecoder`] collaborator.

pub mod error;
pub mod external;
pub mod formats;
pub mod inspect;
pub mod io;
pub mod options;
pub mod sniff;
pub mod types;

pub use error::{CollaboratorError, InspectError, ParseError};
pub use external::{ExifReader, KamadakExifReader, RawDecoder, RawFrame, RawLoaderDecoder};
pub use inspect::{Inspector, inspect, inspect_bytes};
pub use io::{ByteCursor, Endian, ImageSource};
pub use options::InspectOptions;
pub use sniff::{sniff, sniff_bytes};
pub use types::{FormatTag, ImageInfo, MpEntry, MultiPicture, Orientation, RawKind, SampleKind};
