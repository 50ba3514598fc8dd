use std::io;
use thiserror::Error;

/// Failure while walking one format's header structure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Truncated header: needed {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        offset: u64,
        needed: u64,
        available: u64,
    },

    #[error("Offset {offset} is out of bounds (len: {len})")]
    OutOfBounds { offset: u64, len: u64 },

    #[error("Signature does not match {expected}")]
    FormatMismatch { expected: &'static str },

    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    #[error("Missing required tag: {0}")]
    MissingTag(&'static str),

    #[error("No start-of-frame marker before end of stream")]
    NoFrameMarker,

    #[error("Unsupported element type: {0}")]
    UnsupportedDType(String),
}

impl ParseError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedHeader(msg.into())
    }
}

/// Failure reported by an external RAW or EXIF collaborator.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("RAW decoder: {0}")]
    Raw(String),

    #[error("EXIF reader: {0}")]
    Exif(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Failure of one `inspect` call.
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("File is not a recognized image format")]
    UnsupportedFormat,

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

pub type Result<T> = std::result::Result<T, ParseError>;
