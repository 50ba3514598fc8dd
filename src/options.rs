//! Inspection options

/// Default cap on the SubIFDs visited when looking for the full-size
/// image of a DNG/NEF.
pub const DEFAULT_MAX_SUB_IFDS: usize = 16;

/// Options controlling one [`Inspector`](crate::Inspector)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectOptions {
    /// Ask the EXIF collaborator for orientation on sensor RAW files
    pub read_exif: bool,
    /// Hand sensor RAW files to the RAW collaborator (slow: decodes the file)
    pub decode_raw: bool,
    /// Maximum SubIFDs followed per TIFF
    pub max_sub_ifds: usize,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            read_exif: true,
            decode_raw: true,
            max_sub_ifds: DEFAULT_MAX_SUB_IFDS,
        }
    }
}

impl InspectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables EXIF lookups
    pub fn without_exif(mut self) -> Self {
        self.read_exif = false;
        self
    }

    /// Disables RAW decoding
    pub fn without_raw(mut self) -> Self {
        self.decode_raw = false;
        self
    }

    pub fn with_max_sub_ifds(mut self, max: usize) -> Self {
        self.max_sub_ifds = max;
        self
    }
}
