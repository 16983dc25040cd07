//! Error types for magic scanning and record validation

use thiserror::Error;

/// Errors raised while locating or validating embedded tables
#[derive(Error, Debug)]
pub enum ScanError {
    /// A start magic has no end magic after it
    #[error("start magic at offset {offset:#x} has no matching end magic")]
    TruncatedArtifact {
        /// Offset of the unmatched start magic
        offset: usize,
    },

    /// The bracketed region is too short to hold a table header
    #[error("record at offset {offset:#x} is {len} bytes, shorter than a table header")]
    TruncatedHeader {
        /// Offset of the first record byte
        offset: usize,
        /// Record length
        len: usize,
    },

    /// The header length disagrees with the bracketed region
    #[error("record at offset {offset:#x} declares {declared} bytes but spans {actual}")]
    LengthMismatch {
        /// Offset of the first record byte
        offset: usize,
        /// `Length` field from the header
        declared: u32,
        /// Bytes between the magic sequences
        actual: usize,
    },

    /// Header decoding failed
    #[error("Binary format error: {0}")]
    Header(#[from] binrw::Error),
}

impl ScanError {
    /// Taxonomy name of this condition
    pub fn condition(&self) -> &'static str {
        match self {
            Self::TruncatedArtifact { .. } => "TruncatedArtifact",
            Self::TruncatedHeader { .. } => "TruncatedHeader",
            Self::LengthMismatch { .. } => "LengthMismatch",
            Self::Header(_) => "MalformedHeader",
        }
    }
}

/// Result type for scanning operations
pub type Result<T> = std::result::Result<T, ScanError>;
