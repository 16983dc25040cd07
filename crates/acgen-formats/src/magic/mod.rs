//! Magic-bracket protocol for locating tables inside compiled artifacts
//!
//! Every authored table is embedded as
//!
//! ```text
//! 'A' 'C' 'G' 'S' | header + body | 'A' 'C' 'G' 'E'
//! ```
//!
//! so an offline tool can cut exactly the table bytes out of an otherwise
//! opaque binary. The protocol assumes the 4-byte sequences are rare enough
//! elsewhere in the artifact not to produce false positives; nothing here
//! guarantees that.

pub mod error;
mod scanner;

pub use error::ScanError;
pub use scanner::MagicScanner;

use crate::header::TableHeader;
use std::ops::Range;

/// Sequence immediately preceding an embedded table
pub const START_MAGIC: [u8; 4] = *b"ACGS";

/// Sequence immediately following an embedded table
pub const END_MAGIC: [u8; 4] = *b"ACGE";

/// Half-open byte range of one table inside an artifact, magic excluded
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtractedRecord {
    start: usize,
    end: usize,
}

impl ExtractedRecord {
    /// Record covering `[start, end)`
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Byte range within the artifact
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Offset of the first table byte
    pub fn start(&self) -> usize {
        self.start
    }

    /// Number of bytes between the magic sequences
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the magic sequences were adjacent
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Table bytes within the artifact this record was scanned from
    pub fn bytes<'a>(&self, artifact: &'a [u8]) -> &'a [u8] {
        &artifact[self.range()]
    }

    /// Decode the header and check its `Length` against the record span
    ///
    /// A disagreement means the table was mis-authored or the artifact is
    /// corrupt, and is always an error.
    pub fn validate_length(&self, artifact: &[u8]) -> Result<TableHeader, ScanError> {
        let bytes = self.bytes(artifact);
        if bytes.len() < TableHeader::SIZE {
            return Err(ScanError::TruncatedHeader {
                offset: self.start,
                len: bytes.len(),
            });
        }

        let header = TableHeader::parse(bytes)?;
        if header.length as usize != bytes.len() {
            return Err(ScanError::LengthMismatch {
                offset: self.start,
                declared: header.length,
                actual: bytes.len(),
            });
        }

        Ok(header)
    }
}

/// Scan the whole artifact, returning every record or the first failure
///
/// On failure no records are returned at all.
pub fn scan_all(artifact: &[u8]) -> Result<Vec<ExtractedRecord>, ScanError> {
    MagicScanner::new(artifact).collect()
}
