//! Error types for extraction, verification and configuration.
//!
//! Every error exposes `condition()`, the short name printed as
//! `error[<Condition>]` by the command line tool.

use acgen_formats::author::AuthorError;
use acgen_formats::{ChecksumError, ScanError, SchemaError};
use std::path::PathBuf;
use thiserror::Error;

/// Filesystem errors, always carrying the offending path.
#[derive(Debug, Error)]
pub enum IoError {
    /// Path does not exist, is unreadable or is not a regular file
    #[error("{}: not found or not a regular file", .path.display())]
    NotFound {
        /// Requested path
        path: PathBuf,
        /// Underlying I/O error, if any
        #[source]
        source: Option<std::io::Error>,
    },

    /// Fewer bytes were read than the file reported
    #[error("{}: short read, expected {expected} bytes but got {actual}", .path.display())]
    ShortRead {
        /// File being read
        path: PathBuf,
        /// Size reported by the filesystem
        expected: u64,
        /// Bytes actually read
        actual: usize,
        /// Underlying I/O error, if any
        #[source]
        source: Option<std::io::Error>,
    },

    /// File could not be created or fully written
    #[error("{}: write failed after {written} of {requested} bytes", .path.display())]
    WriteFailure {
        /// File being written
        path: PathBuf,
        /// Bytes written before the failure
        written: usize,
        /// Bytes requested
        requested: usize,
        /// Underlying I/O error, if any
        #[source]
        source: Option<std::io::Error>,
    },

    /// Output directory could not be created
    #[error("{}: cannot create directory", .path.display())]
    CreateDir {
        /// Directory path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl IoError {
    /// Taxonomy name of this condition
    pub fn condition(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NotFound",
            Self::ShortRead { .. } => "ShortRead",
            Self::WriteFailure { .. } | Self::CreateDir { .. } => "WriteFailure",
        }
    }
}

/// Findings that make a finalized table file invalid.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// File could not be read
    #[error(transparent)]
    Io(#[from] IoError),

    /// File is smaller than a table header
    #[error("{}: {len} bytes is shorter than the 36-byte header", .path.display())]
    TooShort {
        /// Verified file
        path: PathBuf,
        /// File size
        len: usize,
    },

    /// Header signature does not match the file name
    #[error("{}: file name expects {expected} but table signature is {found}", .path.display())]
    SignatureMismatch {
        /// Verified file
        path: PathBuf,
        /// Signature derived from the file stem
        expected: String,
        /// Signature in the header
        found: String,
    },

    /// Header length disagrees with the file size
    #[error("{}: header declares {declared} bytes but file has {actual}", .path.display())]
    LengthMismatch {
        /// Verified file
        path: PathBuf,
        /// Header `Length`
        declared: u32,
        /// File size
        actual: usize,
    },

    /// Bytes do not sum to zero
    #[error("{}: byte sum is {sum:#04x}, expected 0", .path.display())]
    BadChecksum {
        /// Verified file
        path: PathBuf,
        /// Byte sum modulo 256
        sum: u8,
    },

    /// Node walk of a structured table failed
    #[error("{}: offset {offset:#06x}: {reason}", .path.display())]
    MalformedStructure {
        /// Verified file
        path: PathBuf,
        /// Offset of the offending node
        offset: usize,
        /// What is wrong with it
        reason: String,
    },

    /// Directory argument holds no `.aml` files
    #[error("{}: no .aml files found", .path.display())]
    NoTables {
        /// Directory searched
        path: PathBuf,
    },

    /// Header could not be decoded
    #[error("{}: {source}", .path.display())]
    Header {
        /// Verified file
        path: PathBuf,
        /// Decoding failure
        #[source]
        source: ScanError,
    },
}

impl VerifyError {
    /// Taxonomy name of this condition
    pub fn condition(&self) -> &'static str {
        match self {
            Self::Io(err) => err.condition(),
            Self::TooShort { .. } => "TooShort",
            Self::SignatureMismatch { .. } => "SignatureMismatch",
            Self::LengthMismatch { .. } => "LengthMismatch",
            Self::BadChecksum { .. } => "BadChecksum",
            Self::MalformedStructure { .. } => "MalformedStructure",
            Self::NoTables { .. } => "NotFound",
            Self::Header { source, .. } => source.condition(),
        }
    }
}

/// Invalid run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Worker count of zero
    #[error("job count must be at least 1")]
    ZeroJobs,

    /// Output path exists and is not a directory
    #[error("output path {} exists and is not a directory", .0.display())]
    OutputNotDirectory(PathBuf),

    /// Worker pool could not be started
    #[error("cannot start worker pool: {0}")]
    WorkerPool(String),
}

impl ConfigError {
    /// Taxonomy name of this condition
    pub fn condition(&self) -> &'static str {
        match self {
            Self::ZeroJobs | Self::OutputNotDirectory(_) => "InvalidConfig",
            Self::WorkerPool(_) => "WorkerPool",
        }
    }
}

/// Any failure of an `acgen` operation.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Filesystem failure
    #[error(transparent)]
    Io(#[from] IoError),

    /// Magic scan or header validation failure
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Checksum finalization failure
    #[error(transparent)]
    Checksum(#[from] ChecksumError),

    /// Schema construction failure
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Table authoring failure
    #[error(transparent)]
    Author(#[from] AuthorError),

    /// Verification failure
    #[error(transparent)]
    Verify(#[from] VerifyError),

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Report serialization failure
    #[error("cannot serialize report: {0}")]
    Report(#[from] serde_json::Error),
}

impl ExtractError {
    /// Taxonomy name of this condition
    pub fn condition(&self) -> &'static str {
        match self {
            Self::Io(err) => err.condition(),
            Self::Scan(err) => err.condition(),
            Self::Checksum(err) => err.condition(),
            Self::Schema(err) => err.condition(),
            Self::Author(err) => err.condition(),
            Self::Verify(err) => err.condition(),
            Self::Config(err) => err.condition(),
            Self::Report(_) => "ReportFailure",
        }
    }
}

/// Result type for `acgen` operations
pub type Result<T> = std::result::Result<T, ExtractError>;

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_conditions_pass_through() {
        let err = ExtractError::from(ScanError::TruncatedArtifact { offset: 12 });
        assert_eq!(err.condition(), "TruncatedArtifact");
        assert!(err.to_string().contains("0xc"));

        let err = ExtractError::from(IoError::CreateDir {
            path: PathBuf::from("/out"),
            source: std::io::Error::other("denied"),
        });
        assert_eq!(err.condition(), "WriteFailure");

        let err = ExtractError::from(VerifyError::from(IoError::NotFound {
            path: PathBuf::from("missing.aml"),
            source: None,
        }));
        assert_eq!(err.condition(), "NotFound");
        assert_eq!(err.to_string(), "missing.aml: not found or not a regular file");
    }

    #[test]
    fn test_messages_name_the_path() {
        let err = VerifyError::BadChecksum {
            path: PathBuf::from("GTDT.aml"),
            sum: 0x07,
        };
        assert_eq!(err.to_string(), "GTDT.aml: byte sum is 0x07, expected 0");
        assert_eq!(err.condition(), "BadChecksum");
    }
}
