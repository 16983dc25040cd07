//! Error types for table authoring

use crate::schema::SchemaError;
use thiserror::Error;

/// Errors raised while serializing a table instance against its schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorError {
    /// The value written does not belong to the next field in layout order
    #[error("{schema}: expected field {expected}, got {found}")]
    FieldMismatch {
        /// Schema being written
        schema: &'static str,
        /// Path of the next leaf in layout order
        expected: String,
        /// Field name passed by the caller
        found: &'static str,
    },

    /// The value written has the wrong size for its field
    #[error("{schema}: field {field} holds {expected} bytes, got {actual}")]
    WidthMismatch {
        /// Schema being written
        schema: &'static str,
        /// Leaf path
        field: String,
        /// Byte size declared by the schema
        expected: usize,
        /// Byte size supplied
        actual: usize,
    },

    /// An integer does not fit in the field width
    #[error("{schema}: value {value:#x} does not fit in {width}-byte field {field}")]
    ValueOverflow {
        /// Schema being written
        schema: &'static str,
        /// Leaf path
        field: String,
        /// Rejected value
        value: u64,
        /// Field width in bytes
        width: usize,
    },

    /// A value was written after the last field
    #[error("{schema}: field {field} written past the end of the record")]
    UnexpectedField {
        /// Schema being written
        schema: &'static str,
        /// Field name passed by the caller
        field: &'static str,
    },

    /// `finish` was called before every field was written
    #[error("{schema}: record incomplete, next unwritten field is {next}")]
    IncompleteRecord {
        /// Schema being written
        schema: &'static str,
        /// Path of the first unwritten leaf
        next: String,
    },

    /// Schema construction failed while authoring
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl AuthorError {
    /// Taxonomy name of this condition
    pub fn condition(&self) -> &'static str {
        match self {
            Self::FieldMismatch { .. } => "FieldMismatch",
            Self::WidthMismatch { .. } => "WidthMismatch",
            Self::ValueOverflow { .. } => "ValueOverflow",
            Self::UnexpectedField { .. } => "UnexpectedField",
            Self::IncompleteRecord { .. } => "IncompleteRecord",
            Self::Schema(err) => err.condition(),
        }
    }
}

/// Result type for authoring operations
pub type Result<T> = std::result::Result<T, AuthorError>;
