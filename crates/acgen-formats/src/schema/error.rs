//! Error types for schema construction

use thiserror::Error;

/// Errors raised while declaring or instantiating a table schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The computed layout size disagrees with the documented size
    #[error("Schema {schema} size mismatch: documented {expected} bytes, declared fields sum to {actual} bytes")]
    SizeMismatch {
        /// Schema name
        schema: &'static str,
        /// Size documented for this table kind and revision
        expected: usize,
        /// Sum of `width * count` over all declared fields
        actual: usize,
    },

    /// A parameterized count was not bound at instantiation
    #[error("Schema {schema} field {field} uses unbound parameter '{parameter}'")]
    UnboundParameter {
        /// Schema name
        schema: &'static str,
        /// Field using the parameter
        field: &'static str,
        /// Parameter name
        parameter: &'static str,
    },

    /// A parameter value is out of range for the layout it drives
    #[error("Schema {schema} parameter '{parameter}' = {value}: {reason}")]
    InvalidParameter {
        /// Schema name
        schema: &'static str,
        /// Parameter name
        parameter: &'static str,
        /// Rejected value
        value: usize,
        /// Why the value was rejected
        reason: &'static str,
    },

    /// Two fields at the same nesting level share a name
    #[error("Schema {schema} declares field {field} twice")]
    DuplicateField {
        /// Schema name
        schema: &'static str,
        /// Repeated field name
        field: &'static str,
    },

    /// A field has zero width
    #[error("Schema {schema} field {field} has zero width")]
    ZeroWidth {
        /// Schema name
        schema: &'static str,
        /// Offending field
        field: &'static str,
    },

    /// `width * count` overflowed
    #[error("Schema {schema} field {field} size overflows")]
    SizeOverflow {
        /// Schema name
        schema: &'static str,
        /// Offending field
        field: &'static str,
    },
}

impl SchemaError {
    /// Taxonomy name of this condition
    pub fn condition(&self) -> &'static str {
        match self {
            Self::SizeMismatch { .. } => "SchemaSizeMismatch",
            Self::UnboundParameter { .. } => "UnboundParameter",
            Self::InvalidParameter { .. } => "InvalidParameter",
            Self::DuplicateField { .. } => "DuplicateField",
            Self::ZeroWidth { .. } => "ZeroWidth",
            Self::SizeOverflow { .. } => "SizeOverflow",
        }
    }
}

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;
