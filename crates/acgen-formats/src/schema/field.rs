//! Field descriptors used by schema templates and finalized layouts

use super::TableSchema;
use std::sync::Arc;

/// Number of elements a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Count {
    /// Count known when the template is declared
    Fixed(usize),
    /// Count bound by name when the template is instantiated
    Param(&'static str),
}

/// Element type of a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Little-endian integer or raw byte element of the given width
    Scalar(usize),
    /// Nested, already finalized schema
    Composite(Arc<TableSchema>),
}

impl FieldKind {
    /// Width of one element in bytes
    pub fn element_width(&self) -> usize {
        match self {
            Self::Scalar(width) => *width,
            Self::Composite(schema) => schema.size(),
        }
    }
}

/// Unbound field declaration inside a [`SchemaTemplate`](super::SchemaTemplate)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Field name, unique within its schema level
    pub name: &'static str,
    /// Element type
    pub kind: FieldKind,
    /// Element count
    pub count: Count,
}

/// Field of a finalized schema, with its resolved count and offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field name
    pub name: &'static str,
    /// Element type
    pub kind: FieldKind,
    /// Resolved element count
    pub count: usize,
    /// Byte offset from the start of the enclosing schema
    pub offset: usize,
}

impl Field {
    /// Width of one element in bytes
    pub fn element_width(&self) -> usize {
        self.kind.element_width()
    }

    /// Total bytes occupied by this field
    pub fn size(&self) -> usize {
        self.element_width() * self.count
    }

    /// Offset one past the last byte of this field
    pub fn end(&self) -> usize {
        self.offset + self.size()
    }
}

/// Primitive field reached by flattening every composite in a schema
///
/// Leaves are what actually get serialized: a record is the concatenation of
/// its leaves in order, with no gaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    /// Dotted path from the schema root, e.g. `Header.Checksum` or
    /// `BaseAddrRegister[1].Address`
    pub path: String,
    /// Name of the primitive field itself
    pub name: &'static str,
    /// Absolute byte offset within the root schema
    pub offset: usize,
    /// Width of one element
    pub width: usize,
    /// Element count
    pub count: usize,
}

impl Leaf {
    /// Total bytes occupied by this leaf
    pub fn size(&self) -> usize {
        self.width * self.count
    }
}
