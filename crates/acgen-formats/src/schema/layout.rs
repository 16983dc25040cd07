use super::field::{Field, FieldKind, Leaf};

/// Finalized, size-checked table layout
///
/// Only [`SchemaTemplate`](super::SchemaTemplate) constructs these, so every
/// `TableSchema` in existence has already passed its size check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    name: &'static str,
    fields: Vec<Field>,
    size: usize,
}

impl TableSchema {
    pub(super) fn from_parts(name: &'static str, fields: Vec<Field>, size: usize) -> Self {
        Self { name, fields, size }
    }

    /// Schema name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Total size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Top-level fields in layout order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a top-level field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Byte offset of a dotted field path
    ///
    /// Segments descend into composites and may carry an element index:
    /// `"UARD.BaseAddrRegister[0].Address"`. Returns `None` for unknown
    /// fields, out-of-range indices or descending into a scalar.
    pub fn offset_of(&self, path: &str) -> Option<usize> {
        let mut schema = self;
        let mut offset = 0usize;
        let mut segments = path.split('.').peekable();

        while let Some(segment) = segments.next() {
            let (name, index) = split_index(segment)?;
            let field = schema.field(name)?;
            if index >= field.count {
                return None;
            }
            offset += field.offset + index * field.element_width();

            if segments.peek().is_some() {
                match &field.kind {
                    FieldKind::Composite(inner) => schema = inner,
                    FieldKind::Scalar(_) => return None,
                }
            }
        }

        Some(offset)
    }

    /// Flatten every composite into its primitive leaves, in layout order
    pub fn leaves(&self) -> Vec<Leaf> {
        let mut leaves = Vec::new();
        self.collect_leaves("", 0, &mut leaves);
        leaves
    }

    fn collect_leaves(&self, prefix: &str, base: usize, out: &mut Vec<Leaf>) {
        for field in &self.fields {
            match &field.kind {
                FieldKind::Scalar(width) => {
                    // Zero-count arrays occupy no bytes and are not written
                    if field.count == 0 {
                        continue;
                    }
                    out.push(Leaf {
                        path: format!("{prefix}{}", field.name),
                        name: field.name,
                        offset: base + field.offset,
                        width: *width,
                        count: field.count,
                    });
                }
                FieldKind::Composite(inner) => {
                    for index in 0..field.count {
                        let nested = if field.count == 1 {
                            format!("{prefix}{}.", field.name)
                        } else {
                            format!("{prefix}{}[{index}].", field.name)
                        };
                        inner.collect_leaves(
                            &nested,
                            base + field.offset + index * inner.size(),
                            out,
                        );
                    }
                }
            }
        }
    }
}

fn split_index(segment: &str) -> Option<(&str, usize)> {
    match segment.split_once('[') {
        None => Some((segment, 0)),
        Some((name, rest)) => {
            let index = rest.strip_suffix(']')?.parse().ok()?;
            Some((name, index))
        }
    }
}
