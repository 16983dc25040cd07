use super::error::{Result, SchemaError};
use super::field::{Count, Field, FieldDef, FieldKind};
use super::layout::TableSchema;
use std::collections::HashSet;
use std::sync::Arc;

/// Ordered, not yet size-checked list of field declarations
///
/// Fields are appended in layout order. Counts may reference named parameters
/// that are bound by [`SchemaTemplate::instantiate`], which is also where the
/// documented size is enforced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaTemplate {
    name: &'static str,
    fields: Vec<FieldDef>,
}

impl SchemaTemplate {
    /// Start an empty template
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    /// Template name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared fields in layout order
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Append a single little-endian integer or byte of `width` bytes
    pub fn scalar(self, name: &'static str, width: usize) -> Self {
        self.field(name, FieldKind::Scalar(width), Count::Fixed(1))
    }

    /// Append a fixed-length array of `count` elements of `width` bytes
    pub fn array(self, name: &'static str, width: usize, count: usize) -> Self {
        self.field(name, FieldKind::Scalar(width), Count::Fixed(count))
    }

    /// Append an array whose length is bound at instantiation
    pub fn param_array(self, name: &'static str, width: usize, parameter: &'static str) -> Self {
        self.field(name, FieldKind::Scalar(width), Count::Param(parameter))
    }

    /// Append explicit padding of `len` bytes
    ///
    /// There is no implicit alignment anywhere in a schema, so any gap the
    /// target table requires has to be spelled out with this.
    pub fn reserved(self, name: &'static str, len: usize) -> Self {
        self.array(name, 1, len)
    }

    /// Append a nested schema
    pub fn composite(self, name: &'static str, schema: &Arc<TableSchema>) -> Self {
        self.field(
            name,
            FieldKind::Composite(Arc::clone(schema)),
            Count::Fixed(1),
        )
    }

    /// Append an array of nested schemas
    pub fn composite_array(self, name: &'static str, schema: &Arc<TableSchema>, count: Count) -> Self {
        self.field(name, FieldKind::Composite(Arc::clone(schema)), count)
    }

    /// Append an arbitrary field declaration
    pub fn field(mut self, name: &'static str, kind: FieldKind, count: Count) -> Self {
        self.fields.push(FieldDef { name, kind, count });
        self
    }

    /// Finalize a template that has no parameterized counts
    pub fn build(&self, expected: usize) -> Result<Arc<TableSchema>> {
        self.instantiate(&[], expected)
    }

    /// Bind parameters, lay out offsets and check the total against `expected`
    ///
    /// `expected` is the size documented for this table kind and revision;
    /// any disagreement fails with [`SchemaError::SizeMismatch`].
    pub fn instantiate(
        &self,
        bindings: &[(&'static str, usize)],
        expected: usize,
    ) -> Result<Arc<TableSchema>> {
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(self.fields.len());
        let mut offset = 0usize;

        for def in &self.fields {
            if !seen.insert(def.name) {
                return Err(SchemaError::DuplicateField {
                    schema: self.name,
                    field: def.name,
                });
            }

            let width = def.kind.element_width();
            if width == 0 {
                return Err(SchemaError::ZeroWidth {
                    schema: self.name,
                    field: def.name,
                });
            }

            let count = match def.count {
                Count::Fixed(count) => count,
                Count::Param(parameter) => bindings
                    .iter()
                    .find(|(name, _)| *name == parameter)
                    .map(|(_, value)| *value)
                    .ok_or(SchemaError::UnboundParameter {
                        schema: self.name,
                        field: def.name,
                        parameter,
                    })?,
            };

            let size = width
                .checked_mul(count)
                .and_then(|size| size.checked_add(offset))
                .ok_or(SchemaError::SizeOverflow {
                    schema: self.name,
                    field: def.name,
                })?;

            fields.push(Field {
                name: def.name,
                kind: def.kind.clone(),
                count,
                offset,
            });
            offset = size;
        }

        if offset != expected {
            return Err(SchemaError::SizeMismatch {
                schema: self.name,
                expected,
                actual: offset,
            });
        }

        tracing::trace!(schema = self.name, size = offset, "schema finalized");
        Ok(Arc::new(TableSchema::from_parts(self.name, fields, offset)))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn node_header() -> SchemaTemplate {
        SchemaTemplate::new("NODE")
            .scalar("Type", 1)
            .scalar("Length", 2)
            .scalar("Revision", 1)
    }

    #[test]
    fn test_build_fixed() {
        let schema = node_header().build(4).expect("Test operation should succeed");
        assert_eq!(schema.size(), 4);
        assert_eq!(schema.fields().len(), 3);
        assert_eq!(schema.fields()[1].offset, 1);
        assert_eq!(schema.fields()[2].offset, 3);
    }

    #[test]
    fn test_build_wrong_constant() {
        let err = node_header().build(8).expect_err("Test operation should fail");
        assert_eq!(
            err,
            SchemaError::SizeMismatch {
                schema: "NODE",
                expected: 8,
                actual: 4,
            }
        );
    }

    #[test]
    fn test_instantiate_parameter() {
        let template = node_header().param_array("Payload", 4, "n");
        let schema = template
            .instantiate(&[("n", 3)], 16)
            .expect("Test operation should succeed");
        assert_eq!(schema.size(), 16);
        assert_eq!(schema.fields()[3].count, 3);

        // Same template, different binding
        let schema = template
            .instantiate(&[("n", 0)], 4)
            .expect("Test operation should succeed");
        assert_eq!(schema.size(), 4);
    }

    #[test]
    fn test_unbound_parameter() {
        let template = node_header().param_array("Payload", 4, "n");
        assert!(matches!(
            template.build(4),
            Err(SchemaError::UnboundParameter {
                parameter: "n",
                field: "Payload",
                ..
            })
        ));
    }

    #[test]
    fn test_duplicate_field() {
        let template = node_header().scalar("Type", 1);
        assert!(matches!(
            template.build(5),
            Err(SchemaError::DuplicateField { field: "Type", .. })
        ));
    }

    #[test]
    fn test_zero_width() {
        let template = SchemaTemplate::new("BROKEN").array("Nothing", 0, 4);
        assert!(matches!(
            template.build(0),
            Err(SchemaError::ZeroWidth { .. })
        ));
    }

    #[test]
    fn test_composite_adds_without_padding() {
        let inner = node_header().build(4).expect("Test operation should succeed");
        let outer = SchemaTemplate::new("OUTER")
            .scalar("Flag", 1)
            .composite("Node", &inner)
            .scalar("Tail", 8)
            .build(13)
            .expect("Test operation should succeed");

        // A 1-byte field followed by composites and u64s is never realigned
        assert_eq!(outer.fields()[1].offset, 1);
        assert_eq!(outer.fields()[2].offset, 5);
    }

    #[test]
    fn test_composite_array_parameter() {
        let inner = node_header().build(4).expect("Test operation should succeed");
        let template =
            SchemaTemplate::new("LIST").composite_array("Nodes", &inner, Count::Param("nodes"));
        let schema = template
            .instantiate(&[("nodes", 5)], 20)
            .expect("Test operation should succeed");
        assert_eq!(schema.size(), 20);
    }
}
