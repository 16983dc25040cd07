use super::error::{AuthorError, Result};
use crate::schema::{Leaf, TableSchema};

/// Serializes one record leaf by leaf, in the schema's declared order
///
/// Every `put_*` call names the field it writes. The name and byte size are
/// checked against the next leaf of the schema, so a value can never land in
/// the wrong slot when a field is added, removed or resized. Multi-byte
/// integers are written least-significant byte first.
///
/// ```rust
/// use acgen_formats::author::RecordWriter;
/// use acgen_formats::schema::SchemaTemplate;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let schema = SchemaTemplate::new("NODE")
///     .scalar("Type", 1)
///     .scalar("Length", 2)
///     .reserved("Reserved", 1)
///     .build(4)?;
///
/// let mut writer = RecordWriter::new(&schema);
/// writer
///     .put_u8("Type", 1)?
///     .put_usize("Length", schema.size())?
///     .put_zeros("Reserved")?;
/// assert_eq!(writer.finish()?, vec![1, 4, 0, 0]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RecordWriter {
    schema: &'static str,
    leaves: Vec<Leaf>,
    next: usize,
    buffer: Vec<u8>,
}

impl RecordWriter {
    /// Start writing a record for `schema`
    pub fn new(schema: &TableSchema) -> Self {
        Self {
            schema: schema.name(),
            leaves: schema.leaves(),
            next: 0,
            buffer: Vec::with_capacity(schema.size()),
        }
    }

    /// Offset at which the next field will be written
    pub fn position(&self) -> usize {
        self.buffer.len()
    }

    /// Next leaf to be written, if any
    pub fn next_field(&self) -> Option<&Leaf> {
        self.leaves.get(self.next)
    }

    /// Write a 1-byte field
    pub fn put_u8(&mut self, name: &'static str, value: u8) -> Result<&mut Self> {
        self.put_scalar(name, &[value])
    }

    /// Write a 2-byte little-endian field
    pub fn put_u16(&mut self, name: &'static str, value: u16) -> Result<&mut Self> {
        self.put_scalar(name, &value.to_le_bytes())
    }

    /// Write a 4-byte little-endian field
    pub fn put_u32(&mut self, name: &'static str, value: u32) -> Result<&mut Self> {
        self.put_scalar(name, &value.to_le_bytes())
    }

    /// Write an 8-byte little-endian field
    pub fn put_u64(&mut self, name: &'static str, value: u64) -> Result<&mut Self> {
        self.put_scalar(name, &value.to_le_bytes())
    }

    /// Write a size or offset into a single integer field of whatever width
    /// the schema declares, failing if it does not fit
    pub fn put_usize(&mut self, name: &'static str, value: usize) -> Result<&mut Self> {
        let leaf = self.expect_leaf(name)?;
        if leaf.count != 1 || leaf.width > 8 {
            return Err(self.width_mismatch(leaf.size(), 8));
        }

        let width = leaf.width;
        let value = value as u64;
        if width < 8 && value >> (width * 8) != 0 {
            return Err(AuthorError::ValueOverflow {
                schema: self.schema,
                field: leaf.path.clone(),
                value,
                width,
            });
        }

        let bytes = value.to_le_bytes();
        self.commit(&bytes[..width]);
        Ok(self)
    }

    /// Write a field verbatim; `bytes` must cover the whole field
    pub fn put_bytes(&mut self, name: &'static str, bytes: &[u8]) -> Result<&mut Self> {
        let leaf = self.expect_leaf(name)?;
        if leaf.size() != bytes.len() {
            return Err(self.width_mismatch(leaf.size(), bytes.len()));
        }
        self.commit(bytes);
        Ok(self)
    }

    /// Write an array of 4-byte little-endian integers
    pub fn put_u32_array(&mut self, name: &'static str, values: &[u32]) -> Result<&mut Self> {
        let leaf = self.expect_leaf(name)?;
        if leaf.width != 4 || leaf.count != values.len() {
            return Err(self.width_mismatch(leaf.size(), values.len() * 4));
        }
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.commit(&bytes);
        Ok(self)
    }

    /// Write a NUL-terminated string, zero-filling the rest of the field
    pub fn put_str(&mut self, name: &'static str, value: &str) -> Result<&mut Self> {
        let leaf = self.expect_leaf(name)?;
        let needed = value.len() + 1;
        if leaf.width != 1 || needed > leaf.size() {
            return Err(self.width_mismatch(leaf.size(), needed));
        }
        let mut bytes = vec![0u8; leaf.size()];
        bytes[..value.len()].copy_from_slice(value.as_bytes());
        self.commit(&bytes);
        Ok(self)
    }

    /// Fill a field with zeros
    pub fn put_zeros(&mut self, name: &'static str) -> Result<&mut Self> {
        let leaf = self.expect_leaf(name)?;
        let zeros = vec![0u8; leaf.size()];
        self.commit(&zeros);
        Ok(self)
    }

    /// Finish the record, failing if any field was left unwritten
    pub fn finish(self) -> Result<Vec<u8>> {
        if let Some(leaf) = self.leaves.get(self.next) {
            return Err(AuthorError::IncompleteRecord {
                schema: self.schema,
                next: leaf.path.clone(),
            });
        }
        Ok(self.buffer)
    }

    fn put_scalar(&mut self, name: &'static str, bytes: &[u8]) -> Result<&mut Self> {
        let leaf = self.expect_leaf(name)?;
        if leaf.count != 1 || leaf.width != bytes.len() {
            return Err(self.width_mismatch(leaf.size(), bytes.len()));
        }
        self.commit(bytes);
        Ok(self)
    }

    fn expect_leaf(&self, name: &'static str) -> Result<&Leaf> {
        let leaf = self
            .leaves
            .get(self.next)
            .ok_or(AuthorError::UnexpectedField {
                schema: self.schema,
                field: name,
            })?;

        if leaf.name != name {
            return Err(AuthorError::FieldMismatch {
                schema: self.schema,
                expected: leaf.path.clone(),
                found: name,
            });
        }

        Ok(leaf)
    }

    fn width_mismatch(&self, expected: usize, actual: usize) -> AuthorError {
        AuthorError::WidthMismatch {
            schema: self.schema,
            field: self
                .leaves
                .get(self.next)
                .map(|leaf| leaf.path.clone())
                .unwrap_or_default(),
            expected,
            actual,
        }
    }

    fn commit(&mut self, bytes: &[u8]) {
        debug_assert_eq!(
            self.leaves.get(self.next).map(|leaf| leaf.offset),
            Some(self.buffer.len())
        );
        self.buffer.extend_from_slice(bytes);
        self.next += 1;
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::schema::{Count, SchemaTemplate};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn mapping() -> Arc<TableSchema> {
        SchemaTemplate::new("MAPPING")
            .scalar("Base", 4)
            .scalar("Flags", 1)
            .build(5)
            .expect("Test operation should succeed")
    }

    fn record() -> Arc<TableSchema> {
        SchemaTemplate::new("RECORD")
            .scalar("Type", 1)
            .scalar("Length", 2)
            .scalar("Address", 8)
            .composite_array("Maps", &mapping(), Count::Fixed(2))
            .array("Sizes", 4, 2)
            .array("Name", 1, 6)
            .reserved("Reserved", 3)
            .build(1 + 2 + 8 + 10 + 8 + 6 + 3)
            .expect("Test operation should succeed")
    }

    #[test]
    fn test_write_full_record() {
        let schema = record();
        let mut writer = RecordWriter::new(&schema);
        writer
            .put_u8("Type", 0x11)
            .and_then(|w| w.put_usize("Length", schema.size()))
            .and_then(|w| w.put_u64("Address", 0x0102_0304_0506_0708))
            .and_then(|w| w.put_u32("Base", 0xAABB_CCDD))
            .and_then(|w| w.put_u8("Flags", 1))
            .and_then(|w| w.put_u32("Base", 0))
            .and_then(|w| w.put_u8("Flags", 0))
            .and_then(|w| w.put_u32_array("Sizes", &[0x1000, 0xFFFFF]))
            .and_then(|w| w.put_str("Name", "_SB"))
            .and_then(|w| w.put_zeros("Reserved"))
            .expect("Test operation should succeed");

        let bytes = writer.finish().expect("Test operation should succeed");
        assert_eq!(bytes.len(), schema.size());
        assert_eq!(bytes[0], 0x11);
        assert_eq!(&bytes[1..3], &[38, 0]);
        assert_eq!(&bytes[3..11], &[8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(&bytes[11..15], &[0xDD, 0xCC, 0xBB, 0xAA]);
        assert_eq!(&bytes[21..25], &[0x00, 0x10, 0x00, 0x00]);
        assert_eq!(&bytes[29..35], b"_SB\0\0\0");
    }

    #[test]
    fn test_wrong_field_order() {
        let schema = record();
        let mut writer = RecordWriter::new(&schema);
        let err = writer
            .put_u16("Length", 1)
            .expect_err("Test operation should fail");
        assert!(matches!(
            err,
            AuthorError::FieldMismatch { ref expected, found: "Length", .. } if expected == "Type"
        ));
    }

    #[test]
    fn test_wrong_width() {
        let schema = record();
        let mut writer = RecordWriter::new(&schema);
        let err = writer
            .put_u32("Type", 1)
            .expect_err("Test operation should fail");
        assert!(matches!(
            err,
            AuthorError::WidthMismatch {
                expected: 1,
                actual: 4,
                ..
            }
        ));
        // Failed writes do not advance
        assert_eq!(writer.position(), 0);
        assert!(writer.put_u8("Type", 1).is_ok());
    }

    #[test]
    fn test_usize_overflow() {
        let schema = record();
        let mut writer = RecordWriter::new(&schema);
        writer.put_u8("Type", 0).expect("Test operation should succeed");
        let err = writer
            .put_usize("Length", 0x1_0000)
            .expect_err("Test operation should fail");
        assert!(matches!(
            err,
            AuthorError::ValueOverflow {
                value: 0x1_0000,
                width: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_string_too_long() {
        let schema = SchemaTemplate::new("STR")
            .array("Name", 1, 4)
            .build(4)
            .expect("Test operation should succeed");
        let mut writer = RecordWriter::new(&schema);
        // 4 characters leave no room for the terminator
        assert!(writer.put_str("Name", "ABCD").is_err());
        assert!(writer.put_str("Name", "ABC").is_ok());
    }

    #[test]
    fn test_incomplete_and_overrun() {
        let schema = mapping();
        let mut writer = RecordWriter::new(&schema);
        writer.put_u32("Base", 7).expect("Test operation should succeed");

        let next = writer.next_field().map(|leaf| leaf.path.clone());
        assert_eq!(next.as_deref(), Some("Flags"));
        let err = writer.finish().expect_err("Test operation should fail");
        assert!(matches!(err, AuthorError::IncompleteRecord { ref next, .. } if next == "Flags"));

        let mut writer = RecordWriter::new(&schema);
        writer
            .put_u32("Base", 7)
            .and_then(|w| w.put_u8("Flags", 0))
            .expect("Test operation should succeed");
        assert!(matches!(
            writer.put_u8("Flags", 0),
            Err(AuthorError::UnexpectedField { .. })
        ));
    }
}
