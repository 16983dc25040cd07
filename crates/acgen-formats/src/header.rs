//! The 36-byte header shared by every ACPI system description table
//!
//! Layout (little-endian, no padding):
//!
//! | Offset | Size | Field            |
//! |--------|------|------------------|
//! | 0      | 4    | Signature        |
//! | 4      | 4    | Length           |
//! | 8      | 1    | Revision         |
//! | 9      | 1    | Checksum         |
//! | 10     | 6    | OEM ID           |
//! | 16     | 8    | OEM Table ID     |
//! | 24     | 4    | OEM Revision     |
//! | 28     | 4    | Creator ID       |
//! | 32     | 4    | Creator Revision |

use crate::author::{AuthorError, RecordWriter};
use crate::schema::{SchemaError, SchemaTemplate, TableSchema};
use binrw::{BinRead, BinWrite};
use std::io::Cursor;
use std::sync::Arc;

/// Creator ID stamped into every authored table
pub const CREATOR_ID: [u8; 4] = *b"ALHA";

/// Creator revision stamped into every authored table
pub const CREATOR_REVISION: u32 = 0x0000_0001;

/// Identity fields an OEM stamps into every table it ships
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OemIdentity {
    /// OEM ID, space padded
    pub oem_id: [u8; 6],
    /// OEM table ID (manufacturer model ID)
    pub oem_table_id: [u8; 8],
    /// OEM revision
    pub oem_revision: u32,
    /// Vendor ID of the utility that created the table
    pub creator_id: [u8; 4],
    /// Revision of the utility that created the table
    pub creator_revision: u32,
}

impl OemIdentity {
    /// Identity with this tool's creator ID and revision
    pub const fn new(oem_id: [u8; 6], oem_table_id: [u8; 8], oem_revision: u32) -> Self {
        Self {
            oem_id,
            oem_table_id,
            oem_revision,
            creator_id: CREATOR_ID,
            creator_revision: CREATOR_REVISION,
        }
    }
}

/// ACPI table header
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[br(little)]
#[bw(little)]
pub struct TableHeader {
    /// Table signature, e.g. "GTDT"
    pub signature: [u8; 4],
    /// Length of the entire table in bytes, header included
    pub length: u32,
    /// Table revision
    pub revision: u8,
    /// Byte making the whole table sum to zero
    pub checksum: u8,
    /// OEM ID
    pub oem_id: [u8; 6],
    /// OEM table ID
    pub oem_table_id: [u8; 8],
    /// OEM revision
    pub oem_revision: u32,
    /// Creator ID
    pub creator_id: [u8; 4],
    /// Creator revision
    pub creator_revision: u32,
}

impl TableHeader {
    /// Encoded size in bytes
    pub const SIZE: usize = 36;

    /// Offset of the `Length` field
    pub const LENGTH_OFFSET: usize = 4;

    /// Offset of the `Checksum` field
    pub const CHECKSUM_OFFSET: usize = 9;

    /// Header with a zero checksum
    pub fn new(signature: [u8; 4], revision: u8, length: u32, oem: &OemIdentity) -> Self {
        Self {
            signature,
            length,
            revision,
            checksum: 0,
            oem_id: oem.oem_id,
            oem_table_id: oem.oem_table_id,
            oem_revision: oem.oem_revision,
            creator_id: oem.creator_id,
            creator_revision: oem.creator_revision,
        }
    }

    /// Header whose length is the size of the finalized table schema
    pub fn for_schema(
        signature: [u8; 4],
        revision: u8,
        schema: &TableSchema,
        oem: &OemIdentity,
    ) -> Result<Self, AuthorError> {
        let length = u32::try_from(schema.size()).map_err(|_| AuthorError::ValueOverflow {
            schema: schema.name(),
            field: "Header.Length".to_string(),
            value: schema.size() as u64,
            width: 4,
        })?;
        Ok(Self::new(signature, revision, length, oem))
    }

    /// Write the header leaves through a record writer
    ///
    /// The checksum is always authored as zero.
    pub fn author(&self, writer: &mut RecordWriter) -> Result<(), AuthorError> {
        writer
            .put_bytes("Signature", &self.signature)?
            .put_u32("Length", self.length)?
            .put_u8("Revision", self.revision)?
            .put_u8("Checksum", 0)?
            .put_bytes("OemId", &self.oem_id)?
            .put_bytes("OemTableId", &self.oem_table_id)?
            .put_u32("OemRevision", self.oem_revision)?
            .put_bytes("CreatorId", &self.creator_id)?
            .put_u32("CreatorRevision", self.creator_revision)?;
        Ok(())
    }

    /// Decode a header from the first 36 bytes of `data`
    pub fn parse(data: &[u8]) -> Result<Self, binrw::Error> {
        Self::read(&mut Cursor::new(data))
    }

    /// Encode to 36 bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, binrw::Error> {
        let mut buffer = Vec::with_capacity(Self::SIZE);
        self.write(&mut Cursor::new(&mut buffer))?;
        Ok(buffer)
    }

    /// Signature as text, with non-UTF-8 bytes replaced
    pub fn signature_str(&self) -> String {
        String::from_utf8_lossy(&self.signature).into_owned()
    }
}

/// Schema of [`TableHeader`]
pub fn header_schema() -> Result<Arc<TableSchema>, SchemaError> {
    SchemaTemplate::new("ACPI_TABLE_HEADER")
        .array("Signature", 1, 4)
        .scalar("Length", 4)
        .scalar("Revision", 1)
        .scalar("Checksum", 1)
        .array("OemId", 1, 6)
        .array("OemTableId", 1, 8)
        .scalar("OemRevision", 4)
        .array("CreatorId", 1, 4)
        .scalar("CreatorRevision", 4)
        .build(TableHeader::SIZE)
}

/// Start a table template with the common header as its first field
pub fn table_template(name: &'static str) -> Result<SchemaTemplate, SchemaError> {
    Ok(SchemaTemplate::new(name).composite("Header", &header_schema()?))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TEST_OEM: OemIdentity = OemIdentity::new(*b"TESTOE", *b"TESTTBL1", 2);

    #[test]
    fn test_header_schema_offsets() {
        let schema = header_schema().expect("Test operation should succeed");
        assert_eq!(schema.size(), 36);
        assert_eq!(schema.offset_of("Length"), Some(TableHeader::LENGTH_OFFSET));
        assert_eq!(schema.offset_of("Checksum"), Some(TableHeader::CHECKSUM_OFFSET));
        assert_eq!(schema.offset_of("OemId"), Some(10));
        assert_eq!(schema.offset_of("OemTableId"), Some(16));
        assert_eq!(schema.offset_of("OemRevision"), Some(24));
        assert_eq!(schema.offset_of("CreatorId"), Some(28));
        assert_eq!(schema.offset_of("CreatorRevision"), Some(32));
    }

    #[test]
    fn test_binrw_matches_schema_writer() {
        let header = TableHeader::new(*b"GTDT", 2, 0x1234_5678, &TEST_OEM);

        let schema = header_schema().expect("Test operation should succeed");
        let mut writer = RecordWriter::new(&schema);
        header
            .author(&mut writer)
            .expect("Test operation should succeed");
        let authored = writer.finish().expect("Test operation should succeed");

        let encoded = header.to_bytes().expect("Test operation should succeed");
        assert_eq!(authored, encoded);
        assert_eq!(&encoded[4..8], &[0x78, 0x56, 0x34, 0x12]);
        assert_eq!(&encoded[28..32], b"ALHA");
    }

    #[test]
    fn test_parse() {
        let header = TableHeader::new(*b"DBG2", 1, 36, &TEST_OEM);
        let mut bytes = header.to_bytes().expect("Test operation should succeed");
        bytes.extend_from_slice(&[0xEE; 8]);

        let parsed = TableHeader::parse(&bytes).expect("Test operation should succeed");
        assert_eq!(parsed, header);
        assert_eq!(parsed.signature_str(), "DBG2");
    }

    #[test]
    fn test_parse_short() {
        assert!(TableHeader::parse(&[0u8; 20]).is_err());
    }

    #[test]
    fn test_table_template_embeds_header() {
        let schema = table_template("EMPTY")
            .expect("Test operation should succeed")
            .build(36)
            .expect("Test operation should succeed");
        assert_eq!(schema.offset_of("Header.Checksum"), Some(9));

        let header = TableHeader::for_schema(*b"EMPT", 1, &schema, &TEST_OEM)
            .expect("Test operation should succeed");
        assert_eq!(header.length, 36);
        assert_eq!(header.checksum, 0);
    }
}
