//! Generic Address Structure (ACPI 6.6, section 5.2.3.2)

use crate::author::{AuthorError, RecordWriter};
use crate::schema::{SchemaError, SchemaTemplate, TableSchema};
use std::sync::Arc;

/// Encoded size in bytes
pub const SIZE: usize = 12;

/// Address space: system memory
pub const SPACE_SYSTEM_MEMORY: u8 = 0x00;
/// Address space: system I/O
pub const SPACE_SYSTEM_IO: u8 = 0x01;
/// Address space: PCI configuration space
pub const SPACE_PCI_CONFIG: u8 = 0x02;

/// Schema of the Generic Address Structure
pub fn schema() -> Result<Arc<TableSchema>, SchemaError> {
    SchemaTemplate::new("ACPI_GAS")
        .scalar("AddressSpaceID", 1)
        .scalar("RegisterBitWidth", 1)
        .scalar("RegisterBitOffset", 1)
        .scalar("AccessSize", 1)
        .scalar("Address", 8)
        .build(SIZE)
}

/// Generic Address Structure value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericAddress {
    /// Address space the register lives in
    pub address_space_id: u8,
    /// Register width in bits
    pub register_bit_width: u8,
    /// Bit offset of the register at `address`
    pub register_bit_offset: u8,
    /// Access size
    pub access_size: u8,
    /// Register address
    pub address: u64,
}

impl GenericAddress {
    /// 32-bit wide memory-mapped register at `address`
    pub const fn mmio32(address: u64) -> Self {
        Self {
            address_space_id: SPACE_SYSTEM_MEMORY,
            register_bit_width: 0x20,
            register_bit_offset: 0,
            access_size: 0x20,
            address,
        }
    }

    /// Write the five GAS leaves
    pub fn author(&self, writer: &mut RecordWriter) -> Result<(), AuthorError> {
        writer
            .put_u8("AddressSpaceID", self.address_space_id)?
            .put_u8("RegisterBitWidth", self.register_bit_width)?
            .put_u8("RegisterBitOffset", self.register_bit_offset)?
            .put_u8("AccessSize", self.access_size)?
            .put_u64("Address", self.address)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_gas_size() {
        let schema = schema().expect("Test operation should succeed");
        assert_eq!(schema.size(), SIZE);
        assert_eq!(schema.offset_of("Address"), Some(4));
    }

    #[test]
    fn test_mmio32_encoding() {
        let schema = schema().expect("Test operation should succeed");
        let mut writer = RecordWriter::new(&schema);
        GenericAddress::mmio32(0xA9_C000)
            .author(&mut writer)
            .expect("Test operation should succeed");
        let bytes = writer.finish().expect("Test operation should succeed");
        assert_eq!(
            bytes,
            vec![0x00, 0x20, 0x00, 0x20, 0x00, 0xC0, 0xA9, 0, 0, 0, 0, 0]
        );
    }
}
