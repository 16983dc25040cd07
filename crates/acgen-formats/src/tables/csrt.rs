//! Core System Resource Table (CSRT), revision 0
//!
//! ```text
//! Header (36) | resource group...
//!
//! resource group:
//!   group header (24) | shared info | descriptor (12) | vendor info
//! ```
//!
//! A descriptor's `Length` covers the descriptor itself plus the silicon
//! vendor defined info after it.

use super::{TablePart, compose};
use crate::author::{AuthorError, RecordWriter};
use crate::header::{OemIdentity, TableHeader};
use crate::schema::{SchemaError, SchemaTemplate, TableSchema};
use std::sync::Arc;
use tracing::debug;

/// Table signature
pub const SIGNATURE: [u8; 4] = *b"CSRT";

/// Table revision
pub const REVISION: u8 = 0;

/// Size of a resource group header
pub const GROUP_HEADER_SIZE: usize = 24;

/// Size of a resource descriptor header
pub const DESCRIPTOR_SIZE: usize = 12;

/// Resource types
pub mod resource_type {
    /// Interrupt
    pub const INTERRUPT: u16 = 1;
    /// Timer
    pub const TIMER: u16 = 2;
    /// DMA
    pub const DMA: u16 = 3;
    /// Platform security
    pub const PLATFORM_SECURITY: u16 = 4;
}

/// Resource subtypes, per resource type
pub mod resource_subtype {
    /// Interrupt line
    pub const INTERRUPT_LINE: u16 = 0;
    /// Interrupt controller
    pub const INTERRUPT_CONTROLLER: u16 = 1;
    /// Timer
    pub const TIMER: u16 = 0;
    /// DMA channel
    pub const DMA_CHANNEL: u16 = 0;
    /// DMA controller
    pub const DMA_CONTROLLER: u16 = 1;
    /// Platform security
    pub const PLATFORM_SECURITY: u16 = 1;
    /// DRAM encryption
    pub const DRAM_ENCRYPTION: u16 = 2;
}

/// Schema of a resource group header
pub fn group_header() -> Result<Arc<TableSchema>, SchemaError> {
    SchemaTemplate::new("CSRT_RESOURCE_GROUPS_HEADER_FORMAT")
        .scalar("Length", 4)
        .scalar("VendorId", 4)
        .scalar("SubVendorId", 4)
        .scalar("DeviceId", 2)
        .scalar("SubDeviceId", 2)
        .scalar("Revision", 2)
        .reserved("Reserved", 2)
        .scalar("SharedInfoLength", 4)
        .build(GROUP_HEADER_SIZE)
}

/// Schema of a resource descriptor header
pub fn descriptor() -> Result<Arc<TableSchema>, SchemaError> {
    SchemaTemplate::new("CSRT_RESOURCE_DESCRIPTOR_FORMAT")
        .scalar("Length", 4)
        .scalar("ResourceType", 2)
        .scalar("ResourceSubType", 2)
        .scalar("UID", 4)
        .build(DESCRIPTOR_SIZE)
}

/// Schema of a resource group with one descriptor
///
/// `vendor_info_len` is the descriptor's `Length`: it includes the 12
/// descriptor bytes, so anything smaller is rejected.
pub fn resource_group(
    shared_info_len: usize,
    vendor_info_len: usize,
) -> Result<Arc<TableSchema>, SchemaError> {
    const NAME: &str = "CSRT_RESOURCE_GROUP";
    let vendor_defined = vendor_info_len
        .checked_sub(DESCRIPTOR_SIZE)
        .ok_or(SchemaError::InvalidParameter {
            schema: NAME,
            parameter: "vendor_info_len",
            value: vendor_info_len,
            reason: "must include the 12-byte resource descriptor",
        })?;
    let expected = GROUP_HEADER_SIZE
        .checked_add(shared_info_len)
        .and_then(|size| size.checked_add(vendor_info_len))
        .ok_or(SchemaError::InvalidParameter {
            schema: NAME,
            parameter: "shared_info_len",
            value: shared_info_len,
            reason: "resource group size overflows",
        })?;

    SchemaTemplate::new(NAME)
        .composite("Header", &group_header()?)
        .param_array("ResourceGroupSharedInfo", 1, "shared_info_len")
        .composite("Resource", &descriptor()?)
        .param_array("SiliconVendorDefinedInfo", 1, "vendor_defined_len")
        .instantiate(
            &[
                ("shared_info_len", shared_info_len),
                ("vendor_defined_len", vendor_defined),
            ],
            expected,
        )
}

/// Compose a CSRT from named resource groups
pub fn table(groups: &[TablePart], expected: usize) -> Result<Arc<TableSchema>, SchemaError> {
    compose("CORE_SYSTEM_RESOURCE_TABLE", None, groups, expected)
}

/// Resource group carrying a single resource descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceGroup {
    /// Vendor ID, four ASCII characters read little-endian
    pub vendor_id: u32,
    /// Sub-vendor ID
    pub sub_vendor_id: u32,
    /// Device ID
    pub device_id: u16,
    /// Sub-device ID
    pub sub_device_id: u16,
    /// Revision
    pub revision: u16,
    /// Resource group shared info
    pub shared_info: Vec<u8>,
    /// Resource type, see [`resource_type`]
    pub resource_type: u16,
    /// Resource subtype
    pub resource_subtype: u16,
    /// Resource UID
    pub uid: u32,
    /// Silicon vendor defined info following the descriptor
    pub vendor_info: Vec<u8>,
}

impl ResourceGroup {
    /// Resource group schema sized for this group
    pub fn schema(&self) -> Result<Arc<TableSchema>, SchemaError> {
        resource_group(
            self.shared_info.len(),
            DESCRIPTOR_SIZE + self.vendor_info.len(),
        )
    }

    fn author(&self, schema: &TableSchema, writer: &mut RecordWriter) -> Result<(), AuthorError> {
        writer
            .put_usize("Length", schema.size())?
            .put_u32("VendorId", self.vendor_id)?
            .put_u32("SubVendorId", self.sub_vendor_id)?
            .put_u16("DeviceId", self.device_id)?
            .put_u16("SubDeviceId", self.sub_device_id)?
            .put_u16("Revision", self.revision)?
            .put_zeros("Reserved")?
            .put_usize("SharedInfoLength", self.shared_info.len())?;
        if !self.shared_info.is_empty() {
            writer.put_bytes("ResourceGroupSharedInfo", &self.shared_info)?;
        }
        writer
            .put_usize("Length", DESCRIPTOR_SIZE + self.vendor_info.len())?
            .put_u16("ResourceType", self.resource_type)?
            .put_u16("ResourceSubType", self.resource_subtype)?
            .put_u32("UID", self.uid)?;
        if !self.vendor_info.is_empty() {
            writer.put_bytes("SiliconVendorDefinedInfo", &self.vendor_info)?;
        }
        Ok(())
    }
}

/// Author a complete CSRT
pub fn author(
    oem: &OemIdentity,
    groups: &[(&'static str, ResourceGroup)],
    expected: usize,
) -> Result<Vec<u8>, AuthorError> {
    let parts = groups
        .iter()
        .map(|(name, group)| Ok((*name, group.schema()?)))
        .collect::<Result<Vec<TablePart>, SchemaError>>()?;
    let schema = table(&parts, expected)?;

    let mut writer = RecordWriter::new(&schema);
    TableHeader::for_schema(SIGNATURE, REVISION, &schema, oem)?.author(&mut writer)?;
    for ((_, group), (_, part)) in groups.iter().zip(&parts) {
        group.author(part, &mut writer)?;
    }

    let bytes = writer.finish()?;
    debug!(size = bytes.len(), groups = groups.len(), "authored CSRT");
    Ok(bytes)
}
