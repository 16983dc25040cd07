//! IO Remapping Table (IORT), revision 7
//!
//! ```text
//! Header (36) | IortHeaderExtraData (12) | node...
//! ```
//!
//! Every node starts with the 16-byte node header. Fixed node sizes below
//! exclude the variable trailing arrays (ID mappings, interrupt arrays,
//! object names); [`with_id_mappings`], [`its_group`] and
//! [`named_component`] lay those out.

use super::{TablePart, compose};
use crate::author::{AuthorError, RecordWriter};
use crate::header::TableHeader;
use crate::schema::{Count, SchemaError, SchemaTemplate, TableSchema};
use std::sync::Arc;

/// Table signature
pub const SIGNATURE: [u8; 4] = *b"IORT";

/// Table revision
pub const REVISION: u8 = 7;

/// Size of the extra data following the common header
pub const HEADER_EXTRA_DATA_SIZE: usize = 12;

/// Header plus extra data
pub const FIXED_SIZE: usize = TableHeader::SIZE + HEADER_EXTRA_DATA_SIZE;

/// Size of the common node header
pub const NODE_HEADER_SIZE: usize = 16;

/// Size of one ID mapping
pub const ID_MAPPING_SIZE: usize = 20;

/// Size of the memory access properties
pub const MEMORY_ACCESS_SIZE: usize = 8;

/// Size of an SMMUv1/v2 node without its interrupt arrays
pub const SMMU_V1_V2_SIZE: usize = 76;

/// Size of an SMMUv3 node
pub const SMMU_V3_SIZE: usize = 68;

/// Size of a PMCG node
pub const PMCG_SIZE: usize = 40;

/// Size of an ITS group node without its identifier array
pub const ITS_GROUP_BASE_SIZE: usize = 20;

/// Size of a named component node without its object name
pub const NAMED_COMPONENT_SIZE: usize = 29;

/// Size of a PCI root complex node
pub const ROOT_COMPLEX_SIZE: usize = 40;

/// Size of a memory range descriptor
pub const MEMORY_RANGE_DESCRIPTOR_SIZE: usize = 20;

/// Size of a reserved memory range node
pub const RMR_SIZE: usize = 28;

/// Size of an IWB node without its object name
pub const IWB_SIZE: usize = 30;

/// Node types
pub mod node_type {
    /// ITS group
    pub const ITS_GROUP: u8 = 0;
    /// Named component
    pub const NAMED_COMPONENT: u8 = 1;
    /// PCI root complex
    pub const ROOT_COMPLEX: u8 = 2;
    /// SMMUv1 or SMMUv2
    pub const SMMU_V1_V2: u8 = 3;
    /// SMMUv3
    pub const SMMU_V3: u8 = 4;
    /// Performance monitoring counter group
    pub const PMCG: u8 = 5;
    /// Reserved memory range
    pub const MEMORY_RANGE: u8 = 6;
    /// Interrupt wire bridge
    pub const IWB: u8 = 7;
}

/// Node revisions matching table revision 7
pub mod node_revision {
    /// ITS group
    pub const ITS_GROUP: u8 = 1;
    /// Named component
    pub const NAMED_COMPONENT: u8 = 4;
    /// PCI root complex
    pub const ROOT_COMPLEX: u8 = 4;
    /// SMMUv1 or SMMUv2
    pub const SMMU_V1_V2: u8 = 3;
    /// SMMUv3
    pub const SMMU_V3: u8 = 5;
    /// Performance monitoring counter group
    pub const PMCG: u8 = 2;
    /// Reserved memory range
    pub const MEMORY_RANGE: u8 = 3;
    /// Interrupt wire bridge
    pub const IWB: u8 = 1;
}

/// ID mapping flag: single mapping
pub const ID_MAPPING_SINGLE: u32 = 1 << 0;

/// Memory access flags
pub mod memory_access {
    /// Coherent path to memory
    pub const CPM: u8 = 1 << 0;
    /// Device attributes are cacheable and inner shareable
    pub const DACS: u8 = 1 << 1;
    /// Cacheable, non-shareable writes are coherent
    pub const CANWBS: u8 = 1 << 2;
}

/// SMMUv1/v2 models
pub mod smmu_v1_v2_model {
    /// Generic SMMUv1
    pub const GENERIC_V1: u32 = 0;
    /// Generic SMMUv2
    pub const GENERIC_V2: u32 = 1;
    /// Arm CoreLink MMU-400
    pub const MMU400: u32 = 2;
    /// Arm CoreLink MMU-500
    pub const MMU500: u32 = 3;
    /// Arm CoreLink MMU-401
    pub const MMU401: u32 = 4;
    /// Cavium ThunderX SMMUv2
    pub const CAVIUM_THUNDERX: u32 = 5;
}

/// SMMUv3 models
pub mod smmu_v3_model {
    /// Generic SMMUv3
    pub const GENERIC: u32 = 0;
    /// HiSilicon Hi161x SMMUv3
    pub const HISILICON_HI161X: u32 = 1;
    /// Cavium CN99xx SMMUv3
    pub const CAVIUM_CN99XX: u32 = 2;
}

/// SMMUv1/v2 flag: DVM supported
pub const SMMU_V1_V2_DVM: u32 = 1 << 0;
/// SMMUv1/v2 flag: coherent page table walk
pub const SMMU_V1_V2_COHERENT_WALK: u32 = 1 << 1;

/// SMMUv3 flag: COHACC override
pub const SMMU_V3_COHACC_OVERRIDE: u32 = 1 << 0;
/// SMMUv3 flags: HTTU override (2 bits)
pub const SMMU_V3_HTTU_OVERRIDE: u32 = 0b11 << 1;
/// SMMUv3 flag: proximity domain valid
pub const SMMU_V3_PROXIMITY_DOMAIN_VALID: u32 = 1 << 3;
/// SMMUv3 flag: DeviceID mapping index valid
pub const SMMU_V3_DEVICE_ID_MAPPING_INDEX_VALID: u32 = 1 << 4;

/// Named component flag: stall supported
pub const NAMED_COMPONENT_STALL_SUPPORTED: u32 = 1 << 0;

/// Root complex flag: PASID supported
pub const ROOT_COMPLEX_PASID_SUPPORTED: u32 = 1 << 0;

/// RMR flag: remapping permitted
pub const RMR_REMAPPING_PERMITTED: u32 = 1 << 0;
/// RMR flag: privileged access
pub const RMR_ACCESS_PRIVILEGED: u32 = 1 << 1;

/// Schema of the extra header data
pub fn header_extra_data() -> Result<Arc<TableSchema>, SchemaError> {
    SchemaTemplate::new("IORT_HEADER_EXTRA_DATA")
        .scalar("NumOfNodes", 4)
        .scalar("OffsetToNodeArray", 4)
        .reserved("Reserved", 4)
        .build(HEADER_EXTRA_DATA_SIZE)
}

/// Schema of the common node header
pub fn node_header() -> Result<Arc<TableSchema>, SchemaError> {
    SchemaTemplate::new("IORT_NODE_FORMAT")
        .scalar("Type", 1)
        .scalar("Length", 2)
        .scalar("Revision", 1)
        .scalar("Identifier", 4)
        .scalar("NumOfIDMappings", 4)
        .scalar("ReferenceToIdArray", 4)
        .build(NODE_HEADER_SIZE)
}

/// Schema of one ID mapping
pub fn id_mapping() -> Result<Arc<TableSchema>, SchemaError> {
    SchemaTemplate::new("IORT_ID_MAPPING_FORMAT")
        .scalar("InputBase", 4)
        .scalar("NumOfIds", 4)
        .scalar("OutputBase", 4)
        .scalar("OutputReference", 4)
        .scalar("Flags", 4)
        .build(ID_MAPPING_SIZE)
}

/// Schema of the memory access properties
pub fn memory_access_properties() -> Result<Arc<TableSchema>, SchemaError> {
    SchemaTemplate::new("IORT_MEMORY_ACCESS_PROPERTIES")
        .scalar("CCA", 4)
        .scalar("AH", 1)
        .reserved("Reserved", 2)
        .scalar("MAF", 1)
        .build(MEMORY_ACCESS_SIZE)
}

fn node(name: &'static str) -> Result<SchemaTemplate, SchemaError> {
    Ok(SchemaTemplate::new(name).composite("NodeHeader", &node_header()?))
}

/// Schema of an SMMUv1/v2 node
pub fn smmu_v1_v2() -> Result<Arc<TableSchema>, SchemaError> {
    node("IORT_SMMU_V1_V2_NODE")?
        .scalar("BaseAddress", 8)
        .scalar("Span", 8)
        .scalar("Model", 4)
        .scalar("Flags", 4)
        .scalar("ReferenceToGlobalInterruptArray", 4)
        .scalar("NumOfContextInterrupts", 4)
        .scalar("ReferenceToContextInterruptArray", 4)
        .scalar("NumOfPMUInterrupts", 4)
        .scalar("ReferenceToPMUInterruptArray", 4)
        .scalar("SMMUNSgIrpt", 4)
        .scalar("SMMUNSgIrptInterruptFlags", 4)
        .scalar("SMMUNSgCfgIrpt", 4)
        .scalar("SMMUNSgCfgIrptInterruptFlags", 4)
        .build(SMMU_V1_V2_SIZE)
}

/// Schema of an SMMUv3 node
pub fn smmu_v3() -> Result<Arc<TableSchema>, SchemaError> {
    node("IORT_SMMU_V3_NODE")?
        .scalar("BaseAddress", 8)
        .scalar("Flags", 4)
        .reserved("Reserved", 4)
        .scalar("VATOSAddress", 8)
        .scalar("Model", 4)
        .scalar("Event", 4)
        .scalar("PRI", 4)
        .scalar("GERR", 4)
        .scalar("Sync", 4)
        .scalar("ProximityDomain", 4)
        .scalar("DeviceIDMappingIndex", 4)
        .build(SMMU_V3_SIZE)
}

/// Schema of a performance monitoring counter group node
pub fn pmcg() -> Result<Arc<TableSchema>, SchemaError> {
    node("IORT_PMCG_NODE")?
        .scalar("Page0BaseAddress", 8)
        .scalar("OverflowInterruptGSIV", 4)
        .scalar("NodeReference", 4)
        .scalar("Page1BaseAddress", 8)
        .build(PMCG_SIZE)
}

/// Schema of an ITS group node with `num_its` identifiers
pub fn its_group(num_its: usize) -> Result<Arc<TableSchema>, SchemaError> {
    let expected = num_its
        .checked_mul(4)
        .and_then(|ids| ids.checked_add(ITS_GROUP_BASE_SIZE))
        .ok_or(SchemaError::InvalidParameter {
            schema: "IORT_ITS_GROUP_NODE",
            parameter: "num_its",
            value: num_its,
            reason: "identifier array size overflows",
        })?;

    node("IORT_ITS_GROUP_NODE")?
        .scalar("NumOfITS", 4)
        .param_array("GicITSIdentifierArray", 4, "num_its")
        .instantiate(&[("num_its", num_its)], expected)
}

fn named_component_base() -> Result<SchemaTemplate, SchemaError> {
    Ok(node("IORT_NAMED_COMPONENT_NODE")?
        .scalar("Flags", 4)
        .composite("MemAccessProps", &memory_access_properties()?)
        .scalar("DeviceMemoryAddressSizeLimit", 1))
}

/// Schema of a named component node without its object name
pub fn named_component_fixed() -> Result<Arc<TableSchema>, SchemaError> {
    named_component_base()?.build(NAMED_COMPONENT_SIZE)
}

/// Schema of a named component node carrying `object_name`
///
/// The NUL-terminated name is zero padded so the node ends on a 4-byte
/// boundary.
pub fn named_component(object_name: &str) -> Result<Arc<TableSchema>, SchemaError> {
    let unpadded = NAMED_COMPONENT_SIZE + object_name.len() + 1;
    let expected = unpadded.next_multiple_of(4);

    named_component_base()?
        .param_array("DeviceObjectName", 1, "name_len")
        .instantiate(&[("name_len", expected - NAMED_COMPONENT_SIZE)], expected)
}

/// Schema of a PCI root complex node
pub fn root_complex() -> Result<Arc<TableSchema>, SchemaError> {
    node("IORT_PCI_ROOT_COMPLEX_NODE")?
        .composite("MemAccessProps", &memory_access_properties()?)
        .scalar("ATSAttribute", 4)
        .scalar("PCISegmentNumber", 4)
        .scalar("MemoryAddressSizeLimit", 1)
        .scalar("PASIDCapabilities", 2)
        .reserved("Reserved", 1)
        .scalar("Flags", 4)
        .build(ROOT_COMPLEX_SIZE)
}

/// Schema of a memory range descriptor
pub fn memory_range_descriptor() -> Result<Arc<TableSchema>, SchemaError> {
    SchemaTemplate::new("IORT_MEMORY_RANGE_DESCRIPTOR")
        .scalar("PhysicalRangeOffset", 8)
        .scalar("PhysicalRangeLength", 8)
        .reserved("Reserved", 4)
        .build(MEMORY_RANGE_DESCRIPTOR_SIZE)
}

/// Schema of a reserved memory range node
pub fn reserved_memory_range() -> Result<Arc<TableSchema>, SchemaError> {
    node("IORT_RESERVED_MEMORY_RANGE_NODE")?
        .scalar("Flags", 4)
        .scalar("NumOfMemoryRangeDescriptors", 4)
        .scalar("ReferenceToMemoryRangeDescriptor", 4)
        .build(RMR_SIZE)
}

/// Schema of an interrupt wire bridge node
pub fn iwb() -> Result<Arc<TableSchema>, SchemaError> {
    node("IORT_IWB_NODE")?
        .reserved("Reserved", 4)
        .scalar("ConfigFrameBase", 8)
        .scalar("IWBIndex", 2)
        .build(IWB_SIZE)
}

/// Follow `node` with `count` ID mappings
pub fn with_id_mappings(
    name: &'static str,
    node: &Arc<TableSchema>,
    count: usize,
) -> Result<Arc<TableSchema>, SchemaError> {
    let expected = count
        .checked_mul(ID_MAPPING_SIZE)
        .and_then(|mappings| mappings.checked_add(node.size()))
        .ok_or(SchemaError::InvalidParameter {
            schema: name,
            parameter: "num_mappings",
            value: count,
            reason: "ID mapping array size overflows",
        })?;

    SchemaTemplate::new(name)
        .composite("Node", node)
        .composite_array("IdMappings", &id_mapping()?, Count::Param("num_mappings"))
        .instantiate(&[("num_mappings", count)], expected)
}

/// Compose an IORT from named nodes
pub fn table(nodes: &[TablePart], expected: usize) -> Result<Arc<TableSchema>, SchemaError> {
    compose(
        "IO_REMAPPING_TABLE",
        Some(("IortHeaderExtraData", header_extra_data()?)),
        nodes,
        expected,
    )
}

/// One ID mapping entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdMapping {
    /// Lowest input ID
    pub input_base: u32,
    /// Number of IDs in the range, minus one
    pub num_ids: u32,
    /// Lowest output ID
    pub output_base: u32,
    /// Offset of the output node from the start of the table
    pub output_reference: u32,
    /// Mapping flags
    pub flags: u32,
}

impl IdMapping {
    /// Write the five mapping leaves
    pub fn author(&self, writer: &mut RecordWriter) -> Result<(), AuthorError> {
        writer
            .put_u32("InputBase", self.input_base)?
            .put_u32("NumOfIds", self.num_ids)?
            .put_u32("OutputBase", self.output_base)?
            .put_u32("OutputReference", self.output_reference)?
            .put_u32("Flags", self.flags)?;
        Ok(())
    }
}
