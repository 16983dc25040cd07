//! Generic Timer Description Table (GTDT), revision 2
//!
//! ```text
//! Header (36) | GTDTHeaderExtraData (60) | platform timer structures...
//! ```
//!
//! Platform timers are GT blocks (`20 + 40 * timers` bytes) and SBSA generic
//! watchdogs (28 bytes).

use super::{TablePart, compose};
use crate::author::{AuthorError, RecordWriter};
use crate::header::{OemIdentity, TableHeader};
use crate::schema::{Count, SchemaError, SchemaTemplate, TableSchema};
use std::sync::Arc;
use tracing::debug;

/// Table signature
pub const SIGNATURE: [u8; 4] = *b"GTDT";

/// Table revision
pub const REVISION: u8 = 2;

/// Header plus extra data
pub const FIXED_SIZE: usize = 96;

/// Size of the extra data following the common header
pub const HEADER_EXTRA_DATA_SIZE: usize = FIXED_SIZE - TableHeader::SIZE;

/// Size of one GT block timer
pub const BLOCK_TIMER_SIZE: usize = 40;

/// Size of a GT block before its timer array
pub const TIMER_BLOCK_BASE_SIZE: usize = 20;

/// Size of an SBSA generic watchdog structure
pub const WATCHDOG_SIZE: usize = 28;

/// Platform timer type: GT block
pub const TYPE_TIMER_BLOCK: u8 = 0;

/// Platform timer type: SBSA generic watchdog
pub const TYPE_WATCHDOG: u8 = 1;

/// Physical/virtual timer flags of a block timer
pub mod timer_flags {
    /// Edge triggered when set, level triggered otherwise
    pub const INTERRUPT_MODE_EDGE: u32 = 1 << 0;
    /// Active low when set, active high otherwise
    pub const INTERRUPT_POLARITY_LOW: u32 = 1 << 1;
}

/// Common flags of a block timer
pub mod common_flags {
    /// Timer is secure
    pub const SECURE_TIMER: u32 = 1 << 0;
    /// Timer keeps its state in every power state
    pub const ALWAYS_ON: u32 = 1 << 1;
}

/// Watchdog timer flags
pub mod watchdog_flags {
    /// Edge triggered when set
    pub const INTERRUPT_MODE_EDGE: u32 = 1 << 0;
    /// Active low when set
    pub const INTERRUPT_POLARITY_LOW: u32 = 1 << 1;
    /// Watchdog is secure
    pub const SECURE_TIMER: u32 = 1 << 2;
}

/// Schema of the extra header data
pub fn header_extra_data() -> Result<Arc<TableSchema>, SchemaError> {
    SchemaTemplate::new("GTDT_HEADER_EXTRA_DATA")
        .scalar("CntControlBasePhyAddress", 8)
        .reserved("Reserved", 4)
        .scalar("SecureEL1TimerGSI", 4)
        .scalar("SecureEL1TimerFlags", 4)
        .scalar("NSEL1TimerGSI", 4)
        .scalar("NSEL1TimerFlags", 4)
        .scalar("VirtualEL1TimerGSI", 4)
        .scalar("VirtualEL1TimerFlags", 4)
        .scalar("EL2TimerGSI", 4)
        .scalar("EL2TimerFlags", 4)
        .scalar("CntReadBasePhyAddress", 8)
        .scalar("PlatformTimerCount", 4)
        .scalar("PlatformTimerOffset", 4)
        .build(HEADER_EXTRA_DATA_SIZE)
}

/// Schema of one GT block timer
pub fn block_timer() -> Result<Arc<TableSchema>, SchemaError> {
    SchemaTemplate::new("GTDT_BLOCK_TIMER_STRUCTURE")
        .scalar("GTFrameNumber", 1)
        .reserved("Reserved", 3)
        .scalar("CNTBaseX", 8)
        .scalar("CNTEL0BaseX", 8)
        .scalar("PhysicalTimerGSI", 4)
        .scalar("PhysicalTimerFlags", 4)
        .scalar("VirtualTimerGSI", 4)
        .scalar("VirtualTimerFlags", 4)
        .scalar("CommonFlags", 4)
        .build(BLOCK_TIMER_SIZE)
}

/// Schema of a GT block carrying `block_timer_cnt` timers
pub fn timer_block(block_timer_cnt: usize) -> Result<Arc<TableSchema>, SchemaError> {
    let expected = block_timer_cnt
        .checked_mul(BLOCK_TIMER_SIZE)
        .and_then(|timers| timers.checked_add(TIMER_BLOCK_BASE_SIZE))
        .ok_or(SchemaError::InvalidParameter {
            schema: "GTDT_TIMER_BLOCK_STRUCTURE",
            parameter: "block_timer_cnt",
            value: block_timer_cnt,
            reason: "timer array size overflows",
        })?;

    SchemaTemplate::new("GTDT_TIMER_BLOCK_STRUCTURE")
        .scalar("Type", 1)
        .scalar("Length", 2)
        .reserved("Reserved", 1)
        .scalar("GTBlockPhysicalAddress", 8)
        .scalar("GTBlockTimerCount", 4)
        .scalar("GTBlockTimerOffset", 4)
        .composite_array(
            "GTBlockTimerStructure",
            &block_timer()?,
            Count::Param("block_timer_cnt"),
        )
        .instantiate(&[("block_timer_cnt", block_timer_cnt)], expected)
}

/// Schema of an SBSA generic watchdog structure
pub fn watchdog() -> Result<Arc<TableSchema>, SchemaError> {
    SchemaTemplate::new("ACPI_GTDT_GENERIC_WDT_STRUCTURE")
        .scalar("Type", 1)
        .scalar("Length", 2)
        .reserved("Reserved", 1)
        .scalar("RefreshFramePhysicalAddress", 8)
        .scalar("WatchdogControlFramePhysicalAddress", 8)
        .scalar("WatchdogTimerGSI", 4)
        .scalar("WatchdogTimerFlags", 4)
        .build(WATCHDOG_SIZE)
}

/// Compose a GTDT from named platform timer structures
pub fn table(parts: &[TablePart], expected: usize) -> Result<Arc<TableSchema>, SchemaError> {
    compose(
        "GENERIC_TIMER_DESCRIPTION_TABLE",
        Some(("GTDTHeaderExtraData", header_extra_data()?)),
        parts,
        expected,
    )
}

/// Per-processor timer interrupts and counter frame addresses
///
/// `PlatformTimerCount` and `PlatformTimerOffset` are derived from the
/// platform timers the table is authored with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerInterrupts {
    /// CntControlBase physical address, all ones when not provided
    pub cnt_control_base: u64,
    /// Secure EL1 timer GSI and flags
    pub secure_el1: (u32, u32),
    /// Non-secure EL1 timer GSI and flags
    pub non_secure_el1: (u32, u32),
    /// Virtual EL1 timer GSI and flags
    pub virtual_el1: (u32, u32),
    /// EL2 timer GSI and flags
    pub el2: (u32, u32),
    /// CntReadBase physical address, all ones when not provided
    pub cnt_read_base: u64,
}

/// One frame of a GT block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockTimer {
    /// Frame number, 0-7
    pub frame_number: u8,
    /// CNTBaseX physical address
    pub cnt_base: u64,
    /// CNTEL0BaseX physical address
    pub cnt_el0_base: u64,
    /// Physical timer GSI and flags
    pub physical: (u32, u32),
    /// Virtual timer GSI and flags
    pub virtual_timer: (u32, u32),
    /// Common flags
    pub common_flags: u32,
}

impl BlockTimer {
    fn author(&self, writer: &mut RecordWriter) -> Result<(), AuthorError> {
        writer
            .put_u8("GTFrameNumber", self.frame_number)?
            .put_zeros("Reserved")?
            .put_u64("CNTBaseX", self.cnt_base)?
            .put_u64("CNTEL0BaseX", self.cnt_el0_base)?
            .put_u32("PhysicalTimerGSI", self.physical.0)?
            .put_u32("PhysicalTimerFlags", self.physical.1)?
            .put_u32("VirtualTimerGSI", self.virtual_timer.0)?
            .put_u32("VirtualTimerFlags", self.virtual_timer.1)?
            .put_u32("CommonFlags", self.common_flags)?;
        Ok(())
    }
}

/// Memory-mapped GT block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerBlock {
    /// GTBlock physical address
    pub physical_address: u64,
    /// Implemented frames
    pub timers: Vec<BlockTimer>,
}

/// SBSA generic watchdog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watchdog {
    /// Refresh frame physical address
    pub refresh_frame: u64,
    /// Watchdog control frame physical address
    pub control_frame: u64,
    /// Watchdog interrupt GSI
    pub gsi: u32,
    /// Watchdog flags
    pub flags: u32,
}

/// Platform timer structure following the extra header data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformTimer {
    /// GT block
    Block(TimerBlock),
    /// SBSA generic watchdog
    Watchdog(Watchdog),
}

impl PlatformTimer {
    fn schema(&self) -> Result<Arc<TableSchema>, SchemaError> {
        match self {
            Self::Block(block) => timer_block(block.timers.len()),
            Self::Watchdog(_) => watchdog(),
        }
    }

    fn author(&self, schema: &TableSchema, writer: &mut RecordWriter) -> Result<(), AuthorError> {
        match self {
            Self::Block(block) => {
                let timer_offset = schema
                    .field("GTBlockTimerStructure")
                    .map_or(TIMER_BLOCK_BASE_SIZE, |field| field.offset);
                writer
                    .put_u8("Type", TYPE_TIMER_BLOCK)?
                    .put_usize("Length", schema.size())?
                    .put_zeros("Reserved")?
                    .put_u64("GTBlockPhysicalAddress", block.physical_address)?
                    .put_usize("GTBlockTimerCount", block.timers.len())?
                    .put_usize("GTBlockTimerOffset", timer_offset)?;
                for timer in &block.timers {
                    timer.author(writer)?;
                }
            }
            Self::Watchdog(wdt) => {
                writer
                    .put_u8("Type", TYPE_WATCHDOG)?
                    .put_usize("Length", schema.size())?
                    .put_zeros("Reserved")?
                    .put_u64("RefreshFramePhysicalAddress", wdt.refresh_frame)?
                    .put_u64("WatchdogControlFramePhysicalAddress", wdt.control_frame)?
                    .put_u32("WatchdogTimerGSI", wdt.gsi)?
                    .put_u32("WatchdogTimerFlags", wdt.flags)?;
            }
        }
        Ok(())
    }
}

/// Author a complete GTDT
///
/// `expected` is the total size documented for the platform's table; a
/// layout that disagrees fails before any byte is written.
pub fn author(
    oem: &OemIdentity,
    interrupts: &TimerInterrupts,
    timers: &[(&'static str, PlatformTimer)],
    expected: usize,
) -> Result<Vec<u8>, AuthorError> {
    let parts = timers
        .iter()
        .map(|(name, timer)| Ok((*name, timer.schema()?)))
        .collect::<Result<Vec<TablePart>, SchemaError>>()?;
    let schema = table(&parts, expected)?;

    let timer_offset = if timers.is_empty() { 0 } else { FIXED_SIZE };

    let mut writer = RecordWriter::new(&schema);
    TableHeader::for_schema(SIGNATURE, REVISION, &schema, oem)?.author(&mut writer)?;
    writer
        .put_u64("CntControlBasePhyAddress", interrupts.cnt_control_base)?
        .put_zeros("Reserved")?
        .put_u32("SecureEL1TimerGSI", interrupts.secure_el1.0)?
        .put_u32("SecureEL1TimerFlags", interrupts.secure_el1.1)?
        .put_u32("NSEL1TimerGSI", interrupts.non_secure_el1.0)?
        .put_u32("NSEL1TimerFlags", interrupts.non_secure_el1.1)?
        .put_u32("VirtualEL1TimerGSI", interrupts.virtual_el1.0)?
        .put_u32("VirtualEL1TimerFlags", interrupts.virtual_el1.1)?
        .put_u32("EL2TimerGSI", interrupts.el2.0)?
        .put_u32("EL2TimerFlags", interrupts.el2.1)?
        .put_u64("CntReadBasePhyAddress", interrupts.cnt_read_base)?
        .put_usize("PlatformTimerCount", timers.len())?
        .put_usize("PlatformTimerOffset", timer_offset)?;

    for ((_, timer), (_, part)) in timers.iter().zip(&parts) {
        timer.author(part, &mut writer)?;
    }

    let bytes = writer.finish()?;
    debug!(size = bytes.len(), timers = timers.len(), "authored GTDT");
    Ok(bytes)
}
