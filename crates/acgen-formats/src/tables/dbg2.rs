//! Debug Port Table 2 (DBG2), revision 1
//!
//! ```text
//! Header (36) | Dbg2HeaderExtraData (8) | debug device info...
//! ```
//!
//! Each debug device info structure is variable length:
//! `22 + 12 * gas + 4 * gas + namespace + oem_data` bytes, where the
//! namespace length includes its terminating NUL.

use super::gas::{self, GenericAddress};
use super::{TablePart, compose};
use crate::author::{AuthorError, RecordWriter};
use crate::header::{OemIdentity, TableHeader};
use crate::schema::{Count, SchemaError, SchemaTemplate, TableSchema};
use std::sync::Arc;
use tracing::debug;

/// Table signature
pub const SIGNATURE: [u8; 4] = *b"DBG2";

/// Table revision
pub const REVISION: u8 = 1;

/// Size of the extra data following the common header
pub const HEADER_EXTRA_DATA_SIZE: usize = 8;

/// Header plus extra data
pub const FIXED_SIZE: usize = TableHeader::SIZE + HEADER_EXTRA_DATA_SIZE;

/// Size of a debug device info structure before its arrays
pub const DEVICE_INFO_BASE_SIZE: usize = 22;

/// Revision of the debug device info structure
pub const DEVICE_INFO_REVISION: u8 = 1;

/// Debug port types
pub mod port_type {
    /// Serial port
    pub const SERIAL: u16 = 0x8000;
    /// IEEE 1394 port
    pub const IEEE1394: u16 = 0x8001;
    /// USB port
    pub const USB: u16 = 0x8002;
    /// Network port
    pub const NETWORK: u16 = 0x8003;
}

/// Serial port subtypes
pub mod serial_subtype {
    /// Fully 16550 compatible
    pub const FULL_16550: u16 = 0x0;
    /// 16550 subset compatible with DBGP revision 1
    pub const SUBSET_16550: u16 = 0x1;
    /// MAX311xE SPI UART
    pub const MAX311XE_SPI: u16 = 0x2;
    /// Arm PL011 UART
    pub const ARM_PL011: u16 = 0x3;
    /// MSM8x60
    pub const MSM8X60: u16 = 0x4;
    /// Nvidia 16550
    pub const NVIDIA_16550: u16 = 0x5;
    /// TI OMAP
    pub const TI_OMAP: u16 = 0x6;
    /// APM88xxxx
    pub const APM88XXXX: u16 = 0x8;
    /// MSM8974
    pub const MSM8974: u16 = 0x9;
    /// SAM5250
    pub const SAM5250: u16 = 0xA;
    /// Intel USIF
    pub const INTEL_USIF: u16 = 0xB;
    /// i.MX 6
    pub const IMX6: u16 = 0xC;
    /// Arm SBSA (2.x only) generic UART, deprecated
    pub const ARM_SBSA_32BIT: u16 = 0xD;
    /// Arm SBSA generic UART
    pub const ARM_SBSA_GENERIC: u16 = 0xE;
    /// Arm DCC
    pub const ARM_DCC: u16 = 0xF;
    /// BCM2835
    pub const BCM2835: u16 = 0x10;
    /// SDM845 with 1.8432 MHz clock
    pub const SDM845_1P8432_MHZ: u16 = 0x11;
    /// 16550 compatible with parameters defined in the GAS
    pub const GAS_16550: u16 = 0x12;
    /// SDM845 with 7.372 MHz clock
    pub const SDM845_7P372_MHZ: u16 = 0x13;
    /// Intel LPSS
    pub const INTEL_LPSS: u16 = 0x14;
    /// RISC-V SBI console
    pub const RISCV_SBI_CONSOLE: u16 = 0x15;
}

/// USB port subtypes
pub mod usb_subtype {
    /// XHCI compliant controller
    pub const XHCI: u16 = 0x0;
    /// EHCI compliant controller
    pub const EHCI: u16 = 0x1;
}

/// Network port subtype for Synopsys USB debug (PCI vendor ID style)
pub const NET_SUBTYPE_SYNOPSYS: u16 = 0x5143;

/// Schema of the extra header data
pub fn header_extra_data() -> Result<Arc<TableSchema>, SchemaError> {
    SchemaTemplate::new("DBG2_HEADER_EXTRA_DATA")
        .scalar("OffsetDbgDeviceInfo", 4)
        .scalar("NumberOfDbgDevices", 4)
        .build(HEADER_EXTRA_DATA_SIZE)
}

/// Schema of a debug device info structure
///
/// `namespace_len` counts the terminating NUL.
pub fn device_info(
    num_gas: usize,
    namespace_len: usize,
    oem_data_len: usize,
) -> Result<Arc<TableSchema>, SchemaError> {
    const NAME: &str = "DBG2_DEBUG_DEVICE_INFO_STRUCTURE";
    let per_register = gas::SIZE + 4;
    let expected = num_gas
        .checked_mul(per_register)
        .and_then(|regs| regs.checked_add(DEVICE_INFO_BASE_SIZE))
        .and_then(|size| size.checked_add(namespace_len))
        .and_then(|size| size.checked_add(oem_data_len))
        .ok_or(SchemaError::InvalidParameter {
            schema: NAME,
            parameter: "num_gas",
            value: num_gas,
            reason: "device info size overflows",
        })?;

    SchemaTemplate::new(NAME)
        .scalar("Revision", 1)
        .scalar("Length", 2)
        .scalar("NumOfGenericAddrRegs", 1)
        .scalar("NamespaceStringLen", 2)
        .scalar("NamespaceStringOffset", 2)
        .scalar("OemDataLen", 2)
        .scalar("OemDataOffset", 2)
        .scalar("PortType", 2)
        .scalar("PortSubtype", 2)
        .reserved("Reserved", 2)
        .scalar("BaseAddrRegOffset", 2)
        .scalar("AddrSizeOffset", 2)
        .composite_array("BaseAddrRegister", &gas::schema()?, Count::Param("num_gas"))
        .param_array("AddressSize", 4, "num_gas")
        .param_array("NamespaceString", 1, "namespace_len")
        .param_array("OemData", 1, "oem_data_len")
        .instantiate(
            &[
                ("num_gas", num_gas),
                ("namespace_len", namespace_len),
                ("oem_data_len", oem_data_len),
            ],
            expected,
        )
}

/// Compose a DBG2 from named debug device info structures
pub fn table(devices: &[TablePart], expected: usize) -> Result<Arc<TableSchema>, SchemaError> {
    compose(
        "DEBUG_PORT_TABLE_2",
        Some(("Dbg2HeaderExtraData", header_extra_data()?)),
        devices,
        expected,
    )
}

/// One debug device
///
/// `registers` and `address_sizes` pair up one to one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugDevice {
    /// Port type, see [`port_type`]
    pub port_type: u16,
    /// Port subtype
    pub port_subtype: u16,
    /// Base address registers
    pub registers: Vec<GenericAddress>,
    /// Address range size of each register
    pub address_sizes: Vec<u32>,
    /// ACPI namespace path of the device, without terminator
    pub namespace: String,
    /// OEM-specific data
    pub oem_data: Vec<u8>,
}

impl DebugDevice {
    /// Device info schema sized for this device
    pub fn schema(&self) -> Result<Arc<TableSchema>, SchemaError> {
        if self.address_sizes.len() != self.registers.len() {
            return Err(SchemaError::InvalidParameter {
                schema: "DBG2_DEBUG_DEVICE_INFO_STRUCTURE",
                parameter: "num_gas",
                value: self.address_sizes.len(),
                reason: "one address size is required per base address register",
            });
        }
        device_info(
            self.registers.len(),
            self.namespace.len() + 1,
            self.oem_data.len(),
        )
    }

    fn author(&self, schema: &TableSchema, writer: &mut RecordWriter) -> Result<(), AuthorError> {
        let oem_data_offset = if self.oem_data.is_empty() {
            0
        } else {
            field_offset(schema, "OemData")?
        };

        writer
            .put_u8("Revision", DEVICE_INFO_REVISION)?
            .put_usize("Length", schema.size())?
            .put_usize("NumOfGenericAddrRegs", self.registers.len())?
            .put_usize("NamespaceStringLen", self.namespace.len() + 1)?
            .put_usize("NamespaceStringOffset", field_offset(schema, "NamespaceString")?)?
            .put_usize("OemDataLen", self.oem_data.len())?
            .put_usize("OemDataOffset", oem_data_offset)?
            .put_u16("PortType", self.port_type)?
            .put_u16("PortSubtype", self.port_subtype)?
            .put_zeros("Reserved")?
            .put_usize("BaseAddrRegOffset", field_offset(schema, "BaseAddrRegister")?)?
            .put_usize("AddrSizeOffset", field_offset(schema, "AddressSize")?)?;

        for register in &self.registers {
            register.author(writer)?;
        }
        if !self.address_sizes.is_empty() {
            writer.put_u32_array("AddressSize", &self.address_sizes)?;
        }
        writer.put_str("NamespaceString", &self.namespace)?;
        if !self.oem_data.is_empty() {
            writer.put_bytes("OemData", &self.oem_data)?;
        }
        Ok(())
    }
}

fn field_offset(schema: &TableSchema, name: &'static str) -> Result<usize, AuthorError> {
    schema
        .field(name)
        .map(|field| field.offset)
        .ok_or(AuthorError::UnexpectedField {
            schema: schema.name(),
            field: name,
        })
}

/// Author a complete DBG2
///
/// `OffsetDbgDeviceInfo` and `NumberOfDbgDevices` are derived from
/// `devices`. `expected` is the total size documented for the platform's
/// table.
pub fn author(
    oem: &OemIdentity,
    devices: &[(&'static str, DebugDevice)],
    expected: usize,
) -> Result<Vec<u8>, AuthorError> {
    let parts = devices
        .iter()
        .map(|(name, device)| Ok((*name, device.schema()?)))
        .collect::<Result<Vec<TablePart>, SchemaError>>()?;
    let schema = table(&parts, expected)?;

    let device_offset = if devices.is_empty() { 0 } else { FIXED_SIZE };

    let mut writer = RecordWriter::new(&schema);
    TableHeader::for_schema(SIGNATURE, REVISION, &schema, oem)?.author(&mut writer)?;
    writer
        .put_usize("OffsetDbgDeviceInfo", device_offset)?
        .put_usize("NumberOfDbgDevices", devices.len())?;

    for ((_, device), (_, part)) in devices.iter().zip(&parts) {
        device.author(part, &mut writer)?;
    }

    let bytes = writer.finish()?;
    debug!(size = bytes.len(), devices = devices.len(), "authored DBG2");
    Ok(bytes)
}
