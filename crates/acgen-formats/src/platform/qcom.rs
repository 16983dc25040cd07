//! Qualcomm Snapdragon board tables

use crate::author::AuthorError;
use crate::header::OemIdentity;
use crate::tables::dbg2::{self, DebugDevice, port_type, serial_subtype};
use crate::tables::gas::GenericAddress;
use crate::tables::gtdt::{self, BlockTimer, PlatformTimer, TimerBlock, TimerInterrupts, common_flags};

/// OEM identity shared by every Qualcomm table
pub const QCOM_OEM: OemIdentity = OemIdentity::new(*b"QCOM  ", *b"QCOMEDK2", 1);

/// Documented size of the SM8150 GTDT
pub const SM8150_GTDT_SIZE: usize = 156;

/// Documented size of the SM8850 DBG2
pub const SM8850_DBG2_SIZE: usize = 304;

/// Size of the SM8850 USB debug device OEM data
pub const SM8850_USB_OEM_DATA_SIZE: usize = 0x94;

const NOT_PROVIDED: u64 = 0xFFFF_FFFF_FFFF_FFFF;

/// SM8150 GTDT: architected timer GSIs and one memory-mapped GT block
pub fn sm8150_gtdt() -> Result<Vec<u8>, AuthorError> {
    let interrupts = TimerInterrupts {
        cnt_control_base: NOT_PROVIDED,
        secure_el1: (0x11, 0),
        non_secure_el1: (0x12, 0),
        virtual_el1: (0x13, 0),
        el2: (0x10, 0),
        cnt_read_base: NOT_PROVIDED,
    };
    let block = TimerBlock {
        physical_address: 0x17C2_0000,
        timers: vec![BlockTimer {
            frame_number: 0,
            cnt_base: 0x17C2_1000,
            cnt_el0_base: 0x17C2_2000,
            physical: (0x28, 0),
            virtual_timer: (0x26, 0),
            common_flags: common_flags::ALWAYS_ON,
        }],
    };

    gtdt::author(
        &QCOM_OEM,
        &interrupts,
        &[("GENERIC_TIMER", PlatformTimer::Block(block))],
        SM8150_GTDT_SIZE,
    )
}

/// Debug UART as wired on SDM845-derived SoCs
fn sdm845_uart(address: u64, namespace: &str) -> DebugDevice {
    DebugDevice {
        port_type: port_type::SERIAL,
        port_subtype: serial_subtype::SDM845_7P372_MHZ,
        registers: vec![GenericAddress::mmio32(address)],
        address_sizes: vec![0x1000],
        namespace: namespace.to_string(),
        oem_data: Vec::new(),
    }
}

/// OEM data blob of the SM8850 USB debug device
fn sm8850_usb_oem_data() -> Vec<u8> {
    const PREFIX: [u8; 58] = [
        0x05, 0x00, 0x00, 0x00, 0x32, 0x58, 0x49, 0x46, //
        0x03, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, //
        0x00, 0xc7, 0x00, 0x00, 0xf8, 0xff, 0xff, 0xff, //
        0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, //
        0x10, 0x88, 0x0f, 0x00, 0x00, 0x00, 0x00, 0x00, //
        0x00, 0x00, 0x10, 0x10, 0x00, 0x02, 0x00, 0x00, //
        0xb4, 0x88, 0x0f, 0x00, 0x00, 0x00, 0x00, 0x00, //
        0xeb, 0x0d,
    ];
    const TRAILER: [u8; 4] = *b"CBSU";

    let mut data = vec![0u8; SM8850_USB_OEM_DATA_SIZE];
    data[..PREFIX.len()].copy_from_slice(&PREFIX);
    data[SM8850_USB_OEM_DATA_SIZE - TRAILER.len()..].copy_from_slice(&TRAILER);
    data
}

/// SM8850 DBG2: debug UART plus USB debug over the Synopsys controller
pub fn sm8850_dbg2() -> Result<Vec<u8>, AuthorError> {
    let usb = DebugDevice {
        port_type: port_type::NETWORK,
        port_subtype: dbg2::NET_SUBTYPE_SYNOPSYS,
        registers: vec![GenericAddress::mmio32(0xA60_0000); 2],
        address_sizes: vec![0xF_FFFF, 0x1000],
        namespace: "\\_SB.URS0".to_string(),
        oem_data: sm8850_usb_oem_data(),
    };

    dbg2::author(
        &QCOM_OEM,
        &[
            ("UARD", sdm845_uart(0xA9_C000, "\\_SB.UARD")),
            ("URS0", usb),
        ],
        SM8850_DBG2_SIZE,
    )
}
