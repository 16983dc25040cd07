//! Schemas for the ACPI tables this crate can author
//!
//! Each submodule declares the fixed structures of one table kind with the
//! sizes the ACPI documents give, plus constructors for the
//! parameterized parts (timer blocks, debug device records, resource groups,
//! node ID mapping arrays). A concrete table is composed as
//!
//! ```text
//! ACPI_TABLE_HEADER | <kind> header extra data | part | part | ...
//! ```
//!
//! and checked against the total the caller documents for it.
//!
//! - [`gtdt`]: Generic Timer Description Table, revision 2
//! - [`dbg2`]: Debug Port Table 2, revision 1
//! - [`csrt`]: Core System Resource Table, revision 0
//! - [`iort`]: IO Remapping Table, revision 7
//! - [`gas`]: Generic Address Structure shared by several tables

pub mod csrt;
pub mod dbg2;
pub mod gas;
pub mod gtdt;
pub mod iort;

use crate::header::table_template;
use crate::schema::{SchemaError, TableSchema};
use std::sync::Arc;

/// Named body part of a composed table
pub type TablePart = (&'static str, Arc<TableSchema>);

/// Compose `header | extra | parts...` and check the documented total
pub fn compose(
    name: &'static str,
    extra: Option<TablePart>,
    parts: &[TablePart],
    expected: usize,
) -> Result<Arc<TableSchema>, SchemaError> {
    let mut template = table_template(name)?;
    if let Some((extra_name, extra_schema)) = &extra {
        template = template.composite(extra_name, extra_schema);
    }
    for (part_name, part) in parts {
        template = template.composite(part_name, part);
    }
    template.build(expected)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_header_only() {
        let schema = compose("BARE", None, &[], 36).expect("Test operation should succeed");
        assert_eq!(schema.size(), 36);
    }

    #[test]
    fn test_compose_checks_total() {
        let extra = gtdt::header_extra_data().expect("Test operation should succeed");
        let block = gtdt::timer_block(1).expect("Test operation should succeed");

        let ok = compose(
            "GENERIC_TIMER_DESCRIPTION_TABLE",
            Some(("GTDTHeaderExtraData", extra.clone())),
            &[("GENERIC_TIMER", block.clone())],
            96 + 60,
        )
        .expect("Test operation should succeed");
        assert_eq!(ok.offset_of("GENERIC_TIMER"), Some(96));

        let err = compose(
            "GENERIC_TIMER_DESCRIPTION_TABLE",
            Some(("GTDTHeaderExtraData", extra)),
            &[("GENERIC_TIMER", block)],
            96,
        )
        .expect_err("Test operation should fail");
        assert_eq!(err.condition(), "SchemaSizeMismatch");
    }
}
