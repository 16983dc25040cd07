//! Declarative, size-validated table layouts
//!
//! A table kind is declared as an ordered list of `(name, width, count)`
//! fields. Counts are either fixed or named parameters bound when a concrete
//! table is defined, which is how variable-length trailing regions (vendor
//! payloads, repeated ID mappings, namespace strings) are expressed.
//!
//! # Layout rules
//!
//! - Fields are packed back to back; there is no implicit alignment padding.
//! - Nested composites are schemas themselves and contribute `size * count`.
//! - The sum of all field sizes must equal the size the ACPI
//!   documents give for the table revision, checked when the
//!   schema is finalized and never later.
//!
//! ```rust
//! use acgen_formats::schema::SchemaTemplate;
//!
//! let id_mapping = SchemaTemplate::new("IORT_ID_MAPPING_FORMAT")
//!     .scalar("InputBase", 4)
//!     .scalar("NumOfIds", 4)
//!     .scalar("OutputBase", 4)
//!     .scalar("OutputReference", 4)
//!     .scalar("Flags", 4)
//!     .build(20)
//!     .expect("documented size");
//!
//! assert_eq!(id_mapping.offset_of("Flags"), Some(16));
//! ```

pub mod error;
mod field;
mod layout;
mod template;

pub use error::SchemaError;
pub use field::{Count, Field, FieldDef, FieldKind, Leaf};
pub use layout::TableSchema;
pub use template::SchemaTemplate;
