//! ACPI table schemas, authoring and magic-bracket extraction primitives
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format encoding
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::doc_markdown)] // ACPI field names don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::similar_names)] // Domain-specific naming patterns
#![allow(clippy::return_self_not_must_use)] // Builder patterns
#![allow(clippy::redundant_closure_for_method_calls)] // Iterator chains
//! This crate holds everything that can be said about an ACPI table without
//! touching the filesystem: how it is laid out, how a concrete instance is
//! serialized and wrapped for later discovery, how it is found again inside
//! an opaque compiled artifact and how its checksum is finalized.
//!
//! # Modules
//!
//! - **schema**: data-driven layouts checked against documented sizes
//! - **header**: the 36-byte common header, binrw encoded
//! - **author**: field-checked record serialization and artifact assembly
//! - **magic**: start/end magic scanning over artifact bytes
//! - **checksum**: zero-sum checksum finalization
//! - **tables**: GTDT, DBG2, CSRT and IORT layouts
//! - **platform**: built-in board tables
//!
//! # Lifecycle
//!
//! ```text
//! schema ──► author ──► artifact bytes ──► magic scan ──► checksum ──► .aml
//! ```
//!
//! Authored tables always carry a zero checksum; it is only computed on the
//! extracted copy, since the bytes inside the compiled artifact are not final
//! until the toolchain is done with them.
//!
//! ```rust
//! use acgen_formats::checksum;
//! use acgen_formats::magic::scan_all;
//! use acgen_formats::platform::Platform;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let artifact = Platform::Sm8150.artifact()?;
//! let bytes = artifact.as_bytes();
//!
//! for record in scan_all(bytes)? {
//!     let header = record.validate_length(bytes)?;
//!     let mut table = record.bytes(bytes).to_vec();
//!     checksum::finalize(&mut table)?;
//!     assert!(checksum::is_valid(&table));
//!     assert_eq!(header.signature_str(), "GTDT");
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod author;
pub mod checksum;
pub mod header;
pub mod magic;
pub mod platform;
pub mod schema;
pub mod tables;

pub use checksum::ChecksumError;
pub use header::{OemIdentity, TableHeader};
pub use magic::{ExtractedRecord, MagicScanner, ScanError};
pub use schema::{SchemaError, TableSchema};
