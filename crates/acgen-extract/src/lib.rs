//! Extraction, finalization and verification of ACPI tables
//!
#![allow(clippy::cast_possible_truncation)] // Header lengths are u32 by definition
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::return_self_not_must_use)] // Builder patterns
//! This crate is the filesystem side of `acgen`. It loads compiled
//! artifacts, cuts out every magic-bracketed table, patches each checksum
//! and writes one `.aml` file per table. It also verifies finalized files,
//! renders byte ranges as C arrays and writes test artifacts.
//!
//! # Pipeline
//!
//! ```text
//! load ──► scan (complete) ──► validate + finalize (all) ──► store (each)
//! ```
//!
//! Nothing is written until every record of every input has been
//! finalized. With the `parallel` feature, finalization runs on a rayon
//! pool.
//!
//! ```rust,no_run
//! use acgen_extract::Extractor;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), acgen_extract::ExtractError> {
//! let report = Extractor::new()
//!     .strict(false)
//!     .run(Path::new("build/board.elf"), Path::new("out"))?;
//! println!("{}", report.render_text());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod author;
pub mod config;
pub mod error;
pub mod hexdump;
pub mod io;
pub mod pipeline;
pub mod report;
pub mod verify;

pub use config::{Cli, Command, ExtractConfig};
pub use error::{ConfigError, ExtractError, IoError, Result, VerifyError};
pub use pipeline::{Extractor, FinalizedTable, finalize_record};
pub use report::{ArtifactReport, ExtractReport, TableReport};
pub use verify::{Verified, verify_file};
