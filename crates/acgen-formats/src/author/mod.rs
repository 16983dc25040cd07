//! Instance authoring: serialize concrete tables against their schemas
//!
//! Authored instances follow four rules that the extraction side relies on:
//!
//! 1. Fields are written in schema order and width, little-endian.
//! 2. The header checksum byte is zero; the finalizer fills it in later.
//! 3. The header length is the true byte extent of header and body.
//! 4. The table is immediately preceded by the start magic and followed by
//!    the end magic.
//!
//! [`RecordWriter`] enforces the first rule field by field,
//! [`TableHeader::author`](crate::header::TableHeader::author) the second and
//! third, and [`Artifact`] / [`bracket`] the fourth.

mod artifact;
pub mod error;
mod writer;

pub use artifact::{Artifact, bracket};
pub use error::AuthorError;
pub use writer::RecordWriter;
