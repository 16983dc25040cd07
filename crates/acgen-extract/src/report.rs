//! Extraction reports
//!
//! Serializable summary of what a run wrote, rendered either as one text
//! line per table or as JSON for `--format json`.

use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;

/// One written table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    /// Four-character signature
    pub signature: String,
    /// Output file
    pub path: PathBuf,
    /// Offset of the first table byte within the artifact
    pub offset: usize,
    /// Header `Length`
    pub length: u32,
    /// Header `Revision`
    pub revision: u8,
    /// Finalized checksum byte
    pub checksum: u8,
    /// OEM ID with trailing padding removed
    pub oem_id: String,
    /// OEM table ID with trailing padding removed
    pub oem_table_id: String,
}

/// Every table written from one artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactReport {
    /// Artifact file
    pub input: PathBuf,
    /// Directory the tables were written to
    pub out_dir: PathBuf,
    /// Tables in artifact order
    pub tables: Vec<TableReport>,
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractReport {
    /// Artifacts in processing order
    pub artifacts: Vec<ArtifactReport>,
}

impl ExtractReport {
    /// Number of tables written across all artifacts
    pub fn table_count(&self) -> usize {
        self.artifacts.iter().map(|a| a.tables.len()).sum()
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// One line per table
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for artifact in &self.artifacts {
            for table in &artifact.tables {
                let _ = writeln!(
                    out,
                    "{:<4} rev {:<3} {:>6} bytes  checksum {:#04x}  offset {:#010x}  -> {}",
                    table.signature,
                    table.revision,
                    table.length,
                    table.checksum,
                    table.offset,
                    table.path.display()
                );
            }
        }
        out
    }
}
