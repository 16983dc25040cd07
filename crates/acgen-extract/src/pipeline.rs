//! Load → scan → finalize → store
//!
//! An artifact is scanned completely before anything is finalized, and every
//! record of every input is finalized before the first output file is
//! written, so a fatal condition never leaves a partial output set behind.

use crate::error::{ConfigError, IoError, Result};
use crate::io;
use crate::report::{ArtifactReport, ExtractReport, TableReport};
use acgen_formats::checksum;
use acgen_formats::{ExtractedRecord, MagicScanner, TableHeader};
use std::collections::HashMap;
use std::ffi::OsString;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Extension of every written table
pub const OUTPUT_EXTENSION: &str = "aml";

/// Extracted table with its checksum patched, owning its bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedTable {
    /// Decoded header, checksum as found in the artifact
    pub header: TableHeader,
    /// Offset of the first table byte within the artifact
    pub offset: usize,
    /// Header and body with the final checksum byte
    pub bytes: Vec<u8>,
    /// Final checksum byte
    pub checksum: u8,
}

impl FinalizedTable {
    fn report(&self, path: PathBuf) -> TableReport {
        let text = |bytes: &[u8]| String::from_utf8_lossy(bytes).trim_end().to_string();
        TableReport {
            signature: self.header.signature_str(),
            path,
            offset: self.offset,
            length: self.header.length,
            revision: self.header.revision,
            checksum: self.checksum,
            oem_id: text(&self.header.oem_id),
            oem_table_id: text(&self.header.oem_table_id),
        }
    }
}

/// Validate one record and finalize a copy of its bytes
pub fn finalize_record(artifact: &[u8], record: &ExtractedRecord) -> Result<FinalizedTable> {
    let header = record.validate_length(artifact)?;
    let mut bytes = record.bytes(artifact).to_vec();
    let checksum = checksum::finalize(&mut bytes)?;

    debug!(
        signature = %header.signature_str(),
        offset = record.start(),
        length = header.length,
        checksum,
        "finalized record"
    );

    Ok(FinalizedTable {
        header,
        offset: record.start(),
        bytes,
        checksum,
    })
}

/// File names for one output directory
///
/// The first table with a given signature is `<SIG>.aml`, later ones
/// `<SIG>-2.aml`, `<SIG>-3.aml` and so on. Signature bytes outside
/// `[A-Za-z0-9_]` become `_`.
#[derive(Debug, Default)]
pub struct OutputNames {
    seen: HashMap<String, usize>,
}

impl OutputNames {
    /// Empty name set
    pub fn new() -> Self {
        Self::default()
    }

    /// Name for the next table with `signature`
    pub fn next(&mut self, signature: &[u8; 4]) -> String {
        let stem: String = signature
            .iter()
            .map(|&b| {
                if b.is_ascii_alphanumeric() || b == b'_' {
                    char::from(b)
                } else {
                    '_'
                }
            })
            .collect();

        let count = self.seen.entry(stem.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            format!("{stem}.{OUTPUT_EXTENSION}")
        } else {
            format!("{stem}-{count}.{OUTPUT_EXTENSION}")
        }
    }
}

/// Finalized tables of one artifact, not yet written
#[derive(Debug)]
struct Pending {
    input: PathBuf,
    out_dir: PathBuf,
    tables: Vec<FinalizedTable>,
}

/// Extraction pipeline settings
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    strict: bool,
    jobs: Option<NonZeroUsize>,
}

impl Extractor {
    /// Non-strict extractor using the default worker count
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip start magics not followed by a plausible signature
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Worker count for finalization, only used with the `parallel` feature
    pub fn jobs(mut self, jobs: Option<NonZeroUsize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Scan `artifact` completely, then finalize every record
    pub fn finalize(&self, artifact: &[u8]) -> Result<Vec<FinalizedTable>> {
        let records = MagicScanner::new(artifact)
            .strict(self.strict)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(records = records.len(), "scan complete");
        self.finalize_all(artifact, &records)
    }

    #[cfg(not(feature = "parallel"))]
    fn finalize_all(
        &self,
        artifact: &[u8],
        records: &[ExtractedRecord],
    ) -> Result<Vec<FinalizedTable>> {
        if let Some(jobs) = self.jobs {
            debug!(jobs = jobs.get(), "built without parallel support, finalizing sequentially");
        }
        records
            .iter()
            .map(|record| finalize_record(artifact, record))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn finalize_all(
        &self,
        artifact: &[u8],
        records: &[ExtractedRecord],
    ) -> Result<Vec<FinalizedTable>> {
        use rayon::prelude::*;

        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(jobs) = self.jobs {
            builder = builder.num_threads(jobs.get());
        }
        let pool = builder
            .build()
            .map_err(|e| ConfigError::WorkerPool(e.to_string()))?;

        pool.install(|| {
            records
                .par_iter()
                .map(|record| finalize_record(artifact, record))
                .collect()
        })
    }

    /// Extract every table in `artifact` into `out_dir`
    pub fn extract(&self, artifact: &[u8], out_dir: &Path) -> Result<Vec<TableReport>> {
        let tables = self.finalize(artifact)?;
        write_tables(&tables, out_dir)
    }

    /// Run the pipeline over a file or a directory of artifacts
    ///
    /// A file writes its tables straight into `out_dir`. A directory
    /// treats each regular file directly inside it, in name order, as an
    /// artifact whose tables go to `out_dir/<file stem>/`. Files sharing a
    /// stem use their full file name instead.
    pub fn run(&self, input: &Path, out_dir: &Path) -> Result<ExtractReport> {
        if out_dir.exists() && !io::is_directory(out_dir) {
            return Err(ConfigError::OutputNotDirectory(out_dir.to_path_buf()).into());
        }

        let pending = if io::is_directory(input) {
            self.prepare_batch(input, out_dir)?
        } else {
            vec![self.prepare(input, out_dir.to_path_buf())?]
        };

        let mut report = ExtractReport::default();
        for artifact in pending {
            let tables = write_tables(&artifact.tables, &artifact.out_dir)?;
            report.artifacts.push(ArtifactReport {
                input: artifact.input,
                out_dir: artifact.out_dir,
                tables,
            });
        }

        info!(
            artifacts = report.artifacts.len(),
            tables = report.table_count(),
            "extraction complete"
        );
        Ok(report)
    }

    fn prepare(&self, input: &Path, out_dir: PathBuf) -> Result<Pending> {
        let artifact = io::load(input)?;
        let tables = self.finalize(&artifact)?;
        debug!(input = %input.display(), tables = tables.len(), "artifact finalized");
        Ok(Pending {
            input: input.to_path_buf(),
            out_dir,
            tables,
        })
    }

    fn prepare_batch(&self, dir: &Path, out_dir: &Path) -> Result<Vec<Pending>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| IoError::NotFound {
                path: e.path().unwrap_or(dir).to_path_buf(),
                source: e.into_io_error(),
            })?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }

        let mut stems: HashMap<OsString, usize> = HashMap::new();
        for path in &files {
            *stems.entry(artifact_dir_name(path, false)).or_insert(0) += 1;
        }

        let mut pending = Vec::with_capacity(files.len());
        for path in &files {
            let stem = artifact_dir_name(path, false);
            let shared = stems.get(&stem).is_some_and(|&count| count > 1);
            if shared {
                debug!(input = %path.display(), "file stem shared, using full file name");
            }
            let name = artifact_dir_name(path, shared);
            pending.push(self.prepare(path, out_dir.join(name))?);
        }
        Ok(pending)
    }
}

/// Output directory name of one batch input
///
/// The file stem, or the full file name when `full_name` is set or the
/// path has no stem.
fn artifact_dir_name(path: &Path, full_name: bool) -> OsString {
    let file_name = path.file_name().unwrap_or(path.as_os_str());
    if full_name {
        return file_name.to_os_string();
    }
    path.file_stem().unwrap_or(file_name).to_os_string()
}

/// Write finalized tables into `out_dir`, creating it if needed
pub fn write_tables(tables: &[FinalizedTable], out_dir: &Path) -> Result<Vec<TableReport>> {
    io::ensure_dir(out_dir)?;

    let mut names = OutputNames::new();
    let mut reports = Vec::with_capacity(tables.len());
    for table in tables {
        let path = out_dir.join(names.next(&table.header.signature));
        io::store(&path, &table.bytes)?;
        info!(
            signature = %table.header.signature_str(),
            path = %path.display(),
            length = table.bytes.len(),
            checksum = %format!("{:#04x}", table.checksum),
            "wrote table"
        );
        reports.push(table.report(path));
    }
    Ok(reports)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use acgen_formats::OemIdentity;
    use acgen_formats::author::Artifact;
    use acgen_formats::magic::START_MAGIC;
    use pretty_assertions::assert_eq;

    const TEST_OEM: OemIdentity = OemIdentity::new(*b"TESTOE", *b"TESTTBL1", 1);

    fn table(signature: [u8; 4], body: &[u8]) -> Vec<u8> {
        let length = u32::try_from(TableHeader::SIZE + body.len()).expect("Test operation should succeed");
        let mut bytes = TableHeader::new(signature, 1, length, &TEST_OEM)
            .to_bytes()
            .expect("Test operation should succeed");
        bytes.extend_from_slice(body);
        bytes
    }

    #[test]
    fn test_output_names() {
        let mut names = OutputNames::new();
        assert_eq!(names.next(b"GTDT"), "GTDT.aml");
        assert_eq!(names.next(b"DBG2"), "DBG2.aml");
        assert_eq!(names.next(b"GTDT"), "GTDT-2.aml");
        assert_eq!(names.next(b"GTDT"), "GTDT-3.aml");
        assert_eq!(names.next(b"A/.\0"), "A___.aml");
    }

    #[test]
    fn test_finalize_leaves_artifact_untouched() {
        let mut artifact = Artifact::new();
        artifact
            .filler(b"head")
            .embed(&table(*b"GTDT", &[7; 20]))
            .embed(&table(*b"DBG2", &[]));
        let bytes = artifact.into_bytes();
        let before = bytes.clone();

        let tables = Extractor::new()
            .finalize(&bytes)
            .expect("Test operation should succeed");
        assert_eq!(bytes, before);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].offset, 8);
        assert_eq!(tables[0].header.checksum, 0);
        for table in &tables {
            assert!(checksum::is_valid(&table.bytes));
            assert_eq!(table.bytes[TableHeader::CHECKSUM_OFFSET], table.checksum);
        }
    }

    #[test]
    fn test_finalize_empty_artifact() {
        let tables = Extractor::new()
            .finalize(b"no tables here")
            .expect("Test operation should succeed");
        assert!(tables.is_empty());
    }

    #[test]
    fn test_truncated_artifact_is_fatal() {
        let mut artifact = Artifact::new();
        artifact.embed(&table(*b"GTDT", &[])).filler(&START_MAGIC);
        let err = Extractor::new()
            .finalize(artifact.as_bytes())
            .expect_err("Test operation should fail");
        assert_eq!(err.condition(), "TruncatedArtifact");
    }

    #[test]
    fn test_strict_skips_implausible_magic() {
        let mut artifact = Artifact::new();
        artifact
            .filler(&START_MAGIC)
            .filler(&[0x01, 0x02, 0x03, 0x04])
            .embed(&table(*b"CSRT", &[]));
        let bytes = artifact.into_bytes();

        // Without strict the stray magic swallows the real start magic
        assert!(Extractor::new().finalize(&bytes).is_err());

        let tables = Extractor::new()
            .strict(true)
            .finalize(&bytes)
            .expect("Test operation should succeed");
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].header.signature_str(), "CSRT");
    }
}
