//! Verification of finalized `.aml` files
//!
//! A file passes when it holds at least a full header, its signature matches
//! the file name, its header `Length` matches the file size and its bytes
//! sum to zero. FACS is exempt from the checksum rule and APIC/MADT are
//! interchangeable; both are reported as warnings instead of failures.
//! PPTT files additionally get their node list walked.

use crate::error::VerifyError;
use crate::io;
use acgen_formats::{ScanError, TableHeader, checksum};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Signatures exempt from the checksum rule
const CHECKSUM_EXEMPT: &[&str] = &["FACS"];

/// Pairs of signatures accepted in place of each other
const EQUIVALENT_SIGNATURES: &[(&str, &str)] = &[("MADT", "APIC"), ("APIC", "MADT")];

/// Outcome of a passing verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    /// Verified file
    pub path: PathBuf,
    /// Decoded header
    pub header: TableHeader,
    /// Byte sum modulo 256, non-zero only for exempt tables
    pub sum: u8,
    /// Signature accepted through an equivalence rather than exact match
    pub equivalent: bool,
    /// Number of PPTT nodes walked, for PPTT tables
    pub nodes: Option<usize>,
    /// Tolerated findings
    pub warnings: Vec<String>,
}

impl fmt::Display for Verified {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ok   {}: {} rev {}, {} bytes, checksum {:#04x}",
            self.path.display(),
            self.header.signature_str(),
            self.header.revision,
            self.header.length,
            self.header.checksum
        )?;
        if let Some(nodes) = self.nodes {
            write!(f, ", {nodes} node(s)")?;
        }
        for warning in &self.warnings {
            write!(f, "\n     warning: {warning}")?;
        }
        Ok(())
    }
}

/// Signature a file name promises: the upper-cased stem without a `-N`
/// duplicate suffix
pub fn expected_signature(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_uppercase())
        .unwrap_or_default();

    match stem.rsplit_once('-') {
        Some((base, n)) if !base.is_empty() && !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) => {
            base.to_string()
        }
        _ => stem,
    }
}

fn is_equivalent(expected: &str, found: &str) -> bool {
    EQUIVALENT_SIGNATURES
        .iter()
        .any(|&(e, f)| e == expected && f == found)
}

/// Load and verify one file
pub fn verify_file(path: &Path) -> Result<Verified, VerifyError> {
    let data = io::load(path)?;
    verify_bytes(path, &data)
}

/// Verify `data` as the contents of `path`
pub fn verify_bytes(path: &Path, data: &[u8]) -> Result<Verified, VerifyError> {
    if data.len() < TableHeader::SIZE {
        return Err(VerifyError::TooShort {
            path: path.to_path_buf(),
            len: data.len(),
        });
    }

    let header = TableHeader::parse(data).map_err(|e| VerifyError::Header {
        path: path.to_path_buf(),
        source: ScanError::Header(e),
    })?;
    let signature = header.signature_str();
    let mut warnings = Vec::new();

    let expected = expected_signature(path);
    let equivalent = signature != expected;
    if equivalent {
        if !is_equivalent(&expected, &signature) {
            return Err(VerifyError::SignatureMismatch {
                path: path.to_path_buf(),
                expected,
                found: signature,
            });
        }
        warnings.push(format!("signature {signature} accepted as equivalent to {expected}"));
    }

    if header.length as usize != data.len() {
        return Err(VerifyError::LengthMismatch {
            path: path.to_path_buf(),
            declared: header.length,
            actual: data.len(),
        });
    }

    let sum = checksum::sum(data);
    if sum != 0 {
        if !CHECKSUM_EXEMPT.contains(&signature.as_str()) {
            return Err(VerifyError::BadChecksum {
                path: path.to_path_buf(),
                sum,
            });
        }
        warnings.push(format!("{signature} checksum not enforced (byte sum {sum:#04x})"));
    }

    let nodes = if signature == "PPTT" {
        let (count, node_warnings) = walk_pptt(path, data)?;
        warnings.extend(node_warnings);
        Some(count)
    } else {
        None
    };

    for warning in &warnings {
        warn!(path = %path.display(), "{warning}");
    }
    debug!(path = %path.display(), signature = %signature, "verified");

    Ok(Verified {
        path: path.to_path_buf(),
        header,
        sum,
        equivalent,
        nodes,
        warnings,
    })
}

/// PPTT node type of a processor hierarchy node
const PPTT_PROCESSOR: u8 = 0;
/// PPTT node type of a cache node
const PPTT_CACHE: u8 = 1;
/// Smallest processor hierarchy node
const PPTT_PROCESSOR_MIN_LEN: u8 = 20;
/// Cache node length
const PPTT_CACHE_LEN: u8 = 28;

/// Walk the `Type`/`Length` prefixed node list after the header
fn walk_pptt(path: &Path, data: &[u8]) -> Result<(usize, Vec<String>), VerifyError> {
    let malformed = |offset, reason: &str| VerifyError::MalformedStructure {
        path: path.to_path_buf(),
        offset,
        reason: reason.to_string(),
    };

    let mut warnings = Vec::new();
    let mut offset = TableHeader::SIZE;
    let mut count = 0;

    while offset < data.len() {
        let [node_type, node_len] = match data.get(offset..offset + 2) {
            Some(&[t, l]) => [t, l],
            _ => return Err(malformed(offset, "unexpected end of data")),
        };
        if node_len < 2 {
            return Err(malformed(offset, &format!("invalid node length {node_len}")));
        }
        if offset + usize::from(node_len) > data.len() {
            return Err(malformed(offset, "node exceeds table boundary"));
        }

        match node_type {
            PPTT_PROCESSOR if node_len < PPTT_PROCESSOR_MIN_LEN => {
                return Err(malformed(offset, "processor node too short"));
            }
            PPTT_PROCESSOR => {}
            PPTT_CACHE if node_len != PPTT_CACHE_LEN => warnings.push(format!(
                "offset {offset:#06x}: cache node length {node_len} != {PPTT_CACHE_LEN}"
            )),
            PPTT_CACHE => {}
            other => warnings.push(format!("offset {offset:#06x}: unknown node type {other}")),
        }

        count += 1;
        offset += usize::from(node_len);
    }

    Ok((count, warnings))
}

/// Expand arguments into the files to verify
///
/// Files are taken as given. A directory contributes every `.aml` file
/// directly inside it and in its immediate subdirectories, sorted, and must
/// contribute at least one.
pub fn collect_aml(paths: &[PathBuf]) -> Result<Vec<PathBuf>, VerifyError> {
    let mut files = Vec::new();
    for path in paths {
        if !io::is_directory(path) {
            files.push(path.clone());
            continue;
        }

        let before = files.len();
        files.extend(
            WalkDir::new(path)
                .min_depth(1)
                .max_depth(2)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().is_file())
                .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "aml"))
                .map(walkdir::DirEntry::into_path),
        );
        if files.len() == before {
            return Err(VerifyError::NoTables { path: path.clone() });
        }
    }
    Ok(files)
}

/// Verify every file named by `paths`, one result per file
pub fn verify_paths(paths: &[PathBuf]) -> Result<Vec<Result<Verified, VerifyError>>, VerifyError> {
    Ok(collect_aml(paths)?
        .iter()
        .map(|path| verify_file(path))
        .collect())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use acgen_formats::OemIdentity;
    use pretty_assertions::assert_eq;

    const TEST_OEM: OemIdentity = OemIdentity::new(*b"TESTOE", *b"TESTTBL1", 1);

    fn finalized(signature: [u8; 4], body: &[u8]) -> Vec<u8> {
        let length = u32::try_from(TableHeader::SIZE + body.len()).expect("Test operation should succeed");
        let mut bytes = TableHeader::new(signature, 1, length, &TEST_OEM)
            .to_bytes()
            .expect("Test operation should succeed");
        bytes.extend_from_slice(body);
        checksum::finalize(&mut bytes).expect("Test operation should succeed");
        bytes
    }

    #[test]
    fn test_expected_signature() {
        assert_eq!(expected_signature(Path::new("out/gtdt.aml")), "GTDT");
        assert_eq!(expected_signature(Path::new("GTDT-2.aml")), "GTDT");
        assert_eq!(expected_signature(Path::new("SSDT-x.aml")), "SSDT-X");
        assert_eq!(expected_signature(Path::new("-3.aml")), "-3");
    }

    #[test]
    fn test_valid_table() {
        let data = finalized(*b"GTDT", &[1, 2, 3]);
        let verified =
            verify_bytes(Path::new("GTDT.aml"), &data).expect("Test operation should succeed");
        assert_eq!(verified.sum, 0);
        assert!(!verified.equivalent);
        assert!(verified.warnings.is_empty());
        assert_eq!(verified.nodes, None);
    }

    #[test]
    fn test_too_short() {
        let err = verify_bytes(Path::new("GTDT.aml"), &[0; 35]).expect_err("Test operation should fail");
        assert!(matches!(err, VerifyError::TooShort { len: 35, .. }));
    }

    #[test]
    fn test_signature_mismatch() {
        let data = finalized(*b"DBG2", &[]);
        let err = verify_bytes(Path::new("GTDT.aml"), &data).expect_err("Test operation should fail");
        assert!(matches!(
            &err,
            VerifyError::SignatureMismatch { expected, found, .. }
                if expected == "GTDT" && found == "DBG2"
        ));
        assert_eq!(
            err.to_string(),
            "GTDT.aml: file name expects GTDT but table signature is DBG2"
        );
    }

    #[test]
    fn test_apic_in_madt_file() {
        let data = finalized(*b"APIC", &[0; 8]);
        let verified =
            verify_bytes(Path::new("MADT.aml"), &data).expect("Test operation should succeed");
        assert!(verified.equivalent);
        assert_eq!(verified.warnings.len(), 1);
    }

    #[test]
    fn test_length_mismatch() {
        let mut data = finalized(*b"CSRT", &[0; 4]);
        data.push(0);
        let err = verify_bytes(Path::new("CSRT.aml"), &data).expect_err("Test operation should fail");
        assert!(matches!(
            err,
            VerifyError::LengthMismatch {
                declared: 40,
                actual: 41,
                ..
            }
        ));
    }

    #[test]
    fn test_bad_checksum() {
        let mut data = finalized(*b"IORT", &[0; 4]);
        data[39] = 3;
        let err = verify_bytes(Path::new("IORT.aml"), &data).expect_err("Test operation should fail");
        assert!(matches!(err, VerifyError::BadChecksum { sum: 3, .. }));
    }

    #[test]
    fn test_facs_checksum_tolerated() {
        let mut data = finalized(*b"FACS", &[0; 28]);
        data[40] = 0x11;
        let verified =
            verify_bytes(Path::new("FACS.aml"), &data).expect("Test operation should succeed");
        assert_eq!(verified.sum, 0x11);
        assert_eq!(verified.warnings.len(), 1);
    }

    #[test]
    fn test_pptt_nodes() {
        let mut body = vec![0u8; 20];
        body[1] = 20;
        let mut cache = vec![1u8; 24];
        cache[1] = 24;
        body.extend_from_slice(&cache);

        let data = finalized(*b"PPTT", &body);
        let verified =
            verify_bytes(Path::new("PPTT.aml"), &data).expect("Test operation should succeed");
        assert_eq!(verified.nodes, Some(2));
        assert_eq!(verified.warnings, vec!["offset 0x0038: cache node length 24 != 28".to_string()]);
    }

    #[test]
    fn test_pptt_short_processor_node() {
        let data = finalized(*b"PPTT", &[0, 4, 0, 0]);
        let err = verify_bytes(Path::new("PPTT.aml"), &data).expect_err("Test operation should fail");
        assert_eq!(err.condition(), "MalformedStructure");
    }
}
