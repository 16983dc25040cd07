//! Whole-file buffer I/O
//!
//! Artifacts are loaded into memory in one piece and finalized tables are
//! written back in one piece. Nothing here streams.

use crate::error::IoError;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::Path;
use tracing::debug;

/// Read the whole file at `path`
///
/// Fails with [`IoError::NotFound`] when `path` is missing, unreadable or not
/// a regular file, and with [`IoError::ShortRead`] when fewer bytes arrive
/// than the filesystem reported.
pub fn load(path: &Path) -> Result<Vec<u8>, IoError> {
    let not_found = |source| IoError::NotFound {
        path: path.to_path_buf(),
        source,
    };

    let metadata = fs::metadata(path).map_err(|e| not_found(Some(e)))?;
    if !metadata.is_file() {
        return Err(not_found(None));
    }

    let mut file = File::open(path).map_err(|e| not_found(Some(e)))?;
    let expected = metadata.len();
    let mut buffer = Vec::with_capacity(usize::try_from(expected).unwrap_or_default());
    if let Err(e) = file.read_to_end(&mut buffer) {
        return Err(IoError::ShortRead {
            path: path.to_path_buf(),
            expected,
            actual: buffer.len(),
            source: Some(e),
        });
    }

    if (buffer.len() as u64) < expected {
        return Err(IoError::ShortRead {
            path: path.to_path_buf(),
            expected,
            actual: buffer.len(),
            source: None,
        });
    }

    debug!(path = %path.display(), bytes = buffer.len(), "loaded file");
    Ok(buffer)
}

/// Create or truncate `path` and write all of `bytes` to it
pub fn store(path: &Path, bytes: &[u8]) -> Result<(), IoError> {
    let failure = |written, source| IoError::WriteFailure {
        path: path.to_path_buf(),
        written,
        requested: bytes.len(),
        source,
    };

    let mut file = File::create(path).map_err(|e| failure(0, Some(e)))?;
    let mut written = 0;
    while written < bytes.len() {
        match file.write(&bytes[written..]) {
            Ok(0) => return Err(failure(written, None)),
            Ok(n) => written += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(failure(written, Some(e))),
        }
    }
    file.flush().map_err(|e| failure(written, Some(e)))?;

    debug!(path = %path.display(), bytes = written, "stored file");
    Ok(())
}

/// Whether `path` names an existing directory
pub fn is_directory(path: &Path) -> bool {
    path.is_dir()
}

/// Create `path` and its parents if missing
pub fn ensure_dir(path: &Path) -> Result<(), IoError> {
    fs::create_dir_all(path).map_err(|source| IoError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_path() {
        let dir = TempDir::new().expect("Test operation should succeed");
        let err = load(&dir.path().join("absent.bin")).expect_err("Test operation should fail");
        assert_eq!(err.condition(), "NotFound");
    }

    #[test]
    fn test_load_directory_is_not_found() {
        let dir = TempDir::new().expect("Test operation should succeed");
        let err = load(dir.path()).expect_err("Test operation should fail");
        assert!(matches!(err, IoError::NotFound { source: None, .. }));
    }

    #[test]
    fn test_store_then_load() {
        let dir = TempDir::new().expect("Test operation should succeed");
        let path = dir.path().join("GTDT.aml");
        let bytes: Vec<u8> = (0..=255).collect();

        store(&path, &bytes).expect("Test operation should succeed");
        assert_eq!(load(&path).expect("Test operation should succeed"), bytes);

        // Truncates on rewrite
        store(&path, &bytes[..4]).expect("Test operation should succeed");
        assert_eq!(load(&path).expect("Test operation should succeed"), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_store_empty_file() {
        let dir = TempDir::new().expect("Test operation should succeed");
        let path = dir.path().join("empty");
        store(&path, &[]).expect("Test operation should succeed");
        assert!(load(&path).expect("Test operation should succeed").is_empty());
    }

    #[test]
    fn test_store_into_missing_directory() {
        let dir = TempDir::new().expect("Test operation should succeed");
        let err = store(&dir.path().join("missing/GTDT.aml"), b"data")
            .expect_err("Test operation should fail");
        assert!(matches!(
            err,
            IoError::WriteFailure {
                written: 0,
                requested: 4,
                ..
            }
        ));
    }

    #[test]
    fn test_is_directory() {
        let dir = TempDir::new().expect("Test operation should succeed");
        let file = dir.path().join("file");
        store(&file, b"x").expect("Test operation should succeed");

        assert!(is_directory(dir.path()));
        assert!(!is_directory(&file));
        assert!(!is_directory(&dir.path().join("nothing")));
    }

    #[test]
    fn test_ensure_dir_nested() {
        let dir = TempDir::new().expect("Test operation should succeed");
        let nested = dir.path().join("a/b/c");
        ensure_dir(&nested).expect("Test operation should succeed");
        ensure_dir(&nested).expect("Test operation should succeed");
        assert!(is_directory(&nested));
    }
}
