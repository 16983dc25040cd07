//! Test artifacts for end-to-end checks

use crate::error::Result;
use crate::io;
use acgen_formats::platform::Platform;
use std::path::Path;
use tracing::info;

/// Write an artifact embedding every built-in table of `platform`
///
/// Returns the number of embedded tables.
pub fn write_platform_artifact(platform: Platform, path: &Path) -> Result<usize> {
    let artifact = platform.artifact()?;
    io::store(path, artifact.as_bytes())?;
    info!(
        platform = %platform,
        path = %path.display(),
        tables = artifact.table_count(),
        bytes = artifact.as_bytes().len(),
        "wrote artifact"
    );
    Ok(artifact.table_count())
}
