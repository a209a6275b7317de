//! Crash-safe replacement of the descriptor file.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

/// Replace `path` with `contents`.
///
/// The new text goes to a temporary file in the same directory, which is
/// then renamed over `path`. Readers see either the old or the new file,
/// never a partial write. Permissions of the existing file are kept.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(contents.as_bytes())
        .context("Failed to write temporary file")?;
    tmp.as_file()
        .sync_all()
        .context("Failed to flush temporary file")?;

    if let Ok(metadata) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(metadata.permissions())
            .context("Failed to copy file permissions")?;
    }

    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    Ok(())
}
