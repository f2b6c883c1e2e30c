//! Whole-file replacement helpers shared by the changelog, version file and release info.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::Result;

/// Replace `path` with `content` in one step.
///
/// The new content goes to a temporary file in the target's directory that
/// is then persisted over the target, so readers see either the old or the
/// new file.
pub fn write_atomically(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    tracing::debug!(path = %path.display(), bytes = content.len(), "file rewritten");
    Ok(())
}
