//! Atomic artifact writes.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{GenError, Result};

/// Write `contents` to `path` so readers see the old file or the complete
/// new one, never a partial write.
///
/// The temp file is created beside the target so the final rename stays on
/// one filesystem. It is removed if anything fails before the rename.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| GenError::write(path, e))?;
    temp.write_all(contents.as_bytes())
        .map_err(|e| GenError::write(path, e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| GenError::write(path, e))?;
    temp.persist(path).map_err(|e| GenError::write(path, e.error))?;

    Ok(())
}
