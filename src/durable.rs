//! Crash-safe file helpers shared by the file article store and the group journal

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::Result;

/// Extension of in-flight files written by [`atomic_write`]
pub(crate) const TMP_EXTENSION: &str = "tmp";

/// Replace `path` with `data` so readers see either the old or the new contents
///
/// Writes a sibling temp file, fsyncs it, renames it over `path` and fsyncs
/// the parent directory so the rename itself survives a crash.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension(TMP_EXTENSION);

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    fs::rename(&tmp_path, path)?;

    if let Some(parent) = path.parent() {
        sync_dir(parent)?;
    }

    Ok(())
}

/// Fsync a directory so entries created or removed in it are durable
pub(crate) fn sync_dir(dir: &Path) -> Result<()> {
    // Directories cannot be opened for sync on Windows
    #[cfg(unix)]
    fs::File::open(dir)?.sync_all()?;
    #[cfg(not(unix))]
    let _ = dir;
    Ok(())
}

/// Remove leftover temp files under `dir`, recursively
///
/// Returns the number of files removed. A missing directory counts as clean.
pub(crate) fn remove_tmp_files(dir: &Path) -> Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(err.into()),
    };

    let mut removed = 0;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            removed += remove_tmp_files(&path)?;
        } else if path.extension() == Some(TMP_EXTENSION.as_ref()) {
            debug!("Removing interrupted write {}", path.display());
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}
