//! Crash-safe file replacement.

use partitura_core::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::trace;

/// Write `content` to `path` atomically.
///
/// The bytes go to a temporary file in the destination directory, are synced,
/// then renamed over `path`. Readers observe either the previous file or the
/// complete new one. Parent directories are created as needed; the temporary
/// file is removed if anything fails before the rename.
///
/// # Errors
/// Returns an IO error naming the path that failed.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

    let mut temp = tempfile::Builder::new()
        .prefix(".partitura-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| Error::io(parent, e))?;
    temp.write_all(content)
        .map_err(|e| Error::io(temp.path(), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| Error::io(temp.path(), e))?;

    temp.persist(path).map_err(|e| Error::io(path, e.error))?;

    // Sync parent directory on Unix so the rename itself is durable
    #[cfg(unix)]
    if let Ok(dir) = fs::File::open(parent) {
        let _ = dir.sync_all();
    }

    trace!(path = %path.display(), size = content.len(), "atomic write completed");
    Ok(())
}
