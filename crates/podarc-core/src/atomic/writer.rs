//! Temp-then-rename writer.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use super::error::WriteError;
use super::{TEMP_PREFIX, TEMP_SUFFIX};

fn parent_dir(dest: &Path) -> &Path {
    match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Create the sibling temp file. Same directory as `dest` so the final rename
/// never crosses a filesystem boundary.
fn sibling_temp(dest: &Path) -> Result<NamedTempFile, WriteError> {
    let dir = parent_dir(dest);
    tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| WriteError::new("create temp file in", dir, e))
}

/// Best-effort fsync of the directory entry after a rename.
fn sync_dir(dest: &Path) {
    #[cfg(unix)]
    {
        if let Ok(dir) = File::open(parent_dir(dest)) {
            if let Err(e) = dir.sync_all() {
                tracing::debug!(error = %e, "directory fsync failed");
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = dest;
    }
}

/// Writes `dest` atomically: `producer` fills a sibling temp file, which is
/// synced and renamed onto `dest` only if the producer succeeds.
///
/// On any failure before the rename (producer error, sync error, panic) the
/// temp file is removed and `dest` keeps its previous state (absent or old
/// content). The destination directory must already exist.
pub fn write<T, E, F>(dest: &Path, producer: F) -> Result<T, E>
where
    E: From<WriteError>,
    F: FnOnce(&mut File) -> Result<T, E>,
{
    let mut tmp = sibling_temp(dest)?;
    let out = producer(tmp.as_file_mut())?;
    tmp.as_file_mut()
        .flush()
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| WriteError::new("sync", tmp.path().to_path_buf(), e))?;
    tmp.persist(dest)
        .map_err(|e| WriteError::new("rename onto", dest, e.error))?;
    sync_dir(dest);
    Ok(out)
}

/// Atomically replaces `dest` with `bytes` (manifest, feed copies, artwork).
pub fn write_bytes(dest: &Path, bytes: &[u8]) -> Result<(), WriteError> {
    write(dest, |f: &mut File| {
        f.write_all(bytes)
            .map_err(|e| WriteError::new("write", dest, e))
    })
}

/// Edits an existing file without ever exposing a half-edited state.
///
/// The current content of `dest` is copied into a sibling temp file, `editor`
/// mutates that copy by path (tag writers reopen the file themselves), and the
/// copy is renamed over `dest` on success. On failure the copy is discarded.
pub fn replace_in_place<T, E, F>(dest: &Path, editor: F) -> Result<T, E>
where
    E: From<WriteError>,
    F: FnOnce(&Path) -> Result<T, E>,
{
    let mut tmp = sibling_temp(dest)?;
    {
        let mut src = File::open(dest).map_err(|e| WriteError::new("open", dest, e))?;
        io::copy(&mut src, tmp.as_file_mut())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| WriteError::new("copy", dest, e))?;
    }
    // Close our handle; the editor opens the path on its own.
    let tmp_path = tmp.into_temp_path();
    let out = editor(&tmp_path)?;
    File::open(&tmp_path)
        .and_then(|f| f.sync_all())
        .map_err(|e| WriteError::new("sync", tmp_path.to_path_buf(), e))?;
    tmp_path
        .persist(dest)
        .map_err(|e| WriteError::new("rename onto", dest, e.error))?;
    sync_dir(dest);
    Ok(out)
}
