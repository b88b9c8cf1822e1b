use crate::error::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write `path` so that it either appears complete or not at all.
///
/// Content goes to a temporary file in the destination directory, is
/// flushed to disk, then atomically renamed into place.
pub fn write_durably<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(File) -> Result<File>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let temp = NamedTempFile::new_in(dir)?;
    let mut file = write(temp.as_file().try_clone()?)?;
    file.flush()?;
    file.sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    // Best effort: not every platform can sync a directory handle
    if let Ok(handle) = File::open(dir) {
        let _ = handle.sync_all();
    }
    Ok(())
}
