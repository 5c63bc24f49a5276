//! Crash-safe reads and writes for the `.dat` stores.

use crate::error::{CacheError, Result};
use std::path::Path;
use std::time::UNIX_EPOCH;
use tracing::trace;

/// Write `bytes` to `path` atomically: stage into a temp file in the same
/// directory, then rename over the target. Readers never observe a torn file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(parent).map_err(|source| CacheError::io(parent, source))?;

    let mut temp =
        tempfile::NamedTempFile::new_in(parent).map_err(|source| CacheError::io(parent, source))?;
    std::io::Write::write_all(&mut temp, bytes)
        .map_err(|source| CacheError::io(temp.path().to_path_buf(), source))?;
    temp.persist(path)
        .map_err(|err| CacheError::io(path, err.error))?;

    trace!(path = %path.display(), bytes = bytes.len(), "atomic write");
    Ok(())
}

/// Read a whole binary file.
pub fn read_binary(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| CacheError::io(path, source))
}

/// The file's modification time in milliseconds since the Unix epoch.
///
/// Staleness detection compares these for exact equality, so the unit only
/// has to be stable, not fine-grained.
pub fn modification_time(path: &Path) -> Result<u64> {
    let metadata = std::fs::metadata(path).map_err(|source| CacheError::io(path, source))?;
    let modified = metadata
        .modified()
        .map_err(|source| CacheError::io(path, source))?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.dat");
        write_atomic(&path, b"\x01\x02\x03").unwrap();
        assert_eq!(read_binary(&path).unwrap(), b"\x01\x02\x03");
    }

    #[test]
    fn write_replaces_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.dat");
        write_atomic(&path, b"old").unwrap();
        write_atomic(&path, b"new").unwrap();
        assert_eq!(read_binary(&path).unwrap(), b"new");
    }

    #[test]
    fn modification_time_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file");
        std::fs::write(&path, "x").unwrap();
        let first = modification_time(&path).unwrap();
        let second = modification_time(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_file_reports_the_path() {
        let err = modification_time(Path::new("/nonexistent/file")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/file"));
    }
}
