//! Cross-process lock over the shared package cache.

use crate::error::{CacheError, Result};
use crate::paths::PackageCache;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use tracing::debug;

const LOCK_FILE: &str = "lock";

/// Exclusive advisory lock over a [`PackageCache`].
///
/// Only one builder on a machine may write package artifacts at a time; the
/// lock is held for the whole verify-dependencies phase and released on drop.
#[derive(Debug)]
pub struct RegistryLock {
    file: File,
}

impl RegistryLock {
    /// Block until the cache lock is acquired.
    pub fn acquire(cache: &PackageCache) -> Result<Self> {
        std::fs::create_dir_all(cache.root())
            .map_err(|source| CacheError::io(cache.root(), source))?;

        let path = cache.root().join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|source| CacheError::io(&path, source))?;
        file.lock_exclusive()
            .map_err(|source| CacheError::LockFailed {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), "registry lock acquired");
        Ok(Self { file })
    }
}

impl Drop for RegistryLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
        debug!("registry lock released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_can_be_reacquired_after_release() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PackageCache::new(dir.path());

        let first = RegistryLock::acquire(&cache).unwrap();
        drop(first);
        let _second = RegistryLock::acquire(&cache).unwrap();
    }

    #[test]
    fn lock_creates_the_cache_root() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PackageCache::new(dir.path().join("deep").join("root"));
        let _lock = RegistryLock::acquire(&cache).unwrap();
        assert!(cache.root().is_dir());
    }
}
