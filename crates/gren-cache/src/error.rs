//! Errors for cache-directory operations.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Failures touching the package cache or `.gren/` directories.
#[derive(Error, Debug)]
pub enum CacheError {
    /// An IO operation failed, with the path it touched.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// No home or cache directory could be resolved for this user.
    #[error("could not find a cache directory for this user")]
    NoCacheRoot,

    /// Another build holds the registry lock and it could not be acquired.
    #[error("could not lock the package cache at {path}: {source}")]
    LockFailed {
        /// Lock file path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
