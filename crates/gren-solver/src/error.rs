//! Solver errors.

use crate::registry::RegistryError;
use gren_core::{PackageName, Version};
use thiserror::Error;

/// Convenience alias for solver operations.
pub type Result<T> = std::result::Result<T, SolverError>;

/// Failures that abort resolution outright.
///
/// "No solution exists" is not an error but an [`Outcome`](crate::Outcome):
/// the search completed, it just found nothing. These variants mean the
/// search itself could not proceed.
#[derive(Error, Debug)]
pub enum SolverError {
    /// A cached `gren.json` would not load or is not a package manifest.
    #[error("the cached outline for {package} {version} is unusable: {message}")]
    BadCacheData {
        /// Package whose cache entry is bad.
        package: PackageName,
        /// Version whose cache entry is bad.
        version: Version,
        /// Why it would not load.
        message: String,
    },

    /// The registry failed in a non-recoverable way (unknown package, git).
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
