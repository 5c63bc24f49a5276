//! The seam to the package registry client.

use gren_cache::PackageCache;
use gren_core::{PackageName, Version};
use thiserror::Error;

/// Failures from the registry client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The registry could not be reached at all.
    ///
    /// This is the one failure the solver recovers from, by rerunning the
    /// search against the local cache.
    #[error("could not reach the package registry: {0}")]
    Unreachable(String),

    /// The registry has never heard of this package.
    #[error("the registry does not know any package named {0}")]
    UnknownPackage(PackageName),

    /// A git operation failed while fetching a package.
    #[error("git failed fetching {package} {version}: {message}")]
    Git {
        /// Package being fetched.
        package: PackageName,
        /// Version being fetched.
        version: Version,
        /// Git's own error output.
        message: String,
    },
}

/// Black-box client for the package registry.
///
/// The HTTP/git transport lives outside the build core; the solver only
/// needs published-version listings and the ability to materialize one
/// package version into the local cache.
pub trait Registry: Send + Sync {
    /// All published versions of `name`, in ascending order.
    fn published_versions(&self, name: &PackageName) -> Result<Vec<Version>, RegistryError>;

    /// Download `name@version` (its `gren.json` and source tree) into `cache`.
    fn populate(
        &self,
        cache: &PackageCache,
        name: &PackageName,
        version: Version,
    ) -> Result<(), RegistryError>;
}
