//! Where packages and project state live on disk.

use crate::error::{CacheError, Result};
use gren_core::{PackageName, Version, COMPILER_VERSION};
use std::path::{Path, PathBuf};

/// The shared, cross-project package cache directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageCache {
    root: PathBuf,
}

impl PackageCache {
    /// Use an explicit cache root (tests, `GREN_HOME`-style overrides).
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The host-convention cache root, `<user cache dir>/gren/<compiler-version>`.
    pub fn default_root() -> Result<Self> {
        let dirs = directories::BaseDirs::new().ok_or(CacheError::NoCacheRoot)?;
        Ok(Self::new(
            dirs.cache_dir()
                .join("gren")
                .join(COMPILER_VERSION.to_string()),
        ))
    }

    /// The cache root itself.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<author>/<project>`.
    #[must_use]
    pub fn package_dir(&self, name: &PackageName) -> PathBuf {
        self.root.join(name.author()).join(name.project())
    }

    /// `<root>/<author>/<project>/<version>`.
    #[must_use]
    pub fn version_dir(&self, name: &PackageName, version: Version) -> PathBuf {
        self.package_dir(name).join(version.to_string())
    }

    /// The cached `gren.json` of one package version.
    #[must_use]
    pub fn outline_path(&self, name: &PackageName, version: Version) -> PathBuf {
        self.version_dir(name, version).join("gren.json")
    }

    /// The cached source tree of one package version.
    #[must_use]
    pub fn src_dir(&self, name: &PackageName, version: Version) -> PathBuf {
        self.version_dir(name, version).join("src")
    }

    /// The persisted `ArtifactCache` of one package version.
    #[must_use]
    pub fn artifacts_path(&self, name: &PackageName, version: Version) -> PathBuf {
        self.version_dir(name, version).join("artifacts.dat")
    }

    /// Is this package version present locally (outline downloaded)?
    #[must_use]
    pub fn is_cached(&self, name: &PackageName, version: Version) -> bool {
        self.outline_path(name, version).is_file()
    }

    /// Every version of `name` present in the cache, ascending.
    ///
    /// Directory entries that do not parse as versions are ignored; an absent
    /// package directory is simply no versions.
    #[must_use]
    pub fn cached_versions(&self, name: &PackageName) -> Vec<Version> {
        let Ok(entries) = std::fs::read_dir(self.package_dir(name)) else {
            return Vec::new();
        };
        let mut versions: Vec<Version> = entries
            .filter_map(|entry| {
                let entry = entry.ok()?;
                entry.file_name().to_str()?.parse().ok()
            })
            .collect();
        versions.sort_unstable();
        versions
    }
}

/// Paths of one project's private `.gren/` state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    root: PathBuf,
}

impl ProjectPaths {
    /// State paths for the project at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/gren.json`.
    #[must_use]
    pub fn outline_path(&self) -> PathBuf {
        self.root.join("gren.json")
    }

    /// `<root>/.gren`.
    #[must_use]
    pub fn gren_dir(&self) -> PathBuf {
        self.root.join(".gren")
    }

    /// `<root>/.gren/details.dat`.
    #[must_use]
    pub fn details_path(&self) -> PathBuf {
        self.gren_dir().join("details.dat")
    }

    /// `<root>/.gren/interfaces.dat`.
    #[must_use]
    pub fn interfaces_path(&self) -> PathBuf {
        self.gren_dir().join("interfaces.dat")
    }

    /// `<root>/.gren/objects.dat`.
    #[must_use]
    pub fn objects_path(&self) -> PathBuf {
        self.gren_dir().join("objects.dat")
    }

    /// Create `.gren/` if it does not exist yet.
    pub fn prepare(&self) -> Result<()> {
        let dir = self.gren_dir();
        std::fs::create_dir_all(&dir).map_err(|source| CacheError::io(dir, source))
    }
}
