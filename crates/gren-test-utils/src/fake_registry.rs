//! An in-memory package registry.

use gren_cache::PackageCache;
use gren_core::{PackageName, Version};
use gren_solver::{Registry, RegistryError};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, Clone)]
struct Published {
    outline: String,
    files: BTreeMap<String, String>,
}

/// Registry stand-in serving packages published into it by tests.
///
/// Flip [`FakeRegistry::set_unreachable`] to simulate losing the network
/// mid-solve; every call then fails with [`RegistryError::Unreachable`].
#[derive(Debug, Default)]
pub struct FakeRegistry {
    packages: RwLock<BTreeMap<PackageName, BTreeMap<Version, Published>>>,
    unreachable: AtomicBool,
    downloads: AtomicU64,
}

impl FakeRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish one package version: its `gren.json` plus source files
    /// (paths relative to the package root, e.g. `src/Basics.gren`).
    pub fn publish(
        &self,
        name: &PackageName,
        version: Version,
        outline: &str,
        files: &[(&str, &str)],
    ) {
        self.packages
            .write()
            .entry(name.clone())
            .or_default()
            .insert(
                version,
                Published {
                    outline: outline.to_string(),
                    files: files
                        .iter()
                        .map(|(path, content)| ((*path).to_string(), (*content).to_string()))
                        .collect(),
                },
            );
    }

    /// Simulate the registry dropping off the network.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// How many package versions have been downloaded so far.
    #[must_use]
    pub fn downloads(&self) -> u64 {
        self.downloads.load(Ordering::SeqCst)
    }

    fn check_reachable(&self) -> Result<(), RegistryError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(RegistryError::Unreachable(
                "fake registry is unreachable".to_string(),
            ));
        }
        Ok(())
    }
}

impl Registry for FakeRegistry {
    fn published_versions(&self, name: &PackageName) -> Result<Vec<Version>, RegistryError> {
        self.check_reachable()?;
        let packages = self.packages.read();
        let Some(versions) = packages.get(name) else {
            return Err(RegistryError::UnknownPackage(name.clone()));
        };
        Ok(versions.keys().copied().collect())
    }

    fn populate(
        &self,
        cache: &PackageCache,
        name: &PackageName,
        version: Version,
    ) -> Result<(), RegistryError> {
        self.check_reachable()?;
        let packages = self.packages.read();
        let published = packages
            .get(name)
            .and_then(|versions| versions.get(&version))
            .ok_or_else(|| RegistryError::UnknownPackage(name.clone()))?;

        let dir = cache.version_dir(name, version);
        let io_failed = |message: String| RegistryError::Git {
            package: name.clone(),
            version,
            message,
        };
        std::fs::create_dir_all(&dir).map_err(|err| io_failed(err.to_string()))?;
        std::fs::write(dir.join("gren.json"), &published.outline)
            .map_err(|err| io_failed(err.to_string()))?;
        for (rel, content) in &published.files {
            let path = dir.join(rel);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|err| io_failed(err.to_string()))?;
            }
            std::fs::write(&path, content).map_err(|err| io_failed(err.to_string()))?;
        }
        self.downloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
