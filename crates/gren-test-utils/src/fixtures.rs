//! Canned outlines, packages, and a ready-made build environment.

use crate::{FakeFrontend, FakeRegistry};
use gren_build::Env;
use gren_cache::PackageCache;
use gren_core::{PackageName, Version, COMPILER_VERSION};
use std::sync::Arc;
use tempfile::TempDir;

/// Render an application `gren.json`.
#[must_use]
pub fn app_outline(platform: &str, direct: &[(&str, &str)], indirect: &[(&str, &str)]) -> String {
    let entries = |deps: &[(&str, &str)]| {
        deps.iter()
            .map(|(name, version)| format!("\"{name}\": \"{version}\""))
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        r#"{{
    "type": "application",
    "platform": "{platform}",
    "source-directories": [ "src" ],
    "gren-version": "{version}",
    "dependencies": {{
        "direct": {{ {direct} }},
        "indirect": {{ {indirect} }}
    }}
}}"#,
        version = COMPILER_VERSION,
        direct = entries(direct),
        indirect = entries(indirect),
    )
}

/// Render a package `gren.json`.
#[must_use]
pub fn pkg_outline(
    name: &str,
    version: &str,
    platform: &str,
    exposed: &[&str],
    deps: &[(&str, &str)],
) -> String {
    let exposed = exposed
        .iter()
        .map(|module| format!("\"{module}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let deps = deps
        .iter()
        .map(|(dep, constraint)| format!("\"{dep}\": \"{constraint}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"{{
    "type": "package",
    "name": "{name}",
    "summary": "test fixture package",
    "license": "BSD-3-Clause",
    "version": "{version}",
    "platform": "{platform}",
    "exposed-modules": [ {exposed} ],
    "gren-version": "0.5.0 <= v < 0.6.0",
    "dependencies": {{ {deps} }}
}}"#
    )
}

/// Publish the standard-library stand-ins every scenario leans on:
/// `gren/core 1.0.0` exposing `Basics` and `Html` (kernel-backed).
pub fn publish_std(registry: &FakeRegistry) {
    let core: PackageName = "gren/core".parse().expect("static name");
    registry.publish(
        &core,
        Version::ONE,
        &pkg_outline("gren/core", "1.0.0", "common", &["Basics", "Html"], &[]),
        &[
            (
                "src/Basics.gren",
                "module Basics exposing (..)\n\nidentity =\n    0\n",
            ),
            (
                "src/Html.gren",
                "module Html exposing (..)\n\nimport Gren.Kernel.VirtualDom\n\ntext : Html\ntext =\n    Gren.Kernel.VirtualDom.text\n",
            ),
            (
                "src/Gren/Kernel/VirtualDom.js",
                "// import Basics\nfunction _VirtualDom_text(str) { return str; }\n",
            ),
        ],
    );
}

/// One isolated build world: a package cache, a fake registry, and the
/// fake frontend, wired into an [`Env`].
#[derive(Debug)]
pub struct TestWorld {
    cache_dir: TempDir,
    /// The registry, for publishing and outage simulation.
    pub registry: Arc<FakeRegistry>,
    /// The frontend, for compile counting.
    pub frontend: Arc<FakeFrontend>,
}

impl TestWorld {
    /// A world with an empty cache and an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache_dir: tempfile::tempdir().expect("temp dir"),
            registry: Arc::new(FakeRegistry::new()),
            frontend: Arc::new(FakeFrontend::new()),
        }
    }

    /// A world with the standard-library stand-ins already published.
    #[must_use]
    pub fn with_std() -> Self {
        let world = Self::new();
        publish_std(&world.registry);
        world
    }

    /// The package cache rooted in this world.
    #[must_use]
    pub fn cache(&self) -> PackageCache {
        PackageCache::new(self.cache_dir.path())
    }

    /// An online environment.
    #[must_use]
    pub fn env(&self) -> Env {
        Env {
            cache: self.cache(),
            registry: Some(self.registry.clone()),
            frontend: Arc::new(FakeFrontend::new()),
        }
    }

    /// An environment with no registry at all.
    #[must_use]
    pub fn offline_env(&self) -> Env {
        Env {
            cache: self.cache(),
            registry: None,
            frontend: Arc::new(FakeFrontend::new()),
        }
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}
