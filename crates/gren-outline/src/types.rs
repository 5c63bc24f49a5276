//! The validated, in-memory form of `gren.json`.

use gren_core::{Constraint, PackageName, Platform, Raw, Version};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A validated project manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outline {
    /// An application that is compiled to output.
    App(AppOutline),
    /// A package meant for publication.
    Pkg(PkgOutline),
}

impl Outline {
    /// The root platform of the project.
    #[must_use]
    pub fn platform(&self) -> Platform {
        match self {
            Self::App(app) => app.platform,
            Self::Pkg(pkg) => pkg.platform,
        }
    }
}

/// Manifest of an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppOutline {
    /// Pinned compiler version; must equal the running compiler's.
    pub gren_version: Version,
    /// Root platform.
    pub platform: Platform,
    /// Ordered, non-empty set of source directories.
    pub source_dirs: Vec<PathBuf>,
    /// Direct dependencies, pinned to exact versions.
    pub deps_direct: BTreeMap<PackageName, Version>,
    /// Indirect dependencies, pinned to exact versions.
    pub deps_indirect: BTreeMap<PackageName, Version>,
}

impl AppOutline {
    /// Direct and indirect dependencies as one exact-version map.
    #[must_use]
    pub fn all_deps(&self) -> BTreeMap<PackageName, Version> {
        let mut all = self.deps_direct.clone();
        all.extend(
            self.deps_indirect
                .iter()
                .map(|(name, version)| (name.clone(), *version)),
        );
        all
    }
}

/// Manifest of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkgOutline {
    /// The package's own name.
    pub name: PackageName,
    /// Short description, under 80 bytes.
    pub summary: String,
    /// OSI-approved SPDX license identifier.
    pub license: String,
    /// The package's own version.
    pub version: Version,
    /// Platform the package targets.
    pub platform: Platform,
    /// Modules visible outside the package, flat or grouped under headers.
    pub exposed: Exposed,
    /// Range of compiler versions the package works with.
    pub gren_version: Constraint,
    /// Direct dependencies as ranges.
    pub deps: BTreeMap<PackageName, Constraint>,
}

/// The `exposed-modules` member: a flat list or header-grouped lists.
///
/// Header order is the order modules are presented in docs, so it is
/// preserved rather than sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exposed {
    /// `"exposed-modules": [ "A", "B" ]`
    Flat(Vec<Raw>),
    /// `"exposed-modules": { "Header": [ "A" ], ... }`
    Headered(Vec<(String, Vec<Raw>)>),
}

impl Exposed {
    /// Iterate every exposed module regardless of grouping.
    pub fn iter(&self) -> impl Iterator<Item = &Raw> {
        match self {
            Self::Flat(modules) => ExposedIter::Flat(modules.iter()),
            Self::Headered(groups) => {
                ExposedIter::Headered(groups.iter().flat_map(|(_, modules)| modules.iter()))
            }
        }
    }

    /// Total number of exposed modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// True when nothing is exposed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Is `module` exposed?
    #[must_use]
    pub fn contains(&self, module: &Raw) -> bool {
        self.iter().any(|exposed| exposed == module)
    }
}

enum ExposedIter<'a, H> {
    Flat(std::slice::Iter<'a, Raw>),
    Headered(H),
}

impl<'a, H: Iterator<Item = &'a Raw>> Iterator for ExposedIter<'a, H> {
    type Item = &'a Raw;

    fn next(&mut self) -> Option<&'a Raw> {
        match self {
            Self::Flat(iter) => iter.next(),
            Self::Headered(iter) => iter.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str) -> Raw {
        name.parse().unwrap()
    }

    #[test]
    fn exposed_iterates_groups_in_order() {
        let exposed = Exposed::Headered(vec![
            ("Primitives".to_string(), vec![raw("Int"), raw("Float")]),
            ("Collections".to_string(), vec![raw("Array")]),
        ]);
        let names: Vec<_> = exposed.iter().map(Raw::as_str).collect();
        assert_eq!(names, ["Int", "Float", "Array"]);
        assert_eq!(exposed.len(), 3);
        assert!(exposed.contains(&raw("Array")));
        assert!(!exposed.contains(&raw("Dict")));
    }

    #[test]
    fn app_all_deps_merges_both_maps() {
        let app = AppOutline {
            gren_version: gren_core::COMPILER_VERSION,
            platform: Platform::Browser,
            source_dirs: vec![PathBuf::from("src")],
            deps_direct: BTreeMap::from([("gren/core".parse().unwrap(), Version::ONE)]),
            deps_indirect: BTreeMap::from([(
                "gren/url".parse().unwrap(),
                Version::new(2, 0, 1),
            )]),
        };
        assert_eq!(app.all_deps().len(), 2);
    }
}
