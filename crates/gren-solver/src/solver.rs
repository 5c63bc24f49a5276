//! Backtracking search over package versions.

use crate::error::SolverError;
use crate::registry::{Registry, RegistryError};
use gren_cache::PackageCache;
use gren_core::{Constraint, PackageName, Platform, Version};
use gren_outline::{Outline, OutlineError};
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info, warn};

/// One entry of a complete solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solved {
    /// The selected version.
    pub version: Version,
    /// The package's own direct-dependency constraints at that version.
    pub constraints: BTreeMap<PackageName, Constraint>,
}

/// A complete version assignment covering every transitive dependency.
pub type Solution = BTreeMap<PackageName, Solved>;

/// What the search concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A satisfying assignment was found.
    Ok(Solution),
    /// The registry was reachable and no assignment exists.
    NoSolution,
    /// The registry was unreachable and the local cache alone has no
    /// assignment. Kept distinct from [`Outcome::NoSolution`] because the
    /// user-facing advice differs (connect vs. fix constraints).
    NoOfflineSolution,
}

/// Solve for a package: direct dependencies given as ranges.
pub fn verify_pkg(
    cache: &PackageCache,
    registry: Option<&dyn Registry>,
    root_platform: Platform,
    constraints: &BTreeMap<PackageName, Constraint>,
) -> Result<Outcome, SolverError> {
    run(cache, registry, root_platform, constraints.clone())
}

/// Solve for an application: dependencies given as exact versions.
pub fn verify_app(
    cache: &PackageCache,
    registry: Option<&dyn Registry>,
    root_platform: Platform,
    exact: &BTreeMap<PackageName, Version>,
) -> Result<Outcome, SolverError> {
    let constraints = exact
        .iter()
        .map(|(name, version)| (name.clone(), Constraint::exactly(*version)))
        .collect();
    run(cache, registry, root_platform, constraints)
}

fn run(
    cache: &PackageCache,
    registry: Option<&dyn Registry>,
    root_platform: Platform,
    constraints: BTreeMap<PackageName, Constraint>,
) -> Result<Outcome, SolverError> {
    let state = State::new(constraints);
    let online = Search {
        cache,
        registry,
        root_platform,
    };

    match online.explore(state.clone()) {
        Ok(Some(solution)) => {
            info!(packages = solution.len(), "solution found");
            Ok(Outcome::Ok(solution))
        }
        Ok(None) => Ok(if registry.is_some() {
            Outcome::NoSolution
        } else {
            Outcome::NoOfflineSolution
        }),
        Err(Failure::Fatal(err)) => Err(err),
        Err(Failure::Unreachable(reason)) => {
            warn!(reason, "registry unreachable, retrying against local cache");
            let offline = Search {
                cache,
                registry: None,
                root_platform,
            };
            match offline.explore(state) {
                Ok(Some(solution)) => {
                    info!(packages = solution.len(), "offline solution found");
                    Ok(Outcome::Ok(solution))
                }
                Ok(None) => Ok(Outcome::NoOfflineSolution),
                Err(Failure::Fatal(err)) => Err(err),
                Err(Failure::Unreachable(_)) => unreachable!("offline search never uses the registry"),
            }
        }
    }
}

/// Search state: narrowed constraints, chosen versions, and the order
/// packages became pending. Cloned at each branch point so backtracking is
/// a plain return.
#[derive(Debug, Clone)]
struct State {
    constraints: BTreeMap<PackageName, Constraint>,
    solved: Solution,
    pending: VecDeque<PackageName>,
}

impl State {
    fn new(constraints: BTreeMap<PackageName, Constraint>) -> Self {
        let pending = constraints.keys().cloned().collect();
        Self {
            constraints,
            solved: Solution::new(),
            pending,
        }
    }
}

enum Failure {
    Fatal(SolverError),
    Unreachable(String),
}

struct Search<'a> {
    cache: &'a PackageCache,
    registry: Option<&'a dyn Registry>,
    root_platform: Platform,
}

impl Search<'_> {
    fn explore(&self, mut state: State) -> Result<Option<Solution>, Failure> {
        let Some(name) = state.pending.pop_front() else {
            return Ok(Some(state.solved));
        };
        let constraint = state.constraints[&name];

        // Newest admissible version first, for reproducible tie-breaking.
        let mut candidates = self.versions(&name)?;
        candidates.retain(|version| constraint.satisfies(*version));
        candidates.reverse();

        debug!(package = %name, %constraint, candidates = candidates.len(), "exploring");

        for version in candidates {
            let Some(outline) = self.pkg_outline(&name, version)? else {
                continue;
            };
            if !self.root_platform.compatible(outline.platform) {
                continue;
            }
            if let Some(next) = extend(&state, &name, version, &outline.deps) {
                if let Some(solution) = self.explore(next)? {
                    return Ok(Some(solution));
                }
            }
        }
        Ok(None)
    }

    fn versions(&self, name: &PackageName) -> Result<Vec<Version>, Failure> {
        match self.registry {
            Some(registry) => match registry.published_versions(name) {
                Ok(versions) => Ok(versions),
                Err(RegistryError::Unreachable(reason)) => Err(Failure::Unreachable(reason)),
                Err(err) => Err(Failure::Fatal(err.into())),
            },
            None => Ok(self.cache.cached_versions(name)),
        }
    }

    /// The candidate's manifest, or `None` when this version is simply
    /// inadmissible (wrong compiler range).
    fn pkg_outline(
        &self,
        name: &PackageName,
        version: Version,
    ) -> Result<Option<gren_outline::PkgOutline>, Failure> {
        if !self.cache.is_cached(name, version) {
            let Some(registry) = self.registry else {
                return Ok(None);
            };
            match registry.populate(self.cache, name, version) {
                Ok(()) => {}
                Err(RegistryError::Unreachable(reason)) => {
                    return Err(Failure::Unreachable(reason));
                }
                Err(err) => return Err(Failure::Fatal(err.into())),
            }
        }

        match gren_outline::load(&self.cache.version_dir(name, version)) {
            Ok(Outline::Pkg(outline)) => Ok(Some(outline)),
            Ok(Outline::App(_)) => Err(Failure::Fatal(SolverError::BadCacheData {
                package: name.clone(),
                version,
                message: "expected a package manifest, found an application".to_string(),
            })),
            Err(OutlineError::CompilerVersionRejected { .. }) => Ok(None),
            Err(err) => Err(Failure::Fatal(SolverError::BadCacheData {
                package: name.clone(),
                version,
                message: err.to_string(),
            })),
        }
    }
}

/// Commit `name = version` and fold its constraints into the state.
/// `None` when the candidate conflicts with what is already chosen.
fn extend(
    state: &State,
    name: &PackageName,
    version: Version,
    deps: &BTreeMap<PackageName, Constraint>,
) -> Option<State> {
    let mut next = state.clone();
    for (dep, dep_constraint) in deps {
        if let Some(solved) = next.solved.get(dep) {
            if !dep_constraint.satisfies(solved.version) {
                return None;
            }
        } else if let Some(existing) = next.constraints.get(dep) {
            next.constraints
                .insert(dep.clone(), existing.intersect(*dep_constraint)?);
        } else {
            next.constraints.insert(dep.clone(), *dep_constraint);
            next.pending.push_back(dep.clone());
        }
    }
    next.solved.insert(
        name.clone(),
        Solved {
            version,
            constraints: deps.clone(),
        },
    );
    Some(next)
}
