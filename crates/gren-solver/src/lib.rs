//! Dependency version resolution.
//!
//! Given a root platform and a set of constraints, the solver finds a
//! complete assignment of versions to every transitive dependency, trying
//! newest versions first. Package metadata comes from the local
//! [`PackageCache`](gren_cache::PackageCache) when present and from the
//! [`Registry`] otherwise; when the registry is unreachable the same search
//! reruns against the cache alone.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod registry;
mod solver;

pub use error::{Result, SolverError};
pub use registry::{Registry, RegistryError};
pub use solver::{verify_app, verify_pkg, Outcome, Solution, Solved};
