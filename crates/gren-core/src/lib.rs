//! Core types for the Gren build core.
//!
//! This crate provides the identifiers and version algebra shared by every
//! other crate in the workspace:
//! - Package names with Gren's naming rules
//! - Three-component versions and half-open version constraints
//! - Target platforms and their compatibility rule
//! - Raw and canonical module names

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod module;
mod name;
mod platform;
mod version;

pub use module::{CanonicalModule, ModuleNameError, Raw, KERNEL_PREFIX};
pub use name::{PackageName, PackageNameError};
pub use platform::Platform;
pub use version::{Constraint, ConstraintError, Version, VersionError};

/// The version of the compiler this build core belongs to.
///
/// Outlines that declare a different `gren-version` (applications) or a
/// constraint that rejects this version (packages) fail validation, and any
/// cached artifacts written by another compiler version are rebuilt rather
/// than trusted.
pub const COMPILER_VERSION: Version = Version::new(0, 5, 2);
