//! The error taxonomy surfaced at the command boundary.

use gren_artifacts::Fingerprint;
use gren_core::{PackageName, Raw, Version};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while assembling `Details` (solving and package builds).
#[derive(Error, Debug)]
pub enum DetailsError {
    /// The outline would not load or validate.
    #[error(transparent)]
    Outline(#[from] gren_outline::OutlineError),

    /// The package cache or `.gren/` could not be touched.
    #[error(transparent)]
    Cache(#[from] gren_cache::CacheError),

    /// The solver itself failed.
    #[error(transparent)]
    Solver(#[from] gren_solver::SolverError),

    /// The constraints admit no assignment.
    #[error("no version assignment satisfies the dependency constraints")]
    NoSolution,

    /// The registry was unreachable and the local cache has no assignment.
    #[error("the registry is unreachable and the local package cache cannot satisfy the constraints")]
    NoOfflineSolution,

    /// An application outline's dependency lists do not cover the solution.
    ///
    /// Happens when `dependencies` was edited by hand: the solver needs
    /// `pkg` but neither the direct nor the indirect list pins it.
    #[error("dependencies look hand-edited: {package} is required but not listed")]
    HandEditedDependencies {
        /// The package missing from the outline.
        package: PackageName,
    },

    /// One dependency package failed to build.
    #[error("failed to build {package} {version}")]
    PackageBuildFailed {
        /// Package that failed.
        package: PackageName,
        /// Version that failed.
        version: Version,
        /// Direct-dependency versions it was being built against.
        fingerprint: Fingerprint,
        /// What went wrong inside the package.
        reason: String,
    },
}

/// Failures while crawling and compiling the user's own modules.
#[derive(Error, Debug)]
pub enum BuildError {
    /// An entry path handed to `make` does not exist.
    #[error("could not find {0}")]
    UnknownPath(PathBuf),

    /// An entry path is not a `.gren` file.
    #[error("{0} is not a .gren file")]
    BadExtension(PathBuf),

    /// The same entry path was given twice.
    #[error("{0} is listed more than once")]
    DuplicateEntryPath(PathBuf),

    /// An entry path is outside every source directory.
    #[error("{path} is not under any source directory")]
    NotInSourceDirs {
        /// The stray path.
        path: PathBuf,
    },

    /// An entry path does not spell a legal module name.
    #[error("{path} does not correspond to a valid module name")]
    BadModulePath {
        /// The offending path.
        path: PathBuf,
    },

    /// `make` was invoked on an application with no entry files.
    #[error("no entry files given; tell me which .gren file to build")]
    NoEntryPoints,

    /// A module exists in more than one source directory.
    #[error("module `{module}` was found in more than one source directory")]
    AmbiguousLocal {
        /// The doubled module.
        module: Raw,
        /// Every file claiming the name.
        paths: Vec<PathBuf>,
    },

    /// A module's declared name disagrees with its file path.
    #[error("{path} declares module `{found}`, but its path requires `{expected}`")]
    NameMismatch {
        /// The file.
        path: PathBuf,
        /// Name the path implies.
        expected: Raw,
        /// Name the header declares.
        found: Raw,
    },

    /// An import matched nothing: not local, not foreign, not kernel.
    #[error("`{importer}` imports `{name}`, which cannot be found")]
    ImportNotFound {
        /// The importing module.
        importer: Raw,
        /// The missing import.
        name: Raw,
    },

    /// An import matched exposed modules in several packages.
    #[error("`{importer}` imports `{name}`, which is exposed by multiple packages")]
    AmbiguousImport {
        /// The importing module.
        importer: Raw,
        /// The ambiguous name.
        name: Raw,
        /// Every package exposing it.
        candidates: Vec<PackageName>,
    },

    /// Imports form a cycle, printed in order.
    #[error("import cycle: {}", cycle.iter().map(ToString::to_string).collect::<Vec<_>>().join(" -> "))]
    ImportCycle {
        /// The modules on the cycle, starting from the smallest name.
        cycle: Vec<Raw>,
    },

    /// A package build references a module it never exposes.
    #[error("`{0}` is listed in exposed-modules but has no source file")]
    MissingExposed(Raw),

    /// The external compiler rejected one or more modules.
    #[error("{} module(s) failed to compile", diagnostics.len())]
    ModuleProblems {
        /// Per-module diagnostics, in module-name order.
        diagnostics: BTreeMap<Raw, Vec<String>>,
    },
}

/// Failures while producing output from successfully compiled modules.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// A `.gren/` store would not decode; deleting `.gren/` recovers.
    #[error(
        "the cache at {path} is corrupt ({source}); delete the .gren directory and rebuild"
    )]
    CorruptCache {
        /// The unreadable store.
        path: PathBuf,
        /// Decode failure.
        #[source]
        source: gren_artifacts::CodecError,
    },

    /// `--optimize` and `--debug` together.
    #[error("--optimize and --debug cannot be used at the same time")]
    CannotOptimizeAndDebug,

    /// `--optimize` with `Debug` usage reachable from the entry points.
    #[error("cannot --optimize with Debug values in: {}", modules.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    CannotOptimizeDebugValues {
        /// Modules whose code reaches `Debug`.
        modules: Vec<Raw>,
    },

    /// HTML output needs exactly one entry module.
    #[error("HTML output takes exactly one input file, found {0}")]
    MultipleFilesIntoHtml(usize),

    /// An entry module has no `main` to link.
    #[error("`{0}` has no `main` to build")]
    NoMain(Raw),

    /// The output file could not be written.
    #[error("could not write {path}: {source}")]
    Write {
        /// Output path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Any failure of a command, ready for rendering.
#[derive(Error, Debug)]
pub enum Problem {
    /// Outline reading or validation.
    #[error(transparent)]
    Outline(#[from] gren_outline::OutlineError),

    /// Cache directory operations.
    #[error(transparent)]
    Cache(#[from] gren_cache::CacheError),

    /// Dependency solving and package builds.
    #[error(transparent)]
    Details(#[from] DetailsError),

    /// Crawling and compiling user modules.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Output assembly.
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

impl From<gren_solver::SolverError> for Problem {
    fn from(err: gren_solver::SolverError) -> Self {
        Self::Details(DetailsError::Solver(err))
    }
}
