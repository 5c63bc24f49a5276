//! Outline errors with snippet regions.

use gren_core::{Constraint, PackageName, Version};
use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias for outline operations.
pub type Result<T> = std::result::Result<T, OutlineError>;

/// A one-based (row, column) position in the raw manifest bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// One-based line.
    pub row: u32,
    /// One-based column.
    pub col: u32,
}

impl Region {
    /// Compute the region of a byte offset within `src`.
    #[must_use]
    pub fn at_offset(src: &str, offset: usize) -> Self {
        let offset = offset.min(src.len());
        let before = &src.as_bytes()[..offset];
        let row = before.iter().filter(|b| **b == b'\n').count() as u32 + 1;
        let col = before
            .iter()
            .rev()
            .take_while(|b| **b != b'\n')
            .count() as u32
            + 1;
        Self { row, col }
    }

    /// Locate the first occurrence of the quoted member name `field` in `src`.
    #[must_use]
    pub fn of_member(src: &str, field: &str) -> Option<Self> {
        let needle = format!("\"{field}\"");
        src.find(&needle).map(|offset| Self::at_offset(src, offset))
    }
}

/// Everything that can go wrong reading or validating `gren.json`.
#[derive(Error, Debug)]
pub enum OutlineError {
    /// The manifest file could not be read.
    #[error("could not read {path}: {source}")]
    Read {
        /// Manifest path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The bytes are not valid JSON.
    #[error("invalid JSON at {}:{}: {message}", region.row, region.col)]
    Syntax {
        /// Where the parser stopped.
        region: Region,
        /// Parser message.
        message: String,
    },

    /// A required member is absent.
    #[error("missing required field `{field}`")]
    MissingField {
        /// Dot-notation member name.
        field: &'static str,
    },

    /// The `"type"` member is neither `application` nor `package`.
    #[error("`type` must be \"application\" or \"package\", found {found:?}")]
    BadType {
        /// What the manifest said.
        found: String,
        /// Member region when locatable.
        region: Option<Region>,
    },

    /// A member holds a malformed value.
    #[error("invalid `{field}`: {message}")]
    BadFieldValue {
        /// Dot-notation member name.
        field: String,
        /// What is wrong with it.
        message: String,
        /// Member region when locatable.
        region: Option<Region>,
    },

    /// An application declared no source directories.
    #[error("`source-directories` must list at least one directory")]
    NoSourceDirectories,

    /// The same directory is listed twice.
    #[error("`source-directories` lists `{0}` more than once")]
    DuplicateSourceDirectory(String),

    /// A package appears in both direct and indirect dependencies.
    #[error("`{0}` appears in both direct and indirect dependencies")]
    DependencyListedTwice(PackageName),

    /// A package declared no exposed modules.
    #[error("`exposed-modules` must expose at least one module")]
    NoExposedModules,

    /// An exposed-module header broke the length rules.
    #[error("exposed-modules header {0:?} must be 1 to 20 bytes")]
    BadExposedHeader(String),

    /// The same module is exposed twice.
    #[error("module `{0}` is exposed more than once")]
    DuplicateExposedModule(String),

    /// The package summary is 80 bytes or more.
    #[error("`summary` must be under 80 bytes, found {0}")]
    SummaryTooLong(usize),

    /// The license is not a known SPDX identifier.
    #[error("`license` must be an OSI-approved SPDX identifier, found {0:?}")]
    BadLicense(String),

    /// An application pins a different compiler version.
    #[error(
        "this application requires gren {found}, but you are running {}",
        gren_core::COMPILER_VERSION
    )]
    CompilerVersionMismatch {
        /// Declared `gren-version`.
        found: Version,
    },

    /// A package's `gren-version` range rejects the running compiler.
    #[error(
        "this package allows gren {constraint}, but you are running {}",
        gren_core::COMPILER_VERSION
    )]
    CompilerVersionRejected {
        /// Declared `gren-version` range.
        constraint: Constraint,
    },
}
