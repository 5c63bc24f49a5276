//! Reading and validating `gren.json` project manifests.
//!
//! A manifest decodes in two phases: a structural pass into
//! [`serde_json::Value`], then field-by-field validation that produces
//! itemized [`OutlineError`]s, each carrying a [`Region`] suitable for
//! snippet rendering where one can be located in the raw bytes.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod license;
mod loader;
mod types;
mod write;

pub use error::{OutlineError, Region, Result};
pub use license::is_known_license;
pub use loader::{decode, load};
pub use types::{AppOutline, Exposed, Outline, PkgOutline};
pub use write::encode;

/// The manifest file name at a project or package root.
pub const OUTLINE_FILE: &str = "gren.json";
