//! Project building and incremental compilation.
//!
//! This crate is the coordination layer of the build core. Given a project
//! root it:
//!
//! 1. loads and validates the outline (`gren.json`)
//! 2. solves dependency versions and builds per-package artifact caches,
//!    concurrently across packages
//! 3. crawls the user's source tree, decides which modules are stale, and
//!    compiles them concurrently
//! 4. links the result and assembles output
//!
//! The parser, type checker, optimizer, and code generator are external
//! collaborators reached through the [`Frontend`] trait; the registry
//! transport is reached through [`gren_solver::Registry`]. The host CLI
//! calls the drivers in [`ops`].

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod compile;
mod crawl;
mod details;
mod error;
mod frontend;
mod generate;
pub mod ops;
mod report;
mod writeback;

pub use details::{
    load as load_details, verify_install, Details, Env, Extras, Foreign, ForeignInterface, Local,
    ValidOutline, APP_PACKAGE,
};
pub use error::{BuildError, DetailsError, GenerateError, Problem};
pub use frontend::{CompileInput, CompiledModule, Frontend, Header, Mode};
pub use generate::{Output, OutputTarget};
pub use report::{render_human, render_json, Report};
pub use writeback::Writeback;
