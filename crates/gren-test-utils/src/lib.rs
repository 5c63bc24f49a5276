//! Shared fixtures and fake collaborators for integration tests.
//!
//! The build core treats the compiler frontend and the registry transport
//! as black boxes; the fakes here are small deterministic stand-ins:
//! [`FakeFrontend`] "compiles" a toy module syntax well enough to exercise
//! interfaces, object graphs, and staleness, and [`FakeRegistry`] serves
//! packages from memory with a switchable "unreachable" mode.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod fake_frontend;
mod fake_registry;
mod fixtures;
mod temp_project;

pub use fake_frontend::FakeFrontend;
pub use fake_registry::FakeRegistry;
pub use fixtures::{app_outline, pkg_outline, publish_std, TestWorld};
pub use temp_project::TempProject;

/// Route `tracing` output to the test's captured stderr.
///
/// Call at the top of a test and run with `RUST_LOG=debug` to watch the
/// build phases while debugging a failure. Safe to call repeatedly.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
