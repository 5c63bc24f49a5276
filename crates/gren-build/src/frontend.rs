//! The seam to the external compiler.
//!
//! Parsing, type checking, optimization, and JavaScript generation are
//! black-box services; the build core hands them inputs with all visible
//! interfaces resolved and stores whatever they emit.

use gren_artifacts::{DependencyInterface, GlobalGraph, Interface, KernelChunks, LocalGraph, Main};
use gren_core::{CanonicalModule, PackageName, Raw};
use std::collections::BTreeMap;

/// How generated JavaScript should be shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Plain development output.
    Dev,
    /// Development output with the time-travelling debugger attached.
    Debug,
    /// Production output; erases the metadata `Debug` operations need.
    Optimize,
}

/// A module header as the crawler needs it: name, imports, `main` presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Declared module name; `None` when the header is missing (the module
    /// is then named after its file path).
    pub name: Option<Raw>,
    /// Imported module names, in source order.
    pub imports: Vec<Raw>,
    /// Does the module define a top-level `main`?
    pub has_main: bool,
}

/// Everything the external compiler needs to compile one module.
#[derive(Debug)]
pub struct CompileInput<'a> {
    /// The package the module belongs to.
    pub package: PackageName,
    /// The module's raw name.
    pub module: Raw,
    /// Full source text.
    pub source: &'a str,
    /// Interfaces of every import, local imports included (as `Public`).
    pub interfaces: &'a BTreeMap<Raw, DependencyInterface>,
}

/// What the external compiler emits for one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledModule {
    /// The module's public signature.
    pub interface: Interface,
    /// The module's optimized object graph.
    pub objects: LocalGraph,
}

/// The external compiler.
///
/// Implementations must be usable from many build tasks at once; all methods
/// take `&self`.
pub trait Frontend: Send + Sync + 'static {
    /// Extract the header of a source file without compiling it.
    ///
    /// Errors are forwarded verbatim as module diagnostics.
    fn parse_header(&self, source: &str) -> Result<Header, String>;

    /// Split a kernel JavaScript file into its imports and splice chunks.
    fn parse_kernel(&self, source: &[u8]) -> KernelChunks;

    /// Parse, type check, and optimize one module.
    ///
    /// A failed compile returns the diagnostics to show the user.
    fn compile(&self, input: &CompileInput<'_>) -> Result<CompiledModule, Vec<String>>;

    /// Generate JavaScript for a linked graph and its entry points.
    fn generate(&self, graph: &GlobalGraph, mains: &[(CanonicalModule, Main)], mode: Mode)
        -> String;
}
