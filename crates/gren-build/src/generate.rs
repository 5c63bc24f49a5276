//! Output assembly: linking compiled modules and emitting JavaScript.

use crate::details::ObjectStore;
use crate::error::GenerateError;
use crate::frontend::{Frontend, Mode};
use gren_artifacts::{GlobalGraph, GlobalName, Main};
use gren_core::{CanonicalModule, PackageName, Raw};
use std::path::PathBuf;
use tracing::info;

/// Where `make` sends its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// A self-contained HTML page; requires exactly one entry with `main`.
    Html(PathBuf),
    /// A JavaScript file; every entry must define `main`.
    Js(PathBuf),
    /// Type-check only; code generation is skipped entirely.
    DevNull,
    /// JavaScript on standard output.
    Stdout,
}

/// What `make` produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Output was written to this file.
    File(PathBuf),
    /// Generated JavaScript, for the host to print.
    Text(String),
    /// Nothing was generated (`/dev/null`).
    None,
}

/// Resolve the `--debug` / `--optimize` flags, rejecting the combination
/// before any compilation happens.
pub(crate) fn mode_from_flags(debug: bool, optimize: bool) -> Result<Mode, GenerateError> {
    match (debug, optimize) {
        (true, true) => Err(GenerateError::CannotOptimizeAndDebug),
        (true, false) => Ok(Mode::Debug),
        (false, true) => Ok(Mode::Optimize),
        (false, false) => Ok(Mode::Dev),
    }
}

/// Link the object stores and emit output for `roots`.
pub(crate) fn assemble(
    frontend: &dyn Frontend,
    home: &PackageName,
    objects: &ObjectStore,
    roots: &[Raw],
    target: &OutputTarget,
    mode: Mode,
) -> Result<Output, GenerateError> {
    if matches!(target, OutputTarget::DevNull) {
        return Ok(Output::None);
    }
    if matches!(target, OutputTarget::Html(_)) && roots.len() != 1 {
        return Err(GenerateError::MultipleFilesIntoHtml(roots.len()));
    }

    let mut linked = objects.deps.clone();
    for graph in objects.locals.values() {
        linked.add_local(graph.clone());
    }

    let mut mains: Vec<(CanonicalModule, Main)> = Vec::with_capacity(roots.len());
    for root in roots {
        let main = objects
            .locals
            .get(root)
            .and_then(|graph| graph.main)
            .ok_or_else(|| GenerateError::NoMain(root.clone()))?;
        mains.push((
            CanonicalModule {
                package: home.clone(),
                module: root.clone(),
            },
            main,
        ));
    }

    if mode == Mode::Optimize {
        let main_symbols: Vec<GlobalName> = mains
            .iter()
            .map(|(module, _)| GlobalName {
                home: module.clone(),
                name: "main".to_string(),
            })
            .collect();
        let offenders = linked.debug_users(main_symbols.iter());
        if !offenders.is_empty() {
            return Err(GenerateError::CannotOptimizeDebugValues {
                modules: offenders.into_iter().map(|module| module.module).collect(),
            });
        }
    }

    let javascript = frontend.generate(&linked, &mains, mode);
    info!(
        roots = roots.len(),
        bytes = javascript.len(),
        "output generated"
    );

    match target {
        OutputTarget::DevNull => Ok(Output::None),
        OutputTarget::Stdout => Ok(Output::Text(javascript)),
        OutputTarget::Js(path) => {
            write_output(path, javascript.as_bytes())?;
            Ok(Output::File(path.clone()))
        }
        OutputTarget::Html(path) => {
            let title = roots.first().map_or("Gren", |root| root.as_str());
            let page = html_wrap(title, &javascript);
            write_output(path, page.as_bytes())?;
            Ok(Output::File(path.clone()))
        }
    }
}

fn write_output(path: &std::path::Path, bytes: &[u8]) -> Result<(), GenerateError> {
    std::fs::write(path, bytes).map_err(|source| GenerateError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn html_wrap(title: &str, javascript: &str) -> String {
    format!(
        "<!DOCTYPE HTML>\n\
         <html>\n\
         <head>\n\
         <meta charset=\"UTF-8\">\n\
         <title>{title}</title>\n\
         </head>\n\
         <body>\n\
         <pre id=\"gren\"></pre>\n\
         <script>\n{javascript}\n\
         var app = Gren.{title}.init({{ node: document.getElementById(\"gren\") }});\n\
         </script>\n\
         </body>\n\
         </html>\n"
    )
}
