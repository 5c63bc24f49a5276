//! Resolving the import graph of a source tree.
//!
//! Starting from the entry modules (or every exposed module of a package),
//! each import resolves to exactly one of: a local source file, a foreign
//! module from the dependency solution, or a kernel JavaScript file in a
//! privileged package. The result is a status per module, ready for the
//! compile phase; structural problems (missing imports, ambiguity, cycles)
//! are caught here before any compilation starts.

use crate::details::Foreign;
use crate::error::BuildError;
use crate::frontend::Frontend;
use gren_artifacts::KernelChunks;
use gren_cache::modification_time;
use gren_core::Raw;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::debug;

/// What one crawled module turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Status {
    /// A source file in one of the project's source directories.
    Local {
        /// The file.
        path: PathBuf,
        /// Its modification time (epoch millis) when crawled.
        time: u64,
        /// Full source text, handed to the compile phase.
        source: String,
        /// Imports in source order.
        imports: Vec<Raw>,
        /// Does the header declare a `main`?
        has_main: bool,
    },
    /// Exposed by a dependency package.
    Foreign,
    /// A kernel JavaScript file in this (privileged) package.
    KernelLocal {
        /// Parsed imports and splice chunks.
        chunks: KernelChunks,
    },
    /// A kernel module shipped by a privileged dependency.
    KernelForeign,
}

/// An entry file mapped to the module it defines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Root {
    /// The entry file as given.
    pub path: PathBuf,
    /// The module name its location implies.
    pub module: Raw,
}

/// Whether crawl roots came from `make` arguments or `exposed-modules`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RootKind {
    /// Entry files on the command line; already located on disk.
    Paths,
    /// A package's exposed modules; a missing one is [`BuildError::MissingExposed`].
    Exposed,
}

/// Everything the crawler needs to resolve names.
pub(crate) struct CrawlEnv<'a> {
    pub frontend: &'a dyn Frontend,
    pub source_dirs: Vec<PathBuf>,
    pub foreigns: &'a BTreeMap<Raw, Foreign>,
    pub foreign_kernels: &'a BTreeSet<Raw>,
    pub kernel_privileged: bool,
}

/// Map entry paths to the modules they define.
pub(crate) fn find_roots(
    source_dirs: &[PathBuf],
    entry_paths: &[PathBuf],
) -> Result<Vec<Root>, BuildError> {
    let mut seen_paths = BTreeSet::new();
    let mut seen_modules: BTreeMap<Raw, PathBuf> = BTreeMap::new();
    let mut roots = Vec::with_capacity(entry_paths.len());

    for path in entry_paths {
        if !path.is_file() {
            return Err(BuildError::UnknownPath(path.clone()));
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some("gren") {
            return Err(BuildError::BadExtension(path.clone()));
        }
        if !seen_paths.insert(path.clone()) {
            return Err(BuildError::DuplicateEntryPath(path.clone()));
        }

        let module = module_name_of(source_dirs, path)?;
        if let Some(previous) = seen_modules.get(&module) {
            return Err(BuildError::AmbiguousLocal {
                module,
                paths: vec![previous.clone(), path.clone()],
            });
        }
        seen_modules.insert(module.clone(), path.clone());
        roots.push(Root {
            path: path.clone(),
            module,
        });
    }
    Ok(roots)
}

fn module_name_of(source_dirs: &[PathBuf], path: &Path) -> Result<Raw, BuildError> {
    for dir in source_dirs {
        let Ok(rel) = path.strip_prefix(dir) else {
            continue;
        };
        let mut dotted = rel
            .with_extension("")
            .components()
            .map(|part| part.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(".");
        if dotted.is_empty() {
            dotted = rel.to_string_lossy().into_owned();
        }
        return dotted.parse().map_err(|_| BuildError::BadModulePath {
            path: path.to_path_buf(),
        });
    }
    Err(BuildError::NotInSourceDirs {
        path: path.to_path_buf(),
    })
}

/// Resolve every module reachable from `roots`.
pub(crate) fn crawl(
    env: &CrawlEnv<'_>,
    roots: &[Raw],
    root_kind: RootKind,
) -> Result<BTreeMap<Raw, Status>, BuildError> {
    let mut statuses: BTreeMap<Raw, Status> = BTreeMap::new();
    let mut diagnostics: BTreeMap<Raw, Vec<String>> = BTreeMap::new();
    let mut queue: VecDeque<(Option<Raw>, Raw)> =
        roots.iter().map(|root| (None, root.clone())).collect();

    while let Some((importer, name)) = queue.pop_front() {
        if statuses.contains_key(&name) || diagnostics.contains_key(&name) {
            continue;
        }

        let status = resolve(env, importer.as_ref(), &name, root_kind, &mut diagnostics)?;
        let Some(status) = status else {
            continue;
        };
        let imports: Vec<Raw> = match &status {
            Status::Local { imports, .. } => imports.clone(),
            Status::KernelLocal { chunks } => chunks.imports.clone(),
            Status::Foreign | Status::KernelForeign => Vec::new(),
        };
        for import in imports {
            queue.push_back((Some(name.clone()), import));
        }
        statuses.insert(name, status);
    }

    if !diagnostics.is_empty() {
        return Err(BuildError::ModuleProblems { diagnostics });
    }
    debug!(modules = statuses.len(), "crawl complete");
    Ok(statuses)
}

/// Resolve one name. `Ok(None)` means the module's header had problems that
/// were recorded as diagnostics; the crawl keeps going to surface more.
fn resolve(
    env: &CrawlEnv<'_>,
    importer: Option<&Raw>,
    name: &Raw,
    root_kind: RootKind,
    diagnostics: &mut BTreeMap<Raw, Vec<String>>,
) -> Result<Option<Status>, BuildError> {
    if name.is_kernel() {
        return resolve_kernel(env, importer, name).map(Some);
    }

    let candidates = locate(&env.source_dirs, name, "gren");
    match candidates.len() {
        0 => {}
        1 => return read_local(env, name, candidates.into_iter().next().unwrap(), diagnostics),
        _ => {
            return Err(BuildError::AmbiguousLocal {
                module: name.clone(),
                paths: candidates,
            });
        }
    }

    match env.foreigns.get(name) {
        Some(foreign) if foreign.others.is_empty() => Ok(Some(Status::Foreign)),
        Some(foreign) => Err(BuildError::AmbiguousImport {
            importer: importer.cloned().unwrap_or_else(|| name.clone()),
            name: name.clone(),
            candidates: std::iter::once(foreign.owner.clone())
                .chain(foreign.others.iter().cloned())
                .collect(),
        }),
        None => Err(missing(importer, name, root_kind)),
    }
}

fn resolve_kernel(
    env: &CrawlEnv<'_>,
    importer: Option<&Raw>,
    name: &Raw,
) -> Result<Status, BuildError> {
    if !env.kernel_privileged {
        return Err(missing(importer, name, RootKind::Paths));
    }
    if let Some(path) = locate(&env.source_dirs, name, "js").into_iter().next() {
        let source = std::fs::read(&path).map_err(|_| BuildError::UnknownPath(path))?;
        return Ok(Status::KernelLocal {
            chunks: env.frontend.parse_kernel(&source),
        });
    }
    if env.foreign_kernels.contains(name) {
        return Ok(Status::KernelForeign);
    }
    Err(missing(importer, name, RootKind::Paths))
}

fn read_local(
    env: &CrawlEnv<'_>,
    name: &Raw,
    path: PathBuf,
    diagnostics: &mut BTreeMap<Raw, Vec<String>>,
) -> Result<Option<Status>, BuildError> {
    let source = std::fs::read_to_string(&path)
        .map_err(|_| BuildError::UnknownPath(path.clone()))?;
    let time = modification_time(&path).map_err(|_| BuildError::UnknownPath(path.clone()))?;

    let header = match env.frontend.parse_header(&source) {
        Ok(header) => header,
        Err(problem) => {
            diagnostics.insert(name.clone(), vec![problem]);
            return Ok(None);
        }
    };
    if let Some(declared) = &header.name {
        if declared != name {
            return Err(BuildError::NameMismatch {
                path,
                expected: name.clone(),
                found: declared.clone(),
            });
        }
    }

    Ok(Some(Status::Local {
        path,
        time,
        source,
        imports: header.imports,
        has_main: header.has_main,
    }))
}

fn missing(importer: Option<&Raw>, name: &Raw, root_kind: RootKind) -> BuildError {
    match (importer, root_kind) {
        (None, RootKind::Exposed) => BuildError::MissingExposed(name.clone()),
        (importer, _) => BuildError::ImportNotFound {
            importer: importer.cloned().unwrap_or_else(|| name.clone()),
            name: name.clone(),
        },
    }
}

fn locate(source_dirs: &[PathBuf], name: &Raw, extension: &str) -> Vec<PathBuf> {
    source_dirs
        .iter()
        .map(|dir| dir.join(name.to_rel_path(extension)))
        .filter(|path| path.is_file())
        .collect()
}

/// Reject import cycles among local modules, reporting one cycle in order.
pub(crate) fn check_cycles(statuses: &BTreeMap<Raw, Status>) -> Result<(), BuildError> {
    let mut graph: DiGraph<Raw, ()> = DiGraph::new();
    let mut indices: BTreeMap<Raw, NodeIndex> = BTreeMap::new();
    for name in statuses.keys() {
        indices.insert(name.clone(), graph.add_node(name.clone()));
    }
    for (name, status) in statuses {
        let Status::Local { imports, .. } = status else {
            continue;
        };
        for import in imports {
            if let Some(to) = indices.get(import) {
                graph.add_edge(indices[name], *to, ());
            }
        }
    }

    let mut cyclic: Vec<BTreeSet<Raw>> = Vec::new();
    for scc in petgraph::algo::tarjan_scc(&graph) {
        let is_cycle = scc.len() > 1
            || scc
                .first()
                .is_some_and(|node| graph.contains_edge(*node, *node));
        if is_cycle {
            cyclic.push(scc.into_iter().map(|node| graph[node].clone()).collect());
        }
    }

    let Some(scc) = cyclic
        .into_iter()
        .min_by(|a, b| a.iter().next().cmp(&b.iter().next()))
    else {
        return Ok(());
    };
    Err(BuildError::ImportCycle {
        cycle: order_cycle(statuses, &scc),
    })
}

/// Walk the cycle starting from its smallest member, following imports.
fn order_cycle(statuses: &BTreeMap<Raw, Status>, scc: &BTreeSet<Raw>) -> Vec<Raw> {
    let start = scc.iter().next().expect("cycles are never empty").clone();
    let mut cycle = vec![start.clone()];
    let mut current = start;
    loop {
        let Status::Local { imports, .. } = &statuses[&current] else {
            break;
        };
        let next = imports
            .iter()
            .find(|import| scc.contains(*import) && !cycle.contains(*import));
        match next {
            Some(next) => {
                cycle.push(next.clone());
                current = next.clone();
            }
            None => break,
        }
    }
    cycle
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str) -> Raw {
        name.parse().unwrap()
    }

    fn local(imports: &[&str]) -> Status {
        Status::Local {
            path: PathBuf::from("src/X.gren"),
            time: 0,
            source: String::new(),
            imports: imports.iter().map(|name| raw(name)).collect(),
            has_main: false,
        }
    }

    #[test]
    fn two_module_cycle_is_reported_in_order() {
        let statuses = BTreeMap::from([
            (raw("A"), local(&["B"])),
            (raw("B"), local(&["A"])),
        ]);
        let Err(BuildError::ImportCycle { cycle }) = check_cycles(&statuses) else {
            panic!("expected a cycle");
        };
        assert_eq!(cycle, vec![raw("A"), raw("B")]);
    }

    #[test]
    fn self_import_is_a_cycle() {
        let statuses = BTreeMap::from([(raw("A"), local(&["A"]))]);
        assert!(matches!(
            check_cycles(&statuses),
            Err(BuildError::ImportCycle { .. })
        ));
    }

    #[test]
    fn diamonds_are_not_cycles() {
        let statuses = BTreeMap::from([
            (raw("A"), local(&["B", "C"])),
            (raw("B"), local(&["D"])),
            (raw("C"), local(&["D"])),
            (raw("D"), local(&[])),
        ]);
        assert!(check_cycles(&statuses).is_ok());
    }

    #[test]
    fn roots_map_paths_to_module_names() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(src.join("Page")).unwrap();
        std::fs::write(src.join("Main.gren"), "module Main exposing (..)").unwrap();
        std::fs::write(src.join("Page/Home.gren"), "module Page.Home exposing (..)").unwrap();

        let roots = find_roots(
            &[src.clone()],
            &[src.join("Main.gren"), src.join("Page/Home.gren")],
        )
        .unwrap();
        assert_eq!(roots[0].module, raw("Main"));
        assert_eq!(roots[1].module, raw("Page.Home"));
    }

    #[test]
    fn root_validation_errors() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("Main.gren"), "").unwrap();
        std::fs::write(src.join("notes.txt"), "").unwrap();

        assert!(matches!(
            find_roots(&[src.clone()], &[src.join("Missing.gren")]),
            Err(BuildError::UnknownPath(_))
        ));
        assert!(matches!(
            find_roots(&[src.clone()], &[src.join("notes.txt")]),
            Err(BuildError::BadExtension(_))
        ));
        assert!(matches!(
            find_roots(&[src.clone()], &[src.join("Main.gren"), src.join("Main.gren")]),
            Err(BuildError::DuplicateEntryPath(_))
        ));
        assert!(matches!(
            find_roots(&[dir.path().join("other")], &[src.join("Main.gren")]),
            Err(BuildError::NotInSourceDirs { .. })
        ));
    }
}
