//! Command drivers for the host CLI.
//!
//! These functions carry the command-observable semantics of `make`,
//! `install`, and `init`; argument parsing and terminal concerns stay in
//! the host binary.

use crate::compile;
use crate::crawl::{self, CrawlEnv, RootKind};
use crate::details::{
    self, is_kernel_privileged, Details, Env, Extras, ForeignInterface, InterfaceStore,
    ObjectStore, ValidOutline,
};
use crate::error::{BuildError, GenerateError, Problem};
use crate::generate::{self, Output, OutputTarget};
use crate::report::Report;
use crate::writeback::Writeback;
use gren_artifacts::{from_bytes, to_bytes, Decode, GlobalGraph, Interface, LocalGraph};
use gren_cache::{read_binary, ProjectPaths};
use gren_core::{
    Constraint, PackageName, Platform, Raw, Version, COMPILER_VERSION,
};
use gren_outline::{AppOutline, Exposed, Outline, PkgOutline};
use gren_solver::{verify_pkg, Outcome};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Flags of one `make` invocation.
#[derive(Debug, Clone, Default)]
pub struct Flags {
    /// `--debug`
    pub debug: bool,
    /// `--optimize`
    pub optimize: bool,
    /// `--output=PATH`; `None` picks the default for the project kind.
    pub output: Option<OutputTarget>,
    /// `--report`
    pub report: Report,
}

/// Compile entry files (or a whole package) and assemble output.
pub async fn make(
    env: &Env,
    paths: &ProjectPaths,
    entry_paths: &[PathBuf],
    flags: &Flags,
) -> Result<Output, Problem> {
    let writeback = Writeback::spawn();
    let result = make_inner(env, paths, entry_paths, flags, &writeback).await;
    writeback.flush().await;
    result
}

async fn make_inner(
    env: &Env,
    paths: &ProjectPaths,
    entry_paths: &[PathBuf],
    flags: &Flags,
    writeback: &Writeback,
) -> Result<Output, Problem> {
    // Flag clashes are rejected before anything is read or compiled.
    let mode = generate::mode_from_flags(flags.debug, flags.optimize).map_err(Problem::Generate)?;

    let details = details::load(env, paths, writeback).await?;
    let home = details.outline.home();
    let source_dirs = details.outline.source_dirs(paths.root());

    let (root_modules, root_kind) = match (&details.outline, entry_paths.is_empty()) {
        (ValidOutline::Pkg { exposed, .. }, true) => (exposed.clone(), RootKind::Exposed),
        (ValidOutline::App { .. }, true) => return Err(BuildError::NoEntryPoints.into()),
        (_, false) => {
            let roots = crawl::find_roots(&source_dirs, entry_paths)?;
            (
                roots.into_iter().map(|root| root.module).collect(),
                RootKind::Paths,
            )
        }
    };

    let (foreign_ifaces, cached_local_ifaces, dep_objects, old_local_graphs) =
        load_stores(paths, &details)?;

    let foreign_kernels: BTreeSet<Raw> = dep_objects.kernels.keys().cloned().collect();
    let kernel_privileged = matches!(
        &details.outline,
        ValidOutline::Pkg { name, .. } if is_kernel_privileged(name)
    );

    let crawl_env = CrawlEnv {
        frontend: env.frontend.as_ref(),
        source_dirs,
        foreigns: &details.foreigns,
        foreign_kernels: &foreign_kernels,
        kernel_privileged,
    };
    let statuses = crawl::crawl(&crawl_env, &root_modules, root_kind)?;
    crawl::check_cycles(&statuses)?;

    let built = compile::compile_user(
        env,
        home.clone(),
        details.build_id,
        statuses,
        details.locals.clone(),
        cached_local_ifaces.clone(),
        foreign_ifaces.clone(),
    )
    .await?;

    // Records and artifacts of modules outside this closure are kept, so
    // other entry points of the project stay incremental.
    let mut locals = details.locals.clone();
    locals.extend(built.locals);
    let mut iface_locals = cached_local_ifaces;
    iface_locals.extend(built.interfaces);
    let mut local_graphs = old_local_graphs;
    local_graphs.extend(built.fresh_graphs);

    let object_store = ObjectStore {
        deps: dep_objects,
        locals: local_graphs,
    };

    paths.prepare().map_err(Problem::Cache)?;
    let mut persisted = details;
    persisted.locals = locals;
    persisted.extras = Extras::Cached;
    writeback.queue(paths.details_path(), to_bytes(&persisted));
    writeback.queue(
        paths.interfaces_path(),
        to_bytes(&InterfaceStore {
            foreign: foreign_ifaces.as_ref().clone(),
            locals: iface_locals,
        }),
    );
    writeback.queue(paths.objects_path(), to_bytes(&object_store));

    let target = flags
        .output
        .clone()
        .unwrap_or_else(|| default_target(&persisted.outline));
    generate::assemble(
        env.frontend.as_ref(),
        &home,
        &object_store,
        &root_modules,
        &target,
        mode,
    )
    .map_err(Problem::Generate)
}

fn default_target(outline: &ValidOutline) -> OutputTarget {
    match outline {
        ValidOutline::App { .. } => OutputTarget::Html(PathBuf::from("index.html")),
        ValidOutline::Pkg { .. } => OutputTarget::DevNull,
    }
}

type Stores = (
    Arc<BTreeMap<Raw, ForeignInterface>>,
    BTreeMap<Raw, Interface>,
    GlobalGraph,
    BTreeMap<Raw, LocalGraph>,
);

fn load_stores(paths: &ProjectPaths, details: &Details) -> Result<Stores, Problem> {
    match &details.extras {
        Extras::Fresh {
            interfaces,
            objects,
        } => Ok((
            interfaces.clone(),
            BTreeMap::new(),
            objects.as_ref().clone(),
            BTreeMap::new(),
        )),
        Extras::Cached => {
            let interfaces: InterfaceStore = read_store(&paths.interfaces_path())?;
            let objects: ObjectStore = read_store(&paths.objects_path())?;
            Ok((
                Arc::new(interfaces.foreign),
                interfaces.locals,
                objects.deps,
                objects.locals,
            ))
        }
    }
}

fn read_store<T: Decode>(path: &Path) -> Result<T, Problem> {
    let bytes = read_binary(path).map_err(Problem::Cache)?;
    from_bytes(&bytes).map_err(|source| {
        Problem::Generate(GenerateError::CorruptCache {
            path: path.to_path_buf(),
            source,
        })
    })
}

/// Add `package` to the project's dependencies (or verify them all when no
/// package is given), validating that the new set builds before committing
/// the rewritten outline.
pub async fn install(
    env: &Env,
    paths: &ProjectPaths,
    package: Option<PackageName>,
) -> Result<(), Problem> {
    let outline = gren_outline::load(paths.root())?;
    let Some(package) = package else {
        return details::verify_install(env, paths, &outline).await;
    };

    let Some(planned) = plan_install(env, &outline, &package)? else {
        info!(%package, "already installed");
        return Ok(());
    };
    details::verify_install(env, paths, &planned).await?;

    let path = paths.outline_path();
    std::fs::write(&path, gren_outline::encode(&planned))
        .map_err(|source| Problem::Cache(gren_cache::CacheError::Io { path, source }))?;
    info!(%package, "installed");
    Ok(())
}

/// Solve with the new package admitted, returning the rewritten outline.
/// `None` when the package is already a direct dependency.
fn plan_install(
    env: &Env,
    outline: &Outline,
    package: &PackageName,
) -> Result<Option<Outline>, Problem> {
    let registry = env.registry.as_deref();
    match outline {
        Outline::App(app) => {
            if app.deps_direct.contains_key(package) {
                return Ok(None);
            }
            let mut constraints: BTreeMap<PackageName, Constraint> = app
                .all_deps()
                .into_iter()
                .map(|(name, version)| (name, Constraint::exactly(version)))
                .collect();
            constraints.insert(package.clone(), Constraint::anything());

            let solution = match verify_pkg(&env.cache, registry, app.platform, &constraints)? {
                Outcome::Ok(solution) => solution,
                Outcome::NoSolution => {
                    return Err(crate::error::DetailsError::NoSolution.into());
                }
                Outcome::NoOfflineSolution => {
                    return Err(crate::error::DetailsError::NoOfflineSolution.into());
                }
            };

            let mut planned = app.clone();
            planned
                .deps_direct
                .insert(package.clone(), solution[package].version);
            planned.deps_indirect = solution
                .iter()
                .filter(|(name, _)| !planned.deps_direct.contains_key(*name))
                .map(|(name, solved)| (name.clone(), solved.version))
                .collect();
            Ok(Some(Outline::App(planned)))
        }
        Outline::Pkg(pkg) => {
            if pkg.deps.contains_key(package) {
                return Ok(None);
            }
            let mut constraints = pkg.deps.clone();
            constraints.insert(package.clone(), Constraint::anything());

            let solution = match verify_pkg(&env.cache, registry, pkg.platform, &constraints)? {
                Outcome::Ok(solution) => solution,
                Outcome::NoSolution => {
                    return Err(crate::error::DetailsError::NoSolution.into());
                }
                Outcome::NoOfflineSolution => {
                    return Err(crate::error::DetailsError::NoOfflineSolution.into());
                }
            };

            let mut planned = pkg.clone();
            planned.deps.insert(
                package.clone(),
                Constraint::until_next_major(solution[package].version),
            );
            Ok(Some(Outline::Pkg(planned)))
        }
    }
}

/// Write a starter `gren.json` (and `src/`) at the project root.
pub fn init(paths: &ProjectPaths, platform: Platform, package: bool) -> Result<(), Problem> {
    let outline_path = paths.outline_path();
    if outline_path.exists() {
        return Err(Problem::Cache(gren_cache::CacheError::Io {
            path: outline_path,
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "gren.json already exists",
            ),
        }));
    }

    let outline = if package {
        Outline::Pkg(PkgOutline {
            name: "author/project".parse().expect("placeholder name is valid"),
            summary: "A helpful summary of what this package is for".to_string(),
            license: "BSD-3-Clause".to_string(),
            version: Version::ONE,
            platform,
            exposed: Exposed::Flat(vec!["Main".parse().expect("static module name")]),
            gren_version: Constraint::until_next_minor(COMPILER_VERSION),
            deps: BTreeMap::from([(
                "gren/core".parse().expect("static package name"),
                Constraint::until_next_major(Version::ONE),
            )]),
        })
    } else {
        Outline::App(AppOutline {
            gren_version: COMPILER_VERSION,
            platform,
            source_dirs: vec![PathBuf::from("src")],
            deps_direct: BTreeMap::from([(
                "gren/core".parse().expect("static package name"),
                Version::ONE,
            )]),
            deps_indirect: BTreeMap::new(),
        })
    };

    let io = |path: PathBuf| {
        move |source| Problem::Cache(gren_cache::CacheError::Io { path, source })
    };
    std::fs::create_dir_all(paths.root().join("src"))
        .map_err(io(paths.root().join("src")))?;
    std::fs::write(&outline_path, gren_outline::encode(&outline))
        .map_err(io(outline_path.clone()))?;
    info!(path = %outline_path.display(), "project initialized");
    Ok(())
}
