//! `Details`: the aggregated build state of one project.
//!
//! Loading details means: validate the outline, solve dependency versions,
//! and make sure every package in the solution has usable artifacts,
//! building any that do not. Package builds run concurrently, meeting at
//! one-shot futures: each package's task awaits the futures of its direct
//! dependencies, so the fan-out is ordered by the dependency relation and
//! nothing else.

use crate::compile;
use crate::crawl::{self, CrawlEnv, RootKind};
use crate::error::{BuildError, DetailsError, Problem};
use crate::frontend::Frontend;
use crate::writeback::Writeback;
use dashmap::DashMap;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use gren_artifacts::{
    from_bytes, to_bytes, ArtifactCache, Artifacts, CodecError, Decode, DependencyInterface,
    Encode, Fingerprint, GlobalGraph, Interface, LocalGraph, Reader, Writer,
};
use gren_cache::{modification_time, read_binary, PackageCache, ProjectPaths, RegistryLock};
use gren_core::{PackageName, Platform, Raw, Version};
use gren_outline::Outline;
use gren_solver::{verify_app, verify_pkg, Outcome, Registry, Solution};
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// The package name user application modules are canonicalized under.
pub static APP_PACKAGE: Lazy<PackageName> =
    Lazy::new(|| "author/project".parse().expect("static name is well-formed"));

/// Packages allowed to ship kernel JavaScript next to their source.
const KERNEL_PRIVILEGED: &[&str] = &["gren/core", "gren/browser", "gren/node"];

pub(crate) fn is_kernel_privileged(name: &PackageName) -> bool {
    KERNEL_PRIVILEGED.iter().any(|entry| {
        let (author, project) = entry.split_once('/').expect("whitelist entries are a/b");
        name.author() == author && name.project() == project
    })
}

/// Shared services of one build invocation.
#[derive(Clone)]
pub struct Env {
    /// The machine-wide package cache.
    pub cache: PackageCache,
    /// Registry client; `None` means offline from the start.
    pub registry: Option<Arc<dyn Registry>>,
    /// The external compiler.
    pub frontend: Arc<dyn Frontend>,
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env")
            .field("cache", &self.cache)
            .field("online", &self.registry.is_some())
            .finish_non_exhaustive()
    }
}

/// The outline boiled down to what later phases need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidOutline {
    /// An application root.
    App {
        /// Root platform.
        platform: Platform,
        /// Source directories, absolute.
        source_dirs: Vec<PathBuf>,
        /// Direct dependencies, for interface visibility.
        direct: BTreeSet<PackageName>,
    },
    /// A package root.
    Pkg {
        /// The package's own name.
        name: PackageName,
        /// Root platform.
        platform: Platform,
        /// Exposed modules, flattened.
        exposed: Vec<Raw>,
        /// Direct dependencies.
        direct: BTreeSet<PackageName>,
    },
}

impl ValidOutline {
    /// The project's source directories, rooted at `root`.
    #[must_use]
    pub fn source_dirs(&self, root: &std::path::Path) -> Vec<PathBuf> {
        match self {
            Self::App { source_dirs, .. } => source_dirs.clone(),
            Self::Pkg { .. } => vec![root.join("src")],
        }
    }

    /// The package user modules belong to.
    #[must_use]
    pub fn home(&self) -> PackageName {
        match self {
            Self::App { .. } => APP_PACKAGE.clone(),
            Self::Pkg { name, .. } => name.clone(),
        }
    }
}

/// Build record of one user module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Local {
    /// Source file path.
    pub path: PathBuf,
    /// Modification time (epoch millis) at last compile.
    pub time: u64,
    /// Imports at last compile.
    pub imports: Vec<Raw>,
    /// Does the module define `main`?
    pub main: bool,
    /// Build id of the last compile whose interface bytes differed.
    pub last_change: u64,
    /// Build id of the last compile.
    pub last_compile: u64,
}

/// Which packages expose one importable foreign module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Foreign {
    /// The canonical owner (smallest package name exposing it).
    pub owner: PackageName,
    /// Other packages also exposing the name; non-empty means ambiguous.
    pub others: Vec<PackageName>,
}

/// A foreign module's interface as visible to this project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForeignInterface {
    /// Exactly one package exposes the module.
    Specific(DependencyInterface),
    /// Several packages expose it; an error only if some import uses it.
    Ambiguous,
}

/// Dependency artifacts carried in memory right after a fresh verify.
#[derive(Debug, Clone)]
pub enum Extras {
    /// Artifacts live in `.gren/interfaces.dat` / `.gren/objects.dat`.
    Cached,
    /// Artifacts were just built and have not been round-tripped.
    Fresh {
        /// Foreign interfaces visible to user code.
        interfaces: Arc<BTreeMap<Raw, ForeignInterface>>,
        /// Every dependency's object graph, merged.
        objects: Arc<GlobalGraph>,
    },
}

/// Aggregated build state, persisted to `.gren/details.dat`.
#[derive(Debug, Clone)]
pub struct Details {
    /// `gren.json` modification time this state was derived from.
    pub outline_time: u64,
    /// The validated outline.
    pub outline: ValidOutline,
    /// Monotonic counter, bumped once per load.
    pub build_id: u64,
    /// Per-module build records.
    pub locals: BTreeMap<Raw, Local>,
    /// Importable foreign modules.
    pub foreigns: BTreeMap<Raw, Foreign>,
    /// Fresh artifacts when this load regenerated; never persisted.
    pub extras: Extras,
}

/// The persisted half of `.gren/interfaces.dat`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct InterfaceStore {
    /// Foreign interfaces from the dependency solution.
    pub foreign: BTreeMap<Raw, ForeignInterface>,
    /// Last-built interfaces of the user's own modules.
    pub locals: BTreeMap<Raw, Interface>,
}

/// The persisted half of `.gren/objects.dat`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ObjectStore {
    /// Dependency object graphs, merged.
    pub deps: GlobalGraph,
    /// Per-module graphs of the user's own modules.
    pub locals: BTreeMap<Raw, LocalGraph>,
}

/// Load project details, reusing `.gren/details.dat` when the outline is
/// untouched. The cached path only bumps `build_id`.
pub async fn load(env: &Env, paths: &ProjectPaths, writeback: &Writeback) -> Result<Details, Problem> {
    let outline_time = modification_time(&paths.outline_path()).map_err(Problem::Cache)?;

    let mut previous_build_id = 0;
    if let Ok(bytes) = read_binary(&paths.details_path()) {
        match from_bytes::<Details>(&bytes) {
            Ok(mut details) => {
                if details.outline_time == outline_time {
                    details.build_id += 1;
                    debug!(build_id = details.build_id, "details reused");
                    return Ok(details);
                }
                previous_build_id = details.build_id;
                debug!("outline changed, regenerating details");
            }
            Err(err) => warn!(%err, "corrupt details.dat, regenerating"),
        }
    }

    let outline = gren_outline::load(paths.root())?;
    let details = assemble(
        env,
        paths,
        &outline,
        outline_time,
        previous_build_id + 1,
        Some(writeback),
    )
    .await?;
    Ok(details)
}

/// Validate that `outline`'s dependency set can be built, without touching
/// the current project state. Used before committing an edited outline.
pub async fn verify_install(
    env: &Env,
    paths: &ProjectPaths,
    outline: &Outline,
) -> Result<(), Problem> {
    assemble(env, paths, outline, 0, 1, None).await.map(drop)
}

async fn assemble(
    env: &Env,
    paths: &ProjectPaths,
    outline: &Outline,
    outline_time: u64,
    build_id: u64,
    persist: Option<&Writeback>,
) -> Result<Details, Problem> {
    let (solution, valid) = solve(env, paths, outline)?;
    let root_direct = match &valid {
        ValidOutline::App { direct, .. } | ValidOutline::Pkg { direct, .. } => direct.clone(),
    };

    let deps = verify_dependencies(env, &solution, &root_direct).await?;

    let details = Details {
        outline_time,
        outline: valid,
        build_id,
        locals: BTreeMap::new(),
        foreigns: deps.foreigns,
        extras: Extras::Fresh {
            interfaces: Arc::new(deps.interfaces),
            objects: Arc::new(deps.objects),
        },
    };

    if let Some(writeback) = persist {
        paths.prepare().map_err(Problem::Cache)?;
        writeback.queue(paths.details_path(), to_bytes(&details));
        let Extras::Fresh { interfaces, objects } = &details.extras else {
            unreachable!("assemble always produces fresh extras");
        };
        writeback.queue(
            paths.interfaces_path(),
            to_bytes(&InterfaceStore {
                foreign: interfaces.as_ref().clone(),
                locals: BTreeMap::new(),
            }),
        );
        writeback.queue(
            paths.objects_path(),
            to_bytes(&ObjectStore {
                deps: objects.as_ref().clone(),
                locals: BTreeMap::new(),
            }),
        );
    }
    Ok(details)
}

fn solve(
    env: &Env,
    paths: &ProjectPaths,
    outline: &Outline,
) -> Result<(Solution, ValidOutline), Problem> {
    let registry = env.registry.as_deref();
    match outline {
        Outline::App(app) => {
            let exact = app.all_deps();
            let outcome = verify_app(&env.cache, registry, app.platform, &exact)?;
            let solution = expect_solution(outcome)?;
            // The app outline pins every version by hand; a solution needing
            // a package it never lists means the lists were edited badly.
            for name in solution.keys() {
                if !exact.contains_key(name) {
                    return Err(DetailsError::HandEditedDependencies {
                        package: name.clone(),
                    }
                    .into());
                }
            }
            let valid = ValidOutline::App {
                platform: app.platform,
                source_dirs: app
                    .source_dirs
                    .iter()
                    .map(|dir| paths.root().join(dir))
                    .collect(),
                direct: app.deps_direct.keys().cloned().collect(),
            };
            Ok((solution, valid))
        }
        Outline::Pkg(pkg) => {
            let outcome = verify_pkg(&env.cache, registry, pkg.platform, &pkg.deps)?;
            let solution = expect_solution(outcome)?;
            let valid = ValidOutline::Pkg {
                name: pkg.name.clone(),
                platform: pkg.platform,
                exposed: pkg.exposed.iter().cloned().collect(),
                direct: pkg.deps.keys().cloned().collect(),
            };
            Ok((solution, valid))
        }
    }
}

fn expect_solution(outcome: Outcome) -> Result<Solution, DetailsError> {
    match outcome {
        Outcome::Ok(solution) => Ok(solution),
        Outcome::NoSolution => Err(DetailsError::NoSolution),
        Outcome::NoOfflineSolution => Err(DetailsError::NoOfflineSolution),
    }
}

/// One package's artifacts, or `None` when it (or a dependency) failed.
type DepFuture = Shared<BoxFuture<'static, Option<Arc<Artifacts>>>>;

struct DepOutput {
    interfaces: BTreeMap<Raw, ForeignInterface>,
    foreigns: BTreeMap<Raw, Foreign>,
    objects: GlobalGraph,
}

/// Ensure every package in the solution has artifacts for its fingerprint,
/// building missing ones concurrently.
async fn verify_dependencies(
    env: &Env,
    solution: &Solution,
    root_direct: &BTreeSet<PackageName>,
) -> Result<DepOutput, DetailsError> {
    let _lock = RegistryLock::acquire(&env.cache)?;
    info!(packages = solution.len(), "verifying dependencies");

    let errors: Arc<DashMap<PackageName, DetailsError>> = Arc::new(DashMap::new());
    let mut senders = BTreeMap::new();
    let mut futures: BTreeMap<PackageName, DepFuture> = BTreeMap::new();
    for name in solution.keys() {
        let (tx, rx) = oneshot::channel::<Option<Arc<Artifacts>>>();
        senders.insert(name.clone(), tx);
        futures.insert(name.clone(), rx.map(|result| result.ok().flatten()).boxed().shared());
    }

    let mut tasks = JoinSet::new();
    for (name, solved) in solution {
        let fingerprint: Fingerprint = solved
            .constraints
            .keys()
            .map(|dep| (dep.clone(), solution[dep].version))
            .collect();
        let dep_futures: BTreeMap<PackageName, DepFuture> = solved
            .constraints
            .keys()
            .map(|dep| (dep.clone(), futures[dep].clone()))
            .collect();
        let tx = senders.remove(name).expect("one sender per package");
        let env = env.clone();
        let name = name.clone();
        let version = solved.version;
        let errors = errors.clone();
        tasks.spawn(async move {
            let result = verify_dep(&env, &name, version, &fingerprint, dep_futures).await;
            let ready = match result {
                Ok(artifacts) => Some(artifacts),
                Err(Some(err)) => {
                    errors.insert(name, err);
                    None
                }
                // A dependency already failed; its error is recorded.
                Err(None) => None,
            };
            let _ = tx.send(ready);
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.expect("package task panicked");
    }

    if !errors.is_empty() {
        // Surface the failure of the smallest package name, deterministically.
        let mut names: Vec<PackageName> = errors.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        let (_, err) = errors.remove(&names[0]).expect("error recorded above");
        return Err(err);
    }

    let mut artifacts_by_pkg: BTreeMap<PackageName, Arc<Artifacts>> = BTreeMap::new();
    for (name, future) in &futures {
        if let Some(artifacts) = future.clone().await {
            artifacts_by_pkg.insert(name.clone(), artifacts);
        }
    }

    let (interfaces, foreigns) = gather_foreign(&artifacts_by_pkg, root_direct);
    let mut objects = GlobalGraph::new();
    for artifacts in artifacts_by_pkg.values() {
        objects.merge(&artifacts.objects);
    }
    Ok(DepOutput {
        interfaces,
        foreigns,
        objects,
    })
}

/// `Err(Some(_))` is this package's own failure; `Err(None)` means a
/// dependency failed first and this package merely cannot proceed.
async fn verify_dep(
    env: &Env,
    name: &PackageName,
    version: Version,
    fingerprint: &Fingerprint,
    dep_futures: BTreeMap<PackageName, DepFuture>,
) -> Result<Arc<Artifacts>, Option<DetailsError>> {
    let path = env.cache.artifacts_path(name, version);
    let mut stored: Option<ArtifactCache> = None;
    if let Ok(bytes) = read_binary(&path) {
        match from_bytes::<ArtifactCache>(&bytes) {
            Ok(cache) => {
                if let Some(artifacts) = cache.matching(fingerprint) {
                    debug!(package = %name, %version, "artifact cache hit");
                    return Ok(Arc::new(artifacts.clone()));
                }
                stored = Some(cache);
            }
            Err(err) => {
                warn!(package = %name, %version, %err, "corrupt artifacts.dat, rebuilding");
                let _ = std::fs::remove_file(&path);
            }
        }
    }

    let mut direct_artifacts = BTreeMap::new();
    for (dep, future) in dep_futures {
        match future.await {
            Some(artifacts) => {
                direct_artifacts.insert(dep, artifacts);
            }
            None => return Err(None),
        }
    }

    info!(package = %name, %version, "building package");
    let artifacts = build_package(env, name, version, &direct_artifacts)
        .await
        .map_err(|err| {
            Some(DetailsError::PackageBuildFailed {
                package: name.clone(),
                version,
                fingerprint: fingerprint.clone(),
                reason: err.to_string(),
            })
        })?;

    let store = match stored {
        Some(mut cache) => {
            cache.insert_fingerprint(fingerprint.clone());
            cache.artifacts = artifacts.clone();
            cache
        }
        None => ArtifactCache::new(fingerprint.clone(), artifacts.clone()),
    };
    gren_cache::write_atomic(&path, &to_bytes(&store))
        .map_err(|err| Some(DetailsError::Cache(err)))?;

    Ok(Arc::new(artifacts))
}

/// Compile one dependency package from its cached source.
async fn build_package(
    env: &Env,
    name: &PackageName,
    version: Version,
    direct_artifacts: &BTreeMap<PackageName, Arc<Artifacts>>,
) -> Result<Artifacts, BuildError> {
    let version_dir = env.cache.version_dir(name, version);
    let outline = match gren_outline::load(&version_dir) {
        Ok(Outline::Pkg(outline)) => outline,
        Ok(Outline::App(_)) | Err(_) => {
            return Err(BuildError::UnknownPath(version_dir.join("gren.json")));
        }
    };

    // Relative to this package, every dependency in scope is direct.
    let all_direct: BTreeSet<PackageName> = direct_artifacts.keys().cloned().collect();
    let (foreign_ifaces, foreigns) = gather_foreign(direct_artifacts, &all_direct);
    let foreign_kernels: BTreeSet<Raw> = direct_artifacts
        .values()
        .flat_map(|artifacts| artifacts.objects.kernels.keys().cloned())
        .collect();

    let crawl_env = CrawlEnv {
        frontend: env.frontend.as_ref(),
        source_dirs: vec![env.cache.src_dir(name, version)],
        foreigns: &foreigns,
        foreign_kernels: &foreign_kernels,
        kernel_privileged: is_kernel_privileged(name),
    };
    let exposed: Vec<Raw> = outline.exposed.iter().cloned().collect();
    let statuses = crawl::crawl(&crawl_env, &exposed, RootKind::Exposed)?;
    crawl::check_cycles(&statuses)?;

    let (interfaces, objects) =
        compile::compile_package(env, name.clone(), statuses, Arc::new(foreign_ifaces)).await?;

    let mut exposed_ifaces = BTreeMap::new();
    for module in &exposed {
        let Some(interface) = interfaces.get(module) else {
            return Err(BuildError::MissingExposed(module.clone()));
        };
        exposed_ifaces.insert(
            module.clone(),
            DependencyInterface::Public(interface.clone()),
        );
    }

    Ok(Artifacts {
        interfaces: exposed_ifaces,
        objects,
    })
}

/// Fold per-package interfaces into the project-wide foreign tables.
///
/// Packages in `direct` contribute `Public` interfaces; everything else is
/// privatized. A name exposed by several packages becomes `Ambiguous`; the
/// owner recorded for it is the smallest package name.
fn gather_foreign(
    artifacts_by_pkg: &BTreeMap<PackageName, Arc<Artifacts>>,
    direct: &BTreeSet<PackageName>,
) -> (BTreeMap<Raw, ForeignInterface>, BTreeMap<Raw, Foreign>) {
    let mut interfaces: BTreeMap<Raw, ForeignInterface> = BTreeMap::new();
    let mut foreigns: BTreeMap<Raw, Foreign> = BTreeMap::new();

    for (package, artifacts) in artifacts_by_pkg {
        for (module, dep_iface) in &artifacts.interfaces {
            let Some(interface) = dep_iface.public() else {
                continue;
            };
            match foreigns.get_mut(module) {
                None => {
                    let visible = if direct.contains(package) {
                        DependencyInterface::Public(interface.clone())
                    } else {
                        DependencyInterface::privatize(interface)
                    };
                    interfaces.insert(module.clone(), ForeignInterface::Specific(visible));
                    foreigns.insert(
                        module.clone(),
                        Foreign {
                            owner: package.clone(),
                            others: Vec::new(),
                        },
                    );
                }
                Some(foreign) => {
                    foreign.others.push(package.clone());
                    interfaces.insert(module.clone(), ForeignInterface::Ambiguous);
                }
            }
        }
    }
    (interfaces, foreigns)
}

impl Encode for Local {
    fn encode(&self, writer: &mut Writer) {
        self.path.encode(writer);
        writer.put_u64(self.time);
        self.imports.encode(writer);
        self.main.encode(writer);
        writer.put_u64(self.last_change);
        writer.put_u64(self.last_compile);
    }
}

impl Decode for Local {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            path: PathBuf::decode(reader)?,
            time: reader.get_u64()?,
            imports: Vec::decode(reader)?,
            main: bool::decode(reader)?,
            last_change: reader.get_u64()?,
            last_compile: reader.get_u64()?,
        })
    }
}

impl Encode for Foreign {
    fn encode(&self, writer: &mut Writer) {
        self.owner.encode(writer);
        self.others.encode(writer);
    }
}

impl Decode for Foreign {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            owner: PackageName::decode(reader)?,
            others: Vec::decode(reader)?,
        })
    }
}

impl Encode for ForeignInterface {
    fn encode(&self, writer: &mut Writer) {
        match self {
            Self::Specific(iface) => {
                writer.put_u8(0);
                iface.encode(writer);
            }
            Self::Ambiguous => writer.put_u8(1),
        }
    }
}

impl Decode for ForeignInterface {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let at = reader.position();
        match reader.get_u8()? {
            0 => Ok(Self::Specific(DependencyInterface::decode(reader)?)),
            1 => Ok(Self::Ambiguous),
            tag => Err(CodecError::UnknownTag {
                tag,
                what: "ForeignInterface",
                at,
            }),
        }
    }
}

impl Encode for ValidOutline {
    fn encode(&self, writer: &mut Writer) {
        match self {
            Self::App {
                platform,
                source_dirs,
                direct,
            } => {
                writer.put_u8(0);
                platform.encode(writer);
                source_dirs.encode(writer);
                direct.encode(writer);
            }
            Self::Pkg {
                name,
                platform,
                exposed,
                direct,
            } => {
                writer.put_u8(1);
                name.encode(writer);
                platform.encode(writer);
                exposed.encode(writer);
                direct.encode(writer);
            }
        }
    }
}

impl Decode for ValidOutline {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let at = reader.position();
        match reader.get_u8()? {
            0 => Ok(Self::App {
                platform: Platform::decode(reader)?,
                source_dirs: Vec::decode(reader)?,
                direct: BTreeSet::decode(reader)?,
            }),
            1 => Ok(Self::Pkg {
                name: PackageName::decode(reader)?,
                platform: Platform::decode(reader)?,
                exposed: Vec::decode(reader)?,
                direct: BTreeSet::decode(reader)?,
            }),
            tag => Err(CodecError::UnknownTag {
                tag,
                what: "ValidOutline",
                at,
            }),
        }
    }
}

impl Encode for Details {
    fn encode(&self, writer: &mut Writer) {
        // The store opens with the compiler version that wrote it; no bytes
        // written by another compiler are ever trusted. `extras` never
        // persists: fresh artifacts round-trip through the interface and
        // object stores instead.
        gren_core::COMPILER_VERSION.encode(writer);
        writer.put_u64(self.outline_time);
        self.outline.encode(writer);
        writer.put_u64(self.build_id);
        self.locals.encode(writer);
        self.foreigns.encode(writer);
    }
}

impl Decode for Details {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let at = reader.position();
        let written_by = Version::decode(reader)?;
        if written_by != gren_core::COMPILER_VERSION {
            return Err(CodecError::BadValue {
                what: "Details",
                at,
                message: format!("written by gren {written_by}"),
            });
        }
        Ok(Self {
            outline_time: reader.get_u64()?,
            outline: ValidOutline::decode(reader)?,
            build_id: reader.get_u64()?,
            locals: BTreeMap::decode(reader)?,
            foreigns: BTreeMap::decode(reader)?,
            extras: Extras::Cached,
        })
    }
}

impl Encode for InterfaceStore {
    fn encode(&self, writer: &mut Writer) {
        self.foreign.encode(writer);
        self.locals.encode(writer);
    }
}

impl Decode for InterfaceStore {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            foreign: BTreeMap::decode(reader)?,
            locals: BTreeMap::decode(reader)?,
        })
    }
}

impl Encode for ObjectStore {
    fn encode(&self, writer: &mut Writer) {
        self.deps.encode(writer);
        self.locals.encode(writer);
    }
}

impl Decode for ObjectStore {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            deps: GlobalGraph::decode(reader)?,
            locals: BTreeMap::decode(reader)?,
        })
    }
}
