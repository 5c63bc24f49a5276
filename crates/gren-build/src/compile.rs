//! Concurrent module compilation.
//!
//! Every local module gets one task and one shared one-shot future. A task
//! first awaits the futures of its imports, then decides whether the module
//! needs compiling at all:
//!
//! - its file's modification time differs from the recorded one, or
//! - the record is missing (or the cached interface is), or
//! - some import's interface changed after this module's last compile
//!   (recorded across runs, observed directly within a run).
//!
//! A failed module resolves its future to "no result", which aborts its
//! dependents quietly; siblings keep compiling so one run surfaces as many
//! diagnostics as possible.

use crate::crawl::Status;
use crate::details::{Env, ForeignInterface, Local};
use crate::error::BuildError;
use crate::frontend::CompileInput;
use dashmap::DashMap;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use gren_artifacts::{to_bytes, DependencyInterface, GlobalGraph, Interface, LocalGraph};
use gren_core::{PackageName, Raw};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tracing::{debug, info};

/// What a module's task hands to its dependents.
#[derive(Debug)]
struct ModuleOut {
    interface: Interface,
    changed: bool,
}

type ModuleFuture = Shared<BoxFuture<'static, Option<Arc<ModuleOut>>>>;

/// What one finished task records for the coordinator.
#[derive(Debug)]
struct TaskYield {
    interface: Interface,
    local: Local,
    /// `Some` when the module was actually recompiled.
    graph: Option<LocalGraph>,
}

/// Staleness inputs for user builds; package builds compile everything.
struct Staleness {
    build_id: u64,
    previous: BTreeMap<Raw, Local>,
    cached: BTreeMap<Raw, Interface>,
}

/// Outcome of compiling the user's modules.
#[derive(Debug)]
pub(crate) struct BuildResult {
    /// Updated build records for every crawled local module.
    pub locals: BTreeMap<Raw, Local>,
    /// Current interfaces for every crawled local module.
    pub interfaces: BTreeMap<Raw, Interface>,
    /// Object graphs of the modules recompiled in this run.
    pub fresh_graphs: BTreeMap<Raw, LocalGraph>,
    /// How many modules were actually recompiled.
    pub compiled: usize,
}

/// Compile a dependency package: all modules, no staleness.
pub(crate) async fn compile_package(
    env: &Env,
    package: PackageName,
    statuses: BTreeMap<Raw, Status>,
    foreign: Arc<BTreeMap<Raw, ForeignInterface>>,
) -> Result<(BTreeMap<Raw, Interface>, GlobalGraph), BuildError> {
    let (yields, kernels) = run_modules(env, package, statuses, foreign, None).await?;

    let mut interfaces = BTreeMap::new();
    let mut objects = GlobalGraph::new();
    for (name, yielded) in yields {
        interfaces.insert(name, yielded.interface);
        if let Some(graph) = yielded.graph {
            objects.add_local(graph);
        }
    }
    for (name, chunks) in kernels {
        objects.add_kernel(name, chunks);
    }
    Ok((interfaces, objects))
}

/// Compile the user's modules incrementally.
pub(crate) async fn compile_user(
    env: &Env,
    package: PackageName,
    build_id: u64,
    statuses: BTreeMap<Raw, Status>,
    previous: BTreeMap<Raw, Local>,
    cached: BTreeMap<Raw, Interface>,
    foreign: Arc<BTreeMap<Raw, ForeignInterface>>,
) -> Result<BuildResult, BuildError> {
    let staleness = Staleness {
        build_id,
        previous,
        cached,
    };
    let (yields, _) = run_modules(env, package, statuses, foreign, Some(staleness)).await?;

    let mut result = BuildResult {
        locals: BTreeMap::new(),
        interfaces: BTreeMap::new(),
        fresh_graphs: BTreeMap::new(),
        compiled: 0,
    };
    for (name, yielded) in yields {
        result.interfaces.insert(name.clone(), yielded.interface);
        result.locals.insert(name.clone(), yielded.local);
        if let Some(graph) = yielded.graph {
            result.fresh_graphs.insert(name, graph);
            result.compiled += 1;
        }
    }
    info!(
        modules = result.locals.len(),
        compiled = result.compiled,
        "compile phase done"
    );
    Ok(result)
}

enum ImportKind {
    Local,
    Foreign(DependencyInterface),
    Kernel,
}

async fn run_modules(
    env: &Env,
    package: PackageName,
    statuses: BTreeMap<Raw, Status>,
    foreign: Arc<BTreeMap<Raw, ForeignInterface>>,
    staleness: Option<Staleness>,
) -> Result<(BTreeMap<Raw, TaskYield>, BTreeMap<Raw, gren_artifacts::KernelChunks>), BuildError> {
    let mut kernels = BTreeMap::new();
    let mut local_statuses: BTreeMap<Raw, Status> = BTreeMap::new();
    for (name, status) in statuses {
        match status {
            Status::KernelLocal { chunks } => {
                kernels.insert(name, chunks);
            }
            Status::Local { .. } => {
                local_statuses.insert(name, status);
            }
            Status::Foreign | Status::KernelForeign => {}
        }
    }

    let mut senders = BTreeMap::new();
    let mut futures: BTreeMap<Raw, ModuleFuture> = BTreeMap::new();
    for name in local_statuses.keys() {
        let (tx, rx) = oneshot::channel::<Option<Arc<ModuleOut>>>();
        senders.insert(name.clone(), tx);
        futures.insert(name.clone(), rx.map(|result| result.ok().flatten()).boxed().shared());
    }

    let diagnostics: Arc<DashMap<Raw, Vec<String>>> = Arc::new(DashMap::new());
    let yields: Arc<DashMap<Raw, TaskYield>> = Arc::new(DashMap::new());
    let mut tasks = JoinSet::new();

    for (name, status) in local_statuses {
        let Status::Local {
            path,
            time,
            source,
            imports,
            has_main,
        } = status
        else {
            unreachable!("only local statuses are left");
        };

        // Static half of the staleness rule, decided from the previous run's
        // records. The dynamic half (an import recompiled just now with a
        // different interface) is observed inside the task.
        let (prev, cached_iface, statically_fresh, build_id) = match &staleness {
            None => (None, None, false, 1),
            Some(ctx) => {
                let prev = ctx.previous.get(&name).cloned();
                let cached_iface = ctx.cached.get(&name).cloned();
                let fresh = prev.as_ref().is_some_and(|prev| {
                    prev.time == time
                        && cached_iface.is_some()
                        && prev.imports.iter().all(|import| {
                            ctx.previous
                                .get(import)
                                .is_none_or(|dep| dep.last_change <= prev.last_compile)
                        })
                });
                (prev, cached_iface, fresh, ctx.build_id)
            }
        };

        let import_kinds: Vec<(Raw, ImportKind)> = imports
            .iter()
            .map(|import| {
                let kind = if futures.contains_key(import) {
                    ImportKind::Local
                } else if let Some(ForeignInterface::Specific(iface)) = foreign.get(import) {
                    ImportKind::Foreign(iface.clone())
                } else {
                    // Kernel imports and ambiguous names carry no interface;
                    // the crawler already rejected anything unusable.
                    ImportKind::Kernel
                };
                (import.clone(), kind)
            })
            .collect();
        let dep_futures: Vec<(Raw, ModuleFuture)> = imports
            .iter()
            .filter_map(|import| Some((import.clone(), futures.get(import)?.clone())))
            .collect();

        let tx = senders.remove(&name).expect("one sender per module");
        let frontend = env.frontend.clone();
        let package = package.clone();
        let diagnostics = diagnostics.clone();
        let yields = yields.clone();

        tasks.spawn(async move {
            let mut interfaces: BTreeMap<Raw, DependencyInterface> = BTreeMap::new();
            let mut deps_changed = false;
            let dep_futures: BTreeMap<Raw, ModuleFuture> = dep_futures.into_iter().collect();
            for (import, kind) in import_kinds {
                match kind {
                    ImportKind::Local => {
                        let Some(out) = dep_futures[&import].clone().await else {
                            let _ = tx.send(None);
                            return;
                        };
                        deps_changed |= out.changed;
                        interfaces.insert(
                            import,
                            DependencyInterface::Public(out.interface.clone()),
                        );
                    }
                    ImportKind::Foreign(iface) => {
                        interfaces.insert(import, iface);
                    }
                    ImportKind::Kernel => {}
                }
            }

            if statically_fresh && !deps_changed {
                let interface = cached_iface.expect("statically fresh implies a cached interface");
                let local = prev.expect("statically fresh implies a previous record");
                debug!(module = %name, "fresh, reusing cached interface");
                let out = Arc::new(ModuleOut {
                    interface: interface.clone(),
                    changed: false,
                });
                yields.insert(
                    name,
                    TaskYield {
                        interface,
                        local,
                        graph: None,
                    },
                );
                let _ = tx.send(Some(out));
                return;
            }

            let input = CompileInput {
                package,
                module: name.clone(),
                source: &source,
                interfaces: &interfaces,
            };
            match frontend.compile(&input) {
                Err(problems) => {
                    diagnostics.insert(name, problems);
                    let _ = tx.send(None);
                }
                Ok(compiled) => {
                    let changed = match &cached_iface {
                        Some(old) => {
                            blake3::hash(&to_bytes(old))
                                != blake3::hash(&to_bytes(&compiled.interface))
                        }
                        None => true,
                    };
                    let local = Local {
                        path,
                        time,
                        imports,
                        main: has_main,
                        last_change: if changed {
                            build_id
                        } else {
                            prev.as_ref().map_or(build_id, |prev| prev.last_change)
                        },
                        last_compile: build_id,
                    };
                    debug!(module = %name, changed, "compiled");
                    let out = Arc::new(ModuleOut {
                        interface: compiled.interface.clone(),
                        changed,
                    });
                    yields.insert(
                        name,
                        TaskYield {
                            interface: compiled.interface,
                            local,
                            graph: Some(compiled.objects),
                        },
                    );
                    let _ = tx.send(Some(out));
                }
            }
        });
    }

    while let Some(joined) = tasks.join_next().await {
        joined.expect("module task panicked");
    }

    let diagnostics = Arc::into_inner(diagnostics).expect("all tasks joined");
    if !diagnostics.is_empty() {
        return Err(BuildError::ModuleProblems {
            diagnostics: diagnostics.into_iter().collect(),
        });
    }

    let yields = Arc::into_inner(yields).expect("all tasks joined");
    Ok((yields.into_iter().collect(), kernels))
}
