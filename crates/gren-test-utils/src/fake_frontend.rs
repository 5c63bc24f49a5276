//! A deterministic stand-in for the external compiler.
//!
//! The toy module syntax it understands:
//!
//! ```text
//! module Page.Home exposing (..)
//!
//! import Html
//!
//! greeting : String
//! greeting =
//!     Html.text "hi"
//!
//! main =
//!     greeting
//! ```
//!
//! Interfaces carry one entry per top-level binding; a binding's type is
//! its annotation text, so editing a body never changes the interface while
//! editing an annotation always does. Object nodes depend on same-module
//! bindings referenced by name and on `Module.name` qualified references,
//! and a body mentioning `Debug.` marks its node as debug-using. A line
//! containing `!syntax_error` fails header parsing; a body containing
//! `!type_error` fails compilation.

use gren_artifacts::{
    Annotation, DependencyInterface, GlobalName, Interface, KernelChunks, LocalGraph, Main, Node,
    Type,
};
use gren_build::{CompileInput, CompiledModule, Frontend, Header, Mode};
use gren_core::{CanonicalModule, PackageName, Raw};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

/// The fake external compiler.
#[derive(Debug, Default)]
pub struct FakeFrontend {
    compiles: AtomicU64,
}

impl FakeFrontend {
    /// A fresh fake.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How many modules have been compiled so far, across all builds.
    ///
    /// Incremental-build tests watch this to prove what was (not) recompiled.
    #[must_use]
    pub fn compiles(&self) -> u64 {
        self.compiles.load(Ordering::SeqCst)
    }
}

struct Binding {
    annotation: Option<String>,
    body: String,
}

fn bindings_of(source: &str) -> BTreeMap<String, Binding> {
    let mut bindings: BTreeMap<String, Binding> = BTreeMap::new();
    let mut current: Option<String> = None;

    for line in source.lines() {
        let starts_binding = line
            .chars()
            .next()
            .is_some_and(|first| first.is_ascii_lowercase());
        if starts_binding {
            let name: String = line
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                .collect();
            let rest = &line[name.len()..];
            let rest = rest.trim_start();
            if let Some(annotation) = rest.strip_prefix(':') {
                bindings
                    .entry(name)
                    .or_insert_with(|| Binding {
                        annotation: None,
                        body: String::new(),
                    })
                    .annotation = Some(annotation.trim().to_string());
                current = None;
            } else if let Some(body) = rest.strip_prefix('=') {
                let entry = bindings.entry(name.clone()).or_insert_with(|| Binding {
                    annotation: None,
                    body: String::new(),
                });
                entry.body.push_str(body.trim());
                entry.body.push('\n');
                current = Some(name);
            } else {
                current = None;
            }
        } else if line.starts_with(' ') || line.starts_with('\t') {
            if let Some(name) = &current {
                if let Some(binding) = bindings.get_mut(name) {
                    binding.body.push_str(line.trim());
                    binding.body.push('\n');
                }
            }
        } else {
            current = None;
        }
    }
    bindings
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
        .filter(|word| !word.is_empty())
}

fn import_home(
    package: &PackageName,
    interfaces: &BTreeMap<Raw, DependencyInterface>,
    module: &Raw,
) -> PackageName {
    match interfaces.get(module) {
        Some(DependencyInterface::Public(iface)) => iface.home.clone(),
        Some(DependencyInterface::Private(home, _, _)) => home.clone(),
        None => package.clone(),
    }
}

impl Frontend for FakeFrontend {
    fn parse_header(&self, source: &str) -> Result<Header, String> {
        if source.contains("!syntax_error") {
            return Err("SYNTAX PROBLEM: I got stuck at `!syntax_error`".to_string());
        }

        let mut name = None;
        let mut imports = Vec::new();
        for line in source.lines() {
            if let Some(rest) = line.strip_prefix("module ") {
                if let Some(word) = words(rest).next() {
                    name = word.parse().ok();
                }
            } else if let Some(rest) = line.strip_prefix("import ") {
                if let Some(word) = words(rest).next() {
                    if let Ok(import) = word.parse() {
                        imports.push(import);
                    }
                }
            }
        }
        let has_main = bindings_of(source).contains_key("main");
        Ok(Header {
            name,
            imports,
            has_main,
        })
    }

    fn parse_kernel(&self, source: &[u8]) -> KernelChunks {
        let text = String::from_utf8_lossy(source);
        let imports = text
            .lines()
            .filter_map(|line| line.strip_prefix("// import "))
            .filter_map(|name| name.trim().parse().ok())
            .collect();
        KernelChunks {
            imports,
            chunks: vec![source.to_vec()],
        }
    }

    fn compile(&self, input: &CompileInput<'_>) -> Result<CompiledModule, Vec<String>> {
        self.compiles.fetch_add(1, Ordering::SeqCst);
        if input.source.contains("!type_error") {
            return Err(vec![format!(
                "TYPE MISMATCH in `{}`: something is wrong around `!type_error`",
                input.module
            )]);
        }

        let home = CanonicalModule {
            package: input.package.clone(),
            module: input.module.clone(),
        };
        let header = self
            .parse_header(input.source)
            .map_err(|problem| vec![problem])?;
        let bindings = bindings_of(input.source);

        let mut interface = Interface::new(input.package.clone());
        let mut nodes = BTreeMap::new();
        for (name, binding) in &bindings {
            let tipe = match &binding.annotation {
                Some(annotation) => Type::Named(home.clone(), annotation.clone(), Vec::new()),
                None => Type::Var("a".to_string()),
            };
            interface.values.insert(
                name.clone(),
                Annotation {
                    vars: Vec::new(),
                    tipe,
                },
            );

            let mut deps = BTreeSet::new();
            for word in words(&binding.body) {
                match word.rsplit_once('.') {
                    None => {
                        if word != name && bindings.contains_key(word) {
                            deps.insert(GlobalName {
                                home: home.clone(),
                                name: word.to_string(),
                            });
                        }
                    }
                    Some((module, value)) => {
                        let Ok(module) = module.parse::<Raw>() else {
                            continue;
                        };
                        if header.imports.contains(&module) {
                            deps.insert(GlobalName {
                                home: CanonicalModule {
                                    package: import_home(
                                        &input.package,
                                        input.interfaces,
                                        &module,
                                    ),
                                    module,
                                },
                                name: value.to_string(),
                            });
                        }
                    }
                }
            }
            nodes.insert(
                GlobalName {
                    home: home.clone(),
                    name: name.clone(),
                },
                Node {
                    deps,
                    uses_debug: binding.body.contains("Debug."),
                    payload: binding.body.clone().into_bytes(),
                },
            );
        }

        Ok(CompiledModule {
            interface,
            objects: LocalGraph {
                main: bindings.contains_key("main").then_some(Main::Static),
                nodes,
            },
        })
    }

    fn generate(
        &self,
        graph: &gren_artifacts::GlobalGraph,
        mains: &[(CanonicalModule, Main)],
        mode: Mode,
    ) -> String {
        let mut js = String::from("(function(scope){\nvar Gren = {};\n");
        for (module, _) in mains {
            js.push_str(&format!(
                "Gren[\"{0}\"] = {{ init: function(opts) {{ return {{}}; }} }};\n",
                module.module
            ));
        }
        js.push_str(&format!(
            "// mode={} nodes={} kernels={}\n",
            match mode {
                Mode::Dev => "dev",
                Mode::Debug => "debug",
                Mode::Optimize => "optimize",
            },
            graph.nodes.len(),
            graph.kernels.len(),
        ));
        js.push_str("scope.Gren = Gren;\n})(this);\n");
        js
    }
}
