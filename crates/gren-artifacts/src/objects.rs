//! Optimizer output: per-module and linked object graphs.
//!
//! The optimizer itself is an external collaborator; the build core only
//! stores what it emits, tracks symbol-level dependencies, and links the
//! per-module graphs into one `GlobalGraph` at output time.

use crate::codec::{CodecError, Decode, Encode, Reader, Writer};
use gren_core::{CanonicalModule, Raw};
use std::collections::{BTreeMap, BTreeSet};

/// A globally unique top-level symbol.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GlobalName {
    /// The module that defines the symbol.
    pub home: CanonicalModule,
    /// The symbol's name within its module.
    pub name: String,
}

/// One symbol's compiled form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Symbols this one references.
    pub deps: BTreeSet<GlobalName>,
    /// Does evaluating this symbol reach a `Debug` operation?
    pub uses_debug: bool,
    /// Optimizer IR bytes, opaque to the build core.
    pub payload: Vec<u8>,
}

/// How a module's `main` can be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Main {
    /// `main` is a static value (e.g. a constant `Html` tree).
    Static,
    /// `main` is a program that needs flags decoded at startup.
    Dynamic,
}

/// Optimizer output for a single module.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocalGraph {
    /// Present when the module defines a linkable `main`.
    pub main: Option<Main>,
    /// Every top-level symbol the module defines.
    pub nodes: BTreeMap<GlobalName, Node>,
}

/// Parsed content of one kernel JavaScript module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelChunks {
    /// Gren modules the kernel code refers to.
    pub imports: Vec<Raw>,
    /// Raw JavaScript chunks, spliced in at generation time.
    pub chunks: Vec<Vec<u8>>,
}

/// Object graphs of many modules linked into one unit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GlobalGraph {
    /// All symbols, across modules and packages.
    pub nodes: BTreeMap<GlobalName, Node>,
    /// Kernel modules, keyed by raw name.
    pub kernels: BTreeMap<Raw, KernelChunks>,
}

impl GlobalGraph {
    /// An empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb one module's local graph.
    pub fn add_local(&mut self, local: LocalGraph) {
        self.nodes.extend(local.nodes);
    }

    /// Absorb a kernel module.
    pub fn add_kernel(&mut self, name: Raw, chunks: KernelChunks) {
        self.kernels.insert(name, chunks);
    }

    /// Absorb another linked graph (e.g. a dependency package's).
    pub fn merge(&mut self, other: &Self) {
        self.nodes
            .extend(other.nodes.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.kernels
            .extend(other.kernels.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// Symbols reachable from `roots`, following `deps` edges.
    #[must_use]
    pub fn reachable_from<'a>(
        &self,
        roots: impl Iterator<Item = &'a GlobalName>,
    ) -> BTreeSet<GlobalName> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<GlobalName> = roots.cloned().collect();
        while let Some(name) = stack.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            if let Some(node) = self.nodes.get(&name) {
                stack.extend(node.deps.iter().cloned());
            }
        }
        seen
    }

    /// Modules whose reachable symbols use `Debug`, starting from `roots`.
    ///
    /// Drives the `--optimize` refusal: optimized output erases the metadata
    /// `Debug` operations need.
    #[must_use]
    pub fn debug_users<'a>(
        &self,
        roots: impl Iterator<Item = &'a GlobalName>,
    ) -> BTreeSet<CanonicalModule> {
        self.reachable_from(roots)
            .into_iter()
            .filter_map(|name| {
                let node = self.nodes.get(&name)?;
                node.uses_debug.then_some(name.home)
            })
            .collect()
    }
}

impl Encode for GlobalName {
    fn encode(&self, writer: &mut Writer) {
        self.home.encode(writer);
        self.name.encode(writer);
    }
}

impl Decode for GlobalName {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            home: CanonicalModule::decode(reader)?,
            name: String::decode(reader)?,
        })
    }
}

impl Encode for Node {
    fn encode(&self, writer: &mut Writer) {
        self.deps.encode(writer);
        self.uses_debug.encode(writer);
        self.payload.encode(writer);
    }
}

impl Decode for Node {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            deps: BTreeSet::decode(reader)?,
            uses_debug: bool::decode(reader)?,
            payload: Vec::decode(reader)?,
        })
    }
}

impl Encode for Main {
    fn encode(&self, writer: &mut Writer) {
        writer.put_u8(match self {
            Self::Static => 0,
            Self::Dynamic => 1,
        });
    }
}

impl Decode for Main {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let at = reader.position();
        match reader.get_u8()? {
            0 => Ok(Self::Static),
            1 => Ok(Self::Dynamic),
            tag => Err(CodecError::UnknownTag {
                tag,
                what: "Main",
                at,
            }),
        }
    }
}

impl Encode for LocalGraph {
    fn encode(&self, writer: &mut Writer) {
        self.main.encode(writer);
        self.nodes.encode(writer);
    }
}

impl Decode for LocalGraph {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            main: Option::decode(reader)?,
            nodes: BTreeMap::decode(reader)?,
        })
    }
}

impl Encode for KernelChunks {
    fn encode(&self, writer: &mut Writer) {
        self.imports.encode(writer);
        self.chunks.encode(writer);
    }
}

impl Decode for KernelChunks {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            imports: Vec::decode(reader)?,
            chunks: Vec::decode(reader)?,
        })
    }
}

impl Encode for GlobalGraph {
    fn encode(&self, writer: &mut Writer) {
        self.nodes.encode(writer);
        self.kernels.encode(writer);
    }
}

impl Decode for GlobalGraph {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            nodes: BTreeMap::decode(reader)?,
            kernels: BTreeMap::decode(reader)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{from_bytes, to_bytes};

    fn global(module: &str, name: &str) -> GlobalName {
        GlobalName {
            home: CanonicalModule {
                package: "author/project".parse().unwrap(),
                module: module.parse().unwrap(),
            },
            name: name.to_string(),
        }
    }

    fn node(deps: &[GlobalName], uses_debug: bool) -> Node {
        Node {
            deps: deps.iter().cloned().collect(),
            uses_debug,
            payload: vec![0xAB, 0xCD],
        }
    }

    #[test]
    fn linking_accumulates_nodes_and_kernels() {
        let mut graph = GlobalGraph::new();
        graph.add_local(LocalGraph {
            main: Some(Main::Static),
            nodes: BTreeMap::from([(global("Main", "main"), node(&[], false))]),
        });
        graph.add_kernel(
            "Gren.Kernel.Scheduler".parse().unwrap(),
            KernelChunks {
                imports: vec!["Basics".parse().unwrap()],
                chunks: vec![b"function _Scheduler_succeed".to_vec()],
            },
        );

        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.kernels.len(), 1);
    }

    #[test]
    fn reachability_follows_dep_edges() {
        let a = global("A", "a");
        let b = global("B", "b");
        let c = global("C", "c");
        let unrelated = global("D", "d");

        let mut graph = GlobalGraph::new();
        graph.nodes.insert(a.clone(), node(&[b.clone()], false));
        graph.nodes.insert(b.clone(), node(&[c.clone()], false));
        graph.nodes.insert(c.clone(), node(&[], true));
        graph.nodes.insert(unrelated.clone(), node(&[], true));

        let reachable = graph.reachable_from([a.clone()].iter());
        assert!(reachable.contains(&c));
        assert!(!reachable.contains(&unrelated));

        let debug_homes = graph.debug_users([a].iter());
        assert_eq!(debug_homes.len(), 1);
        assert_eq!(debug_homes.iter().next().unwrap().module.as_str(), "C");
    }

    #[test]
    fn graphs_roundtrip() {
        let mut graph = GlobalGraph::new();
        graph
            .nodes
            .insert(global("A", "a"), node(&[global("B", "b")], true));
        graph.add_kernel(
            "Gren.Kernel.Bytes".parse().unwrap(),
            KernelChunks {
                imports: Vec::new(),
                chunks: vec![vec![1, 2, 3]],
            },
        );
        assert_eq!(from_bytes::<GlobalGraph>(&to_bytes(&graph)).unwrap(), graph);
    }
}
