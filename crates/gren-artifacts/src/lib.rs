//! Compiled artifacts and their on-disk form.
//!
//! Everything long-lived that the build core produces flows through this
//! crate: module interfaces (public signatures), optimized object graphs,
//! and the per-package `ArtifactCache` persisted to `artifacts.dat`. The
//! [`codec`] module is the single serialization used for all of it.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
mod interface;
mod objects;
mod store;

pub use codec::{from_bytes, to_bytes, CodecError, Decode, Encode, Reader, Writer};
pub use interface::{Alias, Annotation, DependencyInterface, Interface, Type, Union};
pub use objects::{GlobalGraph, GlobalName, KernelChunks, LocalGraph, Main, Node};
pub use store::{ArtifactCache, Artifacts, Fingerprint};
